//! Session-scoped state shared by the Query and Answer screens.
//!
//! The research result has to outlive the screen that produced it, so it
//! lives here rather than in either view. The chat pipeline is derived from
//! the stored result and rebuilt only when the result's identity changes.

use crate::api::RequestFailure;
use crate::chat::{ChatPipeline, OutboundChat};
use crate::conversation::ConversationStore;
use crate::form::{FormField, SourceSelection, Submission};
use crate::models::{ChatMessage, ResearchResult};
use crate::navigator::{AnswerView, Navigator, Route};
use crate::research::{RequestTicket, ResearchController, ResultId};

#[derive(Debug, Default)]
pub struct Session {
    controller: ResearchController,
    navigator: Navigator,
    form: Option<SourceSelection>,
    chat: Option<ChatPipeline>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> Route {
        self.navigator.route()
    }

    pub fn controller(&self) -> &ResearchController {
        &self.controller
    }

    pub fn form(&self) -> Option<&SourceSelection> {
        self.form.as_ref()
    }

    pub fn chat(&self) -> Option<&ChatPipeline> {
        self.chat.as_ref()
    }

    pub fn answer_view(&self) -> AnswerView<'_> {
        Navigator::answer_view(&self.controller)
    }

    /// Each visit to the Query screen starts with a fresh form; leaving it
    /// discards the form.
    pub fn navigate(&mut self, route: Route) {
        if !self.navigator.go(route) {
            return;
        }
        self.form = (route == Route::Query).then(SourceSelection::new);
    }

    pub fn update_field(&mut self, field: FormField) {
        if let Some(form) = self.form.as_mut() {
            form.update_field(field);
            self.controller.clear_form_error();
        }
    }

    pub fn submit_research(&mut self) -> Option<Submission> {
        let submission = self.form.as_ref()?.submit(&mut self.controller);
        self.sync_conversation();
        submission
    }

    pub fn finish_research(&mut self, ticket: RequestTicket, outcome: Result<ResearchResult, RequestFailure>) {
        match outcome {
            Ok(result) => {
                if self.controller.resolve(ticket, result).is_some() {
                    self.sync_conversation();
                    self.navigate(Route::Answer);
                }
            }
            Err(failure) => {
                if let RequestFailure::Rejected { status, .. } = &failure {
                    tracing::debug!(status, ?ticket, "Research service rejected the request");
                }
                self.controller.fail(ticket, failure.to_string());
            }
        }
    }

    /// Leaves the Answer screen for a new form; the current result stays
    /// until the next submission replaces it.
    pub fn start_new_research(&mut self) {
        self.controller.clear_form_error();
        self.navigate(Route::Query);
    }

    /// Drops everything from the current session and returns to the form.
    pub fn start_over(&mut self) {
        tracing::info!("Starting over");
        self.controller.reset();
        self.sync_conversation();
        self.navigator.go(Route::Query);
        self.form = Some(SourceSelection::new());
    }

    pub fn set_chat_input(&mut self, input: String) {
        if let Some(chat) = self.chat.as_mut() {
            chat.set_input(input);
        }
    }

    pub fn send_chat(&mut self) -> Option<OutboundChat> {
        self.chat.as_mut()?.begin_from_input()
    }

    pub fn finish_chat(&mut self, origin: ResultId, outcome: Result<ChatMessage, RequestFailure>) {
        match self.chat.as_mut() {
            Some(chat) if chat.origin() == origin => {
                let phase = chat.complete(outcome);
                tracing::debug!(?phase, "Follow-up finished");
            }
            _ => tracing::debug!(?origin, "Dropping chat reply for a conversation that is gone"),
        }
    }

    fn sync_conversation(&mut self) {
        let current = self.controller.result();
        let derived = self.chat.as_ref().map(ChatPipeline::origin);
        if current.map(|stored| stored.id()) == derived {
            return;
        }

        self.chat = current.map(|stored| {
            tracing::debug!(id = ?stored.id(), "Deriving conversation from new result");
            ChatPipeline::new(ConversationStore::from_result(stored.id(), stored.result()))
        });
    }
}
