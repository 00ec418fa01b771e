use crate::api::RequestFailure;
use crate::conversation::{ConversationState, ConversationStore, LocalTurn};
use crate::models::ChatMessage;
use crate::research::ResultId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPhase {
    #[default]
    Idle,
    Sending,
    Appended,
    RolledBack,
}

/// History to post to the backend for one follow-up turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundChat {
    pub origin: ResultId,
    pub history: Vec<ChatMessage>,
}

/// Serializes follow-up turns for one conversation: optimistic append on
/// `begin`, confirm or roll back on `complete`.
#[derive(Debug)]
pub struct ChatPipeline {
    state: ConversationState,
    phase: ChatPhase,
    in_flight: Option<LocalTurn>,
}

impl ChatPipeline {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            state: ConversationState::new(store),
            phase: ChatPhase::Idle,
            in_flight: None,
        }
    }

    pub fn origin(&self) -> ResultId {
        self.state.store().origin()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.state.set_pending_input(input);
    }

    /// Appends the human turn and returns what to send, or `None` if the text
    /// is blank or a turn is already in flight.
    pub fn begin(&mut self, text: &str) -> Option<OutboundChat> {
        if text.trim().is_empty() || self.phase == ChatPhase::Sending {
            return None;
        }

        self.state.set_error(None);
        let turn = self.state.store_mut().append_local(ChatMessage::human(text));
        let history = self.state.store().full_history();
        self.in_flight = Some(turn);
        self.state.set_pending_input(String::new());
        self.state.set_sending(true);
        self.phase = ChatPhase::Sending;

        tracing::debug!(turns = history.len(), "Sending follow-up question");
        Some(OutboundChat {
            origin: self.origin(),
            history,
        })
    }

    /// Sends whatever is in the input box.
    pub fn begin_from_input(&mut self) -> Option<OutboundChat> {
        let text = self.state.pending_input().to_string();
        self.begin(&text)
    }

    /// Applies the backend's answer. `is_sending` is cleared only after the
    /// history has been updated.
    pub fn complete(&mut self, outcome: Result<ChatMessage, RequestFailure>) -> ChatPhase {
        let Some(turn) = self.in_flight.take() else {
            tracing::debug!("Chat completion arrived with nothing in flight");
            return self.phase;
        };

        self.phase = match outcome {
            Ok(reply) => {
                self.state.store_mut().append_remote(reply);
                ChatPhase::Appended
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "Follow-up failed, rolling back");
                self.state.store_mut().revert_local(turn);
                self.state.set_error(Some(failure.to_string()));
                ChatPhase::RolledBack
            }
        };

        self.state.set_sending(false);
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResearchResult;
    use crate::research::ResearchController;

    fn pipeline(history: Vec<ChatMessage>) -> ChatPipeline {
        let result = ResearchResult {
            summary: "S".to_string(),
            chat_history: history,
        };
        let mut controller = ResearchController::new();
        let ticket = controller.begin_request();
        let id = controller.resolve(ticket, result.clone()).unwrap();
        ChatPipeline::new(ConversationStore::from_result(id, &result))
    }

    fn rejected() -> RequestFailure {
        RequestFailure::Rejected {
            status: 500,
            message: "Failed to get a response from the assistant.".to_string(),
        }
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let mut chat = pipeline(vec![ChatMessage::assistant("S")]);
        assert!(chat.begin("   ").is_none());
        assert_eq!(chat.phase(), ChatPhase::Idle);
        assert!(chat.state().displayed_history().is_empty());
    }

    #[test]
    fn test_outbound_includes_summary_turn_and_new_message() {
        let mut chat = pipeline(vec![
            ChatMessage::human("context"),
            ChatMessage::assistant("S"),
        ]);
        chat.set_input("Tell me more");

        let outbound = chat.begin_from_input().unwrap();
        assert_eq!(
            outbound.history,
            vec![
                ChatMessage::human("context"),
                ChatMessage::assistant("S"),
                ChatMessage::human("Tell me more"),
            ]
        );
        assert_eq!(outbound.origin, chat.origin());
        assert_eq!(chat.state().pending_input(), "");
        assert!(chat.state().is_sending());
        assert_eq!(chat.phase(), ChatPhase::Sending);
        assert_eq!(
            chat.state().displayed_history(),
            &[ChatMessage::assistant("S"), ChatMessage::human("Tell me more")]
        );
    }

    #[test]
    fn test_second_send_while_sending_is_dropped() {
        let mut chat = pipeline(vec![ChatMessage::assistant("S")]);
        let first = chat.begin("one");
        let second = chat.begin("two");

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(chat.state().displayed_history(), &[ChatMessage::human("one")]);
    }

    #[test]
    fn test_success_appends_reply() {
        let mut chat = pipeline(vec![ChatMessage::assistant("S")]);
        let before = chat.state().displayed_history().len();

        chat.begin("Tell me more").unwrap();
        let phase = chat.complete(Ok(ChatMessage::assistant("More details...")));

        assert_eq!(phase, ChatPhase::Appended);
        let history = chat.state().displayed_history();
        assert_eq!(history.len(), before + 2);
        assert_eq!(
            &history[before..],
            &[
                ChatMessage::human("Tell me more"),
                ChatMessage::assistant("More details..."),
            ]
        );
        assert!(!chat.state().is_sending());
        assert!(chat.state().last_error().is_none());
    }

    #[test]
    fn test_failure_rolls_back() {
        let mut chat = pipeline(vec![
            ChatMessage::assistant("S"),
            ChatMessage::human("earlier"),
            ChatMessage::assistant("answer"),
        ]);
        let before = chat.state().displayed_history().to_vec();

        chat.begin("Tell me more").unwrap();
        let phase = chat.complete(Err(rejected()));

        assert_eq!(phase, ChatPhase::RolledBack);
        assert_eq!(chat.state().displayed_history(), before.as_slice());
        assert_eq!(
            chat.state().last_error(),
            Some("Failed to get a response from the assistant.")
        );
        assert!(!chat.state().is_sending());
    }

    #[test]
    fn test_later_turns_carry_confirmed_history() {
        let mut chat = pipeline(vec![ChatMessage::assistant("S")]);
        chat.begin("first").unwrap();
        chat.complete(Ok(ChatMessage::assistant("reply one")));

        let outbound = chat.begin("second").unwrap();
        assert_eq!(
            outbound.history,
            vec![
                ChatMessage::assistant("S"),
                ChatMessage::human("first"),
                ChatMessage::assistant("reply one"),
                ChatMessage::human("second"),
            ]
        );
    }

    #[test]
    fn test_new_send_clears_previous_error() {
        let mut chat = pipeline(vec![ChatMessage::assistant("S")]);
        chat.begin("q").unwrap();
        chat.complete(Err(rejected()));
        assert!(chat.state().last_error().is_some());

        chat.begin("q").unwrap();
        assert!(chat.state().last_error().is_none());
    }

    #[test]
    fn test_completion_without_request_is_ignored() {
        let mut chat = pipeline(vec![ChatMessage::assistant("S")]);
        let phase = chat.complete(Ok(ChatMessage::assistant("stray")));
        assert_eq!(phase, ChatPhase::Idle);
        assert!(chat.state().displayed_history().is_empty());
    }
}
