use std::sync::Arc;

use crate::form::ValidationError;
use crate::models::ResearchResult;

/// Identity of a stored result. Derived state compares these, never contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultId(u64);

/// Identity of one submission, so late completions can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

#[derive(Debug, Clone)]
pub struct StoredResult {
    id: ResultId,
    result: Arc<ResearchResult>,
}

impl StoredResult {
    pub fn id(&self) -> ResultId {
        self.id
    }

    pub fn result(&self) -> &ResearchResult {
        &self.result
    }
}

#[derive(Debug, Clone, Default)]
pub enum ResearchState {
    #[default]
    Idle,
    Pending(RequestTicket),
    Succeeded(StoredResult),
    Failed(String),
}

/// Owns the lifecycle of research submissions and the one live result.
#[derive(Debug, Default)]
pub struct ResearchController {
    state: ResearchState,
    form_error: Option<ValidationError>,
    next_ticket: u64,
    next_result: u64,
}

impl ResearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ResearchState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ResearchState::Pending(_))
    }

    pub fn result(&self) -> Option<&StoredResult> {
        match &self.state {
            ResearchState::Succeeded(stored) => Some(stored),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ResearchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// The last rejected form, kept apart from `state` so a live result survives it.
    pub fn form_error(&self) -> Option<ValidationError> {
        self.form_error
    }

    /// Enters `Pending`, dropping any previous result or error.
    pub fn begin_request(&mut self) -> RequestTicket {
        self.form_error = None;
        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        self.state = ResearchState::Pending(ticket);
        ticket
    }

    /// Stores the result if `ticket` is still the pending request.
    pub fn resolve(&mut self, ticket: RequestTicket, result: ResearchResult) -> Option<ResultId> {
        if !self.is_current(ticket) {
            tracing::debug!(?ticket, "Ignoring result for a superseded research request");
            return None;
        }

        self.next_result += 1;
        let id = ResultId(self.next_result);
        tracing::info!(?id, turns = result.chat_history.len(), "Research request succeeded");
        self.state = ResearchState::Succeeded(StoredResult {
            id,
            result: Arc::new(result),
        });
        Some(id)
    }

    /// Records a failure if `ticket` is still the pending request.
    pub fn fail(&mut self, ticket: RequestTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(?ticket, "Ignoring failure for a superseded research request");
            return false;
        }

        let message = message.into();
        tracing::warn!(error = %message, "Research request failed");
        self.state = ResearchState::Failed(message);
        true
    }

    /// Surfaces a form error; no request was started.
    pub fn report_invalid(&mut self, error: ValidationError) {
        if self.is_pending() {
            return;
        }
        self.form_error = Some(error);
    }

    pub fn clear_form_error(&mut self) {
        self.form_error = None;
    }

    pub fn reset(&mut self) {
        self.state = ResearchState::Idle;
        self.form_error = None;
    }

    fn is_current(&self, ticket: RequestTicket) -> bool {
        matches!(self.state, ResearchState::Pending(current) if current == ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;

    fn result(summary: &str) -> ResearchResult {
        ResearchResult {
            summary: summary.to_string(),
            chat_history: vec![ChatMessage::assistant(summary)],
        }
    }

    #[test]
    fn test_starts_idle() {
        let controller = ResearchController::new();
        assert!(matches!(controller.state(), ResearchState::Idle));
        assert!(!controller.is_pending());
        assert!(controller.result().is_none());
    }

    #[test]
    fn test_resolve_stores_result() {
        let mut controller = ResearchController::new();
        let ticket = controller.begin_request();
        assert!(controller.is_pending());

        let id = controller.resolve(ticket, result("S")).unwrap();
        let stored = controller.result().unwrap();
        assert_eq!(stored.id(), id);
        assert_eq!(stored.result().summary, "S");
        assert!(!controller.is_pending());
    }

    #[test]
    fn test_fail_keeps_message() {
        let mut controller = ResearchController::new();
        let ticket = controller.begin_request();
        assert!(controller.fail(ticket, "HTTP error! Status: 500"));
        assert_eq!(controller.error(), Some("HTTP error! Status: 500"));
    }

    #[test]
    fn test_new_request_clears_error_and_result() {
        let mut controller = ResearchController::new();
        let first = controller.begin_request();
        controller.fail(first, "boom");

        let second = controller.begin_request();
        assert!(controller.error().is_none());
        controller.resolve(second, result("S"));

        controller.begin_request();
        assert!(controller.result().is_none());
        assert!(controller.is_pending());
    }

    #[test]
    fn test_each_result_gets_new_identity() {
        let mut controller = ResearchController::new();
        let ticket = controller.begin_request();
        let first = controller.resolve(ticket, result("S")).unwrap();
        let ticket = controller.begin_request();
        let second = controller.resolve(ticket, result("S")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut controller = ResearchController::new();
        let stale = controller.begin_request();
        controller.reset();

        assert!(controller.resolve(stale, result("late")).is_none());
        assert!(!controller.fail(stale, "late"));
        assert!(matches!(controller.state(), ResearchState::Idle));

        let stale = controller.begin_request();
        let current = controller.begin_request();
        assert!(controller.resolve(stale, result("old")).is_none());
        assert!(controller.resolve(current, result("new")).is_some());
    }

    #[test]
    fn test_report_invalid_ignored_while_pending() {
        let mut controller = ResearchController::new();
        controller.begin_request();
        controller.report_invalid(ValidationError::EmptyPrompt);
        assert!(controller.is_pending());
        assert!(controller.form_error().is_none());
    }

    #[test]
    fn test_report_invalid_keeps_result() {
        let mut controller = ResearchController::new();
        let ticket = controller.begin_request();
        let id = controller.resolve(ticket, result("S")).unwrap();

        controller.report_invalid(ValidationError::EmptyPrompt);
        assert_eq!(controller.form_error(), Some(ValidationError::EmptyPrompt));
        assert_eq!(controller.result().unwrap().id(), id);
        assert!(controller.error().is_none());

        controller.begin_request();
        assert!(controller.form_error().is_none());
    }
}
