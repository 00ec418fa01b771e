//! Chat history for the current research result.
//!
//! The summary turn (entry 0 of the backend history) is kept aside and shown
//! in the summary pane; everything after it is the displayed history. Only the
//! tail is ever mutated.

use crate::models::{ChatMessage, ResearchResult};
use crate::research::ResultId;

/// Undo handle for an optimistic append. Not `Clone`: it can be reverted once.
#[derive(Debug, PartialEq, Eq)]
pub struct LocalTurn {
    origin: ResultId,
    position: usize,
}

#[derive(Debug, Clone)]
pub struct ConversationStore {
    origin: ResultId,
    summary_turn: Option<ChatMessage>,
    displayed: Vec<ChatMessage>,
}

impl ConversationStore {
    pub fn from_result(origin: ResultId, result: &ResearchResult) -> Self {
        let mut history = result.chat_history.iter().cloned();
        let summary_turn = history.next();
        Self {
            origin,
            summary_turn,
            displayed: history.collect(),
        }
    }

    pub fn origin(&self) -> ResultId {
        self.origin
    }

    pub fn displayed(&self) -> &[ChatMessage] {
        &self.displayed
    }

    /// The whole conversation as the backend knows it: summary turn first.
    pub fn full_history(&self) -> Vec<ChatMessage> {
        self.summary_turn
            .iter()
            .chain(self.displayed.iter())
            .cloned()
            .collect()
    }

    pub fn append_local(&mut self, message: ChatMessage) -> LocalTurn {
        let position = self.displayed.len();
        self.displayed.push(message);
        LocalTurn {
            origin: self.origin,
            position,
        }
    }

    /// Removes the message `turn` refers to. It must still be the last entry.
    pub fn revert_local(&mut self, turn: LocalTurn) -> Option<ChatMessage> {
        if turn.origin != self.origin || turn.position + 1 != self.displayed.len() {
            tracing::warn!(?turn, len = self.displayed.len(), "Optimistic turn is no longer at the tail");
            return None;
        }
        self.displayed.pop()
    }

    pub fn append_remote(&mut self, message: ChatMessage) {
        self.displayed.push(message);
    }
}

/// Everything the chat pane renders.
#[derive(Debug, Clone)]
pub struct ConversationState {
    store: ConversationStore,
    pending_input: String,
    is_sending: bool,
    last_error: Option<String>,
}

impl ConversationState {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            store,
            pending_input: String::new(),
            is_sending: false,
            last_error: None,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    pub fn displayed_history(&self) -> &[ChatMessage] {
        self.store.displayed()
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn set_pending_input(&mut self, input: impl Into<String>) {
        self.pending_input = input.into();
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    pub fn set_sending(&mut self, sending: bool) {
        self.is_sending = sending;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::ResearchController;

    fn stored(history: Vec<ChatMessage>) -> (ResultId, ResearchResult) {
        let result = ResearchResult {
            summary: "S".to_string(),
            chat_history: history,
        };
        let mut controller = ResearchController::new();
        let ticket = controller.begin_request();
        let id = controller.resolve(ticket, result.clone()).unwrap();
        (id, result)
    }

    #[test]
    fn test_summary_turn_is_not_displayed() {
        let (id, result) = stored(vec![ChatMessage::assistant("S")]);
        let store = ConversationStore::from_result(id, &result);
        assert!(store.displayed().is_empty());
        assert_eq!(store.full_history(), vec![ChatMessage::assistant("S")]);
    }

    #[test]
    fn test_prior_exchanges_are_displayed() {
        let (id, result) = stored(vec![
            ChatMessage::human("context"),
            ChatMessage::assistant("S"),
            ChatMessage::human("q"),
        ]);
        let store = ConversationStore::from_result(id, &result);
        assert_eq!(
            store.displayed(),
            &[ChatMessage::assistant("S"), ChatMessage::human("q")]
        );
        assert_eq!(store.full_history(), result.chat_history);
    }

    #[test]
    fn test_empty_history() {
        let (id, result) = stored(Vec::new());
        let store = ConversationStore::from_result(id, &result);
        assert!(store.displayed().is_empty());
        assert!(store.full_history().is_empty());
    }

    #[test]
    fn test_append_then_revert_restores_history() {
        let (id, result) = stored(vec![
            ChatMessage::assistant("S"),
            ChatMessage::human("same"),
            ChatMessage::assistant("reply"),
        ]);
        let mut store = ConversationStore::from_result(id, &result);
        let before = store.displayed().to_vec();

        // Same text as an existing turn: removal must not match by content.
        let turn = store.append_local(ChatMessage::human("same"));
        assert_eq!(store.displayed().len(), before.len() + 1);

        let removed = store.revert_local(turn);
        assert_eq!(removed, Some(ChatMessage::human("same")));
        assert_eq!(store.displayed(), before.as_slice());
    }

    #[test]
    fn test_revert_refuses_when_not_at_tail() {
        let (id, result) = stored(vec![ChatMessage::assistant("S")]);
        let mut store = ConversationStore::from_result(id, &result);

        let turn = store.append_local(ChatMessage::human("q"));
        store.append_remote(ChatMessage::assistant("a"));

        assert!(store.revert_local(turn).is_none());
        assert_eq!(store.displayed().len(), 2);
    }

    #[test]
    fn test_revert_refuses_foreign_handle() {
        let result = ResearchResult {
            summary: "S".to_string(),
            chat_history: vec![ChatMessage::assistant("S")],
        };
        let mut controller = ResearchController::new();
        let ticket = controller.begin_request();
        let first_id = controller.resolve(ticket, result.clone()).unwrap();
        let ticket = controller.begin_request();
        let second_id = controller.resolve(ticket, result.clone()).unwrap();

        let mut first = ConversationStore::from_result(first_id, &result);
        let turn = first.append_local(ChatMessage::human("q"));

        let mut second = ConversationStore::from_result(second_id, &result);
        second.append_local(ChatMessage::human("q"));

        assert!(second.revert_local(turn).is_none());
        assert_eq!(second.displayed().len(), 1);
    }
}
