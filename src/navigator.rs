use crate::research::{ResearchController, ResearchState, StoredResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Query,
    Answer,
}

/// What the Answer screen can show for the current controller state.
#[derive(Debug, Clone, Copy)]
pub enum AnswerView<'a> {
    Generating,
    NoResult,
    Ready(&'a StoredResult),
}

#[derive(Debug, Default)]
pub struct Navigator {
    route: Route,
}

impl Navigator {
    pub fn route(&self) -> Route {
        self.route
    }

    /// Returns true when the route actually changed.
    pub fn go(&mut self, route: Route) -> bool {
        if self.route == route {
            return false;
        }
        tracing::debug!(from = ?self.route, to = ?route, "Navigating");
        self.route = route;
        true
    }

    pub fn answer_view(controller: &ResearchController) -> AnswerView<'_> {
        match controller.state() {
            ResearchState::Pending(_) => AnswerView::Generating,
            ResearchState::Succeeded(stored) if stored.result().summary.trim().is_empty() => AnswerView::NoResult,
            ResearchState::Succeeded(stored) => AnswerView::Ready(stored),
            ResearchState::Idle | ResearchState::Failed(_) => AnswerView::NoResult,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResearchResult;

    #[test]
    fn test_go_reports_changes() {
        let mut navigator = Navigator::default();
        assert_eq!(navigator.route(), Route::Home);
        assert!(navigator.go(Route::Query));
        assert!(!navigator.go(Route::Query));
        assert_eq!(navigator.route(), Route::Query);
    }

    #[test]
    fn test_answer_view_follows_controller() {
        let mut controller = ResearchController::new();
        assert!(matches!(Navigator::answer_view(&controller), AnswerView::NoResult));

        let ticket = controller.begin_request();
        assert!(matches!(Navigator::answer_view(&controller), AnswerView::Generating));

        controller.resolve(
            ticket,
            ResearchResult {
                summary: "S".to_string(),
                chat_history: Vec::new(),
            },
        );
        match Navigator::answer_view(&controller) {
            AnswerView::Ready(stored) => assert_eq!(stored.result().summary, "S"),
            other => panic!("expected ready view, got {:?}", other),
        }

        let ticket = controller.begin_request();
        controller.fail(ticket, "boom");
        assert!(matches!(Navigator::answer_view(&controller), AnswerView::NoResult));

        for summary in ["", "  \n"] {
            let ticket = controller.begin_request();
            controller.resolve(
                ticket,
                ResearchResult {
                    summary: summary.to_string(),
                    chat_history: Vec::new(),
                },
            );
            assert!(matches!(Navigator::answer_view(&controller), AnswerView::NoResult));
        }
    }
}
