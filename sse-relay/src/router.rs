//! Type allow-list applied to incoming events.

use std::sync::Arc;

use crate::state::RuntimeState;

/// Decides which events are forwarded and counts the ones that are.
#[derive(Debug)]
pub struct EventRouter {
    collect_types: Option<Vec<String>>,
    state: Arc<RuntimeState>,
    count_messages: bool,
}

impl EventRouter {
    /// `count_messages` enables the per-report counter; it is off when
    /// throughput reporting is disabled.
    pub fn new(
        collect_types: Option<Vec<String>>,
        state: Arc<RuntimeState>,
        count_messages: bool,
    ) -> Self {
        Self {
            collect_types,
            state,
            count_messages,
        }
    }

    /// Whether `event_type` passes the allow-list.
    ///
    /// An absent or empty list accepts every type. Matching is exact and
    /// case-sensitive.
    pub fn accept(&self, event_type: &str) -> bool {
        match &self.collect_types {
            None => true,
            Some(types) if types.is_empty() => true,
            Some(types) => types.iter().any(|t| t == event_type),
        }
    }

    /// Apply the allow-list and, for accepted events, bump the counters.
    pub fn route(&self, event_type: &str) -> bool {
        if !self.accept(event_type) {
            tracing::trace!("Skipping event of type '{}'", event_type);
            return false;
        }

        if self.count_messages {
            self.state.count_message();
        }
        self.state.record_accepted();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn router(types: Option<&[&str]>) -> EventRouter {
        EventRouter::new(
            types.map(|t| t.iter().map(|s| s.to_string()).collect()),
            Arc::new(RuntimeState::new()),
            true,
        )
    }

    #[rstest]
    #[case(Some(&["edit", "new"][..]), "edit", true)]
    #[case(Some(&["edit", "new"][..]), "new", true)]
    #[case(Some(&["edit", "new"][..]), "log", false)]
    #[case(Some(&["edit"][..]), "Edit", false)]
    #[case(Some(&["edit"][..]), "edit ", false)]
    #[case(Some(&[][..]), "anything", true)]
    #[case(None, "anything", true)]
    fn test_accept(
        #[case] types: Option<&[&str]>,
        #[case] event_type: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(router(types).accept(event_type), expected);
    }

    #[test]
    fn test_route_counts_only_accepted() {
        let state = Arc::new(RuntimeState::new());
        let router = EventRouter::new(
            Some(vec!["edit".to_string(), "new".to_string()]),
            Arc::clone(&state),
            true,
        );

        let routed: Vec<bool> = ["edit", "log", "edit"].iter().map(|t| router.route(t)).collect();

        assert_eq!(routed, vec![true, false, true]);
        assert_eq!(state.messages_received(), 2);
        assert_eq!(state.stats().events_accepted, 2);
    }

    #[test]
    fn test_route_without_reporting_skips_counter() {
        let state = Arc::new(RuntimeState::new());
        let router = EventRouter::new(None, Arc::clone(&state), false);

        assert!(router.route("edit"));
        assert_eq!(state.messages_received(), 0);
        assert_eq!(state.stats().events_accepted, 1);
    }

    proptest! {
        #[test]
        fn prop_absent_list_accepts_every_type(event_type in ".*") {
            prop_assert!(router(None).accept(&event_type));
        }

        #[test]
        fn prop_rejected_types_never_count(
            allowed in proptest::collection::vec("[a-z]{1,6}", 1..5),
            event_type in "[A-Z]{1,6}",
        ) {
            let state = Arc::new(RuntimeState::new());
            let router = EventRouter::new(Some(allowed), Arc::clone(&state), true);
            prop_assert!(!router.route(&event_type));
            prop_assert_eq!(state.messages_received(), 0);
        }
    }
}
