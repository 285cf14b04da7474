use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use podwatch_core::{ActionName, BoxType};
use podwatch_matcher::Matcher;

/// A registered handler: when `matcher` accepts an activity observed in
/// one of `box_types`, `action_name` is invoked.
#[derive(Debug, Clone)]
pub struct HandlerEntry {
    pub matcher: Matcher,
    pub action_name: ActionName,
    pub box_types: Vec<BoxType>,
    pub key: String,
}

impl HandlerEntry {
    pub fn new(
        matcher: impl Into<Matcher>,
        action_name: impl Into<ActionName>,
        box_types: &[BoxType],
        key: impl Into<String>,
    ) -> Self {
        let mut box_types = box_types.to_vec();
        box_types.sort_unstable();
        box_types.dedup();
        Self {
            matcher: matcher.into(),
            action_name: action_name.into(),
            box_types,
            key: key.into(),
        }
    }

    pub fn accepts(&self, box_type: BoxType) -> bool {
        self.box_types.contains(&box_type)
    }

    pub fn summary(&self) -> HandlerSummary {
        HandlerSummary {
            key: self.key.clone(),
            action: self.action_name.clone(),
            box_types: self.box_types.clone(),
            kind: self.matcher.kind(),
            depth: self.matcher.depth(),
        }
    }
}

/// Serializable description of a [`HandlerEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerSummary {
    pub key: String,
    pub action: ActionName,
    pub box_types: Vec<BoxType>,
    pub kind: &'static str,
    pub depth: Option<usize>,
}

/// Ordered set of handlers.
///
/// Entries are kept sorted by ascending pattern depth with predicate
/// matchers last; ties keep registration order. Registration replaces the
/// whole list, so readers always see a fully sorted snapshot.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: RwLock<Arc<Vec<HandlerEntry>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler and re-sort. Duplicates are not detected.
    pub fn register(&self, entry: HandlerEntry) {
        let mut guard = self.entries.write();
        let mut next = Vec::clone(&guard);
        next.push(entry);
        // Stable, so equal-specificity entries stay in registration order.
        next.sort_by(|a, b| a.matcher.specificity_cmp(&b.matcher));
        *guard = Arc::new(next);
    }

    /// All entries, in dispatch order.
    pub fn snapshot(&self) -> Arc<Vec<HandlerEntry>> {
        Arc::clone(&self.entries.read())
    }

    /// Entries eligible for activities seen in `box_type`, in dispatch order.
    pub fn entries_for(&self, box_type: BoxType) -> Vec<HandlerEntry> {
        self.snapshot()
            .iter()
            .filter(|entry| entry.accepts(box_type))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use podwatch_matcher::Pattern;

    use super::*;

    fn depth_one() -> Pattern {
        Pattern::of_type("Offer")
    }

    fn depth_two() -> Pattern {
        Pattern::of_type("Offer").nested("object", Pattern::of_type("Add"))
    }

    fn keys(entries: &[HandlerEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn sorted_by_depth_then_predicates() {
        let registry = HandlerRegistry::new();
        registry.register(HandlerEntry::new(
            Matcher::predicate(|_| true),
            "a",
            &[BoxType::Inbox],
            "predicate",
        ));
        registry.register(HandlerEntry::new(depth_two(), "a", &[BoxType::Inbox], "depth-2"));
        registry.register(HandlerEntry::new(depth_one(), "a", &[BoxType::Inbox], "depth-1"));

        let entries = registry.entries_for(BoxType::Inbox);
        assert_eq!(keys(&entries), vec!["depth-1", "depth-2", "predicate"]);
    }

    #[test]
    fn ordering_independent_of_registration_order() {
        let orders: [[usize; 3]; 3] = [[0, 1, 2], [2, 1, 0], [1, 2, 0]];
        for order in orders {
            let registry = HandlerRegistry::new();
            for i in order {
                let entry = match i {
                    0 => HandlerEntry::new(depth_one(), "a", &[BoxType::Inbox], "depth-1"),
                    1 => HandlerEntry::new(depth_two(), "a", &[BoxType::Inbox], "depth-2"),
                    _ => HandlerEntry::new(
                        Matcher::predicate(|_| false),
                        "a",
                        &[BoxType::Inbox],
                        "predicate",
                    ),
                };
                registry.register(entry);
            }
            assert_eq!(
                keys(&registry.entries_for(BoxType::Inbox)),
                vec!["depth-1", "depth-2", "predicate"]
            );
        }
    }

    #[test]
    fn predicates_keep_registration_order() {
        let registry = HandlerRegistry::new();
        for key in ["p1", "p2", "p3"] {
            registry.register(HandlerEntry::new(
                Matcher::predicate(|_| true),
                "a",
                &[BoxType::Outbox],
                key,
            ));
        }
        registry.register(HandlerEntry::new(depth_one(), "a", &[BoxType::Outbox], "s"));
        assert_eq!(
            keys(&registry.entries_for(BoxType::Outbox)),
            vec!["s", "p1", "p2", "p3"]
        );
    }

    #[test]
    fn entries_filtered_by_box_type() {
        let registry = HandlerRegistry::new();
        registry.register(HandlerEntry::new(depth_one(), "a", &[BoxType::Inbox], "in"));
        registry.register(HandlerEntry::new(depth_one(), "a", &[BoxType::Outbox], "out"));
        registry.register(HandlerEntry::new(
            depth_two(),
            "a",
            &[BoxType::Outbox, BoxType::Inbox, BoxType::Inbox],
            "both",
        ));

        assert_eq!(keys(&registry.entries_for(BoxType::Inbox)), vec!["in", "both"]);
        assert_eq!(keys(&registry.entries_for(BoxType::Outbox)), vec!["out", "both"]);
        assert_eq!(registry.snapshot()[2].box_types, vec![BoxType::Inbox, BoxType::Outbox]);
    }

    #[test]
    fn snapshot_unaffected_by_later_registration() {
        let registry = HandlerRegistry::new();
        registry.register(HandlerEntry::new(depth_two(), "a", &[BoxType::Inbox], "late"));
        let before = registry.snapshot();
        registry.register(HandlerEntry::new(depth_one(), "a", &[BoxType::Inbox], "early"));

        assert_eq!(keys(&before), vec!["late"]);
        assert_eq!(keys(&registry.snapshot()), vec!["early", "late"]);
    }

    #[test]
    fn summary_describes_matcher() {
        let entry = HandlerEntry::new(depth_two(), "contacts.handle", &[BoxType::Inbox], "k");
        let summary = entry.summary();
        assert_eq!(summary.kind, "structural");
        assert_eq!(summary.depth, Some(2));
        assert_eq!(summary.action.as_str(), "contacts.handle");
    }
}
