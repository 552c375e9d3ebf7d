use std::collections::HashMap;

use crate::taxonomy::Category;
use crate::types::{Categorized, RecordKey};

/// Expanded items and active category filter for one page instance.
///
/// Items expand independently; opening one never closes another. Nothing
/// here is persisted, and `reset` is called on navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccordionState {
    open: HashMap<RecordKey, bool>,
    filter: Option<String>,
}

impl AccordionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one item. Items never seen before are closed, so they open.
    pub fn toggle(&mut self, key: &RecordKey) {
        let flag = self.open.entry(key.clone()).or_insert(false);
        *flag = !*flag;
    }

    pub fn is_open(&self, key: &RecordKey) -> bool {
        self.open.get(key).copied().unwrap_or(false)
    }

    /// Keys currently expanded, sorted for stable output
    pub fn open_keys(&self) -> Vec<&RecordKey> {
        let mut keys: Vec<&RecordKey> = self
            .open
            .iter()
            .filter(|(_, open)| **open)
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }

    /// Restrict visible records to one category, or clear with `None`
    pub fn set_filter(&mut self, category: Option<&Category>) {
        self.filter = category.map(|c| c.label.clone());
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Records that pass the active filter, in input order
    pub fn visible<'r, R: Categorized>(&self, records: &'r [R]) -> Vec<&'r R> {
        match &self.filter {
            Some(label) => records.iter().filter(|r| r.category() == label.as_str()).collect(),
            None => records.iter().collect(),
        }
    }

    pub fn reset(&mut self) {
        self.open.clear();
        self.filter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;
    use crate::types::{ContentKind, FaqItem};

    fn key(category: &str, index: usize) -> RecordKey {
        RecordKey::position(ContentKind::Faq, category, index)
    }

    fn faq(category: &str, question: &str) -> FaqItem {
        FaqItem {
            category: category.to_string(),
            question: question.to_string(),
            answer: "answer".to_string(),
        }
    }

    #[test]
    fn test_absent_key_is_closed() {
        let state = AccordionState::new();
        assert!(!state.is_open(&key("General", 0)));
    }

    #[test]
    fn test_toggle_opens_unknown_key() {
        let mut state = AccordionState::new();
        state.toggle(&key("General", 0));
        assert!(state.is_open(&key("General", 0)));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut state = AccordionState::new();
        let k = key("Security", 2);

        state.toggle(&k);
        state.toggle(&k);
        assert!(!state.is_open(&k));

        state.toggle(&k);
        let before = state.is_open(&k);
        state.toggle(&k);
        state.toggle(&k);
        assert_eq!(state.is_open(&k), before);
    }

    #[test]
    fn test_toggle_does_not_affect_other_keys() {
        let mut state = AccordionState::new();
        state.toggle(&key("General", 0));
        state.toggle(&key("General", 1));
        assert!(state.is_open(&key("General", 0)));
        assert!(state.is_open(&key("General", 1)));

        state.toggle(&key("General", 0));
        assert!(!state.is_open(&key("General", 0)));
        assert!(state.is_open(&key("General", 1)));
    }

    #[test]
    fn test_open_keys_sorted() {
        let mut state = AccordionState::new();
        state.toggle(&key("Security", 0));
        state.toggle(&key("General", 1));
        state.toggle(&key("General", 0));
        state.toggle(&key("Security", 0));

        assert_eq!(state.open_keys(), vec![&key("General", 0), &key("General", 1)]);
    }

    #[test]
    fn test_filter_visible_records() {
        let taxonomy = Taxonomy::standard();
        let items = vec![faq("General", "a"), faq("Security", "b"), faq("General", "c")];
        let mut state = AccordionState::new();

        assert_eq!(state.visible(&items).len(), 3);

        state.set_filter(Some(taxonomy.resolve("General").unwrap()));
        assert_eq!(state.active_filter(), Some("General"));
        let visible: Vec<&str> = state.visible(&items).iter().map(|f| f.question.as_str()).collect();
        assert_eq!(visible, vec!["a", "c"]);

        state.set_filter(None);
        assert_eq!(state.visible(&items).len(), 3);
    }

    #[test]
    fn test_reset_clears_everything() {
        let taxonomy = Taxonomy::standard();
        let mut state = AccordionState::new();
        state.toggle(&key("General", 0));
        state.set_filter(Some(taxonomy.resolve("Pricing").unwrap()));

        state.reset();
        assert!(!state.is_open(&key("General", 0)));
        assert_eq!(state.active_filter(), None);
        assert_eq!(state, AccordionState::new());
    }
}
