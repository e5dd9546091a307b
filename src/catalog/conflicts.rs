use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::UpgradeCatalog;

/// An ordered set of selected catalog keys, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    keys: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from raw keys, dropping repeats (first occurrence wins).
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::<String>::into).unique().collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> + Clone {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn insert(&mut self, key: &str) {
        if !self.contains(key) {
            self.keys.push(key.to_string());
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        let initial_len = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != initial_len
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Emitted when adding a key pushed other keys out of its conflict groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementEvent {
    pub added: String,
    pub removed: Vec<String>,
}

/// A requested change to a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "key")]
pub enum SelectionChange {
    Add(String),
    Remove(String),
}

/// The selection after a change, plus the replacement event if one occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub selection: Selection,
    pub event: Option<ReplacementEvent>,
}

/// Resolves selection changes against the catalog's mutual-exclusion groups.
///
/// The resolver holds no selection of its own: every operation takes the
/// prior selection and returns the next one. After any transition no two
/// distinct modules reachable from the selection share a conflict group.
pub struct ConflictResolver<'a> {
    catalog: &'a UpgradeCatalog,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(catalog: &'a UpgradeCatalog) -> Self {
        Self { catalog }
    }

    /// Add a key, toggling it off if it is already selected.
    pub fn add(&self, selection: &Selection, key: &str) -> Transition {
        let mut next = selection.clone();

        if next.contains(key) {
            next.remove(key);
            return Transition {
                selection: next,
                event: None,
            };
        }

        // a package holds the groups of its modules as well as its own
        let removed: Vec<String> = selection
            .iter()
            .filter(|k| self.catalog.clashes(key, k))
            .cloned()
            .collect();
        for k in &removed {
            next.remove(k);
        }
        next.insert(key);

        let event = if removed.is_empty() {
            None
        } else {
            debug!("{} replaced {:?} in conflict group", key, removed);
            Some(ReplacementEvent {
                added: key.to_string(),
                removed,
            })
        };

        Transition {
            selection: next,
            event,
        }
    }

    /// Remove a key if present. Nothing else is affected.
    pub fn remove(&self, selection: &Selection, key: &str) -> Selection {
        let mut next = selection.clone();
        next.remove(key);
        next
    }

    pub fn apply(&self, selection: &Selection, change: &SelectionChange) -> Transition {
        match change {
            SelectionChange::Add(key) => self.add(selection, key),
            SelectionChange::Remove(key) => Transition {
                selection: self.remove(selection, key),
                event: None,
            },
        }
    }

    /// Turn an externally supplied key set (e.g. restored from storage) into a
    /// conflict-free selection.
    ///
    /// Keys are de-duplicated and added one by one in catalog order starting
    /// from an empty selection, so within a conflict group the key that comes
    /// last in catalog order wins. Keys the catalog does not know are skipped.
    pub fn normalize<'k, I>(&self, keys: I) -> (Selection, Vec<ReplacementEvent>)
    where
        I: IntoIterator<Item = &'k String>,
    {
        let ordered: Vec<(usize, &String)> = keys
            .into_iter()
            .unique()
            .filter_map(|key| match self.catalog.position(key) {
                Some(pos) => Some((pos, key)),
                None => {
                    warn!("Skipping unknown catalog key {} during normalization", key);
                    None
                }
            })
            .sorted_by_key(|(pos, _)| *pos)
            .collect();

        let mut selection = Selection::new();
        let mut events = Vec::new();
        for (_, key) in ordered {
            let transition = self.add(&selection, key);
            selection = transition.selection;
            events.extend(transition.event);
        }
        (selection, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn keys(selection: &Selection) -> Vec<&str> {
        selection.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_add_inserts_key() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let transition = resolver.add(&Selection::new(), "oil-cooler");
        assert_eq!(keys(&transition.selection), vec!["oil-cooler"]);
        assert!(transition.event.is_none());
    }

    #[test]
    fn test_add_selected_key_toggles_off() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let selection = Selection::from_keys(["oil-cooler", "short-shifter"]);
        let transition = resolver.add(&selection, "oil-cooler");
        assert_eq!(keys(&transition.selection), vec!["short-shifter"]);
        assert!(transition.event.is_none());
    }

    #[test]
    fn test_second_pulley_replaces_first() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);

        let first = resolver.add(&Selection::new(), "supercharger-pulley-small");
        assert!(first.event.is_none());

        let second = resolver.add(&first.selection, "supercharger-pulley-race");
        assert_eq!(keys(&second.selection), vec!["supercharger-pulley-race"]);
        assert_eq!(
            second.event,
            Some(ReplacementEvent {
                added: "supercharger-pulley-race".to_string(),
                removed: vec!["supercharger-pulley-small".to_string()],
            })
        );
    }

    #[test]
    fn test_items_without_group_never_conflict() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let selection = Selection::from_keys(["oil-cooler", "track-radiator"]);
        let transition = resolver.add(&selection, "stainless-brake-lines");
        assert_eq!(transition.selection.len(), 3);
        assert!(transition.event.is_none());
    }

    #[test]
    fn test_remove_does_not_cascade() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let selection = Selection::from_keys(["street-pack", "cold-air-intake"]);
        let next = resolver.remove(&selection, "street-pack");
        assert_eq!(keys(&next), vec!["cold-air-intake"]);
        assert_eq!(resolver.remove(&next, "ghost"), next);
    }

    #[test]
    fn test_apply_dispatches_changes() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let added = resolver.apply(
            &Selection::new(),
            &SelectionChange::Add("coilovers".to_string()),
        );
        assert!(added.selection.contains("coilovers"));
        let removed = resolver.apply(
            &added.selection,
            &SelectionChange::Remove("coilovers".to_string()),
        );
        assert!(removed.selection.is_empty());
    }

    #[test]
    fn test_normalize_last_in_catalog_order_wins() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        // supplied out of catalog order; race pulley comes later in the catalog
        let restored = vec![
            "supercharger-pulley-race".to_string(),
            "oil-cooler".to_string(),
            "supercharger-pulley-small".to_string(),
            "oil-cooler".to_string(),
        ];
        let (selection, events) = resolver.normalize(&restored);
        assert_eq!(
            keys(&selection),
            vec!["supercharger-pulley-race", "oil-cooler"]
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].removed, vec!["supercharger-pulley-small"]);
    }

    #[test]
    fn test_normalize_skips_unknown_keys() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let restored = vec!["ghost".to_string(), "coilovers".to_string()];
        let (selection, events) = resolver.normalize(&restored);
        assert_eq!(keys(&selection), vec!["coilovers"]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_package_displaces_standalone_modules_from_its_groups() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let selection = Selection::from_keys(["performance-pads", "r-compound-tires", "oil-cooler"]);

        let transition = resolver.add(&selection, "track-pack");
        assert_eq!(keys(&transition.selection), vec!["oil-cooler", "track-pack"]);
        assert_eq!(
            transition.event,
            Some(ReplacementEvent {
                added: "track-pack".to_string(),
                removed: vec![
                    "performance-pads".to_string(),
                    "r-compound-tires".to_string()
                ],
            })
        );
        assert_conflict_free(&catalog, &transition.selection);

        // and the other way round
        let back = resolver.add(&transition.selection, "r-compound-tires");
        assert_eq!(keys(&back.selection), vec!["oil-cooler", "r-compound-tires"]);
    }

    #[test]
    fn test_module_already_in_package_does_not_clash() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let selection = Selection::from_keys(["track-pack"]);

        let transition = resolver.add(&selection, "coilovers");
        assert_eq!(keys(&transition.selection), vec!["track-pack", "coilovers"]);
        assert!(transition.event.is_none());
    }

    #[test]
    fn test_normalize_lets_later_package_win() {
        let catalog = UpgradeCatalog::builtin();
        let resolver = ConflictResolver::new(&catalog);
        let restored = vec![
            "track-pack".to_string(),
            "performance-pads".to_string(),
            "r-compound-tires".to_string(),
        ];
        let (selection, events) = resolver.normalize(&restored);
        assert_eq!(keys(&selection), vec!["track-pack"]);
        assert_eq!(events.len(), 1);
        assert_conflict_free(&catalog, &selection);
    }

    fn assert_conflict_free(catalog: &UpgradeCatalog, selection: &Selection) {
        let mut groups = HashSet::new();
        for module in catalog.expand_selection(selection) {
            if let Some(group) = &module.conflict_group {
                assert!(
                    groups.insert(group.clone()),
                    "two modules share conflict group {group}"
                );
            }
        }
        for (a, b) in selection.iter().tuple_combinations() {
            assert!(!catalog.clashes(a, b), "{a} and {b} are both selected");
        }
    }

    fn arb_change(keys: Vec<String>) -> impl Strategy<Value = SelectionChange> {
        (prop::sample::select(keys), any::<bool>()).prop_map(|(key, add)| {
            if add {
                SelectionChange::Add(key)
            } else {
                SelectionChange::Remove(key)
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_every_transition_is_conflict_free(
            changes in prop::collection::vec(
                arb_change(UpgradeCatalog::builtin().items().iter().map(|i| i.key.clone()).collect()),
                1..40,
            )
        ) {
            let catalog = UpgradeCatalog::builtin();
            let resolver = ConflictResolver::new(&catalog);
            let mut selection = Selection::new();
            for change in &changes {
                selection = resolver.apply(&selection, change).selection;
                assert_conflict_free(&catalog, &selection);
            }
        }

        #[test]
        fn prop_normalize_is_conflict_free(
            keys in prop::collection::vec(
                prop::sample::select(
                    UpgradeCatalog::builtin().items().iter().map(|i| i.key.clone()).collect::<Vec<_>>()
                ),
                0..20,
            )
        ) {
            let catalog = UpgradeCatalog::builtin();
            let resolver = ConflictResolver::new(&catalog);
            let (selection, _) = resolver.normalize(&keys);
            assert_conflict_free(&catalog, &selection);
        }
    }
}
