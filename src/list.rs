use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info};

use crate::entry::LauncherEntry;
use crate::row::{LauncherRow, RowId, SequenceGenerator};

/// Rows in display order. The "Add" control sits after the last row.
pub struct LauncherList {
    rows: Vec<LauncherRow>,
    ids: SequenceGenerator,
    deletions_tx: Sender<RowId>,
    deletions_rx: Receiver<RowId>,
}

impl Default for LauncherList {
    fn default() -> Self {
        Self::new()
    }
}

impl LauncherList {
    pub fn new() -> Self {
        let (deletions_tx, deletions_rx) = mpsc::channel();
        Self {
            rows: Vec::new(),
            ids: SequenceGenerator::default(),
            deletions_tx,
            deletions_rx,
        }
    }

    pub fn add(&mut self, entry: LauncherEntry) -> RowId {
        let id = self.ids.next_id();
        debug!(row = %id, alias = %entry.alias, "row added");
        self.rows
            .push(LauncherRow::new(id, entry, self.deletions_tx.clone()));
        id
    }

    pub fn remove_by_creation_id(&mut self, id: RowId) -> bool {
        match self.position(id) {
            Some(index) => {
                let row = self.rows.remove(index);
                info!(row = %id, alias = %row.alias(), "row removed");
                true
            }
            None => {
                debug!(row = %id, "remove ignored, no such row");
                false
            }
        }
    }

    /// Applies every deletion announced by rows since the last call.
    pub fn process_deletions(&mut self) -> usize {
        let pending: Vec<RowId> = self.deletions_rx.try_iter().collect();
        pending
            .into_iter()
            .filter(|id| self.remove_by_creation_id(*id))
            .count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LauncherRow> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LauncherRow> {
        self.rows.iter()
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    pub fn row(&self, id: RowId) -> Option<&LauncherRow> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn row_mut(&mut self, id: RowId) -> Option<&mut LauncherRow> {
        self.rows.iter_mut().find(|row| row.id() == id)
    }

    /// Owned copy of the entries, for saving. Rows awaiting removal are left out.
    pub fn entries(&self) -> Vec<LauncherEntry> {
        self.rows
            .iter()
            .filter(|row| !row.is_hidden())
            .map(|row| row.entry().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(alias: &str) -> LauncherEntry {
        LauncherEntry::new(alias, format!("/usr/bin/{alias}"), Vec::<String>::new())
    }

    fn aliases(list: &LauncherList) -> Vec<String> {
        list.iter().map(|row| row.alias().to_string()).collect()
    }

    #[test]
    fn add_appends_in_order() {
        let mut list = LauncherList::new();
        let a = list.add(entry("a"));
        let b = list.add(entry("b"));
        assert!(b > a);
        assert_eq!(aliases(&list), vec!["a", "b"]);
        assert_eq!(list.get(1).map(|r| r.id()), Some(b));
    }

    #[test]
    fn deletion_targets_creation_id_after_earlier_removals() {
        let mut list = LauncherList::new();
        let ids: Vec<RowId> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|alias| list.add(entry(alias)))
            .collect();

        assert!(list.remove_by_creation_id(ids[1]));
        assert!(list.remove_by_creation_id(ids[0]));
        // "d" now sits at position 1; the id still picks it, not "e".
        assert!(list.remove_by_creation_id(ids[3]));
        assert_eq!(aliases(&list), vec!["c", "e"]);
    }

    #[test]
    fn unknown_id_is_a_noop() {
        let mut list = LauncherList::new();
        let a = list.add(entry("a"));
        assert!(list.remove_by_creation_id(a));
        assert!(!list.remove_by_creation_id(a));
        list.add(entry("b"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn rows_announce_their_own_deletion() {
        let mut list = LauncherList::new();
        list.add(entry("a"));
        let b = list.add(entry("b"));
        list.add(entry("c"));

        assert!(list.row_mut(b).unwrap().request_delete());
        assert_eq!(list.process_deletions(), 1);
        assert_eq!(aliases(&list), vec!["a", "c"]);
        assert_eq!(list.process_deletions(), 0);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut list = LauncherList::new();
        let a = list.add(entry("a"));
        list.remove_by_creation_id(a);
        let b = list.add(entry("b"));
        assert_ne!(a, b);
        assert!(list.row(a).is_none());
    }

    #[test]
    fn entries_is_a_snapshot() {
        let mut list = LauncherList::new();
        list.add(entry("a"));
        let snapshot = list.entries();
        list.add(entry("b"));
        assert_eq!(snapshot, vec![entry("a")]);
        assert!(!list.is_empty());
    }
}
