use std::fmt;
use std::sync::mpsc::Sender;

use tracing::{debug, info};

use crate::edit_form::EditForm;
use crate::entry::LauncherEntry;
use crate::error::LaunchError;
use crate::launch::Launch;

/// Creation-order id; stable across deletions of other rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: u64,
}

impl SequenceGenerator {
    pub fn next_id(&mut self) -> RowId {
        let id = RowId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    Ignored,
    Started,
    Failed(LaunchError),
}

pub struct LauncherRow {
    id: RowId,
    entry: LauncherEntry,
    enabled: bool,
    hidden: bool,
    on_delete: Option<Sender<RowId>>,
}

impl LauncherRow {
    pub fn new(id: RowId, entry: LauncherEntry, on_delete: Sender<RowId>) -> Self {
        Self {
            id,
            entry,
            enabled: true,
            hidden: false,
            on_delete: Some(on_delete),
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn alias(&self) -> &str {
        &self.entry.alias
    }

    pub fn entry(&self) -> &LauncherEntry {
        &self.entry
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn needs_setup(&self) -> bool {
        self.entry.needs_setup()
    }

    /// Disables the row for the attempt; only [`Self::pointer_left`] enables it again.
    pub fn launch(&mut self, launcher: &dyn Launch) -> LaunchOutcome {
        if !self.enabled {
            debug!(row = %self.id, "launch ignored, row disabled");
            return LaunchOutcome::Ignored;
        }
        self.enabled = false;
        info!(row = %self.id, alias = %self.entry.alias, path = %self.entry.executable, "launching");
        match launcher.launch(&self.entry.executable, &self.entry.arguments) {
            Ok(()) => LaunchOutcome::Started,
            Err(err) => LaunchOutcome::Failed(err),
        }
    }

    pub fn pointer_left(&mut self) {
        self.enabled = true;
    }

    pub fn edit_form(&self) -> EditForm {
        EditForm::new(
            &self.entry.alias,
            &self.entry.executable,
            &self.entry.arguments,
        )
    }

    pub fn apply_edit(&mut self, entry: LauncherEntry) {
        info!(row = %self.id, alias = %entry.alias, "row updated");
        self.entry = entry;
    }

    /// Hides the row and announces it to the owning list, at most once.
    pub fn request_delete(&mut self) -> bool {
        self.hidden = true;
        match self.on_delete.take() {
            Some(notifier) => notifier.send(self.id).is_ok(),
            None => false,
        }
    }
}
