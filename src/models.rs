use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    File,
    Folder,
}

/// One file or folder shown in the selection tree.
#[derive(Debug, Clone, Serialize)]
pub struct SelectableItem {
    pub path: PathBuf,
    pub name: String,
    pub kind: ItemKind,
    pub checked: bool,
}

impl SelectableItem {
    pub fn new(path: PathBuf, kind: ItemKind) -> Self {
        let name = crate::util::display_name(&path);
        Self { path, name, kind, checked: false }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}

/// Tri-state used when rendering folders whose descendants disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameStatus {
    Renamed,
    /// Dry run: the file would have been renamed.
    Planned,
    /// The file already carries its title name.
    Unchanged,
    SkippedNoTitle,
    FailedCollision,
    FailedTagRead,
    FailedIo,
}

impl RenameStatus {
    pub fn is_failure(self) -> bool {
        matches!(self, RenameStatus::FailedCollision | RenameStatus::FailedTagRead | RenameStatus::FailedIo)
    }

    pub fn label(self) -> &'static str {
        match self {
            RenameStatus::Renamed => "renamed",
            RenameStatus::Planned => "planned",
            RenameStatus::Unchanged => "unchanged",
            RenameStatus::SkippedNoTitle => "skipped-no-title",
            RenameStatus::FailedCollision => "failed-collision",
            RenameStatus::FailedTagRead => "failed-tag-read",
            RenameStatus::FailedIo => "failed-io",
        }
    }
}

impl fmt::Display for RenameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one attempted rename.
#[derive(Debug, Clone, Serialize)]
pub struct RenameOutcome {
    pub original: PathBuf,
    /// Sanitized file name including extension, when one could be derived.
    pub new_name: Option<String>,
    pub status: RenameStatus,
    pub detail: Option<String>,
    /// Exact on-disk target; `new_name` is only its display form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
}

impl RenameOutcome {
    pub fn new(original: PathBuf, new_name: Option<String>, status: RenameStatus) -> Self {
        Self { original, new_name, status, detail: None, target: None }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_target(mut self, target: PathBuf) -> Self {
        self.target = Some(target);
        self
    }

    /// Full path the file now lives at, for renamed outcomes.
    pub fn new_path(&self) -> Option<PathBuf> {
        if self.status != RenameStatus::Renamed {
            return None;
        }
        if let Some(t) = &self.target {
            return Some(t.clone());
        }
        let name = self.new_name.as_ref()?;
        Some(self.original.with_file_name(name))
    }
}

/// Per-status counts over one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameSummary {
    pub renamed: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RenameSummary {
    pub fn from_outcomes(outcomes: &[RenameOutcome]) -> Self {
        let mut s = Self::default();
        for o in outcomes {
            match o.status {
                RenameStatus::Renamed => s.renamed += 1,
                RenameStatus::Planned => s.planned += 1,
                RenameStatus::Unchanged => s.unchanged += 1,
                RenameStatus::SkippedNoTitle => s.skipped += 1,
                RenameStatus::FailedCollision | RenameStatus::FailedTagRead | RenameStatus::FailedIo => s.failed += 1,
            }
        }
        s
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
