use crate::config::Config;
use crate::models::{CheckState, ItemKind, RenameOutcome, SelectableItem};
use crate::util::path_matches_extensions;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub type ItemId = usize;

/// A path that could not be read while scanning; the item and its subtree are left out.
#[derive(Debug, Clone, Serialize)]
pub struct ScanError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone)]
struct Node {
    item: SelectableItem,
    parent: Option<ItemId>,
    children: Vec<ItemId>,
}

/// Checkbox tree over the user's chosen roots.
///
/// Every path appears at most once, even when roots overlap. Iteration walks
/// the tree top-down with folders listed before the files next to them.
#[derive(Debug, Default)]
pub struct SelectionTree {
    nodes: Vec<Node>,
    roots: Vec<ItemId>,
    index: HashMap<PathBuf, ItemId>,
    errors: Vec<ScanError>,
}

impl SelectionTree {
    /// Scan each root (file or folder). Unreadable paths are collected in `errors()`
    /// instead of failing the scan.
    pub fn scan(roots: &[PathBuf], cfg: &Config) -> Self {
        let mut tree = Self::default();
        for root in roots {
            tree.scan_root(root, cfg);
        }
        info!("Scan complete: {} items, {} errors", tree.nodes.len(), tree.errors.len());
        tree
    }

    fn scan_root(&mut self, root: &Path, cfg: &Config) {
        if self.index.contains_key(root) {
            debug!("root {} already scanned", root.display());
            return;
        }
        let meta = match std::fs::metadata(root) {
            Ok(m) => m,
            Err(e) => {
                self.report(root.to_path_buf(), e.to_string());
                return;
            }
        };

        if meta.is_file() {
            if path_matches_extensions(root, &cfg.file_extensions) {
                let id = self.push(root.to_path_buf(), ItemKind::File, None);
                self.roots.push(id);
            } else {
                self.report(root.to_path_buf(), "not a supported audio file".into());
            }
            return;
        }

        // Walk first, then build: walkdir reports a folder's read error after
        // yielding the folder itself.
        let walker = WalkDir::new(root)
            .follow_links(cfg.follow_links)
            .sort_by(|a, b| {
                let a_key = (!a.file_type().is_dir(), a.file_name().to_string_lossy().to_lowercase());
                let b_key = (!b.file_type().is_dir(), b.file_name().to_string_lossy().to_lowercase());
                a_key.cmp(&b_key)
            });

        let mut entries = Vec::new();
        let mut unreadable: HashSet<PathBuf> = HashSet::new();
        for entry in walker {
            match entry {
                Ok(e) => entries.push(e),
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    self.report(path.clone(), e.to_string());
                    unreadable.insert(path);
                }
            }
        }

        for entry in entries {
            let path = entry.path();
            if unreadable.iter().any(|u| path.starts_with(u)) {
                continue;
            }
            let kind = if entry.file_type().is_dir() {
                ItemKind::Folder
            } else if entry.file_type().is_file() && path_matches_extensions(path, &cfg.file_extensions) {
                ItemKind::File
            } else {
                continue;
            };

            if entry.depth() == 0 {
                let id = self.push(path.to_path_buf(), kind, None);
                self.roots.push(id);
                continue;
            }
            let parent = match path.parent().and_then(|p| self.index.get(p)) {
                Some(&p) => p,
                None => continue,
            };
            if let Some(&existing) = self.index.get(path) {
                // an earlier root inside this folder moves under it; anything
                // else with this path is already placed
                if self.nodes[existing].parent.is_none() {
                    self.roots.retain(|&r| r != existing);
                    self.nodes[existing].parent = Some(parent);
                    self.nodes[parent].children.push(existing);
                }
                continue;
            }
            let id = self.push(path.to_path_buf(), kind, Some(parent));
            self.nodes[parent].children.push(id);
        }
    }

    fn push(&mut self, path: PathBuf, kind: ItemKind, parent: Option<ItemId>) -> ItemId {
        let id = self.nodes.len();
        self.index.insert(path.clone(), id);
        self.nodes.push(Node { item: SelectableItem::new(path, kind), parent, children: Vec::new() });
        id
    }

    fn report(&mut self, path: PathBuf, message: String) {
        warn!("Error scanning {}: {}", path.display(), message);
        self.errors.push(ScanError { path, message });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[ItemId] {
        &self.roots
    }

    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    pub fn item(&self, id: ItemId) -> Option<&SelectableItem> {
        self.nodes.get(id).map(|n| &n.item)
    }

    pub fn children(&self, id: ItemId) -> &[ItemId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Number of ancestors; roots are at depth 0.
    pub fn depth(&self, id: ItemId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    /// Item ids in pre-order, starting from the roots.
    pub fn preorder(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ItemId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    /// Items in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &SelectableItem)> {
        self.preorder().into_iter().map(move |id| (id, &self.nodes[id].item))
    }

    pub fn find(&self, path: &Path) -> Option<ItemId> {
        self.index.get(path).copied()
    }

    /// Flip an item's checkbox. Folders push their new state down to every
    /// descendant. Returns the new state, or None for an unknown id.
    pub fn toggle(&mut self, id: ItemId) -> Option<bool> {
        let value = !self.nodes.get(id)?.item.checked;
        self.set_checked(id, value);
        Some(value)
    }

    /// Set an item's checkbox, propagating to descendants for folders.
    pub fn set_checked(&mut self, id: ItemId, value: bool) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.nodes.get_mut(cur) else { continue };
            node.item.checked = value;
            stack.extend(node.children.iter().copied());
        }
    }

    pub fn check_all(&mut self) {
        let roots = self.roots.clone();
        for r in roots {
            self.set_checked(r, true);
        }
    }

    pub fn uncheck_all(&mut self) {
        for n in self.nodes.iter_mut() {
            n.item.checked = false;
        }
    }

    /// Checkbox state for display. A folder is partial when the audio files
    /// below it are only partly checked; an empty folder shows its own flag.
    pub fn check_state(&self, id: ItemId) -> CheckState {
        let Some(node) = self.nodes.get(id) else { return CheckState::Unchecked };
        let (mut checked, mut total) = (0usize, 0usize);
        let mut stack: Vec<ItemId> = node.children.clone();
        while let Some(cur) = stack.pop() {
            let n = &self.nodes[cur];
            if n.item.kind == ItemKind::File {
                total += 1;
                if n.item.checked {
                    checked += 1;
                }
            }
            stack.extend(n.children.iter().copied());
        }
        if total == 0 {
            return if node.item.checked { CheckState::Checked } else { CheckState::Unchecked };
        }
        match checked {
            0 => CheckState::Unchecked,
            c if c == total => CheckState::Checked,
            _ => CheckState::Partial,
        }
    }

    /// Snapshot of the checked audio files, in tree order. The rename pass
    /// works on this copy only.
    pub fn checked_files(&self) -> Vec<PathBuf> {
        self.iter()
            .filter(|(_, item)| item.kind == ItemKind::File && item.checked)
            .map(|(_, item)| item.path.clone())
            .collect()
    }

    /// Point renamed items at their new paths, keeping their checkbox state.
    pub fn apply_outcomes(&mut self, outcomes: &[RenameOutcome]) {
        for o in outcomes {
            let Some(new_path) = o.new_path() else { continue };
            let Some(id) = self.index.remove(&o.original) else { continue };
            let item = &mut self.nodes[id].item;
            item.name = crate::util::display_name(&new_path);
            item.path = new_path.clone();
            self.index.insert(new_path, id);
        }
    }
}
