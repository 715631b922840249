//! Text and JSON rendering for the terminal front end.
use crate::models::{CheckState, RenameOutcome, RenameSummary};
use crate::tree::{ItemId, SelectionTree};
use serde::Serialize;
use std::io::Write;

fn checkbox(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Unchecked => "[ ]",
        CheckState::Partial => "[-]",
    }
}

/// Label used for one tree row: indentation, checkbox, name (folders end with '/').
pub fn tree_label(tree: &SelectionTree, id: ItemId, with_checkbox: bool) -> String {
    let Some(item) = tree.item(id) else { return String::new() };
    let indent = "  ".repeat(tree.depth(id));
    let suffix = if item.is_folder() { "/" } else { "" };
    if with_checkbox {
        format!("{}{} {}{}", indent, checkbox(tree.check_state(id)), item.name, suffix)
    } else {
        format!("{}{}{}", indent, item.name, suffix)
    }
}

pub fn write_tree(out: &mut impl Write, tree: &SelectionTree) -> std::io::Result<()> {
    for (id, _) in tree.iter() {
        writeln!(out, "{}", tree_label(tree, id, true))?;
    }
    for e in tree.errors() {
        writeln!(out, "! {}: {}", e.path.display(), e.message)?;
    }
    Ok(())
}

pub fn outcome_row(o: &RenameOutcome) -> String {
    let mut row = format!("[{}] {}", o.status, o.original.display());
    if let Some(name) = &o.new_name {
        row.push_str(&format!(" -> {}", name));
    }
    if let Some(detail) = &o.detail {
        row.push_str(&format!(" ({})", detail));
    }
    row
}

pub fn summary_line(summary: &RenameSummary, dry_run: bool) -> String {
    let head = if dry_run {
        format!("Would rename {} file(s).", summary.planned)
    } else {
        format!("Renamed {} file(s).", summary.renamed)
    };
    format!(
        "{} {} unchanged, {} skipped, {} failed.",
        head, summary.unchanged, summary.skipped, summary.failed
    )
}

pub fn write_outcomes(out: &mut impl Write, outcomes: &[RenameOutcome], dry_run: bool) -> std::io::Result<()> {
    for o in outcomes {
        writeln!(out, "{}", outcome_row(o))?;
    }
    writeln!(out, "{}", summary_line(&RenameSummary::from_outcomes(outcomes), dry_run))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    outcomes: &'a [RenameOutcome],
    summary: RenameSummary,
}

pub fn outcomes_json(outcomes: &[RenameOutcome]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport { outcomes, summary: RenameSummary::from_outcomes(outcomes) })
}
