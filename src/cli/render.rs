//! Stack and plan rendering

use crate::cli::style::{CHECK, CIRCLE, CROSS, DOT, Stylize, arrow, hyperlink};
use anstream::println;
use jj_stack::submit::{Evaluation, RowKind, RowState, Stack, StackRow, SyncAction};

/// Longest title shown before truncation
const MAX_TITLE: usize = 40;

/// Print every row, tip first
pub fn print_stack(stack: &Stack) {
    for row in stack.rows() {
        println!("  {}", row_line(row));
    }
}

fn row_line(row: &StackRow) -> String {
    if row.kind == RowKind::Trunk {
        return format!("{} {}", "◆".muted(), row.title.emphasis());
    }

    let symbol = match &row.state {
        _ if !row.syncable && row.kind == RowKind::Revision => CIRCLE.muted(),
        RowState::Pending => CIRCLE.muted(),
        RowState::InProgress => DOT.warning(),
        RowState::Success => CHECK.success(),
        RowState::Error(_) => CROSS.error(),
    };

    let mut line = format!("{symbol} {} ", row.short_id().accent());
    let title = truncate(&row.title, MAX_TITLE);
    if row.syncable || row.kind == RowKind::Merged {
        line.push_str(&title);
    } else {
        line.push_str(&"(no description)".muted());
    }

    if let Some(number) = row.pr_number {
        let label = format!("#{number}");
        let label = row
            .pr_url
            .as_deref()
            .map_or_else(|| label.clone(), |url| hyperlink(&label, url));
        line.push(' ');
        line.push_str(&label.accent());
    }

    match (&row.kind, &row.state) {
        (RowKind::Merged, _) => line.push_str(&format!(" {}", "merged".muted())),
        (_, RowState::Error(msg)) => line.push_str(&format!(" {}", msg.error())),
        _ => {}
    }
    line
}

/// Cut `title` to `max` characters, ending in `...` when shortened
fn truncate(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let kept: String = title.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Print what a sync would do, one line per pending revision
pub fn print_plan(evaluation: &Evaluation) {
    println!("{}:", "Sync plan".emphasis());
    for plan in evaluation.pending() {
        let Some(action) = &plan.action else {
            continue;
        };
        let detail = match action {
            SyncAction::Create => format!("{action} into {}", plan.desired.base.accent()),
            SyncAction::Update { .. } => action.to_string(),
        };
        println!(
            "  {} {} {} ({detail})",
            arrow(),
            plan.change.short_id().accent(),
            truncate(plan.change.title(), MAX_TITLE)
        );
    }
    println!(
        "  {} to create, {} to update",
        evaluation.create_count().accent(),
        evaluation.update_count().accent()
    );
}
