//! Plain-text rendering of board items with status symbols.

use taskboard_core::models::{Epic, Item, Status, Subtask};

const NEW: char = '○';
const IN_PROGRESS: char = '◐';
const DONE: char = '●';

pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn status_symbol(status: Status) -> char {
    match status {
        Status::New => NEW,
        Status::InProgress => IN_PROGRESS,
        Status::Done => DONE,
    }
}

/// One line per item.
///
/// ```text
/// ◐ #1 TASK Write report [2026-03-10 10:00, 30 min]
/// ○ #2 EPIC Move house
/// ```
pub fn render_item(item: &Item) -> String {
    let mut line = format!(
        "{} #{} {} {}",
        status_symbol(item.status()),
        item.id(),
        item.kind().as_str(),
        item.name()
    );
    push_schedule(&mut line, item);
    if !item.description().is_empty() {
        line.push_str(" - ");
        line.push_str(item.description());
    }
    line
}

fn push_schedule(line: &mut String, item: &Item) {
    match (item.start_time(), item.duration()) {
        (Some(start), Some(duration)) => line.push_str(&format!(
            " [{}, {} min]",
            start.format(DATE_TIME_FORMAT),
            duration.num_minutes()
        )),
        (Some(start), None) => line.push_str(&format!(" [{}]", start.format(DATE_TIME_FORMAT))),
        (None, Some(duration)) => line.push_str(&format!(" [{} min]", duration.num_minutes())),
        (None, None) => {}
    }
}

pub fn render_list(items: &[Item]) -> String {
    let mut output = String::new();
    for item in items {
        output.push_str(&render_item(item));
        output.push('\n');
    }
    output
}

/// An epic followed by its subtasks as branches.
///
/// ```text
/// ◐ #2 EPIC Move house
/// ├── ● #3 SUBTASK Pack books
/// └── ○ #4 SUBTASK Book a van
/// ```
pub fn render_epic(epic: &Epic, subtasks: &[Subtask]) -> String {
    let mut output = render_item(&Item::Epic(epic.clone()));
    output.push('\n');
    for (i, subtask) in subtasks.iter().enumerate() {
        let branch = if i == subtasks.len() - 1 { "└── " } else { "├── " };
        output.push_str(branch);
        output.push_str(&render_item(&Item::Subtask(subtask.clone())));
        output.push('\n');
    }
    output
}
