//! Interactive numbered menu over any line-based input and output.
//!
//! Reading stops cleanly at end of input, so the menu can be scripted.

mod render;

pub use render::{render_epic, render_item, render_list};

use std::io::{BufRead, Write};

use chrono::{Duration, NaiveDateTime};
use taskboard_core::models::*;
use taskboard_core::TaskError;
use thiserror::Error;

use crate::board::Board;
use render::DATE_TIME_FORMAT;

const MENU: &str = "\
=== Menu ===
1. Create task
2. Create epic
3. Create subtask
4. List everything
5. List subtasks of an epic
6. Update task
7. Update epic
8. Update subtask
9. Delete by id
10. Delete all of a kind
11. Set status
12. Show by id
13. History
14. Prioritized list
0. Exit";

/// Input ran out while a prompt was waiting.
#[derive(Debug, Error)]
#[error("end of input")]
struct EndOfInput;

pub struct Menu<R, W> {
    board: Board,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(board: Board, input: R, output: W) -> Self {
        Self {
            board,
            input,
            output,
        }
    }

    /// Runs until `0` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match self.step().await {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) if e.is::<EndOfInput>() => return Ok(()),
                Err(e) => return Err(e),
            }
            writeln!(self.output)?;
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// One menu round. `false` means exit.
    async fn step(&mut self) -> anyhow::Result<bool> {
        writeln!(self.output, "{MENU}")?;
        match self.read_number("Choose: ")? {
            1 => self.create_task().await?,
            2 => self.create_epic().await?,
            3 => self.create_subtask().await?,
            4 => self.list_all()?,
            5 => self.list_epic_subtasks()?,
            6 => self.update_task().await?,
            7 => self.update_epic().await?,
            8 => self.update_subtask().await?,
            9 => self.delete_by_id().await?,
            10 => self.delete_all().await?,
            11 => self.set_status().await?,
            12 => self.show_by_id().await?,
            13 => self.show_history()?,
            14 => self.show_prioritized()?,
            0 => {
                writeln!(self.output, "Bye!")?;
                return Ok(false);
            }
            _ => writeln!(self.output, "No such option, try again.")?,
        }
        Ok(true)
    }

    // ============================================================
    // Create
    // ============================================================

    async fn create_task(&mut self) -> anyhow::Result<()> {
        let name = self.read_line("Name: ")?;
        let description = self.read_line("Description: ")?;
        let (start_time, duration) = self.read_schedule()?;

        let input = CreateTaskInput {
            name,
            description,
            status: None,
            start_time,
            duration,
        };
        match self.board.write(|m| m.create_task(input)).await? {
            Ok(id) => writeln!(self.output, "Task created, id={id}")?,
            Err(e) => self.refused("Task not created", &e)?,
        }
        Ok(())
    }

    async fn create_epic(&mut self) -> anyhow::Result<()> {
        let name = self.read_line("Epic name: ")?;
        let description = self.read_line("Description: ")?;

        let input = CreateEpicInput { name, description };
        let id = self.board.write(|m| m.create_epic(input)).await?;
        writeln!(self.output, "Epic created, id={id}")?;
        Ok(())
    }

    async fn create_subtask(&mut self) -> anyhow::Result<()> {
        let epic_id = self.read_id("Epic id: ")?;
        let name = self.read_line("Subtask name: ")?;
        let description = self.read_line("Description: ")?;
        let (start_time, duration) = self.read_schedule()?;

        let input = CreateSubtaskInput {
            epic_id,
            name,
            description,
            status: None,
            start_time,
            duration,
        };
        match self.board.write(|m| m.create_subtask(input)).await? {
            Ok(id) => writeln!(self.output, "Subtask created, id={id}")?,
            Err(e) => self.refused("Subtask not created", &e)?,
        }
        Ok(())
    }

    // ============================================================
    // Read
    // ============================================================

    fn list_all(&mut self) -> anyhow::Result<()> {
        let (tasks, epics) = self
            .board
            .read(|m| (m.list(ItemKind::Task), m.list(ItemKind::Epic)));

        writeln!(self.output, "-- Tasks --")?;
        self.print_list(&tasks)?;
        writeln!(self.output, "-- Epics --")?;
        if epics.is_empty() {
            writeln!(self.output, "(none)")?;
        }
        for item in epics {
            if let Item::Epic(epic) = item {
                let subtasks = self
                    .board
                    .read(|m| m.epic_subtasks(epic.id))
                    .unwrap_or_default();
                write!(self.output, "{}", render_epic(&epic, &subtasks))?;
            }
        }
        Ok(())
    }

    fn list_epic_subtasks(&mut self) -> anyhow::Result<()> {
        let epic_id = self.read_id("Epic id: ")?;
        match self.board.read(|m| m.epic_subtasks(epic_id)) {
            Ok(subtasks) if subtasks.is_empty() => writeln!(self.output, "No subtasks yet.")?,
            Ok(subtasks) => {
                let items: Vec<Item> = subtasks.into_iter().map(Item::from).collect();
                self.print_list(&items)?;
            }
            Err(e) => self.refused("Cannot list", &e)?,
        }
        Ok(())
    }

    async fn show_by_id(&mut self) -> anyhow::Result<()> {
        let kind = self.read_kind("Show what? 1-Task, 2-Epic, 3-Subtask: ")?;
        let id = self.read_id("id: ")?;
        let item = match kind {
            Some(ItemKind::Task) => self.board.write(|m| m.get_task(id).map(Item::from)).await?,
            Some(ItemKind::Epic) => self.board.write(|m| m.get_epic(id).map(Item::from)).await?,
            Some(ItemKind::Subtask) => {
                self.board
                    .write(|m| m.get_subtask(id).map(Item::from))
                    .await?
            }
            None => {
                writeln!(self.output, "Unknown kind.")?;
                return Ok(());
            }
        };
        match item {
            Some(item) => writeln!(self.output, "{}", render_item(&item))?,
            None => writeln!(self.output, "Not found.")?,
        }
        Ok(())
    }

    fn show_history(&mut self) -> anyhow::Result<()> {
        let items = self.board.read(|m| m.history());
        if items.is_empty() {
            writeln!(self.output, "History is empty.")?;
            return Ok(());
        }
        self.print_list(&items)
    }

    fn show_prioritized(&mut self) -> anyhow::Result<()> {
        let items = self.board.read(|m| m.prioritized());
        if items.is_empty() {
            writeln!(self.output, "Nothing to show.")?;
            return Ok(());
        }
        self.print_list(&items)
    }

    // ============================================================
    // Update
    // ============================================================

    async fn update_task(&mut self) -> anyhow::Result<()> {
        let id = self.read_id("Task id: ")?;
        let input = self.read_update()?;
        let requested = input.schedule;
        let task = self
            .board
            .write(|m| {
                if m.update_task(id, input) {
                    m.find_task(id)
                } else {
                    None
                }
            })
            .await?;
        match task {
            Some(task) => self.report_update(requested, task.start_time, task.duration)?,
            None => writeln!(self.output, "Task not found.")?,
        }
        Ok(())
    }

    async fn update_epic(&mut self) -> anyhow::Result<()> {
        let id = self.read_id("Epic id: ")?;
        let name = optional(self.read_line("New name (Enter keeps current): ")?);
        let description = optional(self.read_line("New description (Enter keeps current): ")?);

        let input = UpdateEpicInput { name, description };
        let updated = self.board.write(|m| m.update_epic(id, input)).await?;
        writeln!(self.output, "{}", if updated { "Updated." } else { "Epic not found." })?;
        Ok(())
    }

    async fn update_subtask(&mut self) -> anyhow::Result<()> {
        let id = self.read_id("Subtask id: ")?;
        let input = self.read_update()?;
        let requested = input.schedule;
        let subtask = self
            .board
            .write(|m| {
                if m.update_subtask(id, input) {
                    m.find_subtask(id)
                } else {
                    None
                }
            })
            .await?;
        match subtask {
            Some(s) => self.report_update(requested, s.start_time, s.duration)?,
            None => writeln!(self.output, "Subtask not found.")?,
        }
        Ok(())
    }

    fn read_update(&mut self) -> anyhow::Result<UpdateTaskInput> {
        let name = optional(self.read_line("New name (Enter keeps current): ")?);
        let description = optional(self.read_line("New description (Enter keeps current): ")?);
        let change = self.read_line("Change schedule? (y/N): ")?;
        let schedule = if change.eq_ignore_ascii_case("y") {
            let (start_time, duration) = self.read_schedule()?;
            Some(ScheduleInput {
                start_time,
                duration,
            })
        } else {
            None
        };
        Ok(UpdateTaskInput {
            name,
            description,
            schedule,
        })
    }

    fn report_update(
        &mut self,
        requested: Option<ScheduleInput>,
        start_time: Option<NaiveDateTime>,
        duration: Option<Duration>,
    ) -> anyhow::Result<()> {
        let kept = requested.is_some_and(|s| s.start_time != start_time || s.duration != duration);
        if kept {
            writeln!(
                self.output,
                "Updated, but the new schedule could not be reserved; previous schedule kept."
            )?;
        } else {
            writeln!(self.output, "Updated.")?;
        }
        Ok(())
    }

    async fn set_status(&mut self) -> anyhow::Result<()> {
        let kind = self.read_number("Set status of? 1-Task, 2-Subtask: ")?;
        if !matches!(kind, 1 | 2) {
            writeln!(self.output, "Unknown kind.")?;
            return Ok(());
        }
        let id = self.read_id("id: ")?;
        let status = loop {
            let n = self.read_number("New status? 1-NEW, 2-IN_PROGRESS, 3-DONE: ")?;
            match n {
                1 => break Status::New,
                2 => break Status::InProgress,
                3 => break Status::Done,
                _ => writeln!(self.output, "Pick 1, 2 or 3.")?,
            }
        };

        let result = if kind == 1 {
            self.board.write(|m| m.set_task_status(id, status)).await?
        } else {
            self.board.write(|m| m.set_subtask_status(id, status)).await?
        };
        match result {
            Ok(()) => writeln!(self.output, "Status set to {}.", status.as_str())?,
            Err(e) => self.refused("Status not changed", &e)?,
        }
        Ok(())
    }

    // ============================================================
    // Delete
    // ============================================================

    async fn delete_by_id(&mut self) -> anyhow::Result<()> {
        let kind = self.read_kind("Delete what? 1-Task, 2-Epic, 3-Subtask: ")?;
        let id = self.read_id("id: ")?;
        let deleted = match kind {
            Some(ItemKind::Task) => self.board.write(|m| m.delete_task(id).is_some()).await?,
            Some(ItemKind::Epic) => self.board.write(|m| m.delete_epic(id).is_some()).await?,
            Some(ItemKind::Subtask) => {
                self.board
                    .write(|m| m.delete_subtask(id).is_some())
                    .await?
            }
            None => {
                writeln!(self.output, "Unknown kind.")?;
                return Ok(());
            }
        };
        writeln!(self.output, "{}", if deleted { "Deleted." } else { "Not found." })?;
        Ok(())
    }

    async fn delete_all(&mut self) -> anyhow::Result<()> {
        match self.read_kind("Delete all of? 1-Tasks, 2-Epics, 3-Subtasks: ")? {
            Some(ItemKind::Task) => self.board.write(|m| m.delete_all_tasks()).await?,
            Some(ItemKind::Epic) => self.board.write(|m| m.delete_all_epics()).await?,
            Some(ItemKind::Subtask) => self.board.write(|m| m.delete_all_subtasks()).await?,
            None => {
                writeln!(self.output, "Unknown kind.")?;
                return Ok(());
            }
        }
        writeln!(self.output, "Done.")?;
        Ok(())
    }

    // ============================================================
    // Input helpers
    // ============================================================

    fn read_line(&mut self, prompt: &str) -> anyhow::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(EndOfInput.into());
        }
        Ok(line.trim().to_string())
    }

    /// Re-prompts until the line is a non-negative number.
    fn read_number(&mut self, prompt: &str) -> anyhow::Result<u64> {
        loop {
            let line = self.read_line(prompt)?;
            match line.parse() {
                Ok(n) => return Ok(n),
                Err(_) => writeln!(self.output, "Please enter a number.")?,
            }
        }
    }

    fn read_id(&mut self, prompt: &str) -> anyhow::Result<TaskId> {
        self.read_number(prompt).map(TaskId)
    }

    fn read_kind(&mut self, prompt: &str) -> anyhow::Result<Option<ItemKind>> {
        Ok(match self.read_number(prompt)? {
            1 => Some(ItemKind::Task),
            2 => Some(ItemKind::Epic),
            3 => Some(ItemKind::Subtask),
            _ => None,
        })
    }

    /// Start and duration; an empty line leaves either absent.
    fn read_schedule(&mut self) -> anyhow::Result<(Option<NaiveDateTime>, Option<Duration>)> {
        let start_time = loop {
            let line = self.read_line("Start (YYYY-MM-DD HH:MM, Enter for none): ")?;
            if line.is_empty() {
                break None;
            }
            match NaiveDateTime::parse_from_str(&line, DATE_TIME_FORMAT) {
                Ok(t) => break Some(t),
                Err(_) => writeln!(self.output, "Expected YYYY-MM-DD HH:MM.")?,
            }
        };
        let duration = loop {
            let line = self.read_line("Duration in minutes (Enter for none): ")?;
            if line.is_empty() {
                break None;
            }
            match line.parse::<i64>().ok().map(Duration::try_minutes) {
                Some(Some(duration)) => break Some(duration),
                Some(None) => writeln!(self.output, "That duration is too large.")?,
                None => writeln!(self.output, "Please enter a number.")?,
            }
        };
        Ok((start_time, duration))
    }

    fn print_list(&mut self, items: &[Item]) -> anyhow::Result<()> {
        if items.is_empty() {
            writeln!(self.output, "(none)")?;
        } else {
            write!(self.output, "{}", render_list(items))?;
        }
        Ok(())
    }

    fn refused(&mut self, what: &str, e: &TaskError) -> anyhow::Result<()> {
        writeln!(self.output, "{what}: {e}")?;
        Ok(())
    }
}

fn optional(line: String) -> Option<String> {
    (!line.is_empty()).then_some(line)
}
