//! CSV snapshot file.
//!
//! ```text
//! id,type,name,status,description,epic,start_time,duration
//! 1,TASK,Write report,NEW,,,2026-03-10T10:00,30
//! 2,EPIC,Move house,IN_PROGRESS,,,,
//! 3,SUBTASK,Pack books,DONE,,2,,
//!
//! 3,1
//! ```
//!
//! Rows are tasks, then epics, then subtasks. A blank line separates them
//! from the view history (oldest first). Epic status and schedule are written
//! for readability only; they are recomputed on load.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use taskboard_core::models::*;

use super::PersistError;

const HEADER: &str = "id,type,name,status,description,epic,start_time,duration";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const COLUMNS: usize = 8;

/// Snapshot stored in a local CSV file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file loads as an empty snapshot.
    pub fn load(&self) -> Result<Snapshot, PersistError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no snapshot file yet, starting empty");
            return Ok(Snapshot::default());
        }
        let text = std::fs::read_to_string(&self.path)?;
        decode_snapshot(&text)
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, encode_snapshot(snapshot))?;
        Ok(())
    }
}

pub fn encode_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::with_capacity(64 * (snapshot.tasks.len() + snapshot.subtasks.len() + 1));
    out.push_str(HEADER);
    out.push('\n');

    for task in &snapshot.tasks {
        push_row(
            &mut out,
            task.id,
            ItemKind::Task,
            &task.name,
            task.status,
            &task.description,
            None,
            task.start_time,
            task.duration,
        );
    }
    for epic in &snapshot.epics {
        push_row(
            &mut out,
            epic.id,
            ItemKind::Epic,
            &epic.name,
            epic.status(),
            &epic.description,
            None,
            epic.start_time(),
            epic.duration(),
        );
    }
    for subtask in &snapshot.subtasks {
        push_row(
            &mut out,
            subtask.id,
            ItemKind::Subtask,
            &subtask.name,
            subtask.status,
            &subtask.description,
            Some(subtask.epic_id()),
            subtask.start_time,
            subtask.duration,
        );
    }

    out.push('\n');
    let history: Vec<String> = snapshot.history.iter().map(TaskId::to_string).collect();
    out.push_str(&history.join(","));
    out.push('\n');
    out
}

#[allow(clippy::too_many_arguments)]
fn push_row(
    out: &mut String,
    id: TaskId,
    kind: ItemKind,
    name: &str,
    status: Status,
    description: &str,
    epic_id: Option<TaskId>,
    start_time: Option<NaiveDateTime>,
    duration: Option<Duration>,
) {
    let fields = [
        Cow::Owned(id.to_string()),
        Cow::Borrowed(kind.as_str()),
        escape(name),
        Cow::Borrowed(status.as_str()),
        escape(description),
        Cow::Owned(epic_id.map(|id| id.to_string()).unwrap_or_default()),
        Cow::Owned(start_time.map(|t| t.format(TIME_FORMAT).to_string()).unwrap_or_default()),
        Cow::Owned(duration.map(|d| d.num_minutes().to_string()).unwrap_or_default()),
    ];
    out.push_str(&fields.join(","));
    out.push('\n');
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub fn decode_snapshot(text: &str) -> Result<Snapshot, PersistError> {
    let mut records = parse_records(text).into_iter();
    let mut snapshot = Snapshot::default();

    match records.next() {
        Some(header) if header.fields.first().map(String::as_str) == Some("id") => {}
        Some(header) => return Err(parse_error(header.line, "missing header row")),
        None => return Ok(snapshot),
    }

    for record in records.by_ref() {
        if record.is_blank() {
            break;
        }
        match decode_row(&record)? {
            Item::Task(task) => snapshot.tasks.push(task),
            Item::Epic(epic) => snapshot.epics.push(epic),
            Item::Subtask(subtask) => snapshot.subtasks.push(subtask),
        }
    }

    if let Some(record) = records.find(|r| !r.is_blank()) {
        for field in &record.fields {
            let id = field
                .parse::<TaskId>()
                .map_err(|e| parse_error(record.line, format!("bad history id {field:?}: {e}")))?;
            snapshot.history.push(id);
        }
    }

    Ok(snapshot)
}

fn decode_row(record: &Record) -> Result<Item, PersistError> {
    let line = record.line;
    if record.fields.len() < COLUMNS {
        return Err(parse_error(
            line,
            format!("expected {COLUMNS} columns, found {}", record.fields.len()),
        ));
    }
    let f = &record.fields;

    let id = parse_id(line, &f[0])?;
    let kind = ItemKind::from_str(&f[1])
        .ok_or_else(|| parse_error(line, format!("unknown type {:?}", f[1])))?;
    let name = f[2].clone();
    let status = Status::from_str(&f[3])
        .ok_or_else(|| parse_error(line, format!("unknown status {:?}", f[3])))?;
    let description = f[4].clone();
    let start_time = match f[6].as_str() {
        "" => None,
        s => Some(
            NaiveDateTime::parse_from_str(s, TIME_FORMAT)
                .map_err(|e| parse_error(line, format!("bad start_time {s:?}: {e}")))?,
        ),
    };
    let duration = match f[7].as_str() {
        "" => None,
        s => {
            let minutes = s
                .parse::<i64>()
                .map_err(|e| parse_error(line, format!("bad duration {s:?}: {e}")))?;
            if minutes < 0 {
                return Err(parse_error(line, format!("negative duration {minutes}")));
            }
            Some(
                Duration::try_minutes(minutes)
                    .ok_or_else(|| parse_error(line, format!("duration {minutes} out of range")))?,
            )
        }
    };

    Ok(match kind {
        ItemKind::Task => Item::Task(Task {
            id,
            name,
            description,
            status,
            start_time,
            duration,
        }),
        ItemKind::Epic => Item::Epic(Epic::new(id, name, description)),
        ItemKind::Subtask => {
            let epic_id = parse_id(line, &f[5])?;
            let mut subtask = Subtask::new(id, epic_id, name, description);
            subtask.status = status;
            subtask.start_time = start_time;
            subtask.duration = duration;
            Item::Subtask(subtask)
        }
    })
}

fn parse_id(line: usize, field: &str) -> Result<TaskId, PersistError> {
    field
        .parse()
        .map_err(|e| parse_error(line, format!("bad id {field:?}: {e}")))
}

fn parse_error(line: usize, message: impl Into<String>) -> PersistError {
    PersistError::Parse {
        line,
        message: message.into(),
    }
}

#[derive(Debug)]
struct Record {
    /// 1-based line the record starts on.
    line: usize,
    fields: Vec<String>,
}

impl Record {
    fn is_blank(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].trim().is_empty()
    }
}

/// Splits text into records, honouring quoted fields that span lines.
fn parse_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while chars.peek().is_some() {
        let start_line = line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut quoted = false;

        while let Some(c) = chars.next() {
            if quoted {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => quoted = false,
                    '\n' => {
                        line += 1;
                        field.push(c);
                    }
                    _ => field.push(c),
                }
                continue;
            }
            match c {
                '"' => quoted = true,
                ',' => fields.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    line += 1;
                    break;
                }
                _ => field.push(c),
            }
        }

        fields.push(field);
        records.push(Record {
            line: start_line,
            fields,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample() -> Snapshot {
        let mut subtask = Subtask::new(TaskId(3), TaskId(2), "Pack, \"carefully\"", "multi\nline");
        subtask.status = Status::Done;
        Snapshot {
            tasks: vec![Task {
                id: TaskId(1),
                name: "Write report".into(),
                description: String::new(),
                status: Status::InProgress,
                start_time: Some(at(10, 0)),
                duration: Some(Duration::minutes(30)),
            }],
            epics: vec![Epic::new(TaskId(2), "Move house", "")],
            subtasks: vec![subtask],
            history: vec![TaskId(3), TaskId(1)],
        }
    }

    #[test]
    fn writes_header_rows_and_history() {
        let text = encode_snapshot(&sample());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,TASK,Write report,IN_PROGRESS,,,2026-03-10T10:00,30");
        assert_eq!(lines[2], "2,EPIC,Move house,NEW,,,,");
        assert!(text.ends_with("\n\n3,1\n"));
    }

    #[test]
    fn reads_back_what_it_wrote() {
        let snapshot = sample();
        let decoded = decode_snapshot(&encode_snapshot(&snapshot)).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn empty_input_is_an_empty_snapshot() {
        assert_eq!(decode_snapshot("").unwrap(), Snapshot::default());
        let only_header = format!("{HEADER}\n");
        assert_eq!(decode_snapshot(&only_header).unwrap(), Snapshot::default());
    }

    #[test]
    fn reports_the_offending_line() {
        let text = format!("{HEADER}\n1,TASK,ok,NEW,,,,\n2,TASK,bad,MAYBE,,,,\n");
        match decode_snapshot(&text) {
            Err(PersistError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("MAYBE"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_and_huge_durations() {
        for cell in ["-30", "99999999999999999"] {
            let text = format!("{HEADER}\n1,TASK,x,NEW,,,2026-03-10T10:00,{cell}\n");
            match decode_snapshot(&text) {
                Err(PersistError::Parse { line, message }) => {
                    assert_eq!(line, 2);
                    assert!(message.contains("duration"), "{message}");
                }
                other => panic!("expected parse error for {cell}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_a_missing_header() {
        assert!(matches!(
            decode_snapshot("1,TASK,x,NEW,,,,\n"),
            Err(PersistError::Parse { line: 1, .. })
        ));
    }
}
