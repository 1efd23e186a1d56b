//! JSONL journal of active-learning runs.
//!
//! [`SelectionJournal`] keeps every round in memory and, when persistence is
//! on, appends it to `active.jsonl` in its log directory (`logs/` unless
//! overridden); experiment summaries go to `experiments.jsonl` beside it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

const LOG_DIR: &str = "logs";
const ACTIVE_LOG: &str = "active.jsonl";
const EXPERIMENT_LOG: &str = "experiments.jsonl";

fn log_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

pub fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// One selection made by a policy.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SelectionLogEntry {
    pub experiment: String,
    pub resident: usize,
    pub round: usize,
    pub index: usize,
    pub value: f64,
    pub labeled: usize,
    pub unlabeled: usize,
    pub holdout_accuracy: f64,
    pub timestamp_ms: u128,
}

pub fn log_selection_round<P: AsRef<Path>>(dir: P, entry: &SelectionLogEntry) -> io::Result<()> {
    let dir = dir.as_ref();
    log_dir(dir)?;
    append_json_line(dir.join(ACTIVE_LOG), entry)
}

/// Per-experiment holdout summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExperimentSummary {
    pub experiment: String,
    pub residents: usize,
    pub rounds: usize,
    /// Mean holdout accuracy across residents, per round
    pub accuracy: Vec<f64>,
    pub final_accuracy: f64,
    pub timestamp_ms: u128,
}

pub fn log_experiment_summary<P: AsRef<Path>>(
    dir: P,
    summary: &ExperimentSummary,
) -> io::Result<()> {
    let dir = dir.as_ref();
    log_dir(dir)?;
    append_json_line(dir.join(EXPERIMENT_LOG), summary)
}

#[derive(Debug, Clone)]
pub struct SelectionJournal {
    persist: bool,
    dir: PathBuf,
    entries: Vec<SelectionLogEntry>,
}

impl Default for SelectionJournal {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SelectionJournal {
    pub fn new(persist: bool) -> Self {
        Self {
            persist,
            dir: PathBuf::from(LOG_DIR),
            entries: Vec::new(),
        }
    }

    /// Persist into `dir` instead of `logs/`.
    pub fn with_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[SelectionLogEntry] {
        &self.entries
    }

    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    /// Keep `entry` and, when persistent, append it to disk. The entry is
    /// kept even if the append fails.
    pub fn record(&mut self, entry: SelectionLogEntry) -> io::Result<()> {
        self.entries.push(entry);
        match self.entries.last() {
            Some(entry) if self.persist => log_selection_round(&self.dir, entry),
            _ => Ok(()),
        }
    }

    /// Entries for one resident, in round order.
    pub fn resident(&self, resident: usize) -> impl Iterator<Item = &SelectionLogEntry> + '_ {
        self.entries.iter().filter(move |e| e.resident == resident)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(resident: usize, round: usize) -> SelectionLogEntry {
        SelectionLogEntry {
            experiment: "US".into(),
            resident,
            round,
            index: round * 2,
            value: 0.1,
            labeled: round + 1,
            unlabeled: 9 - round,
            holdout_accuracy: 0.5,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn journal_keeps_entries_in_order() {
        let mut journal = SelectionJournal::new(false);
        for round in 0..3 {
            journal.record(entry(0, round)).unwrap();
            journal.record(entry(1, round)).unwrap();
        }
        assert_eq!(journal.entries().len(), 6);
        let rounds: Vec<usize> = journal.resident(1).map(|e| e.round).collect();
        assert_eq!(rounds, vec![0, 1, 2]);

        journal.clear();
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn persistent_journal_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let mut journal = SelectionJournal::new(true).with_dir(&logs);
        journal.record(entry(0, 0)).unwrap();
        journal.record(entry(0, 1)).unwrap();

        let contents = fs::read_to_string(logs.join(ACTIVE_LOG)).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(journal.entries().len(), 2);
    }

    #[test]
    fn failed_append_still_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("logs");
        fs::write(&blocked, b"not a directory").unwrap();

        let mut journal = SelectionJournal::new(true).with_dir(&blocked);
        for round in 0..3 {
            assert!(journal.record(entry(0, round)).is_err());
        }
        assert_eq!(journal.entries().len(), 3);
    }

    #[test]
    fn entry_serialises_all_fields() {
        let json = serde_json::to_value(entry(2, 4)).unwrap();
        for field in [
            "experiment",
            "resident",
            "round",
            "index",
            "value",
            "labeled",
            "unlabeled",
            "holdout_accuracy",
            "timestamp_ms",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn timestamp_is_monotone_enough() {
        let a = timestamp_ms();
        let b = timestamp_ms();
        assert!(b >= a);
    }
}
