//! Tests for the file-backed backlog

mod common;

use std::fs;

use climalink_core::backlog::{BacklogEntry, FileBacklog, FlushReport};
use climalink_core::{DeliveryResult, DurableLog, Reading};
use common::reading;
use tempfile::TempDir;

fn open(dir: &TempDir) -> FileBacklog {
    FileBacklog::new(dir.path().join("backlog.jsonl"))
}

/// Lines joined into file content, each ending in a newline
fn file_content(lines: &[&[u8]]) -> Vec<u8> {
    lines
        .iter()
        .flat_map(|line| line.iter().copied().chain(Some(b'\n')))
        .collect()
}

fn records(backlog: &FileBacklog) -> Vec<Reading> {
    backlog
        .entries()
        .unwrap()
        .into_iter()
        .filter_map(|entry| match entry {
            BacklogEntry::Record(reading) => Some(reading),
            BacklogEntry::Malformed(_) => None,
        })
        .collect()
}

#[test]
fn failing_flush_keeps_everything_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = open(&dir);
    let appended: Vec<Reading> = (1..=5).map(reading).collect();
    for r in &appended {
        backlog.append(r).unwrap();
    }
    let before = fs::read(backlog.path()).unwrap();

    let report = backlog
        .flush(|_| DeliveryResult::TransportFailed("offline".into()))
        .unwrap();

    assert_eq!(
        report,
        FlushReport {
            delivered: 0,
            kept: 5,
            malformed: 0
        }
    );
    assert_eq!(records(&backlog), appended);
    assert_eq!(fs::read(backlog.path()).unwrap(), before);
}

#[test]
fn flushing_absent_backlog_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = open(&dir);

    let report = backlog.flush(|_| DeliveryResult::Delivered).unwrap();

    assert_eq!(report, FlushReport::default());
    assert!(!backlog.exists());
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn fully_drained_backlog_is_absent_not_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = open(&dir);
    backlog.append(&reading(1)).unwrap();
    backlog.append(&reading(2)).unwrap();

    let report = backlog.flush(|_| DeliveryResult::Delivered).unwrap();
    assert_eq!(report.delivered, 2);
    assert!(!backlog.exists());

    // A second flush finds nothing and creates nothing
    let report = backlog.flush(|_| DeliveryResult::Delivered).unwrap();
    assert_eq!(report, FlushReport::default());
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn partial_success_keeps_failures_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = open(&dir);
    for n in 1..=3 {
        backlog.append(&reading(n)).unwrap();
    }

    let second = reading(2);
    let report = backlog
        .flush(|r| {
            if *r == second {
                DeliveryResult::Delivered
            } else {
                DeliveryResult::Rejected("status 500".into())
            }
        })
        .unwrap();

    assert_eq!(
        report,
        FlushReport {
            delivered: 1,
            kept: 2,
            malformed: 0
        }
    );
    assert_eq!(records(&backlog), vec![reading(1), reading(3)]);
}

#[test]
fn malformed_line_survives_a_successful_flush() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backlog.jsonl");
    let first = BacklogEntry::encode(&reading(1)).unwrap();
    let third = BacklogEntry::encode(&reading(3)).unwrap();
    fs::write(&path, file_content(&[&first, b"{\"temperature\":oops", &third])).unwrap();

    let mut backlog = FileBacklog::new(&path);
    let mut delivered = Vec::new();
    let report = backlog
        .flush(|r| {
            delivered.push(*r);
            DeliveryResult::Delivered
        })
        .unwrap();

    assert_eq!(delivered, vec![reading(1), reading(3)]);
    assert_eq!(
        report,
        FlushReport {
            delivered: 2,
            kept: 0,
            malformed: 1
        }
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"temperature\":oops\n"
    );
}

#[test]
fn malformed_bytes_that_are_not_utf8_survive_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backlog.jsonl");
    let corrupt: &[u8] = b"{\"temperature\":\xff\xfe garbage";
    let valid = BacklogEntry::encode(&reading(1)).unwrap();
    fs::write(&path, file_content(&[corrupt, &valid])).unwrap();

    let mut backlog = FileBacklog::new(&path);
    let report = backlog.flush(|_| DeliveryResult::Delivered).unwrap();

    assert_eq!(
        report,
        FlushReport {
            delivered: 1,
            kept: 0,
            malformed: 1
        }
    );
    assert_eq!(fs::read(&path).unwrap(), file_content(&[corrupt]));
    assert_eq!(
        backlog.entries().unwrap(),
        vec![BacklogEntry::Malformed(corrupt.to_vec())]
    );
}

#[test]
fn kept_lines_are_written_back_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backlog.jsonl");
    let odd = r#"{ "timestamp": 2000, "humidity": 40, "temperature": 18.25, "note": "x" }"#;
    let plain = BacklogEntry::encode(&reading(1)).unwrap();
    fs::write(&path, file_content(&[&plain, odd.as_bytes()])).unwrap();

    let mut backlog = FileBacklog::new(&path);
    let report = backlog
        .flush(|r| {
            if r.timestamp == 2000 {
                DeliveryResult::Rejected("status 400".into())
            } else {
                DeliveryResult::Delivered
            }
        })
        .unwrap();

    assert_eq!(report.kept, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", odd));
}

#[test]
fn appended_entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut backlog = open(&dir);
        backlog.append(&reading(1)).unwrap();
        backlog.append(&reading(2)).unwrap();
    }

    let backlog = open(&dir);
    assert_eq!(records(&backlog), vec![reading(1), reading(2)]);
}

#[test]
fn crash_before_swap_keeps_pre_flush_backlog() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = open(&dir);
    for n in 1..=3 {
        backlog.append(&reading(n)).unwrap();
    }
    let before = fs::read(backlog.path()).unwrap();

    // Rewrite staged after delivering 1 and 3, then the process dies
    let survivors = vec![BacklogEntry::encode(&reading(2)).unwrap()];
    let staged = backlog.stage_rewrite(&survivors).unwrap();
    assert!(backlog.side_path().exists());
    drop(staged);
    drop(backlog);

    // Restart
    let backlog = open(&dir);
    assert!(!backlog.side_path().exists());
    assert_eq!(fs::read(backlog.path()).unwrap(), before);
    assert_eq!(records(&backlog), vec![reading(1), reading(2), reading(3)]);
}

#[test]
fn committed_rewrite_replaces_backlog() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = open(&dir);
    backlog.append(&reading(1)).unwrap();
    backlog.append(&reading(2)).unwrap();

    let survivors = vec![BacklogEntry::encode(&reading(2)).unwrap()];
    let staged = backlog.stage_rewrite(&survivors).unwrap();
    backlog.commit(staged).unwrap();

    assert!(!backlog.side_path().exists());
    assert_eq!(records(&backlog), vec![reading(2)]);
}

#[test]
fn append_after_flush_goes_to_the_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = open(&dir);
    backlog.append(&reading(1)).unwrap();
    backlog.append(&reading(2)).unwrap();

    let first = reading(1);
    backlog
        .flush(|r| {
            if *r == first {
                DeliveryResult::Delivered
            } else {
                DeliveryResult::TransportFailed("timeout".into())
            }
        })
        .unwrap();
    backlog.append(&reading(3)).unwrap();

    assert_eq!(records(&backlog), vec![reading(2), reading(3)]);
}

#[test]
fn backlog_directory_is_created_on_first_append() {
    let dir = tempfile::tempdir().unwrap();
    let mut backlog = FileBacklog::new(dir.path().join("state/nested/backlog.jsonl"));

    backlog.append(&reading(1)).unwrap();
    assert!(backlog.exists());
}
