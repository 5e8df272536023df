//! Printout formatting for snapshots and changes

use std::io::{self, Write};

use serial_usage::{Entry, Snapshot, SnapshotDiff};

/// Device line followed by tab-indented stable link names
pub fn format_entry(entry: &Entry) -> String {
    let mut line = entry.device_file.clone();
    match entry.used_by_pids.as_slice() {
        [] => {}
        [pid] => line.push_str(&format!(" (used by PID {pid})")),
        pids => line.push_str(&format!(" (used by PIDs {pids:?})")),
    }
    if !entry.certain {
        line.push_str(" (uncertain)");
    }
    line.push('\n');

    for link in [&entry.device_by_id, &entry.device_by_path]
        .into_iter()
        .flatten()
    {
        line.push_str(&format!("\t{link}\n"));
    }
    line
}

pub fn print_snapshot(out: &mut impl Write, snapshot: &Snapshot, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, snapshot)?;
        return writeln!(out);
    }
    for (i, entry) in snapshot.iter().enumerate() {
        write!(out, "{}: {}", i, format_entry(entry))?;
    }
    Ok(())
}

pub fn print_diff(out: &mut impl Write, diff: &SnapshotDiff, json: bool) -> io::Result<()> {
    if diff.is_empty() {
        return Ok(());
    }
    if json {
        serde_json::to_writer(&mut *out, diff)?;
        return writeln!(out);
    }
    for entry in &diff.added {
        write!(out, "\nADDED:\n{}\n", format_entry(entry))?;
    }
    for entry in &diff.removed {
        write!(out, "\n{} removed\n", entry.device_file)?;
    }
    for entry in &diff.updated {
        write!(out, "\nUPDATED:\n{}", format_entry(entry))?;
    }
    out.flush()
}
