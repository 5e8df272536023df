//! Single port check and its exit codes

use serial_usage::{Pid, Usage};

/// Exit code for hard failures (no /proc, missing port, bad settings)
pub const EXIT_ERROR: i32 = -2;

/// Outcome of checking one port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Free,
    InUse(Vec<Pid>),
    /// Nobody found, but some processes could not be inspected
    Uncertain,
}

impl Verdict {
    /// Users found always mean in use; an incomplete scan only matters
    /// when certainty is required
    pub fn from_usage(usage: &Usage, require_certain: bool) -> Self {
        if !usage.pids.is_empty() {
            Verdict::InUse(usage.pids.clone())
        } else if require_certain && !usage.certain {
            Verdict::Uncertain
        } else {
            Verdict::Free
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Free => 0,
            Verdict::InUse(_) => -1,
            Verdict::Uncertain => -3,
        }
    }

    pub fn message(&self, port: &str) -> String {
        match self {
            Verdict::Free => format!("{port} is free"),
            Verdict::InUse(pids) if pids.len() == 1 => {
                format!("File {port} is used by {}", pids[0])
            }
            Verdict::InUse(pids) => format!("File {port} is used by {pids:?}"),
            Verdict::Uncertain => "Uncertain is free".to_string(),
        }
    }
}
