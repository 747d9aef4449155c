//! Diagnostic scheduler report.

use std::fmt;

use serde::Serialize;

/// Who is asking, and what the CPU pool looks like to them.
///
/// Displays as `caller/free_tokens/ready_len/ready_head`, with `none` for an
/// empty ready queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerReport {
    /// Calling logical thread, or `-` for any other OS thread.
    pub caller: String,
    /// Unallocated CPU tokens.
    pub free_tokens: usize,
    /// Threads queued for a token.
    pub ready_len: usize,
    /// Thread at the head of the ready queue.
    pub ready_head: Option<String>,
}

impl fmt::Display for SchedulerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.caller,
            self.free_tokens,
            self.ready_len,
            self.ready_head.as_deref().unwrap_or("none")
        )
    }
}
