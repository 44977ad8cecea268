//! Operator approval for publication.
//!
//! The publication stage asks an [`Approver`] before every post. The CLI
//! picks the implementation: [`InteractiveApprover`] on a terminal,
//! [`AutoApprove`] for `--yes`, [`PolicyApprover`] for `--limit`.

use std::io::{BufRead, Write};

use newsrelay_shared::{NewsRelayError, Result, WorkItem};

/// What the operator decided for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    /// Leave the record for a later run.
    Skip,
    /// Stop the publication run; nothing further is posted.
    Abort,
}

/// Everything the operator sees before deciding.
pub struct ApprovalRequest<'a> {
    pub item: &'a WorkItem,
    pub artifact_url: &'a str,
    pub message: &'a str,
}

/// Decides whether a record gets posted.
pub trait Approver {
    fn decide(&mut self, request: &ApprovalRequest<'_>) -> Result<Decision>;
}

/// Approves everything.
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn decide(&mut self, _request: &ApprovalRequest<'_>) -> Result<Decision> {
        Ok(Decision::Approve)
    }
}

/// Approves the first `max` records of a run and skips the rest.
pub struct PolicyApprover {
    max: usize,
    approved: usize,
}

impl PolicyApprover {
    pub fn new(max: usize) -> Self {
        Self { max, approved: 0 }
    }
}

impl Approver for PolicyApprover {
    fn decide(&mut self, _request: &ApprovalRequest<'_>) -> Result<Decision> {
        if self.approved >= self.max {
            return Ok(Decision::Skip);
        }
        self.approved += 1;
        Ok(Decision::Approve)
    }
}

/// Prompts on `output` and reads `y`, `n`, or `q` from `input`.
///
/// End of input counts as abort.
pub struct InteractiveApprover<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveApprover<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn show(&mut self, request: &ApprovalRequest<'_>) -> std::io::Result<()> {
        let item = request.item;
        writeln!(self.output)?;
        writeln!(self.output, "  {}", item.article_title)?;
        if let Some(copy) = item.composed_copy() {
            writeln!(self.output, "  title: {}", copy.title)?;
        }
        writeln!(self.output, "  page:  {}", request.artifact_url)?;
        writeln!(self.output, "  ---")?;
        for line in request.message.lines() {
            writeln!(self.output, "  {line}")?;
        }
        writeln!(self.output, "  ---")
    }
}

impl<R: BufRead, W: Write> Approver for InteractiveApprover<R, W> {
    fn decide(&mut self, request: &ApprovalRequest<'_>) -> Result<Decision> {
        self.show(request).map_err(console_error)?;

        loop {
            write!(self.output, "Post this? [y]es / [n]o / [q]uit: ").map_err(console_error)?;
            self.output.flush().map_err(console_error)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(console_error)? == 0 {
                return Ok(Decision::Abort);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Decision::Approve),
                "n" | "no" => return Ok(Decision::Skip),
                "q" | "quit" => return Ok(Decision::Abort),
                _ => {}
            }
        }
    }
}

fn console_error(e: std::io::Error) -> NewsRelayError {
    NewsRelayError::validation(format!("operator console unavailable: {e}"))
}
