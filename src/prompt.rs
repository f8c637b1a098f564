//! Interactive yes/no confirmation over arbitrary streams.
use std::io::{BufRead, Write};

use crate::error::InitError;

/// Ask `question` on `writer` and read answers from `reader` until one is
/// recognised.
///
/// Accepts `y`/`yes` and `n`/`no`, case-insensitively. Anything else repeats
/// the question.
///
/// # Errors
///
/// Returns [`InitError::PromptClosed`] when the input ends before an answer,
/// or an I/O error from either stream.
pub fn ask_confirm(
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
    question: &str,
) -> anyhow::Result<bool> {
    loop {
        write!(writer, "{question} [y/n]: ")?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(InitError::PromptClosed.into());
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {}
        }
    }
}
