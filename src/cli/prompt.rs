//! Confirmation prompt shown before any network access

use std::io::{self, BufRead, Write};

use crate::constants::prompt::ACCEPTED_ANSWERS;

/// Ask whether `missing` archives should be downloaded
///
/// Reads a single line. Only `y` or `yes` (any case, surrounding whitespace
/// ignored) confirms; anything else, including end of input, declines.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, missing: usize) -> io::Result<bool> {
    write!(
        output,
        "{} archives are missing. Download and extract them now? [y/N] ",
        missing
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_accepted(&answer))
}

/// Whether `answer` counts as a confirmation
pub fn is_accepted(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    ACCEPTED_ANSWERS.contains(&answer.as_str())
}
