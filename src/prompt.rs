//! Interactive confirmation before destructive actions.

use std::io::{self, BufRead, Write};

/// Asks the user whether to proceed.
///
/// Returning `false` must leave everything untouched. [`StdinConfirm`]
/// accepts only `yes` (any case); a blank answer is not taken as a decline
/// but asks again, while any other word or end of input declines.
pub trait Confirm {
    /// Ask `message`; `true` only on explicit agreement.
    fn confirm(&self, message: &str) -> bool;
}

/// Ask `prompt` on `output` and read the answer from `input`.
///
/// Only a literal `yes` (any case) confirms. `no` or any other word
/// declines; a blank line asks again. End of input declines.
///
/// # Errors
///
/// Returns any I/O error from reading or writing.
pub fn prompt_confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<bool> {
    let mut line = String::new();

    loop {
        line.clear();

        write!(output, "{} (yes/no): ", prompt)?;
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match line.trim().to_lowercase().as_str() {
            "yes" => return Ok(true),
            "" => continue,
            _ => return Ok(false),
        }
    }
}

/// Confirmation read from the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        match prompt_confirm(&mut input, &mut output, message) {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}
