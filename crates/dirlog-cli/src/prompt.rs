/// Line prompts over arbitrary reader/writer pairs.
use std::io::{self, BufRead, Write};

/// Print `label` (no newline), then read one line.
///
/// The line ending is stripped but other whitespace is kept, since
/// directory names may legitimately start or end with spaces. End of
/// input yields an empty string.
pub fn prompt(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> io::Result<String> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
