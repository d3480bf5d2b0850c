//! Confirmation and selection prompts.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};

/// Reads answers to confirmation questions from a line-oriented input.
pub struct Prompt<R> {
    input: R,
}

impl<R: BufRead> Prompt<R> {
    pub const fn new(input: R) -> Self {
        Self { input }
    }

    /// Writes `question [y/N]: ` and reads one line.
    ///
    /// Only `y` or `yes` (any case) confirm; end of input declines.
    pub fn confirm<W: Write>(&mut self, writer: &mut W, question: &str) -> Result<bool> {
        write!(writer, "{question} [y/N]: ")?;
        writer.flush()?;
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .context("failed to read confirmation")?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    /// Lists `options` numbered from 1 and returns the index of the chosen one.
    pub fn select<W: Write>(
        &mut self,
        writer: &mut W,
        title: &str,
        options: &[&str],
    ) -> Result<usize> {
        writeln!(writer, "{title}")?;
        writeln!(writer)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(writer, "  {}. {option}", i + 1)?;
        }
        writeln!(writer)?;
        write!(writer, "Enter number (1-{}): ", options.len())?;
        writer.flush()?;
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .context("failed to read selection")?;
        match answer.trim().parse::<usize>() {
            Ok(choice) if (1..=options.len()).contains(&choice) => Ok(choice - 1),
            _ => bail!("invalid selection: choose 1-{}", options.len()),
        }
    }
}
