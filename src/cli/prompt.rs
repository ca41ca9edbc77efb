//! Confirmation prompts before files are rewritten.

use dialoguer::Confirm;

/// Asks the user whether computed changes should be written back.
///
/// Commands take this as a capability so tests can answer without a
/// terminal.
pub trait PersistPrompt {
    /// Present the summary and return whether to persist.
    fn confirm(&self, summary: &str) -> anyhow::Result<bool>;
}

/// Interactive prompt backed by the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl PersistPrompt for TerminalPrompt {
    fn confirm(&self, summary: &str) -> anyhow::Result<bool> {
        let confirmed = Confirm::new()
            .with_prompt(format!("{summary}. Write changes?"))
            .default(true)
            .interact()?;
        Ok(confirmed)
    }
}
