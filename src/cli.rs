use std::path::{Path, PathBuf};

mod number;
mod prompt;
mod show;
mod terminal;

use clap::ArgAction;
use numbering::domain::{
    BlockId, NumberingSettings, NumberingStyle, SettingsOverrides,
    is_valid_numbering_value_string,
};
use tracing::instrument;

use self::{
    number::{Number, Remove},
    show::Show,
};

/// The name of the defaults file looked up next to the notes.
const DEFAULTS_FILE: &str = "numbering.toml";

/// Parse a numbering style from a single letter (`1`, `A`, `a`, `I`, `i`).
fn parse_style(s: &str) -> Result<NumberingStyle, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Parse a block ID setting such as `^toc`.
fn parse_block_id(s: &str) -> Result<BlockId, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Load the numbering defaults for a target path.
///
/// Looks for a `numbering.toml` next to the target (or in the directory
/// itself, when the target is a directory). Missing or unreadable files
/// fall back to the built-in defaults.
fn load_defaults(target: &Path) -> NumberingSettings {
    let dir = if target.is_dir() {
        target
    } else {
        target.parent().unwrap_or(target)
    };

    let path = dir.join(DEFAULTS_FILE);
    NumberingSettings::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load defaults: {e}");
        NumberingSettings::default()
    })
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run()
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Number the headings of a file or every markdown file in a directory
    Number(Number),

    /// Strip numbering labels from headings
    Remove(Remove),

    /// Show the effective numbering settings of a document
    Show(Show),

    /// Change the numbering settings stored in a document's front matter
    Set(Set),

    /// Create a numbering.toml defaults file
    Init(Init),
}

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Number(command) => command.run()?,
            Self::Remove(command) => command.run()?,
            Self::Show(command) => command.run()?,
            Self::Set(command) => command.run()?,
            Self::Init(command) => command.run()?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {
    /// The directory to place the defaults file in
    #[arg(default_value = ".")]
    dir: PathBuf,
}

impl Init {
    #[instrument]
    fn run(self) -> anyhow::Result<()> {
        use self::terminal::Colorize;

        let path = self.dir.join(DEFAULTS_FILE);
        if path.exists() {
            anyhow::bail!("Defaults file already exists at {}", path.display());
        }

        NumberingSettings::default()
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to write defaults file: {e}"))?;

        println!(
            "{}",
            format!("Created {}", path.display()).success()
        );
        println!();
        println!("Next steps:");
        println!("  numh number <file-or-directory>");

        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Set {
    /// The markdown file to update
    path: PathBuf,

    /// Disable numbering for the document
    #[arg(long)]
    off: bool,

    /// Re-enable numbering for the document
    #[arg(long, conflicts_with = "off")]
    on: bool,

    /// Renumber documents automatically during directory passes
    #[arg(long)]
    auto: Option<bool>,

    /// The first heading level to number (1-6)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=6))]
    first_level: Option<u32>,

    /// The deepest heading level to number (1-6)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=6))]
    max_level: Option<u32>,

    /// Leave level-1 headings unnumbered
    #[arg(long)]
    skip_top_level: Option<bool>,

    /// Numbering style for level-1 headings (1, A, a, I or i)
    #[arg(long, value_parser = parse_style)]
    style_1: Option<NumberingStyle>,

    /// Numbering style for deeper headings (1, A, a, I or i)
    #[arg(long, value_parser = parse_style)]
    style_other: Option<NumberingStyle>,

    /// The value the first counter starts at, e.g. `3` or `C`
    #[arg(long)]
    start_at: Option<String>,

    /// Text inserted between the number and the heading text, e.g. `:`
    #[arg(long)]
    separator: Option<String>,

    /// Text inserted before the number, e.g. `Chapter `
    #[arg(long)]
    prepend: Option<String>,

    /// Block ID of a table-of-contents heading to leave unnumbered
    /// (an empty value clears the setting)
    #[arg(long)]
    contents: Option<String>,

    /// Block ID of headings to skip entirely
    /// (an empty value clears the setting)
    #[arg(long)]
    skip: Option<String>,

    /// Renumber the document immediately after saving the settings
    #[arg(long)]
    apply: bool,
}

impl Set {
    #[instrument]
    fn run(self) -> anyhow::Result<()> {
        use numbering::MarkdownDocument;

        use self::terminal::Colorize;

        let overrides = self.overrides()?;

        let mut document = MarkdownDocument::load(&self.path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", self.path.display()))?;

        let defaults = load_defaults(&self.path);
        let settings = document
            .settings_or_alternative(&defaults)
            .with_overrides(overrides);

        document.save_settings(&settings);

        if self.apply {
            document.apply_numbering(&settings);
        }

        document.save(&self.path)?;

        println!(
            "{}",
            format!("Updated settings in {}", self.path.display()).success()
        );
        println!(
            "  number headings: {}",
            numbering::storage::settings_to_compact_front_matter_value(&settings)
        );

        Ok(())
    }

    fn overrides(&self) -> anyhow::Result<SettingsOverrides> {
        if let Some(start_at) = &self.start_at {
            if !start_at.is_empty() && !is_valid_numbering_value_string(start_at) {
                anyhow::bail!("start-at value must not contain a comma");
            }
        }
        if let Some(separator) = &self.separator {
            if separator.contains(',') {
                anyhow::bail!("separator must not contain a comma");
            }
        }

        let block_id = |value: &str| -> anyhow::Result<Option<BlockId>> {
            if value.is_empty() {
                Ok(None)
            } else {
                parse_block_id(value).map(Some).map_err(anyhow::Error::msg)
            }
        };

        Ok(SettingsOverrides {
            off: self.off.then_some(true).or(self.on.then_some(false)),
            auto: self.auto,
            first_level: self.first_level,
            max_level: self.max_level,
            skip_top_level: self.skip_top_level,
            style_level_1: self.style_1,
            style_level_other: self.style_other,
            start_at: self.start_at.clone(),
            prepend_value: self.prepend.clone(),
            contents: self.contents.as_deref().map(&block_id).transpose()?,
            skip_headings: self.skip.as_deref().map(&block_id).transpose()?,
            separator: self.separator.clone(),
        })
    }
}
