use std::path::PathBuf;

use clap::Parser;
use numbering::{MarkdownDocument, storage::settings_to_compact_front_matter_value};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Display the effective numbering settings of a document")]
pub struct Show {
    /// The markdown file to inspect
    path: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let document = MarkdownDocument::load(&self.path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", self.path.display()))?;

        let defaults = super::load_defaults(&self.path);
        let settings = document.settings_or_alternative(&defaults);

        match self.output {
            OutputFormat::Pretty => Self::output_pretty(&settings),
            OutputFormat::Json => Self::output_json(&settings)?,
        }

        Ok(())
    }

    fn output_pretty(settings: &numbering::NumberingSettings) {
        println!("{}", "Numbering".dim());
        println!("  Enabled:         {}", !settings.off);
        println!("  Automatic:       {}", settings.auto);
        println!("  First level:     {}", settings.first_level);
        println!("  Max level:       {}", settings.max_level);
        println!("  Skip top level:  {}", settings.skip_top_level);
        println!("  Style (level 1): {}", settings.style_level_1);
        println!("  Style (other):   {}", settings.style_level_other);
        if !settings.start_at.is_empty() {
            println!("  Start at:        {}", settings.start_at);
        }
        if !settings.separator.is_empty() {
            println!("  Separator:       {:?}", settings.separator);
        }
        if !settings.prepend_value.is_empty() {
            println!("  Prepend:         {:?}", settings.prepend_value);
        }
        if let Some(contents) = &settings.contents {
            println!("  Contents at:     {}", contents.as_str());
        }
        if let Some(skip) = &settings.skip_headings {
            println!("  Skip headings:   {}", skip.as_str());
        }

        println!();
        println!("{}", "Front matter".dim());
        println!(
            "  number headings: {}",
            settings_to_compact_front_matter_value(settings)
        );
    }

    fn output_json(settings: &numbering::NumberingSettings) -> anyhow::Result<()> {
        use serde_json::json;

        let output = json!({
            "off": settings.off,
            "auto": settings.auto,
            "first_level": settings.first_level,
            "max_level": settings.max_level,
            "skip_top_level": settings.skip_top_level,
            "style_level_1": settings.style_level_1.to_string(),
            "style_level_other": settings.style_level_other.to_string(),
            "start_at": settings.start_at,
            "prepend_value": settings.prepend_value,
            "contents": settings.contents.as_ref().map(numbering::domain::BlockId::as_str),
            "skip_headings": settings.skip_headings.as_ref().map(numbering::domain::BlockId::as_str),
            "separator": settings.separator,
            "compact": settings_to_compact_front_matter_value(settings),
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
