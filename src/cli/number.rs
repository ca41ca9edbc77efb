use std::{path::PathBuf, time::Duration};

use clap::Parser;
use indicatif::ProgressBar;
use numbering::{
    Directory, MarkdownDocument,
    storage::{NumberingOutcome, PassOptions, PassReport},
};
use tracing::instrument;

use super::{
    load_defaults,
    prompt::{PersistPrompt, TerminalPrompt},
    terminal::{Colorize, fit},
};

#[derive(Debug, Parser)]
#[command(about = "Number the headings of markdown documents")]
pub struct Number {
    /// The file or directory to process
    path: PathBuf,

    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Only process documents whose settings carry the auto flag
    #[arg(long)]
    auto_only: bool,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Number {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let options = PassOptions {
            dry_run: self.dry_run,
            only_auto: self.auto_only,
            remove: false,
        };
        run_pass(&self.path, options, self.yes, &TerminalPrompt)
    }
}

#[derive(Debug, Parser)]
#[command(about = "Strip numbering labels from markdown headings")]
pub struct Remove {
    /// The file or directory to process
    path: PathBuf,

    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Remove {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let options = PassOptions {
            dry_run: self.dry_run,
            only_auto: false,
            remove: true,
        };
        run_pass(&self.path, options, self.yes, &TerminalPrompt)
    }
}

fn run_pass(
    path: &std::path::Path,
    options: PassOptions,
    yes: bool,
    prompt: &dyn PersistPrompt,
) -> anyhow::Result<()> {
    let defaults = load_defaults(path);

    if path.is_dir() {
        run_directory_pass(path, &defaults, options, yes, prompt)
    } else {
        run_file_pass(path, &defaults, options, yes, prompt)
    }
}

fn run_file_pass(
    path: &std::path::Path,
    defaults: &numbering::NumberingSettings,
    options: PassOptions,
    yes: bool,
    prompt: &dyn PersistPrompt,
) -> anyhow::Result<()> {
    let mut document = MarkdownDocument::load(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;

    let settings = document.settings_or_alternative(defaults);
    if options.only_auto && !settings.auto {
        println!("{}", "Skipped: document is not marked auto.".dim());
        return Ok(());
    }

    let outcome = if options.remove {
        document.remove_numbering(&settings)
    } else {
        document.apply_numbering(&settings)
    };

    if !outcome.changed() {
        println!("{}", "Nothing to do.".success());
        return Ok(());
    }

    let summary = outcome_summary(&outcome);
    if options.dry_run {
        println!("{summary} (dry run)");
        return Ok(());
    }

    if !yes && !prompt.confirm(&summary)? {
        println!("{}", "Cancelled".warning());
        return Ok(());
    }

    document.save(path)?;
    println!("{}", format!("{summary} in {}", fit(&path.display().to_string())).success());

    Ok(())
}

fn run_directory_pass(
    path: &std::path::Path,
    defaults: &numbering::NumberingSettings,
    options: PassOptions,
    yes: bool,
    prompt: &dyn PersistPrompt,
) -> anyhow::Result<()> {
    // First pass is always dry: it produces the preview the user confirms.
    let preview_options = PassOptions {
        dry_run: true,
        ..options
    };

    let spinner = progress_spinner(path);
    let report = Directory::new(path.to_path_buf()).apply(defaults, preview_options)?;
    spinner.finish_and_clear();

    print_report(&report);

    if report.changed_files() == 0 {
        println!("{}", "Nothing to do.".success());
        return Ok(());
    }

    if options.dry_run {
        println!("{}", "(dry run, nothing written)".dim());
        return Ok(());
    }

    let summary = report_summary(&report);
    if !yes && !prompt.confirm(&summary)? {
        println!("{}", "Cancelled".warning());
        return Ok(());
    }

    let spinner = progress_spinner(path);
    Directory::new(path.to_path_buf()).apply(defaults, options)?;
    spinner.finish_and_clear();

    println!("{}", summary.success());

    Ok(())
}

fn progress_spinner(path: &std::path::Path) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("processing {}", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn print_report(report: &PassReport) {
    for file in &report.files {
        if file.outcome.changed() {
            println!(
                "  {}  {}",
                fit(&file.path.display().to_string()),
                outcome_summary(&file.outcome).dim()
            );
        }
    }
    if report.skipped > 0 {
        println!(
            "{}",
            format!("Skipped {} files not marked auto", report.skipped).dim()
        );
    }
}

fn outcome_summary(outcome: &NumberingOutcome) -> String {
    match (outcome.labeled, outcome.cleared) {
        (0, cleared) => format!("Removed numbering from {cleared} headings"),
        (labeled, 0) => format!("Numbered {labeled} headings"),
        (labeled, cleared) => {
            format!("Numbered {labeled} headings, cleared {cleared}")
        }
    }
}

fn report_summary(report: &PassReport) -> String {
    format!(
        "Will change {} headings across {} files",
        report.changed_headings(),
        report.changed_files()
    )
}
