//! `numh` is a command line tool that numbers the headings of markdown
//! documents, the way word processors number outline sections.

mod cli;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
