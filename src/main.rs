//! # deckhand CLI
//!
//! Replaces duplicate files in a content tree with relative symlinks to one
//! canonical copy.
//!
//! ## Commands
//!
//! - **scan**: Hash every regular file under the root and rebuild the store
//! - **resolve**: Pick one canonical record per content
//! - **link**: Replace duplicates with relative symlinks
//! - **run**: scan + resolve + link
//! - **report**: Verify the store and print totals
//! - **clear**: Delete the store file
//!
//! ## Quick Start
//!
//! ```bash
//! # See what would happen
//! deckhand --root /srv/media/library run --dry-run
//!
//! # Do it
//! deckhand --root /srv/media/library run
//! deckhand --root /srv/media/library report
//! ```
//!
//! ## Environment Variables
//!
//! - `DECKHAND_ROOT`: Root of the content tree (default: .)
//! - `DECKHAND_STORE_PATH`: Custom store file location
//! - `DECKHAND_VERBOSE`: Enable verbose output
//! - `DECKHAND_QUIET`: Silence all output except errors
//! - `DECKHAND_DRY_RUN`: Dry run for `link` and `run`

use std::io::IsTerminal;

use clap::Parser;
use deckhand::cli::Cli;

fn main() -> miette::Result<()> {
    // Install miette's fancy panic and error report handler
    miette::set_panic_hook();

    // Plain output when stderr is not a terminal (CI, logs, cron)
    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let cli = Cli::parse();

    deckhand::commands::execute(&cli).map_err(Into::into)
}
