//! Run command (scan + resolve + link).

use crate::commands::phases::{link_store, resolve_store, scan_store};
use crate::config::ScanConfig;
use crate::error::{DeckError, Result};
use crate::linker::LinkSummary;
use crate::logging::Logger;
use crate::resolver::ResolveSummary;
use crate::scanner::ScanSummary;
use crate::store::FileStore;

/// Results of every phase of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub scan: ScanSummary,
    pub resolve: ResolveSummary,
    pub link: LinkSummary,
}

pub struct Run<'a> {
    pub(crate) config: &'a ScanConfig,
    pub(crate) log: &'a Logger,
    pub(crate) dry_run: bool,
}

#[derive(Default)]
pub struct RunBuilder<'a> {
    config: Option<&'a ScanConfig>,
    log: Option<&'a Logger>,
    dry_run: bool,
}

impl<'a> Run<'a> {
    pub fn builder() -> RunBuilder<'a> {
        RunBuilder::new()
    }

    /// Execute the full pipeline.
    ///
    /// Phases run strictly in order over one open store. The store is flushed
    /// after the scan and after resolution, so a failed link phase can be
    /// retried with `deckhand link` without rescanning.
    pub fn run(self) -> Result<RunSummary> {
        self.log.info("🧭 Deduplicating (scan + resolve + link)...");

        let mut store = FileStore::open_or_reset(self.config.store_path(), self.log)?;
        let scan = scan_store(&mut store, self.config, self.log)?;
        let resolve = resolve_store(&mut store, self.log)?;
        let link = link_store(&store, self.config, self.log, self.dry_run)?;

        self.log.info("🧭 Done");

        Ok(RunSummary {
            scan,
            resolve,
            link,
        })
    }
}

impl<'a> RunBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: &'a ScanConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn log(mut self, log: &'a Logger) -> Self {
        self.log = Some(log);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn build(self) -> Result<Run<'a>> {
        Ok(Run {
            config: self.config.ok_or_else(|| DeckError::Config {
                message: "config is required".to_string(),
            })?,
            log: self.log.ok_or_else(|| DeckError::Config {
                message: "log is required".to_string(),
            })?,
            dry_run: self.dry_run,
        })
    }
}
