//! Bundle pipeline

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::BundleConfig;
use crate::inliner::{InlineStats, Inliner};
use crate::loader::Loader;
use crate::minifier::Minifier;
use crate::stamp::BuildStamp;
use crate::writer::write_output;

/// Summary of a finished build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// File written
    pub output: PathBuf,
    /// Size of the written document in bytes
    pub bytes: usize,
    /// What was inlined
    pub stats: InlineStats,
}

/// A bundled document that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub html: String,
    pub stats: InlineStats,
}

/// Drives the load → inline → minify → write pipeline
pub struct Bundler {
    config: BundleConfig,
    stamp: Option<BuildStamp>,
}

impl Bundler {
    /// Create a bundler; the build stamp defaults to the current time
    pub fn new(config: BundleConfig) -> Self {
        Self {
            config,
            stamp: None,
        }
    }

    /// Use a fixed build stamp instead of the current time
    pub fn with_stamp(mut self, stamp: BuildStamp) -> Self {
        self.stamp = Some(stamp);
        self
    }

    fn resolve_stamp(&self) -> Result<Option<BuildStamp>> {
        if self.config.stamp_script.is_none() {
            return Ok(None);
        }
        match self.stamp {
            Some(stamp) => Ok(Some(stamp)),
            None => Ok(Some(BuildStamp::now(&self.config.timezone)?)),
        }
    }

    /// Produce the final document without writing it
    pub fn bundle(&self) -> Result<Bundle> {
        info!("Building...");
        let loader = Loader::new(&self.config.source_root);
        let html = loader
            .read_text(&self.config.entry)
            .with_context(|| format!("Failed to read entry document {}", self.config.entry))?;

        let mut inliner = Inliner::new(&self.config, self.resolve_stamp()?)?;
        let html = inliner.inline(&html)?;

        let html = match &self.config.minify {
            Some(options) => {
                info!("Minifying...");
                Minifier::new(options.clone()).minify(&html)?
            }
            None => html,
        };

        Ok(Bundle {
            html,
            stats: inliner.stats(),
        })
    }

    /// Produce the final document and write it to the configured output
    pub fn build(&self) -> Result<BuildReport> {
        let bundle = self.bundle()?;

        info!("Writing to file...");
        write_output(&self.config.output, &bundle.html)?;
        info!("Done!");

        Ok(BuildReport {
            output: self.config.output.clone(),
            bytes: bundle.html.len(),
            stats: bundle.stats,
        })
    }
}
