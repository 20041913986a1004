//! emx-bundle CLI
//!
//! Bundle a static site into a single HTML file. Run without arguments to
//! build `src/index.html` into `dist/index.html`.

use anyhow::Result;
use clap::Parser;
use emx_bundle::config::{
    DEFAULT_ENTRY, DEFAULT_FAVICON, DEFAULT_IMAGE_MAP, DEFAULT_OUTPUT, DEFAULT_SOURCE_ROOT,
    DEFAULT_STAMP_SCRIPT, DEFAULT_TIMEZONE,
};
use emx_bundle::writer::write_to;
use emx_bundle::{BundleConfig, Bundler, MinifyOptions, ObfuscateOptions};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emx-bundle")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Bundle a static site into one self-contained HTML file")]
struct Cli {
    /// Directory holding the entry document and its assets
    #[arg(short = 's', long, default_value = DEFAULT_SOURCE_ROOT)]
    src: PathBuf,

    /// Entry document, relative to the source directory
    #[arg(short = 'e', long, default_value = DEFAULT_ENTRY)]
    entry: String,

    /// Output file
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT)]
    out: PathBuf,

    /// Write the bundle to stdout instead of the output file
    #[arg(long)]
    stdout: bool,

    /// Favicon href to inline
    #[arg(long, default_value = DEFAULT_FAVICON)]
    favicon: String,

    /// Script that gets the build timestamp appended
    #[arg(long, default_value = DEFAULT_STAMP_SCRIPT)]
    stamp_script: String,

    /// Do not append a build timestamp to any script
    #[arg(long)]
    no_stamp: bool,

    /// Name of the in-script image map constant
    #[arg(long, default_value = DEFAULT_IMAGE_MAP)]
    image_map: String,

    /// Timezone of the build timestamp
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Seed for obfuscation
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Inline scripts without obfuscating them
    #[arg(long)]
    no_obfuscate: bool,

    /// Write the inlined document without minifying it
    #[arg(long)]
    no_minify: bool,

    /// Keep top-level script names, e.g. for inline event handlers
    #[arg(long)]
    keep_names: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> BundleConfig {
        BundleConfig {
            source_root: self.src,
            entry: self.entry,
            output: self.out,
            favicon: Some(self.favicon),
            stamp_script: if self.no_stamp { None } else { Some(self.stamp_script) },
            image_map_name: self.image_map,
            timezone: self.timezone,
            obfuscate: if self.no_obfuscate {
                None
            } else {
                Some(ObfuscateOptions {
                    seed: self.seed,
                    ..Default::default()
                })
            },
            minify: if self.no_minify {
                None
            } else {
                Some(MinifyOptions {
                    shorten_top_level: !self.keep_names,
                    ..Default::default()
                })
            },
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("EMX_BUNDLE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = cli.stdout;
    let bundler = Bundler::new(cli.into_config());

    if stdout {
        let bundle = bundler.bundle()?;
        write_to(io::stdout().lock(), &bundle.html)?;
    } else {
        let report = bundler.build()?;
        tracing::debug!(
            output = %report.output.display(),
            bytes = report.bytes,
            scripts = report.stats.scripts,
            stylesheets = report.stats.stylesheets,
            images = report.stats.images,
            image_map_entries = report.stats.image_map_entries,
            "Bundle written"
        );
    }

    Ok(())
}
