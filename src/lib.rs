//! # emx-bundle
//!
//! Bundles a static site into one self-contained HTML file.
//!
//! Starting from an entry document, every referenced asset is embedded:
//!
//! ```text
//! <script src="script.js"></script>          ->  <script>…obfuscated code…</script>
//! <link rel="stylesheet" href="style.css">   ->  <style>…url(data:…)…</style>
//! <img src="img/logo.png">                   ->  <img src="data:image/png;base64,…">
//! ```
//!
//! ## Pipeline
//!
//! 1. **Load** the entry document from the source root ([`Loader`])
//! 2. **Inline** favicon, scripts, stylesheets and images ([`Inliner`])
//! 3. **Rewrite** the `const IMAGES = {...}` map of each script into a frozen
//!    object of data URIs ([`ImageMapRewriter`])
//! 4. **Obfuscate** scripts, stamping one with the build time ([`Obfuscator`])
//! 5. **Minify** the document ([`Minifier`])
//! 6. **Write** the result, creating the output directory if needed
//!
//! Any missing asset aborts the build before anything is written.
//!
//! ```no_run
//! use emx_bundle::{BundleConfig, Bundler};
//!
//! let report = Bundler::new(BundleConfig::default()).build()?;
//! println!("{} bytes", report.bytes);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod bundler;
pub mod canonical;
pub mod config;
pub mod error;
pub mod image_map;
pub mod inliner;
pub mod loader;
pub mod minifier;
pub mod obfuscator;
pub mod rewrite;
pub mod stamp;
pub mod writer;

pub use bundler::{Bundle, BuildReport, Bundler};
pub use config::BundleConfig;
pub use error::BundleError;
pub use image_map::{ImageMap, ImageMapRewriter};
pub use inliner::{InlineStats, Inliner};
pub use loader::{DataUri, Loader};
pub use minifier::{Minifier, MinifyOptions};
pub use obfuscator::{ObfuscateOptions, Obfuscator};
pub use stamp::BuildStamp;
