//! Bundle configuration

use std::path::PathBuf;

use crate::minifier::MinifyOptions;
use crate::obfuscator::ObfuscateOptions;

/// Default source root holding the entry HTML and its assets
pub const DEFAULT_SOURCE_ROOT: &str = "src";
/// Default entry document, relative to the source root
pub const DEFAULT_ENTRY: &str = "index.html";
/// Default output file
pub const DEFAULT_OUTPUT: &str = "dist/index.html";
/// Default favicon reference as written in the entry document
pub const DEFAULT_FAVICON: &str = "./img/favicon.png";
/// Script that receives the build timestamp statement
pub const DEFAULT_STAMP_SCRIPT: &str = "script.js";
/// Name of the image map constant rewritten inside scripts
pub const DEFAULT_IMAGE_MAP: &str = "IMAGES";
/// Timezone used to render the build timestamp
pub const DEFAULT_TIMEZONE: &str = "America/Toronto";

/// Configuration for a bundle run
///
/// `BundleConfig::default()` reproduces the fixed layout: `src/index.html` in,
/// `dist/index.html` out.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// Directory every asset reference is resolved against
    pub source_root: PathBuf,
    /// Entry HTML file, relative to `source_root`
    pub entry: String,
    /// Output file path
    pub output: PathBuf,
    /// Favicon `href` value to inline, if any
    pub favicon: Option<String>,
    /// Script `src` value that gets the build timestamp appended, if any
    pub stamp_script: Option<String>,
    /// Constant name of the in-script image map
    pub image_map_name: String,
    /// IANA timezone for the build timestamp
    pub timezone: String,
    /// Obfuscation options; `None` inlines scripts untouched
    pub obfuscate: Option<ObfuscateOptions>,
    /// Minification options; `None` writes the inlined document as is
    pub minify: Option<MinifyOptions>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from(DEFAULT_SOURCE_ROOT),
            entry: DEFAULT_ENTRY.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            favicon: Some(DEFAULT_FAVICON.to_string()),
            stamp_script: Some(DEFAULT_STAMP_SCRIPT.to_string()),
            image_map_name: DEFAULT_IMAGE_MAP.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            obfuscate: Some(ObfuscateOptions::default()),
            minify: Some(MinifyOptions::default()),
        }
    }
}

impl BundleConfig {
    /// Create a configuration rooted at `source_root` writing to `output`
    pub fn new(source_root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    /// Whether `src` names the script that receives the build timestamp
    pub fn is_stamp_script(&self, src: &str) -> bool {
        match &self.stamp_script {
            Some(name) => src.trim_start_matches("./") == name.trim_start_matches("./"),
            None => false,
        }
    }
}
