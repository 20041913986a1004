//! Asset inlining
//!
//! Ordered textual passes over the entry document:
//!
//! 1. favicon `href` → data URI
//! 2. `<script src="..."></script>` → `<script>...</script>` (image map,
//!    build stamp and obfuscation applied to the file first)
//! 3. `<link rel="stylesheet" href="...">` → `<style>...</style>` with every
//!    CSS `url(...)` turned into a data URI
//! 4. every remaining `src="..."` → data URI
//! 5. adjacent `</script><script>` boundaries removed; every inlined script
//!    ends with `;` so merged scripts stay separate statements
//!
//! Scripts and stylesheets go first so the generic `src=` pass only meets
//! image attributes.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::BundleConfig;
use crate::image_map::ImageMapRewriter;
use crate::loader::Loader;
use crate::obfuscator::lexer::{tokenize, TokenKind};
use crate::obfuscator::Obfuscator;
use crate::rewrite::try_replace_all;
use crate::stamp::BuildStamp;

static RE_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<script\s+src="([^"]+)"\s*>\s*</script>"#).expect("script pattern is valid")
});

static RE_STYLESHEET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<link\s+rel="stylesheet"\s+href="([^"]+)"\s*/?>"#)
        .expect("stylesheet pattern is valid")
});

static RE_CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url\(([^)]+)\)").expect("css url pattern is valid"));

static RE_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src="([^"]+)""#).expect("src pattern is valid"));

static RE_SCRIPT_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</script>\s*<script>").expect("script boundary pattern is valid"));

/// Counts of what was inlined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStats {
    pub favicon: bool,
    pub scripts: usize,
    pub stylesheets: usize,
    pub css_urls: usize,
    pub images: usize,
    pub image_map_entries: usize,
}

/// Runs the inlining passes for one document
pub struct Inliner<'c> {
    config: &'c BundleConfig,
    loader: Loader,
    image_maps: ImageMapRewriter,
    obfuscator: Option<Obfuscator>,
    stamp: Option<BuildStamp>,
    stats: InlineStats,
}

impl<'c> Inliner<'c> {
    /// Create an inliner; `stamp` is appended to the configured stamp script
    pub fn new(config: &'c BundleConfig, stamp: Option<BuildStamp>) -> Result<Self> {
        Ok(Self {
            config,
            loader: Loader::new(&config.source_root),
            image_maps: ImageMapRewriter::new(&config.image_map_name)?,
            obfuscator: config.obfuscate.clone().map(Obfuscator::new),
            stamp,
            stats: InlineStats::default(),
        })
    }

    /// What has been inlined so far
    pub fn stats(&self) -> InlineStats {
        self.stats
    }

    /// Run every pass in order
    pub fn inline(&mut self, html: &str) -> Result<String> {
        let html = self.inline_favicon(html)?;
        let html = self.inline_scripts(&html)?;
        let html = self.inline_stylesheets(&html)?;
        let html = self.inline_images(&html)?;
        Ok(merge_adjacent_scripts(&html))
    }

    /// Replace the favicon reference with a data URI
    pub fn inline_favicon(&mut self, html: &str) -> Result<String> {
        let config = self.config;
        let favicon = match &config.favicon {
            Some(favicon) => favicon,
            None => return Ok(html.to_string()),
        };
        let pattern = Regex::new(&format!(r#"href="{}""#, regex::escape(favicon)))?;
        if !pattern.is_match(html) {
            return Ok(html.to_string());
        }

        info!("Adding favicon {}...", favicon);
        let uri = self
            .loader
            .data_uri(favicon)
            .with_context(|| format!("Failed to inline favicon {}", favicon))?;
        self.stats.favicon = true;
        Ok(pattern
            .replace_all(html, |_: &regex::Captures<'_>| format!("href=\"{}\"", uri))
            .into_owned())
    }

    /// Inline every external script
    pub fn inline_scripts(&mut self, html: &str) -> Result<String> {
        try_replace_all(&RE_SCRIPT, html, |caps| {
            let code = self.process_script(&caps[1])?;
            Ok(format!("<script>{}</script>", code))
        })
    }

    /// Load one script and apply the image map, build stamp and obfuscation
    pub fn process_script(&mut self, src: &str) -> Result<String> {
        info!("Adding script {}...", src);
        let code = self
            .loader
            .read_text(src)
            .with_context(|| format!("Failed to inline script {}", src))?;

        let (mut code, entries) = self
            .image_maps
            .rewrite(&code, &self.loader)
            .with_context(|| format!("Failed to rewrite image map in {}", src))?;
        self.stats.image_map_entries += entries;

        if self.config.is_stamp_script(src) {
            if let Some(stamp) = &self.stamp {
                code.push('\n');
                code.push_str(&stamp.log_statement());
            }
        }

        if let Some(obfuscator) = self.obfuscator.as_mut() {
            info!("Obfuscating {}...", src);
            code = obfuscator.obfuscate(&code);
        }
        terminate_script(&mut code);

        self.stats.scripts += 1;
        info!("Script {} done!", src);
        Ok(code)
    }

    /// Inline every stylesheet link as a `<style>` block
    pub fn inline_stylesheets(&mut self, html: &str) -> Result<String> {
        try_replace_all(&RE_STYLESHEET, html, |caps| {
            let href = &caps[1];
            info!("Adding stylesheet {}...", href);
            let css = self
                .loader
                .read_text(href)
                .with_context(|| format!("Failed to inline stylesheet {}", href))?;
            let css = self
                .rewrite_css_urls(&css)
                .with_context(|| format!("Failed to inline assets of stylesheet {}", href))?;
            self.stats.stylesheets += 1;
            info!("Finished stylesheet {}", href);
            Ok(format!("<style>{}</style>", css))
        })
    }

    /// Turn every `url(...)` of a stylesheet into a data URI
    pub fn rewrite_css_urls(&mut self, css: &str) -> Result<String> {
        try_replace_all(&RE_CSS_URL, css, |caps| {
            let reference = caps[1].trim().trim_matches(|c| c == '\'' || c == '"');
            if reference.starts_with("data:") {
                return Ok(caps[0].to_string());
            }
            debug!("Encoding stylesheet asset {}", reference);
            let uri = self.loader.data_uri(reference)?;
            self.stats.css_urls += 1;
            Ok(format!("url({})", uri))
        })
    }

    /// Turn every remaining `src="..."` into a data URI
    pub fn inline_images(&mut self, html: &str) -> Result<String> {
        try_replace_all(&RE_SRC, html, |caps| {
            let src = &caps[1];
            if src.starts_with("data:") {
                return Ok(caps[0].to_string());
            }
            info!("Adding image {}...", src);
            let uri = self
                .loader
                .data_uri(src)
                .with_context(|| format!("Failed to inline image {}", src))?;
            self.stats.images += 1;
            Ok(format!("src=\"{}\"", uri))
        })
    }
}

/// End a script with `;` so it cannot run into whatever follows it once
/// adjacent scripts are merged
pub fn terminate_script(code: &mut String) {
    let tokens = tokenize(code.as_str());
    let last = match tokens.iter().rev().find(|t| !t.is_trivia()) {
        Some(token) => token,
        None => return,
    };
    if last.is_punct(";") {
        return;
    }
    let ends_in_line_comment = tokens
        .last()
        .is_some_and(|t| t.kind == TokenKind::Comment && t.text.starts_with("//"));
    if ends_in_line_comment {
        code.push('\n');
    }
    code.push(';');
}

/// Join consecutive inlined scripts into one block
pub fn merge_adjacent_scripts(html: &str) -> String {
    RE_SCRIPT_BOUNDARY.replace_all(html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, BundleConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("img")).unwrap();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("img/favicon.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("img/logo.png"), [1u8, 2, 3]).unwrap();
        fs::write(root.join("img/bg.jpg"), [0xFF, 0xD8, 0xFF]).unwrap();
        fs::write(root.join("script.js"), "const IMAGES = {\n  'logo': 'img/logo.png'\n};\nshow(IMAGES.logo);").unwrap();
        fs::write(root.join("util.js"), "function show(x) { return x; }").unwrap();
        fs::write(root.join("css/style.css"), "body { background: url('img/bg.jpg'); }\n.a { background: url(data:image/gif;base64,AA==); }").unwrap();

        let config = BundleConfig {
            obfuscate: None,
            minify: None,
            ..BundleConfig::new(root, root.join("out/index.html"))
        };
        (dir, config)
    }

    #[test]
    fn test_favicon() {
        let (_dir, config) = site();
        let mut inliner = Inliner::new(&config, None).unwrap();
        let out = inliner
            .inline_favicon(r#"<link rel="icon" href="./img/favicon.png">"#)
            .unwrap();
        assert_eq!(out, r#"<link rel="icon" href="data:image/png;base64,iVBORw==">"#);
        assert!(inliner.stats().favicon);
    }

    #[test]
    fn test_scripts_inlined_with_image_map() {
        let (_dir, config) = site();
        let mut inliner = Inliner::new(&config, None).unwrap();
        let out = inliner
            .inline_scripts(r#"<script src="util.js"></script><script src="script.js"></script>"#)
            .unwrap();
        assert!(out.starts_with("<script>function show(x) { return x; };</script><script>"));
        assert!(out.contains(r#"const IMAGES = Object.freeze({"logo":"data:image/png;base64,AQID"});"#));
        assert_eq!(inliner.stats().scripts, 2);
        assert_eq!(inliner.stats().image_map_entries, 1);
    }

    #[test]
    fn test_stamp_only_on_designated_script() {
        let (_dir, config) = site();
        let at = chrono::DateTime::parse_from_rfc3339("2026-10-17T18:39:05Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let stamp = BuildStamp::new(at, "America/Toronto").unwrap();
        let mut inliner = Inliner::new(&config, Some(stamp)).unwrap();

        let stamped = inliner.process_script("script.js").unwrap();
        assert!(stamped.ends_with("\nconsole.log('Built on Sat, Oct 17, 2026, 2:39:05 PM EDT');"));

        let plain = inliner.process_script("util.js").unwrap();
        assert_eq!(plain, "function show(x) { return x; };");
    }

    #[test]
    fn test_stylesheet_urls_become_data_uris() {
        let (_dir, config) = site();
        let mut inliner = Inliner::new(&config, None).unwrap();
        let out = inliner
            .inline_stylesheets(r#"<link rel="stylesheet" href="css/style.css">"#)
            .unwrap();
        assert_eq!(
            out,
            "<style>body { background: url(data:image/jpeg;base64,/9j/); }\n.a { background: url(data:image/gif;base64,AA==); }</style>"
        );
        assert_eq!(inliner.stats().stylesheets, 1);
        assert_eq!(inliner.stats().css_urls, 1);
    }

    #[test]
    fn test_images_skip_data_uris() {
        let (_dir, config) = site();
        let mut inliner = Inliner::new(&config, None).unwrap();
        let out = inliner
            .inline_images(r#"<img src="img/logo.png"><img src="data:image/gif;base64,AA==">"#)
            .unwrap();
        assert_eq!(
            out,
            r#"<img src="data:image/png;base64,AQID"><img src="data:image/gif;base64,AA==">"#
        );
        assert_eq!(inliner.stats().images, 1);
    }

    #[test]
    fn test_missing_script_aborts() {
        let (_dir, config) = site();
        let mut inliner = Inliner::new(&config, None).unwrap();
        let err = inliner
            .inline_scripts(r#"<script src="gone.js"></script>"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("gone.js"));
    }

    #[test]
    fn test_terminate_script() {
        let mut call = "init()\n".to_string();
        terminate_script(&mut call);
        assert_eq!(call, "init()\n;");

        let mut commented = "run() // go".to_string();
        terminate_script(&mut commented);
        assert_eq!(commented, "run() // go\n;");

        let mut done = "a = 1; /* end */".to_string();
        terminate_script(&mut done);
        assert_eq!(done, "a = 1; /* end */");

        let mut empty = "  // nothing\n".to_string();
        terminate_script(&mut empty);
        assert_eq!(empty, "  // nothing\n");
    }

    #[test]
    fn test_merged_scripts_stay_separate_statements() {
        let (dir, config) = site();
        fs::write(dir.path().join("a.js"), "function init() { return 0 }\ninit()\n").unwrap();
        fs::write(dir.path().join("b.js"), "(function () { globalThis.done = 1 })()").unwrap();
        let mut inliner = Inliner::new(&config, None).unwrap();

        let out = inliner
            .inline("<script src=\"a.js\"></script>\n<script src=\"b.js\"></script>")
            .unwrap();
        assert_eq!(
            out,
            "<script>function init() { return 0 }\ninit()\n;(function () { globalThis.done = 1 })();</script>"
        );
    }

    #[test]
    fn test_merge_adjacent_scripts() {
        let html = "<script>a()</script>\n  <script>b()</script><p></p><script>c()</script>";
        assert_eq!(
            merge_adjacent_scripts(html),
            "<script>a()b()</script><p></p><script>c()</script>"
        );
    }

    #[test]
    fn test_full_pass_order() {
        let (_dir, config) = site();
        let mut inliner = Inliner::new(&config, None).unwrap();
        let html = concat!(
            r#"<link rel="icon" href="./img/favicon.png">"#,
            r#"<link rel="stylesheet" href="css/style.css">"#,
            r#"<img src="img/logo.png">"#,
            r#"<script src="util.js"></script>"#,
            "\n",
            r#"<script src="script.js"></script>"#,
        );
        let out = inliner.inline(html).unwrap();

        assert!(!out.contains("<script src="));
        assert!(!out.contains(r#"rel="stylesheet""#));
        assert_eq!(out.matches("<script>").count(), 1);
        for m in RE_SRC.captures_iter(&out) {
            assert!(m[1].starts_with("data:"));
        }
    }
}
