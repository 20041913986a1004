//! In-script image map rewriting
//!
//! Scripts may declare a lookup table of image paths:
//!
//! ```text
//! const IMAGES = {
//!     'player': 'img/player.png',
//!     'enemy': 'img/enemy.png',
//! };
//! ```
//!
//! The bundler replaces it with a frozen object of data URIs so the script no
//! longer needs the image files at runtime:
//!
//! ```text
//! const IMAGES = Object.freeze({"player":"data:image/png;base64,...","enemy":"..."});
//! ```

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::info;

use crate::loader::Loader;
use crate::rewrite::try_replace_all;

/// `'key': 'path'` or `"key": "path"` pairs inside the map literal
static RE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:'([^'\n]+)'|"([^"\n]+)")\s*:\s*(?:'([^'\n]+)'|"([^"\n]+)")"#)
        .expect("image map pair pattern is valid")
});

/// Key/path pairs declared in a map literal, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMap {
    pub entries: Vec<(String, String)>,
}

impl ImageMap {
    /// Collect the pairs declared in a map literal body
    pub fn parse(literal: &str) -> Self {
        let entries = RE_PAIR
            .captures_iter(literal)
            .filter_map(|caps| {
                let key = caps.get(1).or_else(|| caps.get(2))?;
                let path = caps.get(3).or_else(|| caps.get(4))?;
                Some((key.as_str().to_string(), path.as_str().to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Encode every path and serialize the result as a JSON object
    ///
    /// Key order follows the source; a repeated key keeps its first position
    /// and its last value, as a JavaScript object literal would.
    pub fn encode(&self, loader: &Loader) -> Result<String> {
        let mut images = Map::new();
        for (key, path) in &self.entries {
            let uri = loader
                .data_uri(path)
                .with_context(|| format!("Failed to encode image '{}' for key '{}'", path, key))?;
            images.insert(key.clone(), Value::String(uri.to_string()));
        }
        Ok(serde_json::to_string(&images)?)
    }
}

/// Rewrites the image map constant of a script
pub struct ImageMapRewriter {
    name: String,
    pattern: Regex,
}

impl ImageMapRewriter {
    /// Create a rewriter for the constant called `name`
    pub fn new(name: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"const\s+{}\s*=\s*\{{[\s\S]*?\}};",
            regex::escape(name)
        ))
        .with_context(|| format!("Invalid image map name: {}", name))?;

        Ok(Self {
            name: name.to_string(),
            pattern,
        })
    }

    /// Whether the script declares the image map
    pub fn matches(&self, script: &str) -> bool {
        self.pattern.is_match(script)
    }

    /// Replace every image map declaration in `script`
    ///
    /// Returns the rewritten script and the number of entries encoded. A script
    /// without a declaration is returned unchanged.
    pub fn rewrite(&self, script: &str, loader: &Loader) -> Result<(String, usize)> {
        if !self.matches(script) {
            return Ok((script.to_string(), 0));
        }

        info!("Converting script images to base 64...");
        let mut count = 0;
        let rewritten = try_replace_all(&self.pattern, script, |caps| {
            let map = ImageMap::parse(&caps[0]);
            count += map.entries.len();
            let json = map.encode(loader)?;
            Ok(format!("const {} = Object.freeze({});", self.name, json))
        })?;

        Ok((rewritten, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Loader) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/a.png"), [1u8, 2, 3]).unwrap();
        fs::write(dir.path().join("img/b.svg"), "<svg/>").unwrap();
        let loader = Loader::new(dir.path());
        (dir, loader)
    }

    #[test]
    fn test_parse_pairs_in_order() {
        let map = ImageMap::parse("const IMAGES = {\n  'b': 'img/b.svg',\n  \"a\": \"img/a.png\"\n};");
        assert_eq!(
            map.entries,
            vec![
                ("b".to_string(), "img/b.svg".to_string()),
                ("a".to_string(), "img/a.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_rewrite_freezes_data_uris() {
        let (_dir, loader) = fixture();
        let script = "let x = 1;\nconst IMAGES = {\n    'a': 'img/a.png',\n    'b': './img/b.svg',\n};\ndraw(IMAGES.a);";

        let rewriter = ImageMapRewriter::new("IMAGES").unwrap();
        let (out, count) = rewriter.rewrite(script, &loader).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            out,
            "let x = 1;\nconst IMAGES = Object.freeze({\"a\":\"data:image/png;base64,AQID\",\"b\":\"data:image/svg+xml;base64,PHN2Zy8+\"});\ndraw(IMAGES.a);"
        );
    }

    #[test]
    fn test_pairs_outside_the_literal_are_ignored() {
        let (_dir, loader) = fixture();
        let script = "const IMAGES = {'a': 'img/a.png'};\nconst LABELS = {'x': 'not/a/file.png'};";

        let rewriter = ImageMapRewriter::new("IMAGES").unwrap();
        let (out, count) = rewriter.rewrite(script, &loader).unwrap();

        assert_eq!(count, 1);
        assert!(out.ends_with("const LABELS = {'x': 'not/a/file.png'};"));
    }

    #[test]
    fn test_no_map_is_noop() {
        let (_dir, loader) = fixture();
        let rewriter = ImageMapRewriter::new("IMAGES").unwrap();
        let (out, count) = rewriter.rewrite("console.log('hi');", &loader).unwrap();
        assert_eq!(out, "console.log('hi');");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_empty_map_is_frozen() {
        let (_dir, loader) = fixture();
        let rewriter = ImageMapRewriter::new("IMAGES").unwrap();
        let (out, count) = rewriter.rewrite("const IMAGES = {};", &loader).unwrap();
        assert_eq!(out, "const IMAGES = Object.freeze({});");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_missing_image_fails() {
        let (_dir, loader) = fixture();
        let rewriter = ImageMapRewriter::new("IMAGES").unwrap();
        let err = rewriter
            .rewrite("const IMAGES = {'gone': 'img/gone.png'};", &loader)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("img/gone.png"));
    }

    #[test]
    fn test_custom_name() {
        let (_dir, loader) = fixture();
        let rewriter = ImageMapRewriter::new("SPRITES").unwrap();
        let (out, _) = rewriter
            .rewrite("const SPRITES = { 'a': 'img/a.png' };", &loader)
            .unwrap();
        assert!(out.starts_with("const SPRITES = Object.freeze({\"a\":"));
    }
}
