//! Document minification
//!
//! Canonical attribute ordering runs first. Inline scripts are then compacted
//! as modules by `minify-js`, which also shortens top-level names, and the
//! document is finished by `minify-html`, which collapses whitespace, strips
//! comments and minifies inline CSS and JavaScript.

use lol_html::html_content::ContentType;
use lol_html::{text, HtmlRewriter, Settings};
use minify_js::{Session, TopLevelMode};
use tracing::debug;

use crate::canonical::{canonicalize, CanonicalOrder};
use crate::error::BundleError;

/// Configuration for minification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyOptions {
    /// Minify `<style>` contents and `style` attributes
    pub minify_css: bool,
    /// Minify `<script>` contents
    pub minify_js: bool,
    /// Shorten top-level names of inline scripts (needs `minify_js`)
    pub shorten_top_level: bool,
    /// Drop HTML comments
    pub remove_comments: bool,
    /// Sort attributes of every start tag by name
    pub sort_attributes: bool,
    /// Sort the tokens of `class` attributes
    pub sort_class_names: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            minify_css: true,
            minify_js: true,
            shorten_top_level: true,
            remove_comments: true,
            sort_attributes: true,
            sort_class_names: true,
        }
    }
}

/// Compacts a fully inlined document
pub struct Minifier {
    options: MinifyOptions,
}

impl Minifier {
    /// Create a minifier
    pub fn new(options: MinifyOptions) -> Self {
        Self { options }
    }

    fn cfg(&self) -> minify_html::Cfg {
        minify_html::Cfg {
            minify_css: self.options.minify_css,
            minify_js: self.options.minify_js,
            keep_comments: !self.options.remove_comments,
            ..minify_html::Cfg::default()
        }
    }

    /// Minify a document
    pub fn minify(&self, html: &str) -> Result<String, BundleError> {
        let html = canonicalize(
            html,
            CanonicalOrder {
                attributes: self.options.sort_attributes,
                class_names: self.options.sort_class_names,
            },
        )?;

        let html = if self.options.minify_js && self.options.shorten_top_level {
            shorten_scripts(&html)?
        } else {
            html
        };

        let minified = minify_html::minify(html.as_bytes(), &self.cfg());
        String::from_utf8(minified)
            .map_err(|_| BundleError::Minify("minification produced invalid UTF-8".to_string()))
    }
}

impl Default for Minifier {
    fn default() -> Self {
        Self::new(MinifyOptions::default())
    }
}

/// Run every classic inline script through [`minify_module`]
fn shorten_scripts(html: &str) -> Result<String, BundleError> {
    let mut output = Vec::with_capacity(html.len());
    let mut script = String::new();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![text!("script:not([src]):not([type])", |chunk| {
                script.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    let code = std::mem::take(&mut script);
                    chunk.replace(&minify_module(&code), ContentType::Html);
                } else {
                    chunk.remove();
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| BundleError::Minify(format!("HTML rewrite error: {}", e)))?;
    rewriter
        .end()
        .map_err(|e| BundleError::Minify(format!("HTML rewrite finalization error: {}", e)))?;

    String::from_utf8(output)
        .map_err(|_| BundleError::Minify("script minification produced invalid UTF-8".to_string()))
}

/// Minify a script with its top level treated as module scope
///
/// Top-level declarations become local and are renamed. Code that does not
/// parse as a module is returned unchanged.
pub fn minify_module(code: &str) -> String {
    if code.trim().is_empty() {
        return code.to_string();
    }
    let session = Session::new();
    let mut output = Vec::new();
    match minify_js::minify(&session, TopLevelMode::Module, code.as_bytes(), &mut output) {
        Ok(()) => match String::from_utf8(output) {
            Ok(minified) => minified,
            Err(_) => code.to_string(),
        },
        Err(_) => {
            debug!("Script does not parse as a module, keeping top-level names");
            code.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_and_comments_removed() {
        let html = "<!DOCTYPE html>\n<html>\n  <body>\n    <!-- note -->\n    <p>  Hello   world  </p>\n  </body>\n</html>\n";
        let out = Minifier::default().minify(html).unwrap();
        assert!(!out.contains("note"));
        assert!(!out.contains("\n"));
        assert!(out.contains("Hello world"));
    }

    #[test]
    fn test_comments_kept_when_asked() {
        let minifier = Minifier::new(MinifyOptions {
            remove_comments: false,
            ..Default::default()
        });
        let out = minifier.minify("<div><!-- keep me --><p>x</p></div>").unwrap();
        assert!(out.contains("keep me"));
    }

    #[test]
    fn test_attributes_sorted_before_compaction() {
        let out = Minifier::default()
            .minify(r#"<div title="t" class="b a" id="m">x</div>"#)
            .unwrap();
        let class = out.find("class").unwrap();
        let id = out.find("id=").unwrap();
        let title = out.find("title").unwrap();
        assert!(class < id && id < title);
        assert!(out.contains("a b"));
    }

    #[test]
    fn test_top_level_names_shortened() {
        let html = "<script>var longVariableName = 1; function computeSomething() { return longVariableName + 1; } console.log(computeSomething());</script>";
        let out = Minifier::default().minify(html).unwrap();
        assert!(!out.contains("longVariableName"));
        assert!(!out.contains("computeSomething"));
        assert!(out.contains("console.log("));
    }

    #[test]
    fn test_top_level_names_kept_when_disabled() {
        let minifier = Minifier::new(MinifyOptions {
            shorten_top_level: false,
            ..Default::default()
        });
        let out = minifier
            .minify("<script>var longVariableName = 1; console.log(longVariableName);</script>")
            .unwrap();
        assert!(out.contains("longVariableName"));
    }

    #[test]
    fn test_minify_module_keeps_unparsable_code() {
        let code = "let = = ;";
        assert_eq!(minify_module(code), code);
    }

    #[test]
    fn test_external_and_typed_scripts_skipped() {
        let html = r#"<script type="application/ld+json">{"longKeyName": 1}</script>"#;
        let out = shorten_scripts(html).unwrap();
        assert_eq!(out, html);
    }

    #[test]
    fn test_css_minified() {
        let out = Minifier::default()
            .minify("<style>\n  body {\n    color: red;\n  }\n</style><p>x</p>")
            .unwrap();
        assert!(out.contains("body{color:red}"));
    }
}
