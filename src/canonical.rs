//! Canonical attribute and class ordering
//!
//! Rewrites start tags so attributes appear sorted by name and the tokens of
//! `class` attributes appear sorted. Tags that are already in canonical order
//! are passed through as written. Text, comments and the bodies of raw-text
//! elements are left to the `lol_html` tokenizer and never touched.

use lol_html::{element, HtmlRewriter, Settings};

use crate::error::BundleError;

/// Which parts of a start tag to reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalOrder {
    pub attributes: bool,
    pub class_names: bool,
}

/// Reorder attributes and class names of every start tag in `html`
pub fn canonicalize(html: &str, order: CanonicalOrder) -> Result<String, BundleError> {
    if !order.attributes && !order.class_names {
        return Ok(html.to_string());
    }

    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("*", move |el| {
                let attributes: Vec<(String, String)> = el
                    .attributes()
                    .iter()
                    .map(|attr| (attr.name(), attr.value()))
                    .collect();
                let canonical = canonical_attributes(&attributes, order);
                if canonical != attributes {
                    for (name, _) in &attributes {
                        el.remove_attribute(name);
                    }
                    for (name, value) in &canonical {
                        el.set_attribute(name, value)?;
                    }
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
        .map_err(|_| BundleError::Minify("attribute ordering produced invalid UTF-8".to_string()))
}

/// Attributes in canonical order, with the class value normalised
fn canonical_attributes(
    attributes: &[(String, String)],
    order: CanonicalOrder,
) -> Vec<(String, String)> {
    let mut canonical: Vec<(String, String)> = attributes
        .iter()
        .map(|(name, value)| {
            if order.class_names && name == "class" {
                (name.clone(), sort_classes(value))
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect();
    if order.attributes {
        canonical.sort_by(|a, b| a.0.cmp(&b.0));
    }
    canonical
}

/// Sort the whitespace separated tokens of a class value
fn sort_classes(value: &str) -> String {
    let mut classes: Vec<&str> = value.split_ascii_whitespace().collect();
    classes.sort_unstable();
    classes.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: CanonicalOrder = CanonicalOrder {
        attributes: true,
        class_names: true,
    };

    #[test]
    fn test_attributes_sorted() {
        let out = canonicalize(r#"<img src="a.png" alt="x" class="b a">"#, BOTH).unwrap();
        assert_eq!(out, r#"<img alt="x" class="a b" src="a.png">"#);
    }

    #[test]
    fn test_boolean_and_unquoted_attributes() {
        let out = canonicalize("<input type=checkbox disabled checked>", BOTH).unwrap();
        assert_eq!(out, r#"<input checked="" disabled="" type="checkbox">"#);
    }

    #[test]
    fn test_class_only() {
        let order = CanonicalOrder {
            attributes: false,
            class_names: true,
        };
        let out = canonicalize(r#"<div id="m" class="z  y x"></div>"#, order).unwrap();
        assert_eq!(out, r#"<div id="m" class="x y z"></div>"#);
    }

    #[test]
    fn test_sorted_tag_kept_as_written() {
        let html = "<p class=a id=b>t</p>";
        assert_eq!(canonicalize(html, BOTH).unwrap(), html);
    }

    #[test]
    fn test_script_body_untouched() {
        let html = r#"<script b="2" a="1">if (a < b && c > d) { x = '<p z="1" y="2">'; }</script><p y="2" x="1">"#;
        let out = canonicalize(html, BOTH).unwrap();
        assert_eq!(
            out,
            r#"<script a="1" b="2">if (a < b && c > d) { x = '<p z="1" y="2">'; }</script><p x="1" y="2">"#
        );
    }

    #[test]
    fn test_comments_and_doctype_untouched() {
        let html = "<!DOCTYPE html><!-- <b z=1 a=2> --><b z=1 a=2>t</b>";
        let out = canonicalize(html, BOTH).unwrap();
        assert_eq!(out, r#"<!DOCTYPE html><!-- <b z=1 a=2> --><b a="2" z="1">t</b>"#);
    }

    #[test]
    fn test_quoted_value_with_gt() {
        let out = canonicalize(r##"<a title="a > b" href="#">x</a>"##, BOTH).unwrap();
        assert_eq!(out, r##"<a href="#" title="a > b">x</a>"##);
    }

    #[test]
    fn test_self_closing() {
        let out = canonicalize(r#"<br class="b a"/>"#, BOTH).unwrap();
        assert!(out.contains(r#"class="a b""#));
        assert!(out.ends_with("/>"));
    }

    #[test]
    fn test_disabled_is_identity() {
        let order = CanonicalOrder {
            attributes: false,
            class_names: false,
        };
        let html = r#"<p b="1" a="2" class="z a">"#;
        assert_eq!(canonicalize(html, order).unwrap(), html);
    }

    #[test]
    fn test_canonical_attributes() {
        let attributes = vec![
            ("src".to_string(), "x.png".to_string()),
            ("class".to_string(), "b a b".to_string()),
        ];
        assert_eq!(
            canonical_attributes(&attributes, BOTH),
            vec![
                ("class".to_string(), "a b b".to_string()),
                ("src".to_string(), "x.png".to_string()),
            ]
        );
    }
}
