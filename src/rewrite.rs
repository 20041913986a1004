//! Fallible regex substitution

use anyhow::Result;
use regex::{Captures, Regex};

/// Replace every non-overlapping match of `re` in `text` with the closure's output.
///
/// Same semantics as [`Regex::replace_all`], except the replacement may fail;
/// the first error aborts the whole substitution.
pub fn try_replace_all<F>(re: &Regex, text: &str, mut replacement: F) -> Result<String>
where
    F: FnMut(&Captures<'_>) -> Result<String>,
{
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        output.push_str(&text[last..whole.start()]);
        output.push_str(&replacement(&caps)?);
        last = whole.end();
    }

    output.push_str(&text[last..]);
    Ok(output)
}
