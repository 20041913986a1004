//! Numeric literal to arithmetic expression

use rand::Rng;

/// Largest literal rewritten; bigger values are left as written
pub const MAX_REWRITTEN: u64 = 0x7fff_ffff;

/// Value of a plain decimal integer literal
///
/// Hex, octal, binary, legacy-octal, fractional, exponent, BigInt and
/// separator forms are rejected so they keep their exact spelling.
pub fn plain_integer(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse::<u64>().ok().filter(|v| *v <= MAX_REWRITTEN)
}

/// Parenthesized expression evaluating to `value`
///
/// Either `(a*b+c)` or `(-a*b+c)` with the signs of `c` folded in, all terms
/// in hexadecimal.
pub fn to_expression<R: Rng>(value: u64, rng: &mut R) -> String {
    let value = value as i64;
    let a: i64 = rng.gen_range(0x1..=0x3ff);
    let b: i64 = rng.gen_range(0x2..=0x7f);

    let (lead, c) = if rng.gen_bool(0.5) {
        ("", value - a * b)
    } else {
        ("-", value + a * b)
    };

    let tail = if c < 0 {
        format!("-{:#x}", -c)
    } else {
        format!("+{:#x}", c)
    };

    format!("({}{:#x}*{:#x}{})", lead, a, b, tail)
}
