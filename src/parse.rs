//! Line splitting and value parsing.
//!
//! Malformed lines are not errors: a line without `;`, with a value that is not
//! a plain finite decimal, or with nothing on it at all is skipped.

/// Iterator over the `(key, value)` records of a span of complete lines.
///
/// A clone resumes from the same position; call [`records`] again on the same
/// span to start over.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    rest: &'a [u8],
}

/// Parses every well-formed `key;value` line in `span`. The final line may be
/// unterminated.
pub fn records(span: &[u8]) -> Records<'_> {
    Records { rest: span }
}

impl<'a> Iterator for Records<'a> {
    type Item = (&'a [u8], f64);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.rest.is_empty() {
            let line = match self.rest.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    let (line, rest) = self.rest.split_at(end);
                    self.rest = &rest[1..];
                    line
                }
                None => std::mem::take(&mut self.rest),
            };
            if let Some(record) = parse_line(line) {
                return Some(record);
            }
        }
        None
    }
}

/// Splits one line (without its terminator) on the first `;`.
pub fn parse_line(line: &[u8]) -> Option<(&[u8], f64)> {
    let sep = line.iter().position(|&b| b == b';')?;
    let (key, rest) = line.split_at(sep);
    let v = parse_decimal(&rest[1..])?;
    Some((key, v))
}

// Largest mantissa the fast path accumulates; anything below 2^53 is exact.
const MAX_EXACT_MANTISSA: u64 = 1 << 53;

// Exact powers of ten representable in an f64.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Parses a plain decimal: optional sign, digits, at most one `.`, at least one
/// digit. Surrounding ASCII whitespace is ignored. The result is correctly
/// rounded and always finite.
pub fn parse_decimal(bs: &[u8]) -> Option<f64> {
    let bs = bs.trim_ascii();
    let (negative, digits) = match bs.split_first()? {
        (b'-', rest) => (true, rest),
        (b'+', rest) => (false, rest),
        _ => (false, bs),
    };

    let mut n: u64 = 0;
    let mut exact = true;
    let mut seen_digit = false;
    let mut dot = None;
    for (i, &b) in digits.iter().enumerate() {
        match b {
            b'0'..=b'9' => {
                seen_digit = true;
                if exact {
                    n = n * 10 + (b - b'0') as u64;
                    exact = n < MAX_EXACT_MANTISSA;
                }
            }
            b'.' if dot.is_none() => dot = Some(i),
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }

    let scale = dot.map_or(0, |d| digits.len() - 1 - d);
    let v = if exact && scale < POW10.len() {
        // n and 10^scale are both exact, so one division rounds correctly
        n as f64 / POW10[scale]
    } else {
        // the token is validated above, so std only sees plain decimals
        std::str::from_utf8(digits).ok()?.parse::<f64>().ok()?
    };
    if !v.is_finite() {
        return None;
    }
    Some(if negative { -v } else { v })
}
