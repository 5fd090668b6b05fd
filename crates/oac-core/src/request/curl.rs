//! curl-equivalent rendering of a prepared request.
//!
//! The real request carries full credentials; only this rendering masks
//! the Authorization token, keeping the scheme word and the first and
//! last three characters.

use crate::result::Headers;

pub fn render(method: &str, url: &str, headers: &Headers, body: Option<&str>) -> String {
    let mut out = format!("curl -X {method} {}", quote(url));
    for (name, value) in headers.iter() {
        let shown = if name.eq_ignore_ascii_case("authorization") {
            mask_authorization(value)
        } else {
            value.to_string()
        };
        out.push_str(&format!(" -H {}", quote(&format!("{name}: {shown}"))));
    }
    if let Some(body) = body {
        out.push_str(&format!(" --data {}", quote(body)));
    }
    out
}

/// `Bearer abc123xyz` → `Bearer abc...xyz`; tokens too short to sample
/// are fully redacted.
pub fn mask_authorization(value: &str) -> String {
    let (scheme, token) = match value.split_once(' ') {
        Some((scheme, token)) => (Some(scheme), token),
        None => (None, value),
    };
    let masked = mask_token(token);
    match scheme {
        Some(scheme) => format!("{scheme} {masked}"),
        None => masked,
    }
}

fn mask_token(token: &str) -> String {
    if token.chars().count() <= 6 {
        return "***".to_string();
    }
    let chars: Vec<char> = token.chars().collect();
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{head}...{tail}")
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
