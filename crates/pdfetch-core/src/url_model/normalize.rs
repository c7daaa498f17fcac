//! Normalization of raw link cells into fetchable URLs.

use url::Url;

/// Removes zero-width and byte-order-mark characters (U+200B..=U+200F, U+FEFF)
/// and trims surrounding whitespace.
fn strip_invisible(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(*c, '\u{200B}'..='\u{200F}' | '\u{FEFF}'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Normalizes a raw link: strips invisible characters, prefixes `http://`
/// when no HTTP(S) scheme is present, and checks the result parses with a host.
///
/// Returns the reason as `Err` when the link cannot be made fetchable.
pub fn normalize_url(raw: &str) -> Result<String, String> {
    let cleaned = strip_invisible(raw);
    if cleaned.is_empty() {
        return Err("empty URL".to_string());
    }
    let candidate = if has_http_scheme(&cleaned) {
        cleaned
    } else {
        format!("http://{}", cleaned)
    };
    let parsed = Url::parse(&candidate).map_err(|e| format!("malformed URL {:?}: {}", candidate, e))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("URL has no host: {:?}", candidate));
    }
    Ok(candidate)
}
