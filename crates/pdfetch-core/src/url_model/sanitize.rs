//! Record id → Linux-safe file stem.

/// Linux NAME_MAX in bytes.
const NAME_MAX: usize = 255;

fn is_separator(c: char) -> bool {
    c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace()
}

/// Sanitizes a record id for use as a filename on Linux.
///
/// Separators, NUL, control characters and whitespace become `_` (runs are
/// collapsed), leading/trailing dots and underscores are dropped, and the
/// result is cut to NAME_MAX bytes on a char boundary.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if is_separator(c) {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_separators_become_underscores() {
        assert_eq!(sanitize_filename_for_linux("2017/BR\\55"), "2017_BR_55");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(sanitize_filename_for_linux("Annual \t Report"), "Annual_Report");
    }

    #[test]
    fn leading_dots_are_dropped() {
        assert_eq!(sanitize_filename_for_linux("../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename_for_linux(".."), "");
    }

    #[test]
    fn nul_and_control_chars() {
        assert_eq!(sanitize_filename_for_linux("id\x00\x07x"), "id_x");
    }

    #[test]
    fn multibyte_is_cut_on_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename_for_linux(&long);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
