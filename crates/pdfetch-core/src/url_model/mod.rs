//! Link normalization and artifact naming.
//!
//! Links from spreadsheets carry stray whitespace, zero-width characters and
//! missing schemes; `normalize_url` turns them into something libcurl can
//! fetch. Artifact names are derived from record ids, sanitized for Linux.

mod normalize;
mod sanitize;

pub use normalize::normalize_url;
pub use sanitize::sanitize_filename_for_linux;

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extension given to every artifact.
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// Hex digits of the id digest appended to rewritten names.
const DIGEST_SUFFIX_LEN: usize = 16;

/// Longest stem that still fits `<stem>.pdf` within NAME_MAX.
const MAX_STEM: usize = 250;

fn id_digest(id: &str) -> String {
    hex::encode(Sha256::digest(id.as_bytes()))
}

/// Derives the artifact filename for a record id: `<sanitized id>.pdf`.
///
/// Ids that are already safe keep their name. Ids the sanitizer had to rewrite
/// get `-<digest prefix>` appended, so distinct ids never share a file
/// (`"A b"`, `"A/b"` and `"A_b"` all differ). Ids that sanitize to nothing
/// (or to `.`/`..`) use the full SHA-256 hex digest.
pub fn artifact_file_name(id: &str) -> String {
    let sanitized = sanitize_filename_for_linux(id);
    let stem = if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        id_digest(id)
    } else if sanitized == id && sanitized.len() <= MAX_STEM {
        sanitized
    } else {
        let keep = MAX_STEM - DIGEST_SUFFIX_LEN - 1;
        format!(
            "{}-{}",
            truncate_on_char_boundary(&sanitized, keep),
            &id_digest(id)[..DIGEST_SUFFIX_LEN]
        )
    };
    format!("{}.{}", stem, ARTIFACT_EXTENSION)
}

/// Full artifact path for `id` inside `output_dir`.
pub fn artifact_path(output_dir: &Path, id: &str) -> PathBuf {
    output_dir.join(artifact_file_name(id))
}

fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_id_gets_pdf_extension() {
        assert_eq!(artifact_file_name("12345"), "12345.pdf");
    }

    #[test]
    fn id_with_separators_is_sanitized_and_tagged() {
        let name = artifact_file_name("BR/2017 report");
        assert!(name.starts_with("BR_2017_report-"), "{}", name);
        assert_eq!(name.len(), "BR_2017_report-".len() + DIGEST_SUFFIX_LEN + 4);
        assert_eq!(name, artifact_file_name("BR/2017 report"));
    }

    #[test]
    fn ids_that_sanitize_alike_get_distinct_names() {
        let names = [
            artifact_file_name("A b"),
            artifact_file_name("A/b"),
            artifact_file_name("A_b"),
            artifact_file_name("A\\b"),
        ];
        assert_eq!(names[2], "A_b.pdf");
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(artifact_file_name("x"), "x.pdf");
        assert_ne!(artifact_file_name("x."), artifact_file_name("x"));
        assert_ne!(artifact_file_name(".x"), artifact_file_name("x"));
    }

    #[test]
    fn unusable_id_uses_digest() {
        let name = artifact_file_name("///");
        assert_eq!(name.len(), 64 + 4);
        assert!(name.ends_with(".pdf"));
        assert_eq!(name, artifact_file_name("///"));
        assert_ne!(name, artifact_file_name("..."));
    }

    #[test]
    fn long_id_is_truncated() {
        let id = "x".repeat(400);
        let name = artifact_file_name(&id);
        assert!(name.len() <= 255);
        assert_ne!(name, artifact_file_name(&"x".repeat(401)));
    }

    #[test]
    fn artifact_path_joins_output_dir() {
        let p = artifact_path(Path::new("/tmp/out"), "A1");
        assert_eq!(p, PathBuf::from("/tmp/out/A1.pdf"));
    }
}
