//! Name rules for the rename flow: extension derivation, sanitizing and
//! validation of the user's proposed base name.

use crate::error::ValidationError;

/// Extension of `file_name` including its leading dot, or `""`.
///
/// Leading dots of a dot-file (`.bashrc`) do not start an extension, so
/// `".bashrc"` has none while `"archive.tar.gz"` has `".gz"`.
pub fn extension_of(file_name: &str) -> &str {
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[stem_start..].rfind('.') {
        Some(idx) => &file_name[stem_start + idx..],
        None => "",
    }
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.')
}

/// Keep alphanumerics, space, `-`, `_` and `.`; drop everything else.
pub fn sanitize(s: &str) -> String {
    s.chars().filter(|c| is_allowed(*c)).collect()
}

/// Turn raw user input into a base name, or say why it can't be used.
/// Length is counted in characters before sanitizing.
pub fn validate_name(input: &str, max_chars: usize) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::TooLong { max: max_chars });
    }

    let clean = sanitize(trimmed);
    if clean.is_empty() {
        return Err(ValidationError::NoValidCharacters);
    }

    Ok(clean)
}

/// New file name from an already validated base and the stored extension.
pub fn compose_file_name(base: &str, extension: &str, sanitize_extension: bool) -> String {
    if sanitize_extension {
        format!("{}{}", base, sanitize(extension))
    } else {
        format!("{}{}", base, extension)
    }
}

/// "512 B", "1.5 KB", "3.2 MB"
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("report.final.pdf"), ".pdf");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("..hidden.txt"), ".txt");
        assert_eq!(extension_of("trailing."), ".");
        assert_eq!(extension_of(""), "");
    }

    #[test]
    fn test_sanitize_drops_disallowed() {
        assert_eq!(sanitize("My Report v2!!!"), "My Report v2");
        assert_eq!(sanitize("a/b\\c:d*e?f"), "abcdef");
        assert_eq!(sanitize("résumé_2024-final.v1"), "résumé_2024-final.v1");
        assert_eq!(sanitize("@@@"), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for s in [
            "My Report v2!!!",
            "@@@",
            "  spaced  out  ",
            "emoji 🎉 name",
            "tab\tand\nnewline",
            "日本語のファイル",
        ] {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("  holiday pics  ", 100).unwrap(), "holiday pics");
    }

    #[test]
    fn test_validate_name_rejections() {
        assert_eq!(validate_name("", 100), Err(ValidationError::Empty));
        assert_eq!(validate_name(" \t\n ", 100), Err(ValidationError::Empty));
        assert_eq!(
            validate_name("@@@", 100),
            Err(ValidationError::NoValidCharacters)
        );
    }

    #[test]
    fn test_validate_name_length_boundary() {
        let exact = "a".repeat(100);
        assert_eq!(validate_name(&exact, 100).unwrap(), exact);

        let over = "a".repeat(101);
        assert_eq!(
            validate_name(&over, 100),
            Err(ValidationError::TooLong { max: 100 })
        );
    }

    #[test]
    fn test_validate_name_counts_chars_not_bytes() {
        // 100 two-byte characters
        let name = "é".repeat(100);
        assert!(name.len() > 100);
        assert_eq!(validate_name(&name, 100).unwrap(), name);
    }

    #[test]
    fn test_compose_file_name() {
        assert_eq!(compose_file_name("My Report v2", ".pdf", false), "My Report v2.pdf");
        assert_eq!(compose_file_name("notes", "", false), "notes");
        assert_eq!(compose_file_name("x", ".t@r", false), "x.t@r");
        assert_eq!(compose_file_name("x", ".t@r", true), "x.tr");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024 + 200 * 1024), "5.2 MB");
    }
}
