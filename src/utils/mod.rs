//! Miscellaneous utils
use chrono::Utc;

pub mod pass;

/// Name under which an uploaded file is staged on disk: a timestamp and a ULID to keep
/// concurrent uploads apart, then the client's filename reduced to a safe character set.
pub(crate) fn staged_file_name(original: &str) -> String {
    let base = original.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let safe: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let safe = safe.trim_start_matches('.');

    format!(
        "{}-{}-{}",
        Utc::now().format("%Y%m%dT%H%M%S%3f"),
        ulid::Ulid::new(),
        if safe.is_empty() { "upload" } else { safe }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_names_drop_paths_and_odd_characters() {
        let name = staged_file_name("../../etc/pass wd?.jpg");
        assert!(name.ends_with("-passwd.jpg"), "{}", name);
        assert!(!name.contains('/'));
    }

    #[test]
    fn staged_names_are_unique() {
        assert_ne!(staged_file_name("a.png"), staged_file_name("a.png"));
    }

    #[test]
    fn empty_names_get_a_placeholder() {
        assert!(staged_file_name("").ends_with("-upload"));
        assert!(staged_file_name("...").ends_with("-upload"));
    }
}
