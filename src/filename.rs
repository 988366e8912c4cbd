use crate::contact::Contact;
use std::fs;
use std::path::{Path, PathBuf};

const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const UNTITLED: &str = "untitled";

/// Derive the filesystem-safe base name (no extension) for a contact's note.
pub fn derive_filename(contact: &Contact, source: &Path) -> String {
    sanitize_filename(&candidate_name(contact, source))
}

/// The unsanitized name, taken from the first non-empty source in priority order:
/// full name, `"{given} {family}"`, UID, then the stem of the source file.
pub fn candidate_name(contact: &Contact, source: &Path) -> String {
    contact
        .full_name
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| contact.constructed_name())
        .or_else(|| contact.identifier.clone().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| {
            source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

/// Replace characters that are invalid in filenames with `_`, then strip
/// surrounding whitespace and dots. Falls back to `untitled`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The line a rendered note carries for its contact's UID.
pub fn uid_line(identifier: &str) -> String {
    format!("UID: {}", identifier)
}

// Scans `*.md` directly inside `dir` and keeps those holding a `UID: <uid>` line.
// The scan is repeated on every call; unreadable files and directories are skipped.
// Matching is per whole line, so an identifier containing a line break (from an
// escaped `\n` in the card) never matches and its old notes are never removed.
pub fn find_existing_files_with_uid(dir: &Path, uid: &str) -> Vec<PathBuf> {
    if uid.is_empty() {
        return Vec::new();
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let needle = uid_line(uid);

    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md") && p.is_file())
        .filter(|p| {
            fs::read_to_string(p)
                .map(|content| content.lines().any(|l| l.trim_end() == needle))
                .unwrap_or(false)
        })
        .collect();
    matches.sort();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source() -> PathBuf {
        PathBuf::from("/contacts/minimal_contact.vcf")
    }

    #[test]
    fn full_name_wins() {
        let c = Contact {
            full_name: Some("John Doe".into()),
            given_name: Some("Johnny".into()),
            family_name: Some("D".into()),
            identifier: Some("12345".into()),
            ..Default::default()
        };
        assert_eq!(derive_filename(&c, &source()), "John Doe");
    }

    #[test]
    fn constructed_name_is_second() {
        let c = Contact {
            given_name: Some("Jane".into()),
            family_name: Some("Smith".into()),
            identifier: Some("12345".into()),
            ..Default::default()
        };
        assert_eq!(candidate_name(&c, &source()), "Jane Smith");

        let c = Contact {
            family_name: Some("Smith".into()),
            ..Default::default()
        };
        assert_eq!(candidate_name(&c, &source()), "Smith");
    }

    #[test]
    fn identifier_is_third() {
        let c = Contact {
            identifier: Some("abc-123".into()),
            ..Default::default()
        };
        assert_eq!(candidate_name(&c, &source()), "abc-123");
    }

    #[test]
    fn source_stem_is_last() {
        assert_eq!(
            derive_filename(&Contact::default(), &source()),
            "minimal_contact"
        );
    }

    #[test]
    fn forbidden_characters_become_underscores() {
        assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
        let out = sanitize_filename("Dr. Who: \"The/Doctor\"");
        assert!(!out.contains(&FORBIDDEN_CHARS[..]));
        assert_eq!(out, "Dr. Who_ _The_Doctor_");
    }

    #[test]
    fn surrounding_dots_and_whitespace_are_stripped() {
        assert_eq!(sanitize_filename("  ..Jane Smith.. "), "Jane Smith");
        assert_eq!(sanitize_filename(" . . "), "untitled");
        assert_eq!(sanitize_filename(""), "untitled");
    }

    #[test]
    fn finds_only_matching_uid_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "---\nFN: A\nUID: 123\n---\n").unwrap();
        fs::write(dir.path().join("b.md"), "---\nFN: B\nUID: 12345\n---\n").unwrap();
        fs::write(dir.path().join("c.txt"), "UID: 123\n").unwrap();

        let found = find_existing_files_with_uid(dir.path(), "123");
        assert_eq!(found, vec![dir.path().join("a.md")]);
    }

    #[test]
    fn identifier_with_line_break_is_never_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "---\nUID: a\nb\n---\n").unwrap();
        assert!(find_existing_files_with_uid(dir.path(), "a\nb").is_empty());
        assert_eq!(
            find_existing_files_with_uid(dir.path(), "a"),
            vec![dir.path().join("a.md")]
        );
    }

    #[test]
    fn lookup_never_fails() {
        assert!(find_existing_files_with_uid(Path::new("/does/not/exist"), "x").is_empty());
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "UID: \n").unwrap();
        assert!(find_existing_files_with_uid(dir.path(), "").is_empty());
    }
}
