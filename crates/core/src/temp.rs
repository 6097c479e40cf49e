//! Temp, swap and backup file recognition
//!
//! Covers: Vim, Emacs, GNOME (GIO), JetBrains, MS Office, browsers, and the
//! generic `name.ext.<random>` staging files written by atomic-save routines.
//! Everything here is a pure string check on the file name; no I/O.

use std::path::{Path, PathBuf};

/// Swap, staging and backup extensions (compared case-insensitively)
const TEMP_EXTENSIONS: &[&str] = &[
    "swp", "swo", "swx", "swn", "tmp", "temp", "bak", "part", "crdownload",
];

/// JetBrains "safe write" suffixes
const JETBRAINS_SUFFIXES: &[&str] = &["___jb_tmp___", "___jb_old___"];

/// GIO's atomic replace prefix; the remainder is random and carries no name
const GOUTPUTSTREAM_PREFIX: &str = ".goutputstream-";

/// Check if path looks like an editor/OS transient file
pub fn is_temp_file(path: &Path) -> bool {
    let name = match file_name(path) {
        Some(name) => name,
        None => return false,
    };

    // Dotfiles, including .#lock, .name.swp and .goutputstream-XXXX
    if name.starts_with('.') {
        return true;
    }

    // Vim/Emacs backups (name~, name.~1~)
    if name.ends_with('~') {
        return true;
    }

    // Emacs auto-save (#name#)
    if name.len() > 1 && name.starts_with('#') && name.ends_with('#') {
        return true;
    }

    // MS Office owner files
    if name.starts_with("~$") {
        return true;
    }

    // Vim's write probe
    if name == "4913" {
        return true;
    }

    if JETBRAINS_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return true;
    }

    if let Some(ext) = extension(name) {
        if is_temp_extension(ext) {
            return true;
        }
    }

    has_staging_segment(name)
}

/// Recover the probable real path from a temp path
///
/// Strips recognized markers (`.name.swp` -> `name`, `name~` -> `name`,
/// `name.txt.48213` -> `name.txt`, ...). Returns `None` when no known
/// pattern matches or when the marker carries no trace of the real name.
pub fn extract_base_name(path: &Path) -> Option<PathBuf> {
    let original = file_name(path)?;
    if original.starts_with(GOUTPUTSTREAM_PREFIX) {
        return None;
    }

    let mut name = original.to_string();
    while let Some(stripped) = strip_marker(&name) {
        name = stripped;
    }

    // A lone leading dot is not a marker we can undo on its own, but once
    // another marker came off it belongs to the temp name (.report.txt.swp)
    if name != original {
        if let Some(rest) = name.strip_prefix('.') {
            if !rest.is_empty() {
                name = rest.to_string();
            }
        }
    }

    if name.is_empty() || name == original || is_temp_file(Path::new(&name)) {
        return None;
    }

    Some(match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    })
}

/// Remove one layer of temp markers, if any
fn strip_marker(name: &str) -> Option<String> {
    if let Some(rest) = name.strip_prefix("~$") {
        return non_empty(rest);
    }

    if let Some(rest) = name.strip_prefix(".#") {
        return non_empty(rest);
    }

    if name.len() > 2 && name.starts_with('#') && name.ends_with('#') {
        return non_empty(&name[1..name.len() - 1]);
    }

    if let Some(rest) = name.strip_suffix('~') {
        // Numbered backups: name.~3~
        let rest = match rest.rsplit_once(".~") {
            Some((stem, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => stem,
            _ => rest,
        };
        return non_empty(rest);
    }

    for suffix in JETBRAINS_SUFFIXES {
        if let Some(rest) = name.strip_suffix(suffix) {
            return non_empty(rest);
        }
    }

    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || stem == "." {
        return None;
    }

    if is_temp_extension(ext) || is_generated_tail(stem, ext) {
        return non_empty(stem);
    }

    // name.txt.tmp1234
    if stem.contains('.') && is_staging_token(ext) {
        return non_empty(stem);
    }

    // Counter behind a staging segment: name.txt.tmp.1234
    let behind_staging = stem
        .rsplit_once('.')
        .is_some_and(|(_, e)| is_temp_extension(e) || is_staging_token(e));
    if behind_staging && ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return non_empty(stem);
    }

    None
}

/// Any dot segment after the first is a staging token or the name ends in a
/// random suffix behind a real extension (`report.txt.48213`)
fn has_staging_segment(name: &str) -> bool {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 3 {
        return segments.len() == 2 && is_staging_token(segments[1]);
    }

    if segments[1..].iter().any(|s| is_staging_token(s)) {
        return true;
    }

    let (stem, suffix) = match name.rsplit_once('.') {
        Some(split) => split,
        None => return false,
    };
    is_generated_tail(stem, suffix)
}

/// `suffix` is random and sits behind a real extension (`report.txt` + `48213`)
fn is_generated_tail(stem: &str, suffix: &str) -> bool {
    let ext = match stem.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => ext,
        _ => return false,
    };
    is_plain_extension(ext) && is_generated_suffix(suffix)
}

/// Short lowercase alphanumeric extension (`txt`, `rs`, `mp4`)
fn is_plain_extension(ext: &str) -> bool {
    (1..=5).contains(&ext.len())
        && ext.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && ext.bytes().any(|b| b.is_ascii_lowercase())
}

fn is_temp_extension(ext: &str) -> bool {
    TEMP_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext))
}

/// `tmp` with a random tail (`tmp`, `tmp3f2a`, `tmp_0001`), but not `tmpl`
fn is_staging_token(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    let tail = match lower.strip_prefix("tmp") {
        Some(tail) => tail,
        None => return false,
    };

    if !tail
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return false;
    }

    tail.is_empty() || tail.len() >= 6 || tail.bytes().any(|b| b.is_ascii_digit())
}

/// Pid-style numeric suffixes (5+ digits) or random mkstemp-style tokens
///
/// Random tokens mix letters and digits and are either 8+ characters long or
/// mixed case, so version tags and short counters (`2024`, `001`, `abc123`)
/// are left alone.
fn is_generated_suffix(segment: &str) -> bool {
    if !segment.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return false;
    }

    let digits = segment.bytes().any(|b| b.is_ascii_digit());
    let lower = segment.bytes().any(|b| b.is_ascii_lowercase());
    let upper = segment.bytes().any(|b| b.is_ascii_uppercase());

    if !lower && !upper {
        return segment.len() >= 5;
    }

    digits && segment.len() >= 6 && (segment.len() >= 8 || (lower && upper))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str()).filter(|n| !n.is_empty())
}

fn extension(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(p: &str) -> bool {
        is_temp_file(Path::new(p))
    }

    fn base(p: &str) -> Option<PathBuf> {
        extract_base_name(Path::new(p))
    }

    #[test]
    fn test_editor_temp_files_recognized() {
        // Vim
        assert!(temp("/w/.report.txt.swp"));
        assert!(temp("/w/.report.txt.swo"));
        assert!(temp("/w/.report.txt.swx"));
        assert!(temp("/w/4913"));
        assert!(temp("/w/report.txt~"));

        // Emacs
        assert!(temp("/w/#report.txt#"));
        assert!(temp("/w/.#report.txt"));
        assert!(temp("/w/report.txt.~2~"));

        // GNOME, JetBrains, Office, browsers
        assert!(temp("/w/.goutputstream-X1Y2Z3"));
        assert!(temp("/w/Main.java___jb_tmp___"));
        assert!(temp("/w/~$budget.xlsx"));
        assert!(temp("/w/video.mp4.crdownload"));
    }

    #[test]
    fn test_atomic_save_staging_names_recognized() {
        assert!(temp("/w/.tmp123"));
        assert!(temp("/w/report.txt.tmp"));
        assert!(temp("/w/report.TMP"));
        assert!(temp("/w/report.txt.48213"));
        assert!(temp("/w/report.txt.a9f3c2e1"));
        assert!(temp("/w/report.txt.Xa9fQ2"));
        assert!(temp("/w/report.txt.tmp.1234"));
        assert!(temp("/w/report.tmp3f2a"));
    }

    #[test]
    fn test_regular_files_not_temp() {
        assert!(!temp("/w/report.txt"));
        assert!(!temp("/w/src/main.rs"));
        assert!(!temp("/w/archive.tar.gz"));
        assert!(!temp("/w/photo.2024"));
        assert!(!temp("/w/Makefile"));
        assert!(!temp("/w/template.html"));
        assert!(!temp("/w/index.tmpl"));
        assert!(!temp("/w/Report.Q3.2024"));
        assert!(!temp("/w/jquery.min.abc123"));
        assert!(!temp("/w/scan.page.001"));
        assert!(!temp("/w/backup.2024.10.17"));
        assert!(!temp("/w/notes.md.123"));
        assert!(!temp("/"));
    }

    #[test]
    fn test_extract_base_name_strips_markers() {
        assert_eq!(base("/w/.report.txt.swp"), Some(PathBuf::from("/w/report.txt")));
        assert_eq!(base("/w/report.txt~"), Some(PathBuf::from("/w/report.txt")));
        assert_eq!(base("/w/report.txt.~2~"), Some(PathBuf::from("/w/report.txt")));
        assert_eq!(base("/w/#notes.org#"), Some(PathBuf::from("/w/notes.org")));
        assert_eq!(base("/w/.#notes.org"), Some(PathBuf::from("/w/notes.org")));
        assert_eq!(base("/w/~$budget.xlsx"), Some(PathBuf::from("/w/budget.xlsx")));
        assert_eq!(base("/w/report.txt.tmp"), Some(PathBuf::from("/w/report.txt")));
        assert_eq!(base("/w/report.txt.48213"), Some(PathBuf::from("/w/report.txt")));
        assert_eq!(base("/w/report.txt.tmp.1234"), Some(PathBuf::from("/w/report.txt")));
        assert_eq!(
            base("/w/Main.java___jb_tmp___"),
            Some(PathBuf::from("/w/Main.java"))
        );
    }

    #[test]
    fn test_extract_base_name_gives_up_without_a_name() {
        assert_eq!(base("/w/.tmp123"), None);
        assert_eq!(base("/w/.goutputstream-X1Y2Z3"), None);
        assert_eq!(base("/w/4913"), None);
        assert_eq!(base("/w/.bashrc"), None);
        assert_eq!(base("/w/report.txt"), None);
    }
}
