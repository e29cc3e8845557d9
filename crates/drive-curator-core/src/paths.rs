//! Helpers for the slash-separated remote namespace. Remote paths are
//! absolute, `/`-rooted and never use a platform separator.

/// True when `path` equals `dir` or lives anywhere beneath it.
pub fn is_under(path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    path == dir || (path.starts_with(dir) && path.as_bytes().get(dir.len()) == Some(&b'/'))
}

/// Splits a path into its parent directory and final segment.
/// The parent of a top-level entry is `/`.
pub fn split_parent(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", name)) => ("/".to_string(), name.to_string()),
        Some((parent, name)) => (parent.to_string(), name.to_string()),
        None => ("/".to_string(), trimmed.to_string()),
    }
}

/// Final path segment, empty for the root.
pub fn leaf_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Lower-cased extension including the dot, or empty when the name has
/// none. Dot-files (".profile") are treated as extensionless.
pub fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(i) if i > 0 && i + 1 < file_name.len() => file_name[i..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Non-empty path segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect()
}

/// The `/`-prefixed first segment, if any.
pub fn top_level(path: &str) -> Option<String> {
    segments(path).first().map(|s| format!("/{}", s))
}

/// Number of separators; used for deepest-first ordering.
pub fn separator_depth(path: &str) -> usize {
    path.matches('/').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_under() {
        assert!(is_under("/a/b", "/a"));
        assert!(is_under("/a", "/a"));
        assert!(is_under("/a/b/c", "/a/"));
        assert!(!is_under("/ab", "/a"));
        assert!(!is_under("/a", "/a/b"));
        assert!(is_under("/anything", "/"));
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/a/b/c"), ("/a/b".to_string(), "c".to_string()));
        assert_eq!(split_parent("/a"), ("/".to_string(), "a".to_string()));
        assert_eq!(split_parent("/"), ("/".to_string(), String::new()));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("movie.MP4"), ".mp4");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".profile"), "");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn test_segments_and_top_level() {
        assert_eq!(segments("/a/b/c"), vec!["a", "b", "c"]);
        assert_eq!(top_level("/a/b"), Some("/a".to_string()));
        assert_eq!(top_level("/"), None);
    }

    #[test]
    fn test_separator_depth() {
        assert_eq!(separator_depth("/a"), 1);
        assert_eq!(separator_depth("/a/b/c"), 3);
    }
}
