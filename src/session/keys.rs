//! Object key derivation and path sanitization
//!
//! Object keys must never allow path traversal: `..` segments, leading
//! separators, and empty segments are stripped before key construction, so a
//! hostile relative path can never escape its session namespace.

use super::types::SessionError;

/// Sanitize a client-supplied relative path into safe key segments.
///
/// Backslashes are treated as separators (Windows clients), then `..`, `.`,
/// and empty segments are dropped. Fails when nothing usable remains.
pub fn sanitize_relative_path(rel_path: &str) -> Result<String, SessionError> {
    if rel_path.contains('\0') {
        return Err(SessionError::InvalidPath(rel_path.to_string()));
    }

    let normalized = rel_path.replace('\\', "/");
    let segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    if segments.is_empty() {
        return Err(SessionError::InvalidPath(rel_path.to_string()));
    }

    Ok(segments.join("/"))
}

/// Derive the deterministic object key for a file in a session
pub fn derive_object_key(
    namespace: &str,
    session_id: &str,
    rel_path: &str,
) -> Result<String, SessionError> {
    let sanitized = sanitize_relative_path(rel_path)?;
    Ok(format!("{}/{}/{}", namespace, session_id, sanitized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_pass_through() {
        assert_eq!(sanitize_relative_path("a.txt").unwrap(), "a.txt");
        assert_eq!(
            sanitize_relative_path("docs/sub/a.txt").unwrap(),
            "docs/sub/a.txt"
        );
    }

    #[test]
    fn test_traversal_segments_are_stripped() {
        assert_eq!(
            sanitize_relative_path("../../etc/passwd").unwrap(),
            "etc/passwd"
        );
        assert_eq!(
            sanitize_relative_path("docs/../../../secret.txt").unwrap(),
            "docs/secret.txt"
        );
    }

    #[test]
    fn test_leading_separators_are_stripped() {
        assert_eq!(sanitize_relative_path("/etc/passwd").unwrap(), "etc/passwd");
        assert_eq!(sanitize_relative_path("//a//b").unwrap(), "a/b");
        assert_eq!(sanitize_relative_path("\\windows\\a.txt").unwrap(), "windows/a.txt");
    }

    #[test]
    fn test_dot_segments_are_dropped() {
        assert_eq!(sanitize_relative_path("./a/./b.txt").unwrap(), "a/b.txt");
    }

    #[test]
    fn test_degenerate_paths_fail() {
        assert!(matches!(
            sanitize_relative_path(".."),
            Err(SessionError::InvalidPath(_))
        ));
        assert!(matches!(
            sanitize_relative_path("../.."),
            Err(SessionError::InvalidPath(_))
        ));
        assert!(matches!(
            sanitize_relative_path(""),
            Err(SessionError::InvalidPath(_))
        ));
        assert!(matches!(
            sanitize_relative_path("a\0b"),
            Err(SessionError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_keys_never_escape_the_session_namespace() {
        let key = derive_object_key("vaults", "abc123", "../../etc/passwd").unwrap();
        assert_eq!(key, "vaults/abc123/etc/passwd");
        assert!(key.starts_with("vaults/abc123/"));
        assert!(!key.contains(".."));
    }

    #[test]
    fn test_key_derivation_is_deterministic() {
        let a = derive_object_key("vaults", "abc123", "docs/a.txt").unwrap();
        let b = derive_object_key("vaults", "abc123", "docs/a.txt").unwrap();
        assert_eq!(a, b);
    }
}
