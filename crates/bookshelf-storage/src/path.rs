use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Prefix that marks a platform content handle rather than a filesystem path.
pub const CONTENT_SCHEME_PREFIX: &str = "content://";

/// A usable backup/restore location as remembered in preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPath {
    /// Document-tree handle granted through the system picker
    Content(Url),
    /// Plain absolute filesystem path (legacy storage)
    Filesystem(PathBuf),
}

impl StoredPath {
    /// Parse a stored preference value.
    ///
    /// Returns `None` for anything that cannot be used as a location: empty
    /// or blank text, a `content://` value that does not parse or has no
    /// authority, and relative filesystem paths.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.starts_with(CONTENT_SCHEME_PREFIX) {
            let url = Url::parse(raw).ok()?;
            if url.host_str().is_none_or(str::is_empty) {
                return None;
            }
            return Some(Self::Content(url));
        }

        let path = Path::new(raw);
        path.is_absolute().then(|| Self::Filesystem(path.to_path_buf()))
    }

    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }

    /// The string form written back to preferences.
    pub fn to_pref_string(&self) -> String {
        match self {
            Self::Content(url) => url.as_str().to_string(),
            Self::Filesystem(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for StoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(url) => write!(f, "{url}"),
            Self::Filesystem(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("content://")]
    #[case("content:///no-authority")]
    #[case("relative/folder")]
    #[case("BookShelf")]
    fn test_unusable_values_are_rejected(#[case] raw: &str) {
        assert_eq!(StoredPath::parse(raw), None);
    }

    #[test]
    fn test_content_uri_keeps_exact_text() {
        let raw = "content://com.android.externalstorage.documents/tree/primary%3ABookShelf";

        let parsed = StoredPath::parse(raw).unwrap();

        assert!(parsed.is_content());
        assert_eq!(parsed.to_pref_string(), raw);
    }

    #[test]
    fn test_short_content_uri() {
        let parsed = StoredPath::parse("content://x/y").unwrap();

        assert_eq!(parsed.to_pref_string(), "content://x/y");
    }

    #[test]
    fn test_absolute_path_is_filesystem() {
        let parsed = StoredPath::parse("/storage/emulated/0/BookShelf").unwrap();

        assert_eq!(
            parsed,
            StoredPath::Filesystem(PathBuf::from("/storage/emulated/0/BookShelf"))
        );
        assert!(!parsed.is_content());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let parsed = StoredPath::parse("  /sdcard/BookShelf \n").unwrap();

        assert_eq!(parsed.to_string(), "/sdcard/BookShelf");
    }

    #[test]
    fn test_other_schemes_are_not_content() {
        // Only the content scheme is a platform handle; a file URL is not an absolute path either
        assert_eq!(StoredPath::parse("file:///sdcard/BookShelf"), None);
    }
}
