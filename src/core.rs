use std::fmt;

use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, crate::GateError>;

/// A fully-qualified backing-store location: `{base}/{namespace}/{path}`.
///
/// Backends that address objects by plain string (`MapStore`, `HttpStore`) use the rendered
/// form; backends with their own layout (`DirStore`, `DocumentStore`) use the parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub base: String,
    pub namespace: String,
    pub path: String,
}

impl Location {
    pub fn new(base: &str, namespace: &str, path: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
            path: path.trim_start_matches('/').to_string(),
        }
    }

    /// Last segment of `path`, used for media type fallback.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.base, self.namespace, self.path)
    }
}

/// Object content returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    /// Media type reported by the backend, if it reports one.
    pub media_type: Option<String>,
}

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = Some(media_type.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Blob),
    Missing,
}

/// A backing store holding the files of every namespace.
///
/// `Ok(Lookup::Missing)` is an ordinary outcome of candidate probing. `Err` means the store
/// itself could not be reached or answered with garbage for that one location.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup>;

    /// Lookup view used for the candidates of a single request and dropped with it.
    ///
    /// Stores that repeat work on every lookup override this to share that work between
    /// the candidates. The default view forwards to the store.
    fn session(&self) -> Box<dyn BlobStore + '_> {
        Box::new(Forward(self))
    }
}

struct Forward<'a, S: ?Sized>(&'a S);

#[async_trait]
impl<S: BlobStore + ?Sized> BlobStore for Forward<'_, S> {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup> {
        self.0.fetch(location).await
    }

    fn session(&self) -> Box<dyn BlobStore + '_> {
        Box::new(Forward(self.0))
    }
}

#[async_trait]
impl<S: BlobStore + ?Sized> BlobStore for std::sync::Arc<S> {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup> {
        (**self).fetch(location).await
    }

    fn session(&self) -> Box<dyn BlobStore + '_> {
        (**self).session()
    }
}

pub mod utils {
    /// Non-empty `/`-separated segments of `path`.
    pub fn segments(path: &str) -> impl Iterator<Item = &str> {
        path.split('/').filter(|s| !s.is_empty())
    }

    /// `"."` or `".."` when `segment` is a dot segment, literally or percent-encoded
    /// (`%2e`, `.%2E`, ...). URL parsers resolve both forms.
    pub fn dot_segment(segment: &str) -> Option<&'static str> {
        match segment.to_ascii_lowercase().replace("%2e", ".").as_str() {
            "." => Some("."),
            ".." => Some(".."),
            _ => None,
        }
    }

    /// Collapses `.` and `..` segments and repeated separators.
    /// `..` never climbs above the start of the path.
    pub fn normalize(path: &str) -> String {
        let mut result: Vec<&str> = Vec::new();
        for segment in segments(path) {
            match dot_segment(segment).unwrap_or(segment) {
                "." => {}
                ".." => {
                    result.pop();
                }
                _ => result.push(segment),
            }
        }
        result.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod session {
        use super::*;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct Counter(AtomicUsize);

        #[async_trait]
        impl BlobStore for Counter {
            async fn fetch(&self, _location: &Location) -> anyhow::Result<Lookup> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Lookup::Missing)
            }
        }

        #[tokio::test]
        async fn test_default_session_forwards() {
            let store = Arc::new(Counter::default());
            let session = store.session();
            let loc = Location::new("mem://", "ns1", "a");
            assert_eq!(session.fetch(&loc).await.unwrap(), Lookup::Missing);
            assert_eq!(session.fetch(&loc).await.unwrap(), Lookup::Missing);
            assert_eq!(store.0.load(Ordering::SeqCst), 2);
        }
    }

    mod location {
        use super::*;

        #[test]
        fn test_display_joins_parts() {
            let loc = Location::new("https://store.example/", "ns1", "/Build/app.js");
            assert_eq!(loc.to_string(), "https://store.example/ns1/Build/app.js");
        }

        #[test]
        fn test_file_name() {
            let loc = Location::new("mem://", "ns1", "start/index.html");
            assert_eq!(loc.file_name(), "index.html");
            let loc = Location::new("mem://", "ns1", "readme");
            assert_eq!(loc.file_name(), "readme");
        }
    }

    mod normalize {
        use super::*;

        #[test]
        fn test_normalize_path() {
            assert_eq!(utils::normalize("a/b/c/"), "a/b/c");
            assert_eq!(utils::normalize("a/b/./c"), "a/b/c");
            assert_eq!(utils::normalize("a/b/../c"), "a/c");
            assert_eq!(utils::normalize("//a//b"), "a/b");
            assert_eq!(utils::normalize(".."), "");
            assert_eq!(utils::normalize("../../etc/passwd"), "etc/passwd");
            assert_eq!(utils::normalize(""), "");
        }

        #[test]
        fn test_normalize_encoded_dots() {
            assert_eq!(utils::normalize("a/%2e%2e/b"), "b");
            assert_eq!(utils::normalize("%2E%2e/%2e./x"), "x");
            assert_eq!(utils::normalize("a/%2e/b"), "a/b");
            assert_eq!(utils::normalize("a/%2e%2ex/b"), "a/%2e%2ex/b");
        }

        #[test]
        fn test_dot_segment() {
            assert_eq!(utils::dot_segment(".."), Some(".."));
            assert_eq!(utils::dot_segment("%2E"), Some("."));
            assert_eq!(utils::dot_segment(".%2e"), Some(".."));
            assert_eq!(utils::dot_segment("..."), None);
            assert_eq!(utils::dot_segment("ns1"), None);
        }

        #[test]
        fn test_segments_skip_empty() {
            let parts: Vec<_> = utils::segments("/virtual//ns1/").collect();
            assert_eq!(parts, vec!["virtual", "ns1"]);
        }
    }
}
