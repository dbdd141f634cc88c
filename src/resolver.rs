//! Mapping of a virtual request onto an ordered list of backing-store candidates, and the
//! sequential probe over them.
//!
//! Packaged web builds put their real root at different depths: flat in the namespace
//! folder, in a nested boot folder, or in an alternate output folder. The candidate list
//! covers these layouts without the caller knowing which one a namespace uses. The first
//! candidate the store has wins.

use std::fmt;

use crate::config::Layout;
use crate::core::{BlobStore, Location, Lookup, Result, utils};
use crate::namespace::NamespaceConfig;
use crate::{GateError, media};

const INDEX: &str = "index.html";

/// A request for `relative_path` inside namespace `namespace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRequest {
    namespace: String,
    relative_path: String,
}

impl VirtualRequest {
    /// `relative_path` is normalized: empty segments and trailing `/` are dropped, so
    /// `""`, `"/"` and `"//"` all denote the namespace root. Dot segments, encoded or not,
    /// never climb out of the namespace, and a namespace may not be one itself.
    pub fn new(namespace: &str, relative_path: &str) -> Result<Self> {
        if namespace.is_empty()
            || namespace.contains(['/', '\\'])
            || utils::dot_segment(namespace).is_some()
        {
            return Err(GateError::InvalidPath(format!("bad namespace {namespace:?}")));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            relative_path: utils::normalize(relative_path),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn is_root(&self) -> bool {
        self.relative_path.is_empty()
    }
}

impl fmt::Display for VirtualRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.relative_path)
    }
}

/// Ordered backing-store locations for one request. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath(Vec<Location>);

impl CandidatePath {
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Namespace-relative paths, in probe order.
    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(|loc| loc.path.as_str()).collect()
    }
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub bytes: Vec<u8>,
    pub media_type: String,
    /// Fully-qualified location that matched. Diagnostics only, never sent to clients.
    pub source_path: String,
}

/// Candidate resolver for one [`Layout`].
#[derive(Debug, Clone, Default)]
pub struct CandidateResolver {
    layout: Layout,
}

impl CandidateResolver {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Builds the candidate list for `request` below `base`.
    ///
    /// * root: `index.html`, `{secondary}/index.html`, `{alternate}/index.html`
    /// * bare name: `{name}`, `{name}/index.html`, `{secondary}/{name}`
    /// * nested path: `{path}`, `{secondary}/{path}`
    pub fn candidates(&self, request: &VirtualRequest, base: &str) -> CandidatePath {
        let path = request.relative_path();
        let secondary = &self.layout.secondary;
        let paths = if request.is_root() {
            vec![
                INDEX.to_string(),
                format!("{secondary}/{INDEX}"),
                format!("{}/{INDEX}", self.layout.alternate),
            ]
        } else if !path.contains('/') {
            vec![
                path.to_string(),
                format!("{path}/{INDEX}"),
                format!("{secondary}/{path}"),
            ]
        } else {
            vec![path.to_string(), format!("{secondary}/{path}")]
        };

        CandidatePath(
            paths
                .iter()
                .map(|p| Location::new(base, request.namespace(), p))
                .collect(),
        )
    }

    /// Probes the candidates of `request` one at a time and returns the first hit.
    ///
    /// A failed lookup does not stop the probe. Fails with `ConfigMissing` when `config` is
    /// unset, with the first lookup failure (`Transport`, or the store's own `Decode`) when
    /// no candidate was found and at least one lookup failed, and with `NotFound` when every
    /// candidate is missing.
    pub async fn resolve<S>(
        &self,
        request: &VirtualRequest,
        config: &NamespaceConfig,
        store: &S,
    ) -> Result<ResolvedContent>
    where
        S: BlobStore + ?Sized,
    {
        let Some(base) = config.base() else {
            return Err(GateError::ConfigMissing(request.to_string()));
        };

        let session = store.session();
        let mut failure = None;
        for location in self.candidates(request, base).iter() {
            tracing::debug!(candidate = %location.path, namespace = request.namespace(), "probing");
            let blob = match session.fetch(location).await {
                Ok(Lookup::Found(blob)) => blob,
                Ok(Lookup::Missing) => continue,
                Err(err) => {
                    tracing::warn!(candidate = %location.path, error = %err, "lookup failed");
                    if failure.is_none() {
                        failure = Some(lookup_error(request, err));
                    }
                    continue;
                }
            };

            let media_type = match blob.media_type {
                Some(media_type) if !media_type.is_empty() => media_type,
                _ => media::resolve(location.file_name()).to_string(),
            };
            tracing::info!(
                namespace = request.namespace(),
                path = request.relative_path(),
                matched = %location.path,
                "resolved"
            );
            return Ok(ResolvedContent {
                bytes: blob.bytes,
                media_type,
                source_path: location.to_string(),
            });
        }

        Err(failure.unwrap_or_else(|| GateError::NotFound {
            path: request.to_string(),
        }))
    }
}

fn lookup_error(request: &VirtualRequest, err: anyhow::Error) -> GateError {
    match err.downcast::<GateError>() {
        Ok(gate) => gate,
        Err(source) => GateError::Transport {
            path: request.to_string(),
            source,
        },
    }
}
