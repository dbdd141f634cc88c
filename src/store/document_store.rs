//! This module provides the JSON-document integration mode: every namespace is stored as one
//! document listing its files, each with a base64 payload.
//!
//! The document for namespace `ns1` lives at `{base}/files/ns1.json` and looks like
//!
//! ```json
//! { "files": [ { "name": "app.wasm", "path": "MyGame/Build/app.wasm",
//!                "type": "application/wasm", "data": "AGFzbQ..." } ] }
//! ```
//!
//! Some databases hand the document back as a JSON *string* holding that object; both forms
//! are accepted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::GateError;
use crate::codec;
use crate::core::{Blob, BlobStore, Location, Lookup};

/// Namespace-wide document: the uploaded folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDocument {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Path including the uploaded folder's own name, e.g. `MyGame/Build/app.wasm`.
    pub path: String,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    /// Base64, optionally as a `data:` URL.
    pub data: String,
}

impl FileEntry {
    /// Path below the uploaded folder, e.g. `Build/app.wasm`.
    pub fn relative_path(&self) -> &str {
        self.path.split_once('/').map_or("", |(_, rest)| rest)
    }

    fn matches(&self, path: &str) -> bool {
        self.relative_path() == path || self.path.ends_with(&format!("/{path}"))
    }
}

impl FolderDocument {
    /// First entry whose folder-relative path is `path`, or that ends with `/{path}`.
    pub fn find(&self, path: &str) -> Option<&FileEntry> {
        if path.is_empty() {
            return None;
        }
        self.files.iter().find(|entry| entry.matches(path))
    }

    /// Parses a stored document, unwrapping one level of JSON-string encoding if present.
    /// `Ok(None)` means the database holds `null` for this namespace.
    pub fn parse(bytes: &[u8]) -> crate::core::Result<Option<Self>> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let document = match value {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::String(text) if text.is_empty() => return Ok(None),
            serde_json::Value::String(text) => serde_json::from_str(&text)?,
            other => serde_json::from_value(other)?,
        };
        Ok(Some(document))
    }
}

/// A [`BlobStore`] adapter that reads namespace documents from `S` and serves the files
/// listed in them.
///
/// A plain `fetch` downloads the document for every lookup. A [`BlobStore::session`] downloads
/// it once and reuses it for the remaining lookups of that session; nothing is kept between
/// sessions.
#[derive(Debug, Clone)]
pub struct DocumentStore<S> {
    documents: S,
}

impl<S: BlobStore> DocumentStore<S> {
    pub fn new(documents: S) -> Self {
        Self { documents }
    }

    /// Location of the document describing `location.namespace`.
    pub fn document_location(location: &Location) -> Location {
        Location::new(
            &location.base,
            "files",
            &format!("{}.json", location.namespace),
        )
    }

    pub fn inner(&self) -> &S {
        &self.documents
    }

    /// `Ok(None)` when the namespace has no document, or an empty one.
    async fn load(&self, location: &Location) -> anyhow::Result<Option<FolderDocument>> {
        let blob = match self.documents.fetch(&Self::document_location(location)).await? {
            Lookup::Found(blob) => blob,
            Lookup::Missing => {
                tracing::debug!(namespace = %location.namespace, "no document for namespace");
                return Ok(None);
            }
        };
        Ok(FolderDocument::parse(&blob.bytes)?)
    }
}

fn serve(document: Option<&FolderDocument>, location: &Location) -> anyhow::Result<Lookup> {
    let Some(entry) = document.and_then(|doc| doc.find(&location.path)) else {
        return Ok(Lookup::Missing);
    };

    let declared = entry.media_type.as_deref().unwrap_or_default();
    let payload = codec::decode_payload(&entry.data, declared).map_err(|e| match e {
        GateError::Decode(msg) => {
            GateError::Decode(format!("{} in {}: {msg}", entry.name, location.namespace))
        }
        other => other,
    })?;

    Ok(Lookup::Found(Blob {
        bytes: payload.bytes,
        media_type: (!payload.media_type.is_empty()).then_some(payload.media_type),
    }))
}

#[async_trait]
impl<S: BlobStore> BlobStore for DocumentStore<S> {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup> {
        let document = self.load(location).await?;
        serve(document.as_ref(), location)
    }

    fn session(&self) -> Box<dyn BlobStore + '_> {
        Box::new(DocumentSession {
            store: self,
            loaded: Mutex::new(None),
        })
    }
}

/// Remembers the last document it loaded, keyed by document location.
struct DocumentSession<'a, S> {
    store: &'a DocumentStore<S>,
    loaded: Mutex<Option<(Location, Option<FolderDocument>)>>,
}

#[async_trait]
impl<S: BlobStore> BlobStore for DocumentSession<'_, S> {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup> {
        let key = DocumentStore::<S>::document_location(location);
        let mut loaded = self.loaded.lock().await;
        if !matches!(&*loaded, Some((cached, _)) if *cached == key) {
            *loaded = Some((key, self.store.load(location).await?));
        }
        let document = loaded.as_ref().and_then(|(_, doc)| doc.as_ref());
        serve(document, location)
    }
}
