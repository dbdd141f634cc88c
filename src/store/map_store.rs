//! This module provides a backing store kept entirely in memory.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::core::{Blob, BlobStore, Location, Lookup};

/// A [`BlobStore`] that keeps objects in memory, keyed by their fully-qualified location.
///
/// `MapStore` behaves like a direct object store: whatever was inserted under
/// `{base}/{namespace}/{path}` is returned as-is, with the media type it was inserted with.
/// It is handy for tests and for serving a build that is already loaded in the process.
///
/// ### Example
///
/// ```
/// use vfs_gate::{Blob, Location, MapStore};
///
/// let mut store = MapStore::new();
/// store.insert(&Location::new("mem://builds", "ns1", "index.html"), Blob::new("<html></html>"));
/// assert!(store.contains("mem://builds/ns1/index.html"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapStore {
    objects: BTreeMap<String, Blob>, // rendered locations
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `blob` under `location`, replacing anything stored there before.
    pub fn insert(&mut self, location: &Location, blob: Blob) {
        self.objects.insert(location.to_string(), blob);
    }

    /// Shorthand for inserting `bytes` under `{base}/{namespace}/{path}`.
    pub fn put(&mut self, base: &str, namespace: &str, path: &str, bytes: impl Into<Vec<u8>>) {
        self.insert(&Location::new(base, namespace, path), Blob::new(bytes));
    }

    pub fn remove(&mut self, location: &Location) -> Option<Blob> {
        self.objects.remove(&location.to_string())
    }

    pub fn contains(&self, location: &str) -> bool {
        self.objects.contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MapStore {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup> {
        Ok(match self.objects.get(&location.to_string()) {
            Some(blob) => Lookup::Found(blob.clone()),
            None => Lookup::Missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "mem://builds";

    #[tokio::test]
    async fn test_fetch_found_and_missing() {
        let mut store = MapStore::new();
        store.put(BASE, "ns1", "Build/app.js", "console.log(1)");

        let hit = store
            .fetch(&Location::new(BASE, "ns1", "Build/app.js"))
            .await
            .unwrap();
        assert_eq!(hit, Lookup::Found(Blob::new("console.log(1)")));

        let miss = store
            .fetch(&Location::new(BASE, "ns2", "Build/app.js"))
            .await
            .unwrap();
        assert_eq!(miss, Lookup::Missing);
    }

    #[tokio::test]
    async fn test_reported_media_type_kept() {
        let mut store = MapStore::new();
        let loc = Location::new(BASE, "ns1", "Build/app.data");
        store.insert(&loc, Blob::new(vec![1, 2, 3]).with_media_type("application/x-custom"));

        let Lookup::Found(blob) = store.fetch(&loc).await.unwrap() else {
            panic!("expected a hit");
        };
        assert_eq!(blob.media_type.as_deref(), Some("application/x-custom"));
    }

    #[test]
    fn test_insert_replace_remove() {
        let mut store = MapStore::new();
        assert!(store.is_empty());

        let loc = Location::new(BASE, "ns1", "a.txt");
        store.insert(&loc, Blob::new("one"));
        store.insert(&loc, Blob::new("two"));
        assert_eq!(store.len(), 1);
        assert!(store.contains("mem://builds/ns1/a.txt"));

        assert_eq!(store.remove(&loc), Some(Blob::new("two")));
        assert!(store.is_empty());
    }
}
