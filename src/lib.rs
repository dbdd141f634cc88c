//! A virtual path gateway: serves `/virtual/{namespace}/{path}` requests from a remote blob
//! store so that a relocatable packaged web build (a loader, a binary payload and auxiliary
//! assets) behaves as though it were served from its original relative root.
//!
//! ### Overview
//!
//! `vfs-gate` maps each request onto an ordered list of candidate locations in a backing
//! store, returns the first one that exists and rewrites relative references in markup so
//! they stay inside the virtual namespace. It defines the generic `BlobStore` trait and
//! provides specific implementations, such as `DirStore`, which maps to an actual directory.
//!
//! **Key ideas**:
//! - **Abstraction**: Direct object storage, JSON documents with embedded base64 payloads,
//!   host directories and in-memory maps all sit behind one lookup trait.
//! - **Layout tolerance**: A build may boot from its namespace root or from a nested output
//!   folder; the resolver probes the known layouts in a fixed order.
//! - **Safety**: Responses name the virtual path that failed, never the backing location.
//! - **Testability**: `MapStore` serves whole builds from memory without any network.
//!
//! ### Example
//!
//! ```
//! use vfs_gate::{Dispatch, GateConfig, Gateway, MapStore};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut store = MapStore::new();
//! store.put("mem://builds", "game", "start/index.html", "<html></html>");
//!
//! let gateway = Gateway::new(GateConfig::default(), store);
//! gateway
//!     .namespace()
//!     .apply_json(r#"{"type":"INIT_STORAGE","storageUrl":"mem://builds"}"#)
//!     .unwrap();
//!
//! let response = gateway.dispatch("/virtual/game/").await;
//! assert_eq!(response.response().unwrap().status.code(), 200);
//! assert_eq!(gateway.dispatch("/favicon.ico").await, Dispatch::PassThrough);
//! # });
//! ```

pub mod codec;
mod config;
mod core;
mod dispatch;
mod error;
pub mod logging;
pub mod media;
mod namespace;
mod resolver;
pub mod rewrite;
mod store;

/// First path segment of every virtual request.
pub const VIRTUAL_PREFIX: &str = "virtual";

pub use config::{GateConfig, Layout};
pub use crate::core::{Blob, BlobStore, Location, Lookup, Result, utils};
pub use dispatch::{Dispatch, Gateway, Response, Status, parse_request_path};
pub use error::GateError;
pub use namespace::{ControlMessage, Namespace, NamespaceConfig};
pub use resolver::{CandidatePath, CandidateResolver, ResolvedContent, VirtualRequest};
pub use rewrite::{ReferenceKind, RewriteContext};
pub use store::{DirStore, DocumentStore, FileEntry, FolderDocument, HttpStore, MapStore};
