mod dir_store;
mod document_store;
mod http_store;
mod map_store;

pub use dir_store::DirStore;
pub use document_store::{DocumentStore, FileEntry, FolderDocument};
pub use http_store::HttpStore;
pub use map_store::MapStore;
