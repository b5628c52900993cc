/// Warp descriptors, nodes, paths and documents.
pub mod model;

/// The versioned binary parameter blob.
pub mod blob;

pub use blob::{deserialize_document, serialize_document, BlobError, BLOB_VERSION};
pub use model::{
    Document, Node, NodeKind, NodeRef, NodeType, Warp, WarpKind, WarpPath,
};
