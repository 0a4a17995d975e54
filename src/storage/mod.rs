pub mod layout;
pub mod metadata;
pub mod persistence;

pub use layout::StoreLayout;
pub use metadata::{ConversionRecord, METADATA_VERSION, StoreMetadata, read_metadata, write_metadata};
pub use persistence::{SnapshotManager, StoreSnapshot, create_classic_store, wal_len};
