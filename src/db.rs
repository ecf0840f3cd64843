pub mod gateway;
pub use gateway::{Filter, GatewayError, OrderBy, RemoteGateway, Table};
pub mod row_codec;
pub mod pg_gateway;
pub use pg_gateway::PgGateway;
pub mod memory_gateway;
pub use memory_gateway::{MemoryGateway, Operation};
pub mod blob_store;
pub use blob_store::{storage_key, BlobStore, LocalBlobStore, MemoryBlobStore, StorageError};
