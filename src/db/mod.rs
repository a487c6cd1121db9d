pub mod memory;
pub mod pool;
pub mod postgres;
pub mod records;
pub mod store;

pub use memory::MemoryStore;
pub use pool::{create_pool, ensure_schema};
pub use postgres::PgStore;
pub use records::Stored;
pub use store::{RecordStore, Scope, StoreOp, StoredRecord, Table};
