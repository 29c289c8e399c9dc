pub mod aggregate;
pub mod error;
pub mod ingestion;
pub mod repository;
pub mod schema;

pub use aggregate::{AggregationBuilder, JoinRow, OrganizationRole, PersonRole, fold_rows};
pub use error::{Result, StoreError};
pub use ingestion::{DEFAULT_SOURCE, DEFAULT_STATUS, DEFAULT_VERSION, MAX_VALUE_LEN};
pub use schema::Store;
