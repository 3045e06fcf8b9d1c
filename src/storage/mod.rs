//! Persistence layer: SQLite database, schema, and the CRM store.

pub mod crm_store;
pub mod database;
pub mod schema;

pub use crm_store::{CrmError, CrmStore};
pub use database::{Database, DatabaseError};
