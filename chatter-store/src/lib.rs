// Storage layer for the Chatter data model: schema sync, entity repositories,
// declared associations and seed fixtures over SQLite.

pub mod db;
pub mod error;
pub mod fixtures;

pub use db::{Associations, Database, Repository, SyncOptions};
pub use error::{StoreError, StoreResult};
pub use fixtures::{Fixtures, Seeded};
