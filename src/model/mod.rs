//! Live monitoring object model
//!
//! - **types**: Entities (hosts, services, contacts, groups, ...)
//! - **value**: Typed cell values
//! - **item**: Row handles passed from the store to the engine
//! - **store**: The `ObjectStore` interface and scan hints
//! - **memory**: A snapshot-backed in-memory store

mod item;
mod memory;
mod store;
pub mod types;
mod value;

pub use item::{Attached, Item};
pub use memory::{MemoryStore, StoreSnapshot};
pub use store::{Hint, ObjectStore, StoreError, StoreResult};
pub use types::{
    ColumnInfo, Command, Comment, Contact, ContactGroup, Downtime, Host, HostGroup, LogLine,
    ProgramStatus, Problem, Service, ServiceGroup, ServiceSummary, Timeperiod,
};
pub use value::Value;
