//! Object store interface
//!
//! The live object graph is rebuilt elsewhere from broker events; the query
//! engine only reads it through `ObjectStore`. Iteration is a momentary
//! snapshot in stable, name-sorted order.

use super::item::Item;
use super::types::{ContactGroup, HostGroup, ProgramStatus, ServiceGroup};
use crate::schema::Table;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by object store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Snapshot could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be decoded
    #[error("Snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// An object references something that does not exist
    #[error("Dangling reference: {0}")]
    DanglingReference(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Advisory preselection passed to the store.
///
/// Every populated field narrows the candidate set; a store may ignore any
/// of them, since the engine re-applies the full filter afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hint {
    pub by_host: Option<String>,
    pub by_hosts: Option<Vec<String>>,
    pub by_service_key: Option<(String, String)>,
    pub by_services: Option<Vec<(String, String)>>,
    pub by_group: Option<String>,
    pub by_contact: Option<String>,
}

impl Hint {
    pub fn is_empty(&self) -> bool {
        *self == Hint::default()
    }
}

/// Read access to the live object graph
pub trait ObjectStore: Send + Sync {
    /// Iterate a scan table (hosts, services, contacts, groups, commands,
    /// timeperiods). Other tables yield nothing.
    fn scan(&self, table: Table, hint: &Hint) -> Box<dyn Iterator<Item = Item> + '_>;

    /// Group lookups back the `*bygroup` joins: a membership whose group
    /// is not found here yields no joined row, so every group named by an
    /// object's membership list should resolve.
    fn hostgroup(&self, name: &str) -> Option<Arc<HostGroup>>;

    fn servicegroup(&self, name: &str) -> Option<Arc<ServiceGroup>>;

    fn contactgroup(&self, name: &str) -> Option<Arc<ContactGroup>>;

    fn program_status(&self) -> Arc<ProgramStatus>;
}
