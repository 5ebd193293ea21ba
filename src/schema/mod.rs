//! Table schemas
//!
//! - **table**: Logical table names and how their rows are produced
//! - **column**: Typed columns with value accessors
//! - **tables**: Native column declarations per table
//! - **registry**: Merged schemas including linked columns

mod column;
mod registry;
mod table;
mod tables;

pub use column::{Accessor, Column, Datatype, TableSchema};
pub use registry::{strip_table_prefix, Registry};
pub use table::{Shape, Table};
