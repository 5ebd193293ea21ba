//! LQL Query Engine
//!
//! Compiles and executes Livestatus Query Language requests:
//!
//! - **AST**: The compiled `Query` and its output options
//! - **Filter**: Filter/stats stack machine with structural negation
//! - **Parser**: Parse request lines into a `Query`
//! - **Hint**: Derive store preselection hints from the filter
//! - **Executor**: Per-table-shape execution strategies
//! - **Stats**: Single-row aggregate evaluation
//! - **Response**: CSV / JSON / Python formatting and fixed16 framing
//! - **Wait**: Object-targeted condition checks
//!
//! # Query Language
//!
//! ```text
//! GET <table>
//! [Columns: col1 col2 ...]
//! [Filter: <column> <op> <reference>]...
//! [And: N | Or: N | Negate: [N]]...
//! [Stats: <column> <op> <reference> | Stats: sum|min|max|avg <column>]...
//! [StatsAnd: N | StatsOr: N | StatsNegate: [N]]...
//! [OutputFormat: csv|json|python]
//! [ResponseHeader: fixed16]
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use livestatus::query::{parse_query, format_result, Executor};
//!
//! let query = parse_query("GET hosts\nColumns: name state\nFilter: state = 1\n")?;
//! let result = Executor::new(&store).execute(&query)?;
//! print!("{}", format_result(&result, &query));
//! ```

mod ast;
mod error;
mod executor;
mod filter;
mod hint;
mod parser;
mod response;
mod stats;
mod wait;

pub use ast::{HeaderMode, OutputFormat, Query, ResponseHeader, Separators};
pub use error::{QueryError, QueryResult};
pub use executor::{Executor, ResultSet};
pub use filter::{
    AggregateFunc, FilterNode, FilterStack, Leaf, Operator, Reference, StackEntry, StatsEntry,
};
pub use hint::derive_hint;
pub use parser::{parse_leaf, parse_query, split_keyword, QueryParser};
pub use response::{format_error, format_result, frame};
pub use stats::evaluate as evaluate_stats;
pub use wait::WaitQuery;
