//! Column definitions and per-table schemas

use super::table::Table;
use crate::model::{Item, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Declared type of a column; drives filter coercion and output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    Int,
    Float,
    Bool,
    String,
    List,
}

impl Datatype {
    pub fn is_list(&self) -> bool {
        matches!(self, Datatype::List)
    }

    /// Value used when an accessor has nothing to report
    pub fn default_value(&self) -> Value {
        match self {
            Datatype::Int => Value::Int(0),
            Datatype::Float => Value::Float(0.0),
            Datatype::Bool => Value::Bool(false),
            Datatype::String => Value::Str(String::new()),
            Datatype::List => Value::List(Vec::new()),
        }
    }
}

impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Datatype::Int => write!(f, "int"),
            Datatype::Float => write!(f, "float"),
            Datatype::Bool => write!(f, "int"),
            Datatype::String => write!(f, "string"),
            Datatype::List => write!(f, "list"),
        }
    }
}

type Getter = dyn Fn(&Item) -> Option<Value> + Send + Sync;

/// Shared value accessor for one column
#[derive(Clone)]
pub struct Accessor(Arc<Getter>);

impl Accessor {
    pub fn new(f: impl Fn(&Item) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Read the value from an item; `None` if the item has no such attribute
    pub fn get(&self, item: &Item) -> Option<Value> {
        (self.0)(item)
    }

    /// Accessor that first follows `relation` to a related item
    pub fn via(&self, relation: fn(&Item) -> Option<Item>) -> Self {
        let inner = self.clone();
        Accessor::new(move |item| relation(item).and_then(|related| inner.get(&related)))
    }
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Accessor")
    }
}

/// One attribute of a table
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub description: String,
    pub datatype: Datatype,
    pub accessor: Accessor,
    /// Storage field name when it differs from the public name
    pub filter_redirect: Option<String>,
    /// Donor table for columns imported by a link merge
    pub origin: Option<Table>,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        datatype: Datatype,
        description: impl Into<String>,
        accessor: Accessor,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            datatype,
            accessor,
            filter_redirect: None,
            origin: None,
        }
    }

    /// Builder method: set the storage field name
    pub fn redirect(mut self, field: impl Into<String>) -> Self {
        self.filter_redirect = Some(field.into());
        self
    }

    /// Name of the field in backing storage
    pub fn storage_name(&self) -> &str {
        self.filter_redirect.as_deref().unwrap_or(&self.name)
    }

    /// Whether this column was imported from another table
    pub fn is_foreign(&self) -> bool {
        self.origin.is_some()
    }

    /// Read the value, substituting the datatype default when absent
    pub fn value(&self, item: &Item) -> Value {
        self.accessor
            .get(item)
            .unwrap_or_else(|| self.datatype.default_value())
    }
}

/// Ordered set of columns for one table
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: Table,
    columns: Vec<Arc<Column>>,
    index: HashMap<String, usize>,
}

impl TableSchema {
    pub fn new(table: Table, columns: Vec<Column>) -> Self {
        let mut schema = Self {
            table,
            columns: Vec::with_capacity(columns.len()),
            index: HashMap::new(),
        };
        for column in columns {
            schema.push(Arc::new(column));
        }
        schema
    }

    /// Copy of `base` under a new table identity; columns are shared
    pub fn derive(table: Table, base: &TableSchema) -> Self {
        Self {
            table,
            columns: base.columns.clone(),
            index: base.index.clone(),
        }
    }

    /// Append a column unless one with the same name exists.
    /// Returns whether it was added.
    pub fn push(&mut self, column: Arc<Column>) -> bool {
        if self.index.contains_key(&column.name) {
            return false;
        }
        self.index.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        true
    }

    /// Import every native column of `donor` as `prefix` + name, reached
    /// through `relation`. Existing columns are never overwritten.
    pub fn link(
        &mut self,
        donor: &TableSchema,
        prefix: &str,
        relation: fn(&Item) -> Option<Item>,
    ) -> usize {
        let mut added = 0;
        for column in donor.columns.iter().filter(|c| !c.is_foreign()) {
            let imported = Column {
                name: format!("{}{}", prefix, column.name),
                description: format!("{} ({})", column.description, donor.table.singular()),
                datatype: column.datatype,
                accessor: column.accessor.via(relation),
                filter_redirect: None,
                origin: Some(donor.table),
            };
            if self.push(Arc::new(imported)) {
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Column>> {
        self.index.get(name).map(|i| &self.columns[*i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Arc<Column>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Host, Service};

    fn host_name() -> Column {
        Column::new(
            "name",
            Datatype::String,
            "Host name",
            Accessor::new(|i| i.as_host().map(|h| Value::from(&h.name))),
        )
        .redirect("host_name")
    }

    #[test]
    fn test_push_never_overwrites() {
        let mut schema = TableSchema::new(Table::Hosts, vec![host_name()]);
        let other = Column::new("name", Datatype::Int, "dup", Accessor::new(|_| None));
        assert!(!schema.push(Arc::new(other)));
        assert_eq!(schema.get("name").unwrap().datatype, Datatype::String);
    }

    #[test]
    fn test_link_imports_with_prefix() {
        let hosts = TableSchema::new(Table::Hosts, vec![host_name()]);
        let mut services = TableSchema::new(Table::Services, vec![]);
        assert_eq!(services.link(&hosts, "host_", Item::related_host), 1);

        let column = services.get("host_name").unwrap();
        assert!(column.is_foreign());
        assert_eq!(column.storage_name(), "host_name");

        let host = Arc::new(Host::new("web01"));
        let mut service = Service::new("web01", "http");
        service.host = host;
        let item = Item::Service(Arc::new(service));
        assert_eq!(column.value(&item), Value::from("web01"));
    }

    #[test]
    fn test_missing_value_uses_default() {
        let column = host_name();
        let item = Item::Service(Arc::new(Service::new("a", "b")));
        assert_eq!(column.value(&item), Value::Str(String::new()));
    }
}
