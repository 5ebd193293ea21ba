//! Merged schemas for every table
//!
//! Built once on first use. Base tables come from `tables`; derived tables
//! copy a base schema and then import the columns of related tables:
//!
//! ```text
//! services            = services + hosts as host_*
//! comments, downtimes = base + hosts as host_* + services as service_*
//! hostsbygroup        = hosts + hostgroups as hostgroup_*
//! servicesbygroup     = services + servicegroups as servicegroup_*
//! servicesbyhostgroup = services + hostgroups as hostgroup_*
//! contactsbygroup     = contacts + contactgroups as contactgroup_*
//! ```

use super::column::{Column, TableSchema};
use super::table::Table;
use super::tables;
use crate::model::{ColumnInfo, Item};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// All table schemas plus the precomputed `columns` table rows
#[derive(Debug)]
pub struct Registry {
    schemas: HashMap<Table, TableSchema>,
    column_infos: Vec<Arc<ColumnInfo>>,
}

impl Registry {
    /// Process-wide registry
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    /// Build every schema, running link merges in dependency order
    pub fn build() -> Self {
        let hosts = TableSchema::new(Table::Hosts, tables::hosts());
        let hostgroups = TableSchema::new(Table::HostGroups, tables::hostgroups());
        let servicegroups = TableSchema::new(Table::ServiceGroups, tables::servicegroups());
        let contactgroups = TableSchema::new(Table::ContactGroups, tables::contactgroups());
        let contacts = TableSchema::new(Table::Contacts, tables::contacts());

        let mut services = TableSchema::new(Table::Services, tables::services());
        services.link(&hosts, "host_", Item::related_host);

        let annotated = |table: Table, columns: Vec<Column>| {
            let mut schema = TableSchema::new(table, columns);
            schema.link(&hosts, "host_", Item::related_host);
            schema.link(&services, "service_", Item::related_service);
            schema
        };
        let comments = annotated(Table::Comments, tables::comments());
        let downtimes = annotated(Table::Downtimes, tables::downtimes());

        let hostsbygroup = joined(
            Table::HostsByGroup,
            &hosts,
            &hostgroups,
            "hostgroup_",
            Item::joined_hostgroup,
        );
        let servicesbygroup = joined(
            Table::ServicesByGroup,
            &services,
            &servicegroups,
            "servicegroup_",
            Item::joined_servicegroup,
        );
        let servicesbyhostgroup = joined(
            Table::ServicesByHostGroup,
            &services,
            &hostgroups,
            "hostgroup_",
            Item::joined_hostgroup,
        );
        let contactsbygroup = joined(
            Table::ContactsByGroup,
            &contacts,
            &contactgroups,
            "contactgroup_",
            Item::joined_contactgroup,
        );

        let mut schemas = HashMap::new();
        for schema in [
            hosts,
            services,
            contacts,
            hostgroups,
            servicegroups,
            contactgroups,
            TableSchema::new(Table::Commands, tables::commands()),
            TableSchema::new(Table::Timeperiods, tables::timeperiods()),
            comments,
            downtimes,
            hostsbygroup,
            servicesbygroup,
            servicesbyhostgroup,
            contactsbygroup,
            TableSchema::new(Table::Problems, tables::problems()),
            TableSchema::new(Table::Status, tables::status()),
            TableSchema::new(Table::Columns, tables::columns()),
            TableSchema::new(Table::Log, tables::log_lines()),
        ] {
            schemas.insert(schema.table, schema);
        }

        let column_infos = Table::all()
            .iter()
            .filter_map(|t| schemas.get(t))
            .flat_map(|schema| {
                schema.columns().iter().map(move |c| {
                    Arc::new(ColumnInfo {
                        table: schema.table.name().to_string(),
                        name: c.name.clone(),
                        description: c.description.clone(),
                        datatype: c.datatype.to_string(),
                    })
                })
            })
            .collect();

        tracing::debug!(tables = schemas.len(), "Built table registry");

        Self {
            schemas,
            column_infos,
        }
    }

    /// Schema of a table; every `Table` has one
    pub fn schema(&self, table: Table) -> &TableSchema {
        &self.schemas[&table]
    }

    /// Resolve a requested column name, tolerating the redundant
    /// `<singular>_` prefix (`host_name` on `hosts` is `name`)
    pub fn column(&self, table: Table, name: &str) -> Option<&Arc<Column>> {
        let schema = self.schema(table);
        schema
            .get(name)
            .or_else(|| schema.get(&strip_table_prefix(table, name)))
    }

    /// Rows of the `columns` table
    pub fn column_infos(&self) -> &[Arc<ColumnInfo>] {
        &self.column_infos
    }
}

fn joined(
    table: Table,
    base: &TableSchema,
    group: &TableSchema,
    prefix: &str,
    relation: fn(&Item) -> Option<Item>,
) -> TableSchema {
    let mut schema = TableSchema::derive(table, base);
    schema.link(group, prefix, relation);
    schema
}

/// Remove one leading `<singular>_` from a column name, if present
pub fn strip_table_prefix(table: Table, name: &str) -> String {
    let prefix = format!("{}_", table.singular());
    name.strip_prefix(&prefix).unwrap_or(name).to_string()
}
