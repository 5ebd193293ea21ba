//! Logical LQL table identities

use regex::Regex;
use std::sync::OnceLock;

/// Every table the engine can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Hosts,
    Services,
    Contacts,
    HostGroups,
    ServiceGroups,
    ContactGroups,
    Commands,
    Timeperiods,
    Comments,
    Downtimes,
    HostsByGroup,
    ServicesByGroup,
    ServicesByHostGroup,
    ContactsByGroup,
    Problems,
    Status,
    Columns,
    Log,
}

/// How rows of a table are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Plain iteration over store objects
    Scan,
    /// Union of per-host and per-service sub-collections
    Flattened,
    /// One row per (object, group membership)
    GroupJoin,
    /// One synthetic row per problem object
    Problems,
    /// A single synthetic row
    Singleton,
    /// Rows describing the schema itself
    Introspection,
    /// Rows from the log store
    Log,
}

impl Table {
    /// All tables in declaration order
    pub fn all() -> &'static [Table] {
        &[
            Table::Hosts,
            Table::Services,
            Table::Contacts,
            Table::HostGroups,
            Table::ServiceGroups,
            Table::ContactGroups,
            Table::Commands,
            Table::Timeperiods,
            Table::Comments,
            Table::Downtimes,
            Table::HostsByGroup,
            Table::ServicesByGroup,
            Table::ServicesByHostGroup,
            Table::ContactsByGroup,
            Table::Problems,
            Table::Status,
            Table::Columns,
            Table::Log,
        ]
    }

    /// Parse a table name as sent on a `GET` line
    pub fn from_name(name: &str) -> Option<Self> {
        Table::all().iter().copied().find(|t| t.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::Hosts => "hosts",
            Table::Services => "services",
            Table::Contacts => "contacts",
            Table::HostGroups => "hostgroups",
            Table::ServiceGroups => "servicegroups",
            Table::ContactGroups => "contactgroups",
            Table::Commands => "commands",
            Table::Timeperiods => "timeperiods",
            Table::Comments => "comments",
            Table::Downtimes => "downtimes",
            Table::HostsByGroup => "hostsbygroup",
            Table::ServicesByGroup => "servicesbygroup",
            Table::ServicesByHostGroup => "servicesbyhostgroup",
            Table::ContactsByGroup => "contactsbygroup",
            Table::Problems => "problems",
            Table::Status => "status",
            Table::Columns => "columns",
            Table::Log => "log",
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Table::Hosts
            | Table::Services
            | Table::Contacts
            | Table::HostGroups
            | Table::ServiceGroups
            | Table::ContactGroups
            | Table::Commands
            | Table::Timeperiods => Shape::Scan,
            Table::Comments | Table::Downtimes => Shape::Flattened,
            Table::HostsByGroup
            | Table::ServicesByGroup
            | Table::ServicesByHostGroup
            | Table::ContactsByGroup => Shape::GroupJoin,
            Table::Problems => Shape::Problems,
            Table::Status => Shape::Singleton,
            Table::Columns => Shape::Introspection,
            Table::Log => Shape::Log,
        }
    }

    /// Singular entity name used as the redundant column prefix.
    ///
    /// For the `<x>sby...group` join tables the entity is taken from the
    /// table name (`servicesbyhostgroup` → `service`).
    pub fn singular(&self) -> String {
        static JOIN_TABLE: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = JOIN_TABLE
            .get_or_init(|| Regex::new(r"^([a-z]+?)sby[a-z]*group$").ok())
            .as_ref();

        let name = self.name();
        if let Some(caps) = pattern.and_then(|re| re.captures(name)) {
            return caps[1].to_string();
        }
        match self {
            Table::Status => "status".to_string(),
            Table::Log => "log".to_string(),
            _ => name.trim_end_matches('s').to_string(),
        }
    }

    /// Tables whose rows are hosts or services and can be scoped by `AuthUser`
    pub fn is_host_or_service_shaped(&self) -> bool {
        matches!(
            self,
            Table::Hosts
                | Table::Services
                | Table::HostsByGroup
                | Table::ServicesByGroup
                | Table::ServicesByHostGroup
        )
    }

    /// Whether rows are services (as opposed to hosts)
    pub fn is_service_shaped(&self) -> bool {
        matches!(
            self,
            Table::Services | Table::ServicesByGroup | Table::ServicesByHostGroup
        )
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_roundtrips_all() {
        for table in Table::all() {
            assert_eq!(Table::from_name(table.name()), Some(*table));
        }
        assert_eq!(Table::from_name("nosuchtable"), None);
    }

    #[test]
    fn test_singular() {
        assert_eq!(Table::Hosts.singular(), "host");
        assert_eq!(Table::Services.singular(), "service");
        assert_eq!(Table::HostGroups.singular(), "hostgroup");
        assert_eq!(Table::Status.singular(), "status");
        assert_eq!(Table::HostsByGroup.singular(), "host");
        assert_eq!(Table::ServicesByGroup.singular(), "service");
        assert_eq!(Table::ServicesByHostGroup.singular(), "service");
        assert_eq!(Table::ContactsByGroup.singular(), "contact");
    }

    #[test]
    fn test_shapes() {
        assert_eq!(Table::Hosts.shape(), Shape::Scan);
        assert_eq!(Table::Downtimes.shape(), Shape::Flattened);
        assert_eq!(Table::ServicesByHostGroup.shape(), Shape::GroupJoin);
        assert_eq!(Table::Status.shape(), Shape::Singleton);
    }
}
