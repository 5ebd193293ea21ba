//! Row items handed from the object store to the query engine
//!
//! An `Item` is a cheap, `Arc`-backed handle to one row of some table.
//! Joined tables (hosts by group, services by group, ...) and flattened
//! tables (comments, downtimes) carry the related objects they need so
//! that column accessors can reach linked attributes without a lookup.

use super::types::*;
use std::sync::Arc;

/// A comment or downtime together with the object it is attached to
#[derive(Debug, Clone)]
pub struct Attached<T> {
    pub entry: Arc<T>,
    pub host: Arc<Host>,
    pub service: Option<Arc<Service>>,
}

/// One row of any table
#[derive(Debug, Clone)]
pub enum Item {
    Host(Arc<Host>),
    Service(Arc<Service>),
    Contact(Arc<Contact>),
    HostGroup(Arc<HostGroup>),
    ServiceGroup(Arc<ServiceGroup>),
    ContactGroup(Arc<ContactGroup>),
    Command(Arc<Command>),
    Timeperiod(Arc<Timeperiod>),
    Comment(Attached<Comment>),
    Downtime(Attached<Downtime>),
    /// A host annotated with one of its hostgroups
    HostInGroup(Arc<Host>, Arc<HostGroup>),
    /// A service annotated with one of its servicegroups
    ServiceInGroup(Arc<Service>, Arc<ServiceGroup>),
    /// A service annotated with one of its host's hostgroups
    ServiceInHostGroup(Arc<Service>, Arc<HostGroup>),
    /// A contact annotated with one of its contactgroups
    ContactInGroup(Arc<Contact>, Arc<ContactGroup>),
    Problem(Arc<Problem>),
    Status(Arc<ProgramStatus>),
    Column(Arc<ColumnInfo>),
    Log(Arc<LogLine>),
}

impl Item {
    pub fn as_host(&self) -> Option<&Host> {
        match self {
            Item::Host(h) | Item::HostInGroup(h, _) => Some(h),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            Item::Service(s) | Item::ServiceInGroup(s, _) | Item::ServiceInHostGroup(s, _) => {
                Some(s)
            }
            _ => None,
        }
    }

    pub fn as_contact(&self) -> Option<&Contact> {
        match self {
            Item::Contact(c) | Item::ContactInGroup(c, _) => Some(c),
            _ => None,
        }
    }

    pub fn as_hostgroup(&self) -> Option<&HostGroup> {
        match self {
            Item::HostGroup(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_servicegroup(&self) -> Option<&ServiceGroup> {
        match self {
            Item::ServiceGroup(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_contactgroup(&self) -> Option<&ContactGroup> {
        match self {
            Item::ContactGroup(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Item::Command(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_timeperiod(&self) -> Option<&Timeperiod> {
        match self {
            Item::Timeperiod(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Item::Comment(c) => Some(&c.entry),
            _ => None,
        }
    }

    pub fn as_downtime(&self) -> Option<&Downtime> {
        match self {
            Item::Downtime(d) => Some(&d.entry),
            _ => None,
        }
    }

    pub fn as_problem(&self) -> Option<&Problem> {
        match self {
            Item::Problem(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<&ProgramStatus> {
        match self {
            Item::Status(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnInfo> {
        match self {
            Item::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_log(&self) -> Option<&LogLine> {
        match self {
            Item::Log(l) => Some(l),
            _ => None,
        }
    }

    /// Whether a comment or downtime row belongs to a service
    pub fn is_service_entry(&self) -> Option<bool> {
        match self {
            Item::Comment(c) => Some(c.service.is_some()),
            Item::Downtime(d) => Some(d.service.is_some()),
            _ => None,
        }
    }

    /// Host related to this row, for `host_` link columns
    pub fn related_host(&self) -> Option<Item> {
        match self {
            Item::Service(s) | Item::ServiceInGroup(s, _) | Item::ServiceInHostGroup(s, _) => {
                Some(Item::Host(Arc::clone(&s.host)))
            }
            Item::Comment(c) => Some(Item::Host(Arc::clone(&c.host))),
            Item::Downtime(d) => Some(Item::Host(Arc::clone(&d.host))),
            _ => None,
        }
    }

    /// Service related to this row, for `service_` link columns
    pub fn related_service(&self) -> Option<Item> {
        match self {
            Item::Comment(c) => c.service.as_ref().map(|s| Item::Service(Arc::clone(s))),
            Item::Downtime(d) => d.service.as_ref().map(|s| Item::Service(Arc::clone(s))),
            _ => None,
        }
    }

    /// Hostgroup a joined row was annotated with
    pub fn joined_hostgroup(&self) -> Option<Item> {
        match self {
            Item::HostInGroup(_, g) | Item::ServiceInHostGroup(_, g) => {
                Some(Item::HostGroup(Arc::clone(g)))
            }
            _ => None,
        }
    }

    /// Servicegroup a joined row was annotated with
    pub fn joined_servicegroup(&self) -> Option<Item> {
        match self {
            Item::ServiceInGroup(_, g) => Some(Item::ServiceGroup(Arc::clone(g))),
            _ => None,
        }
    }

    /// Contactgroup a joined row was annotated with
    pub fn joined_contactgroup(&self) -> Option<Item> {
        match self {
            Item::ContactInGroup(_, g) => Some(Item::ContactGroup(Arc::clone(g))),
            _ => None,
        }
    }

    /// Name of the group a joined row was annotated with
    pub fn join_group_name(&self) -> Option<&str> {
        match self {
            Item::HostInGroup(_, g) | Item::ServiceInHostGroup(_, g) => Some(&g.name),
            Item::ServiceInGroup(_, g) => Some(&g.name),
            Item::ContactInGroup(_, g) => Some(&g.name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_rows_expose_base_object() {
        let host = Arc::new(Host::new("web01"));
        let group = Arc::new(HostGroup::new("linux"));
        let item = Item::HostInGroup(Arc::clone(&host), Arc::clone(&group));

        assert_eq!(item.as_host().map(|h| h.name.as_str()), Some("web01"));
        assert_eq!(item.join_group_name(), Some("linux"));
        assert!(item.as_hostgroup().is_none());
        assert!(matches!(item.joined_hostgroup(), Some(Item::HostGroup(_))));
    }

    #[test]
    fn test_service_related_host() {
        let host = Arc::new(Host::new("web01"));
        let mut service = Service::new("web01", "http");
        service.host = Arc::clone(&host);
        let item = Item::Service(Arc::new(service));

        let related = item.related_host().unwrap();
        assert_eq!(related.as_host().map(|h| h.name.as_str()), Some("web01"));
        assert!(item.related_service().is_none());
    }
}
