//! In-memory object store
//!
//! Builds a name-sorted, `Arc`-shared object graph from a `StoreSnapshot`
//! and answers hinted table scans from precomputed indexes:
//!
//! ```text
//! StoreSnapshot ──build──▶ hosts (sorted) ──▶ services (host resolved)
//!                              │                    │
//!                              ▼                    ▼
//!                       hostgroups.hosts    servicegroups.services
//!                              └──── authorization index ────┘
//! ```

use super::item::Item;
use super::store::{Hint, ObjectStore, StoreError, StoreResult};
use super::types::*;
use crate::schema::Table;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Serializable description of the whole object graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub hosts: Vec<Host>,
    pub services: Vec<Service>,
    pub contacts: Vec<Contact>,
    pub hostgroups: Vec<HostGroup>,
    pub servicegroups: Vec<ServiceGroup>,
    pub contactgroups: Vec<ContactGroup>,
    pub commands: Vec<Command>,
    pub timeperiods: Vec<Timeperiod>,
    pub status: ProgramStatus,
}

impl StoreSnapshot {
    /// Read a JSON snapshot from disk
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builder method: add a host
    pub fn host(mut self, host: Host) -> Self {
        self.hosts.push(host);
        self
    }

    /// Builder method: add a service
    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    /// Builder method: add a contact
    pub fn contact(mut self, contact: Contact) -> Self {
        self.contacts.push(contact);
        self
    }

    /// Builder method: add a hostgroup definition
    pub fn hostgroup(mut self, group: HostGroup) -> Self {
        self.hostgroups.push(group);
        self
    }

    /// Builder method: add a servicegroup definition
    pub fn servicegroup(mut self, group: ServiceGroup) -> Self {
        self.servicegroups.push(group);
        self
    }

    /// Builder method: add a contactgroup definition
    pub fn contactgroup(mut self, group: ContactGroup) -> Self {
        self.contactgroups.push(group);
        self
    }
}

/// Which hosts and services a contact may see
#[derive(Debug, Default)]
struct Authorization {
    hosts: HashSet<String>,
    services: HashSet<(String, String)>,
}

/// Object store holding a fully resolved snapshot in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    hosts: Vec<Arc<Host>>,
    services: Vec<Arc<Service>>,
    contacts: Vec<Arc<Contact>>,
    hostgroups: Vec<Arc<HostGroup>>,
    servicegroups: Vec<Arc<ServiceGroup>>,
    contactgroups: Vec<Arc<ContactGroup>>,
    commands: Vec<Arc<Command>>,
    timeperiods: Vec<Arc<Timeperiod>>,
    status: Arc<ProgramStatus>,
    host_index: HashMap<String, usize>,
    service_index: HashMap<(String, String), usize>,
    authorization: HashMap<String, Authorization>,
}

impl MemoryStore {
    /// Resolve a snapshot into a queryable store.
    ///
    /// Services must reference an existing host. Groups named by members
    /// but never defined are created implicitly.
    pub fn build(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let StoreSnapshot {
            mut hosts,
            mut services,
            mut contacts,
            hostgroups,
            servicegroups,
            contactgroups,
            mut commands,
            mut timeperiods,
            mut status,
        } = snapshot;

        hosts.sort_by(|a, b| a.name.cmp(&b.name));
        services.sort_by(|a, b| {
            (&a.host_name, &a.description).cmp(&(&b.host_name, &b.description))
        });
        contacts.sort_by(|a, b| a.name.cmp(&b.name));
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        timeperiods.sort_by(|a, b| a.name.cmp(&b.name));

        // Contacts reached through contact groups count as direct contacts
        let contactgroups = Self::build_contactgroups(contactgroups, &contacts);
        let members: HashMap<&str, &[String]> = contactgroups
            .iter()
            .map(|g| (g.name.as_str(), g.members.as_slice()))
            .collect();
        for host in &mut hosts {
            expand_contacts(&mut host.contacts, &host.contact_groups, &members);
        }
        for service in &mut services {
            expand_contacts(&mut service.contacts, &service.contact_groups, &members);
        }

        // Service summaries must be in place before hosts are frozen
        let mut summaries: HashMap<String, Vec<ServiceSummary>> = HashMap::new();
        for service in &services {
            summaries
                .entry(service.host_name.clone())
                .or_default()
                .push(ServiceSummary {
                    description: service.description.clone(),
                    state: service.state,
                    has_been_checked: service.has_been_checked,
                });
        }

        let hosts: Vec<Arc<Host>> = hosts
            .into_iter()
            .map(|mut host| {
                host.services = summaries.remove(&host.name).unwrap_or_default();
                Arc::new(host)
            })
            .collect();
        let host_index: HashMap<String, usize> = hosts
            .iter()
            .enumerate()
            .map(|(i, h)| (h.name.clone(), i))
            .collect();

        let mut resolved = Vec::with_capacity(services.len());
        for mut service in services {
            let idx = host_index.get(&service.host_name).ok_or_else(|| {
                StoreError::DanglingReference(format!(
                    "service '{}' references unknown host '{}'",
                    service.description, service.host_name
                ))
            })?;
            service.host = Arc::clone(&hosts[*idx]);
            resolved.push(Arc::new(service));
        }
        let services = resolved;
        let service_index: HashMap<(String, String), usize> = services
            .iter()
            .enumerate()
            .map(|(i, s)| (s.key(), i))
            .collect();

        let hostgroups = Self::build_hostgroups(hostgroups, &hosts);
        let servicegroups = Self::build_servicegroups(servicegroups, &services);
        let authorization = Self::build_authorization(&hosts, &services);

        status.num_hosts = hosts.len() as i64;
        status.num_services = services.len() as i64;

        tracing::debug!(
            hosts = hosts.len(),
            services = services.len(),
            contacts = contacts.len(),
            "Built in-memory object store"
        );

        Ok(Self {
            hosts,
            services,
            contacts: contacts.into_iter().map(Arc::new).collect(),
            hostgroups,
            servicegroups,
            contactgroups,
            commands: commands.into_iter().map(Arc::new).collect(),
            timeperiods: timeperiods.into_iter().map(Arc::new).collect(),
            status: Arc::new(status),
            host_index,
            service_index,
            authorization,
        })
    }

    /// Load and build a store from a JSON snapshot file
    pub fn load(path: &Path) -> StoreResult<Self> {
        Self::build(StoreSnapshot::load(path)?)
    }

    fn build_hostgroups(defs: Vec<HostGroup>, hosts: &[Arc<Host>]) -> Vec<Arc<HostGroup>> {
        let mut groups: BTreeMap<String, HostGroup> =
            defs.into_iter().map(|g| (g.name.clone(), g)).collect();
        for host in hosts {
            for name in &host.groups {
                groups
                    .entry(name.clone())
                    .or_insert_with(|| HostGroup::new(name.clone()))
                    .hosts
                    .push(Arc::clone(host));
            }
        }
        groups.into_values().map(Arc::new).collect()
    }

    fn build_servicegroups(
        defs: Vec<ServiceGroup>,
        services: &[Arc<Service>],
    ) -> Vec<Arc<ServiceGroup>> {
        let mut groups: BTreeMap<String, ServiceGroup> =
            defs.into_iter().map(|g| (g.name.clone(), g)).collect();
        for service in services {
            for name in &service.groups {
                groups
                    .entry(name.clone())
                    .or_insert_with(|| ServiceGroup::new(name.clone()))
                    .services
                    .push(Arc::clone(service));
            }
        }
        groups.into_values().map(Arc::new).collect()
    }

    fn build_contactgroups(
        defs: Vec<ContactGroup>,
        contacts: &[Contact],
    ) -> Vec<Arc<ContactGroup>> {
        let mut groups: BTreeMap<String, ContactGroup> =
            defs.into_iter().map(|g| (g.name.clone(), g)).collect();
        for contact in contacts {
            for name in &contact.groups {
                groups
                    .entry(name.clone())
                    .or_insert_with(|| ContactGroup::new(name.clone()))
                    .members
                    .push(contact.name.clone());
            }
        }
        groups.into_values().map(Arc::new).collect()
    }

    /// Per-contact visibility from the (already expanded) contact lists
    fn build_authorization(
        hosts: &[Arc<Host>],
        services: &[Arc<Service>],
    ) -> HashMap<String, Authorization> {
        let mut index: HashMap<String, Authorization> = HashMap::new();
        for host in hosts {
            for contact in &host.contacts {
                index
                    .entry(contact.clone())
                    .or_default()
                    .hosts
                    .insert(host.name.clone());
            }
        }
        for service in services {
            for contact in &service.contacts {
                index
                    .entry(contact.clone())
                    .or_default()
                    .services
                    .insert(service.key());
            }
        }
        index
    }

    fn select_hosts(&self, hint: &Hint) -> Vec<Arc<Host>> {
        let mut selected: Vec<Arc<Host>> = if let Some(name) = &hint.by_host {
            self.host_index
                .get(name)
                .map(|i| vec![Arc::clone(&self.hosts[*i])])
                .unwrap_or_default()
        } else if let Some(names) = &hint.by_hosts {
            let mut idx: Vec<usize> =
                names.iter().filter_map(|n| self.host_index.get(n).copied()).collect();
            idx.sort_unstable();
            idx.dedup();
            idx.into_iter().map(|i| Arc::clone(&self.hosts[i])).collect()
        } else if let Some(group) = &hint.by_group {
            self.hostgroup(group)
                .map(|g| g.hosts.clone())
                .unwrap_or_default()
        } else {
            self.hosts.clone()
        };

        if let Some(contact) = &hint.by_contact {
            let allowed = self.authorization.get(contact);
            selected.retain(|h| allowed.map(|a| a.hosts.contains(&h.name)).unwrap_or(false));
        }
        selected
    }

    fn select_services(&self, hint: &Hint) -> Vec<Arc<Service>> {
        let mut selected: Vec<Arc<Service>> = if let Some(key) = &hint.by_service_key {
            self.service_index
                .get(key)
                .map(|i| vec![Arc::clone(&self.services[*i])])
                .unwrap_or_default()
        } else if let Some(keys) = &hint.by_services {
            let mut idx: Vec<usize> =
                keys.iter().filter_map(|k| self.service_index.get(k).copied()).collect();
            idx.sort_unstable();
            idx.dedup();
            idx.into_iter().map(|i| Arc::clone(&self.services[i])).collect()
        } else if let Some(host) = &hint.by_host {
            self.services
                .iter()
                .filter(|s| &s.host_name == host)
                .cloned()
                .collect()
        } else if let Some(hosts) = &hint.by_hosts {
            self.services
                .iter()
                .filter(|s| hosts.contains(&s.host_name))
                .cloned()
                .collect()
        } else if let Some(group) = &hint.by_group {
            self.servicegroup(group)
                .map(|g| g.services.clone())
                .unwrap_or_default()
        } else {
            self.services.clone()
        };

        if let Some(contact) = &hint.by_contact {
            let allowed = self.authorization.get(contact);
            selected.retain(|s| {
                allowed
                    .map(|a| a.services.contains(&s.key()))
                    .unwrap_or(false)
            });
        }
        selected
    }
}

fn expand_contacts(
    contacts: &mut Vec<String>,
    groups: &[String],
    members: &HashMap<&str, &[String]>,
) {
    for group in groups {
        for name in members.get(group.as_str()).copied().unwrap_or_default() {
            if !contacts.contains(name) {
                contacts.push(name.clone());
            }
        }
    }
}

impl ObjectStore for MemoryStore {
    fn scan(&self, table: Table, hint: &Hint) -> Box<dyn Iterator<Item = Item> + '_> {
        match table {
            Table::Hosts => Box::new(self.select_hosts(hint).into_iter().map(Item::Host)),
            Table::Services => {
                Box::new(self.select_services(hint).into_iter().map(Item::Service))
            }
            Table::Contacts => Box::new(self.contacts.iter().cloned().map(Item::Contact)),
            Table::HostGroups => Box::new(self.hostgroups.iter().cloned().map(Item::HostGroup)),
            Table::ServiceGroups => {
                Box::new(self.servicegroups.iter().cloned().map(Item::ServiceGroup))
            }
            Table::ContactGroups => {
                Box::new(self.contactgroups.iter().cloned().map(Item::ContactGroup))
            }
            Table::Commands => Box::new(self.commands.iter().cloned().map(Item::Command)),
            Table::Timeperiods => {
                Box::new(self.timeperiods.iter().cloned().map(Item::Timeperiod))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn hostgroup(&self, name: &str) -> Option<Arc<HostGroup>> {
        self.hostgroups
            .binary_search_by(|g| g.name.as_str().cmp(name))
            .ok()
            .map(|i| Arc::clone(&self.hostgroups[i]))
    }

    fn servicegroup(&self, name: &str) -> Option<Arc<ServiceGroup>> {
        self.servicegroups
            .binary_search_by(|g| g.name.as_str().cmp(name))
            .ok()
            .map(|i| Arc::clone(&self.servicegroups[i]))
    }

    fn contactgroup(&self, name: &str) -> Option<Arc<ContactGroup>> {
        self.contactgroups
            .binary_search_by(|g| g.name.as_str().cmp(name))
            .ok()
            .map(|i| Arc::clone(&self.contactgroups[i]))
    }

    fn program_status(&self) -> Arc<ProgramStatus> {
        Arc::clone(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(store: &MemoryStore, table: Table, hint: &Hint) -> Vec<String> {
        store
            .scan(table, hint)
            .map(|item| match item {
                Item::Host(h) => h.name.clone(),
                Item::Service(s) => format!("{};{}", s.host_name, s.description),
                _ => String::new(),
            })
            .collect()
    }

    fn sample() -> MemoryStore {
        let snapshot = StoreSnapshot::default()
            .host(Host::new("web02").group("web").contact("alice"))
            .host(Host::new("web01").group("web").group("linux"))
            .host(Host::new("db01").group("linux").contact("bob"))
            .service(Service::new("web01", "http").group("frontends"))
            .service(Service::new("db01", "mysql").contact("alice"))
            .service(Service::new("web02", "http").group("frontends"))
            .contact(Contact::new("alice"))
            .contact(Contact::new("bob"));
        MemoryStore::build(snapshot).unwrap()
    }

    #[test]
    fn test_scan_is_name_sorted() {
        let store = sample();
        assert_eq!(names(&store, Table::Hosts, &Hint::default()), vec!["db01", "web01", "web02"]);
        assert_eq!(
            names(&store, Table::Services, &Hint::default()),
            vec!["db01;mysql", "web01;http", "web02;http"]
        );
    }

    #[test]
    fn test_host_hints() {
        let store = sample();
        let hint = Hint {
            by_host: Some("web02".into()),
            ..Default::default()
        };
        assert_eq!(names(&store, Table::Hosts, &hint), vec!["web02"]);

        let hint = Hint {
            by_group: Some("linux".into()),
            ..Default::default()
        };
        assert_eq!(names(&store, Table::Hosts, &hint), vec!["db01", "web01"]);
    }

    #[test]
    fn test_contact_hint_uses_authorization_index() {
        let store = sample();
        let hint = Hint {
            by_contact: Some("alice".into()),
            ..Default::default()
        };
        assert_eq!(names(&store, Table::Hosts, &hint), vec!["web02"]);
        assert_eq!(names(&store, Table::Services, &hint), vec!["db01;mysql"]);
    }

    #[test]
    fn test_groups_are_derived_from_members() {
        let store = sample();
        let group = store.hostgroup("web").unwrap();
        let members: Vec<&str> = group.hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(members, vec!["web01", "web02"]);
        assert_eq!(store.servicegroup("frontends").unwrap().services.len(), 2);
        assert!(store.hostgroup("nope").is_none());
    }

    #[test]
    fn test_service_summaries_and_counts() {
        let store = sample();
        let host = store.select_hosts(&Hint {
            by_host: Some("web01".into()),
            ..Default::default()
        });
        assert_eq!(host[0].services.len(), 1);
        assert_eq!(store.program_status().num_services, 3);
    }

    #[test]
    fn test_contact_groups_expand_into_contacts() {
        let mut host = Host::new("app01");
        host.contact_groups.push("admins".into());
        let snapshot = StoreSnapshot::default()
            .host(host)
            .contact(Contact::new("carol").group("admins"));
        let store = MemoryStore::build(snapshot).unwrap();

        let hint = Hint {
            by_contact: Some("carol".into()),
            ..Default::default()
        };
        assert_eq!(names(&store, Table::Hosts, &hint), vec!["app01"]);
        let hosts = store.select_hosts(&Hint::default());
        assert_eq!(hosts[0].contacts, vec!["carol".to_string()]);
    }

    #[test]
    fn test_dangling_service_is_rejected() {
        let snapshot = StoreSnapshot::default().service(Service::new("ghost", "ping"));
        assert!(matches!(
            MemoryStore::build(snapshot),
            Err(StoreError::DanglingReference(_))
        ));
    }
}
