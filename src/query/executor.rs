//! Query Executor
//!
//! Produces the filtered item sequence for a compiled `Query` and turns it
//! into a `ResultSet`. The strategy is chosen by table shape:
//!
//! ```text
//! Scan          hinted store iteration
//! Flattened     comments/downtimes of every host and service
//! GroupJoin     one row per (object, group), sorted by group name
//! Problems      hosts and services flagged as root problems
//! Singleton     program status
//! Introspection schema registry
//! Log           log store, SQL push-down then in-memory filter
//! ```
//!
//! Every strategy re-applies the full filter stack, so store hints and log
//! push-down only ever narrow to a superset of the answer.

use super::ast::Query;
use super::error::QueryResult;
use super::hint::derive_hint;
use super::stats;
use crate::logstore::LogStore;
use crate::model::{Attached, Hint, Host, Item, ObjectStore, Problem, Service, Value};
use crate::schema::{Registry, Shape, Table};
use std::sync::Arc;

/// Rows and header names ready for formatting
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Whether the query named its columns explicitly
    pub columns_requested: bool,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

type Items<'q> = Box<dyn Iterator<Item = Item> + 'q>;

/// Executes queries against an object store and an optional log store
pub struct Executor<'a> {
    store: &'a dyn ObjectStore,
    log_store: Option<&'a dyn LogStore>,
    max_rows: Option<usize>,
}

impl<'a> Executor<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            log_store: None,
            max_rows: None,
        }
    }

    /// Builder method: answer `GET log` from this store
    pub fn with_log_store(mut self, log_store: &'a dyn LogStore) -> Self {
        self.log_store = Some(log_store);
        self
    }

    /// Builder method: hard cap on result rows, on top of `Limit:`
    pub fn max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Row bound for a query: the smaller of `Limit:` and the configured cap
    pub fn row_limit(&self, query: &Query) -> Option<usize> {
        match (query.limit, self.max_rows) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Execute a query into rows (or the single stats row)
    pub fn execute(&self, query: &Query) -> QueryResult<ResultSet> {
        let items = self.items(query)?;
        let headers = query.header_names();

        let rows = if query.is_stats_query {
            vec![stats::evaluate(query.stats.entries(), items)]
        } else {
            let columns = query.output_columns();
            let items: Items<'_> = match self.row_limit(query) {
                Some(limit) => Box::new(items.take(limit)),
                None => items,
            };
            items
                .map(|item| columns.iter().map(|c| c.value(&item)).collect())
                .collect()
        };

        tracing::debug!(table = %query.table, rows = rows.len(), "Query executed");
        Ok(ResultSet {
            headers,
            rows,
            columns_requested: query.has_requested_columns(),
        })
    }

    /// Filtered item sequence for a query, in output order
    pub fn items<'q>(&'q self, query: &'q Query) -> QueryResult<Items<'q>> {
        let candidates: Items<'q> = match query.table.shape() {
            Shape::Scan => self.store.scan(query.table, &derive_hint(query)),
            Shape::Flattened => Box::new(self.annotations(query.table).into_iter()),
            Shape::GroupJoin => return Ok(Box::new(self.group_join(query).into_iter())),
            Shape::Problems => Box::new(self.problems()),
            Shape::Singleton => Box::new(std::iter::once(Item::Status(self.store.program_status()))),
            Shape::Introspection => Box::new(
                Registry::global()
                    .column_infos()
                    .iter()
                    .cloned()
                    .map(Item::Column),
            ),
            Shape::Log => self.log_items(query)?,
        };
        Ok(Box::new(candidates.filter(move |item| query.matches(item))))
    }

    /// Comments or downtimes of all hosts, then all services, ordered by id
    fn annotations(&self, table: Table) -> Vec<Item> {
        let comments = table == Table::Comments;
        let mut items: Vec<Item> = Vec::new();
        for item in self.store.scan(Table::Hosts, &Hint::default()) {
            if let Item::Host(host) = item {
                attach(&mut items, &host, None, comments);
            }
        }
        for item in self.store.scan(Table::Services, &Hint::default()) {
            if let Item::Service(service) = item {
                let host = Arc::clone(&service.host);
                attach(&mut items, &host, Some(&service), comments);
            }
        }
        items.sort_by_key(|item| match item {
            Item::Comment(c) => c.entry.id,
            Item::Downtime(d) => d.entry.id,
            _ => 0,
        });
        items
    }

    /// Cross join of base objects with their group memberships.
    /// Filters run after the join; the result is stably sorted by group.
    fn group_join(&self, query: &Query) -> Vec<Item> {
        let base = join_base(query.table);
        let hint = derive_hint(query);
        let mut rows: Vec<Item> = Vec::new();

        for item in self.store.scan(base, &hint) {
            match (query.table, item) {
                (Table::HostsByGroup, Item::Host(host)) => {
                    for name in &host.groups {
                        if let Some(group) = known_group("hostgroup", name, self.store.hostgroup(name)) {
                            rows.push(Item::HostInGroup(Arc::clone(&host), group));
                        }
                    }
                }
                (Table::ServicesByGroup, Item::Service(service)) => {
                    for name in &service.groups {
                        if let Some(group) = known_group("servicegroup", name, self.store.servicegroup(name)) {
                            rows.push(Item::ServiceInGroup(Arc::clone(&service), group));
                        }
                    }
                }
                (Table::ServicesByHostGroup, Item::Service(service)) => {
                    for name in &service.host.groups {
                        if let Some(group) = known_group("hostgroup", name, self.store.hostgroup(name)) {
                            rows.push(Item::ServiceInHostGroup(Arc::clone(&service), group));
                        }
                    }
                }
                (Table::ContactsByGroup, Item::Contact(contact)) => {
                    for name in &contact.groups {
                        if let Some(group) = known_group("contactgroup", name, self.store.contactgroup(name)) {
                            rows.push(Item::ContactInGroup(Arc::clone(&contact), group));
                        }
                    }
                }
                _ => {}
            }
        }

        rows.retain(|item| query.matches(item));
        rows.sort_by(|a, b| a.join_group_name().cmp(&b.join_group_name()));
        rows
    }

    fn problems(&self) -> impl Iterator<Item = Item> + '_ {
        let hosts = self
            .store
            .scan(Table::Hosts, &Hint::default())
            .filter_map(|item| match item {
                Item::Host(h) if h.is_problem => Some(Problem {
                    source: h.name.clone(),
                    impacts: h.impacts.clone(),
                }),
                _ => None,
            });
        let services = self
            .store
            .scan(Table::Services, &Hint::default())
            .filter_map(|item| match item {
                Item::Service(s) if s.is_problem => Some(Problem {
                    source: format!("{}/{}", s.host_name, s.description),
                    impacts: s.impacts.clone(),
                }),
                _ => None,
            });
        hosts
            .chain(services)
            .map(|problem| Item::Problem(Arc::new(problem)))
    }

    fn log_items<'q>(&'q self, query: &'q Query) -> QueryResult<Items<'q>> {
        let Some(log_store) = self.log_store else {
            tracing::warn!("GET log without a configured log store, returning no rows");
            return Ok(Box::new(std::iter::empty()));
        };

        // The SQL limit is only safe when SQL alone decides membership
        let limit = if !query.is_stats_query && query.log_filter.is_exact() {
            self.row_limit(query)
        } else {
            None
        };
        let lines = log_store.log_lines(&query.log_filter, limit)?;
        tracing::debug!(lines = lines.len(), exact = query.log_filter.is_exact(), "Log store returned");
        Ok(Box::new(lines.into_iter().map(|line| Item::Log(Arc::new(line)))))
    }
}

fn attach(out: &mut Vec<Item>, host: &Arc<Host>, service: Option<&Arc<Service>>, comments: bool) {
    if comments {
        let source = service.map_or(&host.comments, |s| &s.comments);
        out.extend(source.iter().map(|entry| {
            Item::Comment(Attached {
                entry: Arc::clone(entry),
                host: Arc::clone(host),
                service: service.cloned(),
            })
        }));
    } else {
        let source = service.map_or(&host.downtimes, |s| &s.downtimes);
        out.extend(source.iter().map(|entry| {
            Item::Downtime(Attached {
                entry: Arc::clone(entry),
                host: Arc::clone(host),
                service: service.cloned(),
            })
        }));
    }
}

/// Table whose objects a join table fans out
fn join_base(table: Table) -> Table {
    match table {
        Table::HostsByGroup => Table::Hosts,
        Table::ServicesByGroup | Table::ServicesByHostGroup => Table::Services,
        _ => Table::Contacts,
    }
}

/// Memberships naming a group the store does not know produce no row
fn known_group<G>(kind: &str, name: &str, group: Option<G>) -> Option<G> {
    if group.is_none() {
        tracing::debug!(kind, group = name, "Skipping membership of unknown group");
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logstore::SqliteLogStore;
    use crate::model::{Comment, Contact, Downtime, HostGroup, LogLine, MemoryStore, StoreSnapshot};
    use crate::query::parse_query;

    fn store() -> MemoryStore {
        let mut web = Host::new("web01").group("linux").group("web").state(0);
        web.comments.push(Arc::new(Comment {
            id: 7,
            author: "ops".into(),
            comment: "rebooted".into(),
            ..Default::default()
        }));
        let mut db = Host::new("db01").group("linux").state(1);
        db.is_problem = true;
        db.impacts = vec!["db01/mysql".into()];
        let mut mysql = Service::new("db01", "mysql").state(2);
        mysql.downtimes.push(Arc::new(Downtime {
            id: 3,
            author: "ops".into(),
            ..Default::default()
        }));

        MemoryStore::build(
            StoreSnapshot::default()
                .host(web)
                .host(db)
                .host(Host::new("lonely"))
                .service(Service::new("web01", "http").state(0).group("frontends"))
                .service(mysql)
                .hostgroup(HostGroup::new("linux"))
                .hostgroup(HostGroup::new("web"))
                .contact(Contact::new("alice")),
        )
        .unwrap()
    }

    fn run(store: &MemoryStore, request: &str) -> ResultSet {
        let query = parse_query(request).unwrap();
        Executor::new(store).execute(&query).unwrap()
    }

    #[test]
    fn test_scan_with_filter() {
        let store = store();
        let result = run(&store, "GET hosts\nColumns: name state\nFilter: state = 1\n");
        assert_eq!(result.rows, vec![vec![Value::from("db01"), Value::Int(1)]]);
        assert_eq!(result.headers, vec!["name", "state"]);
    }

    #[test]
    fn test_limit_takes_first_in_order() {
        let store = store();
        let result = run(&store, "GET hosts\nColumns: name\nLimit: 2\n");
        assert_eq!(result.rows, vec![vec![Value::from("db01")], vec![Value::from("lonely")]]);
    }

    #[test]
    fn test_max_rows_caps_limit() {
        let store = store();
        let query = parse_query("GET hosts\nColumns: name\nLimit: 2\n").unwrap();
        let result = Executor::new(&store).max_rows(Some(1)).execute(&query).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_group_join_one_row_per_membership() {
        let store = store();
        let result = run(&store, "GET hostsbygroup\nColumns: name hostgroup_name\n");
        assert_eq!(
            result.rows,
            vec![
                vec![Value::from("db01"), Value::from("linux")],
                vec![Value::from("web01"), Value::from("linux")],
                vec![Value::from("web01"), Value::from("web")],
            ]
        );

        let by_host_group = run(&store, "GET servicesbyhostgroup\nColumns: description hostgroup_name\n");
        assert_eq!(by_host_group.len(), 3);
    }

    /// Store whose group lookups never resolve
    struct NoGroups(MemoryStore);

    impl ObjectStore for NoGroups {
        fn scan(&self, table: Table, hint: &Hint) -> Box<dyn Iterator<Item = Item> + '_> {
            self.0.scan(table, hint)
        }

        fn hostgroup(&self, _name: &str) -> Option<Arc<HostGroup>> {
            None
        }

        fn servicegroup(&self, name: &str) -> Option<Arc<crate::model::ServiceGroup>> {
            self.0.servicegroup(name)
        }

        fn contactgroup(&self, name: &str) -> Option<Arc<crate::model::ContactGroup>> {
            self.0.contactgroup(name)
        }

        fn program_status(&self) -> Arc<crate::model::ProgramStatus> {
            self.0.program_status()
        }
    }

    #[test]
    fn test_group_join_skips_unknown_groups() {
        let store = NoGroups(store());
        let query = parse_query("GET hostsbygroup\nColumns: name\n").unwrap();
        let result = Executor::new(&store).execute(&query).unwrap();
        assert!(result.is_empty());

        let query = parse_query("GET servicesbygroup\nColumns: description servicegroup_name\n").unwrap();
        let result = Executor::new(&store).execute(&query).unwrap();
        assert_eq!(result.rows, vec![vec![Value::from("http"), Value::from("frontends")]]);
    }

    #[test]
    fn test_flattened_annotations() {
        let store = store();
        let comments = run(&store, "GET comments\nColumns: id host_name is_service\n");
        assert_eq!(
            comments.rows,
            vec![vec![Value::Int(7), Value::from("web01"), Value::Bool(false)]]
        );
        let downtimes = run(&store, "GET downtimes\nColumns: id service_description\n");
        assert_eq!(downtimes.rows, vec![vec![Value::Int(3), Value::from("mysql")]]);
    }

    #[test]
    fn test_problems_and_status() {
        let store = store();
        let problems = run(&store, "GET problems\nColumns: source impacts\n");
        assert_eq!(
            problems.rows,
            vec![vec![Value::from("db01"), Value::List(vec![Value::from("db01/mysql")])]]
        );
        let status = run(&store, "GET status\nColumns: num_hosts\n");
        assert_eq!(status.rows, vec![vec![Value::Int(3)]]);
    }

    #[test]
    fn test_columns_table_is_post_filtered() {
        let store = store();
        let result = run(&store, "GET columns\nColumns: name\nFilter: table = problems\n");
        assert_eq!(result.rows, vec![vec![Value::from("source")], vec![Value::from("impacts")]]);
    }

    #[test]
    fn test_log_table_reapplies_regex() {
        let store = store();
        let logs = SqliteLogStore::open_in_memory().unwrap();
        for (time, message) in [(1, "HOST ALERT: a"), (2, "SERVICE ALERT: b"), (3, "HOST ALERT: c")] {
            logs.insert(&LogLine {
                time,
                message: message.to_string(),
                ..Default::default()
            })
            .unwrap();
        }
        let query = parse_query("GET log\nColumns: time\nFilter: message ~ ^HOST\nLimit: 1\n").unwrap();
        let result = Executor::new(&store).with_log_store(&logs).execute(&query).unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(1)]]);
    }

    #[test]
    fn test_log_without_store_is_empty() {
        let store = store();
        assert!(run(&store, "GET log\nColumns: time\n").is_empty());
    }

    #[test]
    fn test_auth_user_scopes_rows() {
        let store = MemoryStore::build(
            StoreSnapshot::default()
                .host(Host::new("a").contact("alice"))
                .host(Host::new("b").contact("bob"))
                .contact(Contact::new("alice"))
                .contact(Contact::new("bob")),
        )
        .unwrap();
        let result = run(&store, "GET hosts\nColumns: name\nAuthUser: alice\n");
        assert_eq!(result.rows, vec![vec![Value::from("a")]]);

        let negated = run(&store, "GET hosts\nColumns: name\nAuthUser: alice\nFilter: name = a\nNegate:\n");
        assert!(negated.is_empty());
    }
}
