//! Scan hints derived from the primary filter
//!
//! Only top-level conjuncts are considered, so every hint is implied by the
//! filter and can only narrow the scan to a superset of the result.

use super::ast::Query;
use super::filter::{FilterNode, Leaf, Operator};
use crate::model::Hint;

fn equals<'a>(node: &'a FilterNode, field: &str) -> Option<&'a str> {
    match node {
        FilterNode::Leaf(Leaf { column, op: Operator::Eq, raw, .. })
            if !column.is_foreign() && column.storage_name() == field =>
        {
            Some(raw.as_str())
        }
        _ => None,
    }
}

fn contains<'a>(node: &'a FilterNode, field: &str) -> Option<&'a str> {
    match node {
        FilterNode::Leaf(Leaf { column, op: Operator::Ge, raw, .. })
            if !column.is_foreign() && column.storage_name() == field =>
        {
            Some(raw.as_str())
        }
        _ => None,
    }
}

/// Flatten nested ANDs into their conjuncts
fn conjuncts<'a>(node: &'a FilterNode, out: &mut Vec<&'a FilterNode>) {
    match node {
        FilterNode::And(nodes) => nodes.iter().for_each(|n| conjuncts(n, out)),
        other => out.push(other),
    }
}

fn service_key(node: &FilterNode) -> Option<(String, String)> {
    let mut parts = Vec::new();
    conjuncts(node, &mut parts);
    let host = parts.iter().find_map(|n| equals(n, "host_name"))?;
    let service = parts.iter().find_map(|n| equals(n, "service_description"))?;
    Some((host.to_string(), service.to_string()))
}

/// Build the advisory scan hint for a query
pub fn derive_hint(query: &Query) -> Hint {
    let mut hint = Hint::default();
    if !query.table.is_host_or_service_shaped() {
        return hint;
    }
    hint.by_contact = query.auth_user.clone();

    let services = query.table.is_service_shaped();
    let mut parts = Vec::new();
    for entry in query.filter.entries() {
        conjuncts(entry, &mut parts);
    }

    hint.by_host = parts
        .iter()
        .find_map(|n| equals(n, "host_name"))
        .map(str::to_string);
    hint.by_group = parts
        .iter()
        .find_map(|n| contains(n, "groups"))
        .map(str::to_string);

    if services {
        hint.by_service_key = parts.iter().find_map(|n| equals(n, "service_description")).and_then(
            |description| {
                hint.by_host
                    .as_ref()
                    .map(|host| (host.clone(), description.to_string()))
            },
        );
    }

    for part in &parts {
        let FilterNode::Or(alternatives) = part else {
            continue;
        };
        if alternatives.is_empty() {
            continue;
        }
        if hint.by_hosts.is_none() && hint.by_host.is_none() {
            let hosts: Option<Vec<String>> = alternatives
                .iter()
                .map(|n| equals(n, "host_name").map(str::to_string))
                .collect();
            if hosts.is_some() {
                hint.by_hosts = hosts;
                continue;
            }
        }
        if services && hint.by_services.is_none() && hint.by_service_key.is_none() {
            let keys: Option<Vec<(String, String)>> =
                alternatives.iter().map(service_key).collect();
            if keys.is_some() {
                hint.by_services = keys;
            }
        }
    }

    if !hint.is_empty() {
        tracing::debug!(?hint, table = %query.table, "Derived scan hint");
    }
    hint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Registry, Table};

    fn leaf(table: Table, column: &str, op: &str, raw: &str) -> FilterNode {
        let column = Registry::global().column(table, column).unwrap().clone();
        FilterNode::Leaf(Leaf::new(column, Operator::parse(op).unwrap(), raw).unwrap())
    }

    #[test]
    fn test_host_name_hint() {
        let mut query = Query::new(Table::Hosts);
        query.filter.push(leaf(Table::Hosts, "name", "=", "web01"));
        query.filter.push(leaf(Table::Hosts, "state", "=", "0"));
        assert_eq!(derive_hint(&query).by_host.as_deref(), Some("web01"));
    }

    #[test]
    fn test_or_of_hosts() {
        let mut query = Query::new(Table::Hosts);
        query.filter.push(leaf(Table::Hosts, "name", "=", "a"));
        query.filter.push(leaf(Table::Hosts, "name", "=", "b"));
        query.filter.or(2).unwrap();
        let hint = derive_hint(&query);
        assert_eq!(hint.by_hosts, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(hint.by_host.is_none());
    }

    #[test]
    fn test_service_key_and_services() {
        let mut query = Query::new(Table::Services);
        query.filter.push(leaf(Table::Services, "host_name", "=", "web01"));
        query.filter.push(leaf(Table::Services, "description", "=", "http"));
        let hint = derive_hint(&query);
        assert_eq!(hint.by_service_key, Some(("web01".into(), "http".into())));

        let mut query = Query::new(Table::Services);
        for (host, svc) in [("a", "x"), ("b", "y")] {
            query.filter.push(leaf(Table::Services, "host_name", "=", host));
            query.filter.push(leaf(Table::Services, "description", "=", svc));
            query.filter.and(2).unwrap();
        }
        query.filter.or(2).unwrap();
        let hint = derive_hint(&query);
        assert_eq!(
            hint.by_services,
            Some(vec![("a".into(), "x".into()), ("b".into(), "y".into())])
        );
    }

    #[test]
    fn test_negated_or_partial_filters_give_no_hint() {
        let mut query = Query::new(Table::Hosts);
        query.filter.push(leaf(Table::Hosts, "name", "=", "a"));
        query.filter.push(leaf(Table::Hosts, "state", "=", "1"));
        query.filter.or(2).unwrap();
        assert!(derive_hint(&query).is_empty());

        let mut query = Query::new(Table::Hosts);
        query.filter.push(leaf(Table::Hosts, "name", "=", "a"));
        query.filter.negate(None).unwrap();
        assert!(derive_hint(&query).is_empty());
    }

    #[test]
    fn test_group_and_contact_hints() {
        let mut query = Query::new(Table::HostsByGroup);
        query.filter.push(leaf(Table::HostsByGroup, "groups", ">=", "linux"));
        query.auth_user = Some("alice".into());
        let hint = derive_hint(&query);
        assert_eq!(hint.by_group.as_deref(), Some("linux"));
        assert_eq!(hint.by_contact.as_deref(), Some("alice"));

        let mut query = Query::new(Table::Contacts);
        query.filter.push(leaf(Table::Contacts, "name", "=", "alice"));
        assert!(derive_hint(&query).is_empty());
    }
}
