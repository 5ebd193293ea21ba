//! Declarative column tables
//!
//! One function per base table returning its native columns in canonical
//! order. Link columns are added later by the registry.

use super::column::{Accessor, Column, Datatype};
use crate::model::types::{
    host_state_rank, service_state_rank, HOST_DOWN, HOST_UNREACHABLE, HOST_UP, SERVICE_CRITICAL,
    SERVICE_OK, SERVICE_UNKNOWN, SERVICE_WARNING,
};
use crate::model::*;
use std::collections::BTreeMap;

use super::column::Datatype::{Bool, Float, Int, List, String as Str};

fn on<T: 'static>(
    project: fn(&Item) -> Option<&T>,
    f: impl Fn(&T) -> Value + Send + Sync + 'static,
) -> Accessor {
    Accessor::new(move |item| project(item).map(&f))
}

fn host(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&Host) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_host, f))
}

fn service(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&Service) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_service, f))
}

fn contact(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&Contact) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_contact, f))
}

fn hostgroup(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&HostGroup) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_hostgroup, f))
}

fn servicegroup(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&ServiceGroup) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_servicegroup, f))
}

fn comment(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&Comment) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_comment, f))
}

fn downtime(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&Downtime) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_downtime, f))
}

fn program(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&ProgramStatus) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_status, f))
}

fn log(
    name: &str,
    datatype: Datatype,
    description: &str,
    f: impl Fn(&LogLine) -> Value + Send + Sync + 'static,
) -> Column {
    Column::new(name, datatype, description, on(Item::as_log, f))
}

fn ids<T>(entries: &[std::sync::Arc<T>], id: fn(&T) -> i64) -> Value {
    Value::List(entries.iter().map(|e| Value::Int(id(e))).collect())
}

fn var_names(vars: &BTreeMap<String, String>) -> Value {
    Value::List(vars.keys().map(Value::from).collect())
}

fn var_values(vars: &BTreeMap<String, String>) -> Value {
    Value::List(vars.values().map(Value::from).collect())
}

fn var_pairs(vars: &BTreeMap<String, String>) -> Value {
    Value::List(
        vars.iter()
            .map(|(k, v)| Value::List(vec![Value::from(k), Value::from(v)]))
            .collect(),
    )
}

pub fn hosts() -> Vec<Column> {
    vec![
        host("name", Str, "Host name", |h| Value::from(&h.name)).redirect("host_name"),
        host("alias", Str, "An alias name for the host", |h| Value::from(&h.alias)),
        host("display_name", Str, "Optional display name", |h| Value::from(&h.display_name)),
        host("address", Str, "IP address", |h| Value::from(&h.address)),
        host("state", Int, "The current state of the host (0: up, 1: down, 2: unreachable)", |h| {
            Value::Int(h.state)
        }),
        host("state_type", Int, "Type of the current state (0: soft, 1: hard)", |h| {
            Value::Int(h.state_type)
        }),
        host("has_been_checked", Bool, "Whether the host has already been checked", |h| {
            Value::Bool(h.has_been_checked)
        }),
        host("plugin_output", Str, "Output of the last host check", |h| {
            Value::from(&h.plugin_output)
        }),
        host("long_plugin_output", Str, "Complete output from check plugin", |h| {
            Value::from(&h.long_plugin_output)
        }),
        host("perf_data", Str, "Optional performance data of the last host check", |h| {
            Value::from(&h.perf_data)
        }),
        host("max_check_attempts", Int, "Max check attempts for active host checks", |h| {
            Value::Int(h.max_check_attempts)
        }),
        host("current_attempt", Int, "Number of the current check attempt", |h| {
            Value::Int(h.current_attempt)
        }),
        host("last_check", Int, "Time of the last check (Unix timestamp)", |h| {
            Value::Int(h.last_check)
        }),
        host("next_check", Int, "Scheduled time for the next check (Unix timestamp)", |h| {
            Value::Int(h.next_check)
        }),
        host("last_state_change", Int, "Time of the last state change (Unix timestamp)", |h| {
            Value::Int(h.last_state_change)
        }),
        host("latency", Float, "Time difference between scheduled check time and actual check time", |h| {
            Value::Float(h.latency)
        }),
        host("execution_time", Float, "Time the host check needed for execution", |h| {
            Value::Float(h.execution_time)
        }),
        host("percent_state_change", Float, "Percent state change", |h| {
            Value::Float(h.percent_state_change)
        }),
        host("acknowledged", Bool, "Whether the current host problem has been acknowledged", |h| {
            Value::Bool(h.acknowledged)
        }),
        host("scheduled_downtime_depth", Int, "The number of downtimes this host is currently in", |h| {
            Value::Int(h.scheduled_downtime_depth)
        }),
        host("is_flapping", Bool, "Whether the host state is flapping", |h| Value::Bool(h.is_flapping)),
        host("checks_enabled", Bool, "Whether checks of the host are enabled", |h| {
            Value::Bool(h.checks_enabled)
        }),
        host("notifications_enabled", Bool, "Whether notifications of the host are enabled", |h| {
            Value::Bool(h.notifications_enabled)
        }),
        host("active_checks_enabled", Bool, "Whether active checks are enabled for the host", |h| {
            Value::Bool(h.active_checks_enabled)
        }),
        host("accept_passive_checks", Bool, "Whether passive host checks are accepted", |h| {
            Value::Bool(h.accept_passive_checks)
        }),
        host("check_command", Str, "Nagios command for active host check", |h| {
            Value::from(&h.check_command)
        }),
        host("notes", Str, "Optional notes for this host", |h| Value::from(&h.notes)),
        host("notes_url", Str, "An optional URL with further information about the host", |h| {
            Value::from(&h.notes_url)
        }),
        host("action_url", Str, "An optional URL to custom actions or information about this host", |h| {
            Value::from(&h.action_url)
        }),
        host("icon_image", Str, "The name of an image file to be used in the web pages", |h| {
            Value::from(&h.icon_image)
        }),
        host("groups", List, "A list of all host groups this host is in", |h| Value::from(&h.groups)),
        host("contacts", List, "A list of all contacts of this host", |h| Value::from(&h.contacts)),
        host("contact_groups", List, "A list of all contact groups this host is in", |h| {
            Value::from(&h.contact_groups)
        }),
        host("parents", List, "A list of all direct parents of the host", |h| Value::from(&h.parents)),
        host("childs", List, "A list of all direct childs of the host", |h| Value::from(&h.childs)),
        host("services", List, "A list of all services of the host", |h| {
            Value::List(h.services.iter().map(|s| Value::from(&s.description)).collect())
        }),
        host("services_with_state", List, "A list of all services including state and has_been_checked", |h| {
            Value::List(
                h.services
                    .iter()
                    .map(|s| {
                        Value::List(vec![
                            Value::from(&s.description),
                            Value::Int(s.state),
                            Value::Bool(s.has_been_checked),
                        ])
                    })
                    .collect(),
            )
        }),
        host("num_services", Int, "The total number of services of the host", |h| {
            Value::from(h.services.len())
        }),
        host("num_services_ok", Int, "The number of the host's services with the soft state OK", |h| {
            Value::from(h.num_services_in_state(SERVICE_OK))
        }),
        host("num_services_warn", Int, "The number of the host's services with the soft state WARN", |h| {
            Value::from(h.num_services_in_state(SERVICE_WARNING))
        }),
        host("num_services_crit", Int, "The number of the host's services with the soft state CRIT", |h| {
            Value::from(h.num_services_in_state(SERVICE_CRITICAL))
        }),
        host("num_services_unknown", Int, "The number of the host's services with the soft state UNKNOWN", |h| {
            Value::from(h.num_services_in_state(SERVICE_UNKNOWN))
        }),
        host("num_services_pending", Int, "The number of the host's services which have not been checked yet", |h| {
            Value::from(h.num_services_pending())
        }),
        host("worst_service_state", Int, "The worst soft state of all of the host's services", |h| {
            Value::Int(h.worst_service_state())
        }),
        host("custom_variable_names", List, "A list of the names of all custom variables", |h| {
            var_names(&h.custom_variables)
        }),
        host("custom_variable_values", List, "A list of the values of the custom variables", |h| {
            var_values(&h.custom_variables)
        }),
        host("custom_variables", List, "A list of all custom variables as name/value pairs", |h| {
            var_pairs(&h.custom_variables)
        }),
        host("comments", List, "A list of the ids of all comments of this host", |h| {
            ids(&h.comments, |c| c.id)
        }),
        host("downtimes", List, "A list of the ids of all scheduled downtimes of this host", |h| {
            ids(&h.downtimes, |d| d.id)
        }),
        host("is_problem", Bool, "Whether the host is a root problem", |h| Value::Bool(h.is_problem)),
        host("business_impact", Int, "The importance we gave to this host", |h| {
            Value::Int(h.business_impact)
        }),
        host("impacts", List, "List of what the source impacts", |h| Value::from(&h.impacts)),
        host("source_problems", List, "The name of the source problems (host or service)", |h| {
            Value::from(&h.source_problems)
        }),
    ]
}

pub fn services() -> Vec<Column> {
    vec![
        service("description", Str, "Description of the service (also used as key)", |s| {
            Value::from(&s.description)
        })
        .redirect("service_description"),
        service("host_name", Str, "Host name", |s| Value::from(&s.host_name)),
        service("display_name", Str, "An optional display name", |s| Value::from(&s.display_name)),
        service("state", Int, "The current state of the service (0: OK, 1: WARN, 2: CRITICAL, 3: UNKNOWN)", |s| {
            Value::Int(s.state)
        }),
        service("state_type", Int, "The type of the current state (0: soft, 1: hard)", |s| {
            Value::Int(s.state_type)
        }),
        service("has_been_checked", Bool, "Whether the service already has been checked", |s| {
            Value::Bool(s.has_been_checked)
        }),
        service("plugin_output", Str, "Output of the last check plugin", |s| {
            Value::from(&s.plugin_output)
        }),
        service("long_plugin_output", Str, "Unabbreviated output of the last check plugin", |s| {
            Value::from(&s.long_plugin_output)
        }),
        service("perf_data", Str, "Performance data of the last check plugin", |s| {
            Value::from(&s.perf_data)
        }),
        service("max_check_attempts", Int, "The maximum number of check attempts", |s| {
            Value::Int(s.max_check_attempts)
        }),
        service("current_attempt", Int, "The number of the current check attempt", |s| {
            Value::Int(s.current_attempt)
        }),
        service("last_check", Int, "The time of the last check (Unix timestamp)", |s| {
            Value::Int(s.last_check)
        }),
        service("next_check", Int, "The scheduled time of the next check (Unix timestamp)", |s| {
            Value::Int(s.next_check)
        }),
        service("last_state_change", Int, "The time of the last state change (Unix timestamp)", |s| {
            Value::Int(s.last_state_change)
        }),
        service("latency", Float, "Time difference between scheduled check time and actual check time", |s| {
            Value::Float(s.latency)
        }),
        service("execution_time", Float, "Time the service check needed for execution", |s| {
            Value::Float(s.execution_time)
        }),
        service("percent_state_change", Float, "Percent state change", |s| {
            Value::Float(s.percent_state_change)
        }),
        service("acknowledged", Bool, "Whether the current service problem has been acknowledged", |s| {
            Value::Bool(s.acknowledged)
        }),
        service("scheduled_downtime_depth", Int, "The number of scheduled downtimes the service is currently in", |s| {
            Value::Int(s.scheduled_downtime_depth)
        }),
        service("is_flapping", Bool, "Whether the service is flapping", |s| Value::Bool(s.is_flapping)),
        service("checks_enabled", Bool, "Whether active checks are enabled for the service", |s| {
            Value::Bool(s.checks_enabled)
        }),
        service("notifications_enabled", Bool, "Whether notifications are enabled for the service", |s| {
            Value::Bool(s.notifications_enabled)
        }),
        service("active_checks_enabled", Bool, "Whether active checks are enabled for the service", |s| {
            Value::Bool(s.active_checks_enabled)
        }),
        service("accept_passive_checks", Bool, "Whether the service accepts passive checks", |s| {
            Value::Bool(s.accept_passive_checks)
        }),
        service("check_command", Str, "Nagios command used for active checks", |s| {
            Value::from(&s.check_command)
        }),
        service("notes", Str, "Optional notes about the service", |s| Value::from(&s.notes)),
        service("notes_url", Str, "An optional URL for additional notes about the service", |s| {
            Value::from(&s.notes_url)
        }),
        service("action_url", Str, "An optional URL for actions or custom information about the service", |s| {
            Value::from(&s.action_url)
        }),
        service("icon_image", Str, "The name of an image to be used as icon in the web interface", |s| {
            Value::from(&s.icon_image)
        }),
        service("groups", List, "A list of all service groups the service is in", |s| {
            Value::from(&s.groups)
        }),
        service("contacts", List, "A list of all contacts of the service", |s| Value::from(&s.contacts)),
        service("contact_groups", List, "A list of all contact groups this service is in", |s| {
            Value::from(&s.contact_groups)
        }),
        service("custom_variable_names", List, "A list of the names of all custom variables of the service", |s| {
            var_names(&s.custom_variables)
        }),
        service("custom_variable_values", List, "A list of the values of all custom variables of the service", |s| {
            var_values(&s.custom_variables)
        }),
        service("custom_variables", List, "A list of all custom variables as name/value pairs", |s| {
            var_pairs(&s.custom_variables)
        }),
        service("comments", List, "A list of all comment ids of the service", |s| {
            ids(&s.comments, |c| c.id)
        }),
        service("downtimes", List, "A list of all downtime ids of the service", |s| {
            ids(&s.downtimes, |d| d.id)
        }),
        service("is_problem", Bool, "Whether the service is a root problem", |s| Value::Bool(s.is_problem)),
        service("business_impact", Int, "The importance we gave to this service", |s| {
            Value::Int(s.business_impact)
        }),
        service("impacts", List, "List of what the source impacts", |s| Value::from(&s.impacts)),
        service("source_problems", List, "The name of the source problems (host or service)", |s| {
            Value::from(&s.source_problems)
        }),
    ]
}

pub fn contacts() -> Vec<Column> {
    vec![
        contact("name", Str, "The login name of the contact person", |c| Value::from(&c.name))
            .redirect("contact_name"),
        contact("alias", Str, "The full name of the contact", |c| Value::from(&c.alias)),
        contact("email", Str, "The email address of the contact", |c| Value::from(&c.email)),
        contact("pager", Str, "The pager address of the contact", |c| Value::from(&c.pager)),
        contact("can_submit_commands", Bool, "Whether the contact is allowed to submit commands", |c| {
            Value::Bool(c.can_submit_commands)
        }),
        contact("host_notifications_enabled", Bool, "Whether the contact will be notified about host problems", |c| {
            Value::Bool(c.host_notifications_enabled)
        }),
        contact("service_notifications_enabled", Bool, "Whether the contact will be notified about service problems", |c| {
            Value::Bool(c.service_notifications_enabled)
        }),
        contact("host_notification_period", Str, "The time period in which the contact will be notified about host problems", |c| {
            Value::from(&c.host_notification_period)
        }),
        contact("service_notification_period", Str, "The time period in which the contact will be notified about service problems", |c| {
            Value::from(&c.service_notification_period)
        }),
        contact("in_host_notification_period", Bool, "Whether the contact is currently in his/her host notification period", |c| {
            Value::Bool(c.in_host_notification_period)
        }),
        contact("in_service_notification_period", Bool, "Whether the contact is currently in his/her service notification period", |c| {
            Value::Bool(c.in_service_notification_period)
        }),
        contact("groups", List, "A list of all contact groups this contact is in", |c| {
            Value::from(&c.groups)
        }),
        contact("custom_variable_names", List, "A list of all custom variables of the contact", |c| {
            var_names(&c.custom_variables)
        }),
        contact("custom_variable_values", List, "A list of the values of all custom variables of the contact", |c| {
            var_values(&c.custom_variables)
        }),
    ]
}

fn count_hosts(group: &HostGroup, state: i64) -> Value {
    Value::from(
        group
            .hosts
            .iter()
            .filter(|h| h.has_been_checked && h.state == state)
            .count(),
    )
}

fn count_group_services(group: &HostGroup, state: i64) -> Value {
    Value::from(
        group
            .hosts
            .iter()
            .map(|h| h.num_services_in_state(state))
            .sum::<usize>(),
    )
}

fn count_servicegroup(group: &ServiceGroup, state: i64) -> Value {
    Value::from(
        group
            .services
            .iter()
            .filter(|s| s.has_been_checked && s.state == state)
            .count(),
    )
}

pub fn hostgroups() -> Vec<Column> {
    vec![
        hostgroup("name", Str, "Name of the hostgroup", |g| Value::from(&g.name)).redirect("hostgroup_name"),
        hostgroup("alias", Str, "An alias of the hostgroup", |g| Value::from(&g.alias)),
        hostgroup("notes", Str, "Optional notes to the hostgroup", |g| Value::from(&g.notes)),
        hostgroup("notes_url", Str, "An optional URL with further information about the hostgroup", |g| {
            Value::from(&g.notes_url)
        }),
        hostgroup("action_url", Str, "An optional URL to custom actions or information about the hostgroup", |g| {
            Value::from(&g.action_url)
        }),
        hostgroup("members", List, "A list of all host names that are members of the hostgroup", |g| {
            Value::List(g.hosts.iter().map(|h| Value::from(&h.name)).collect())
        }),
        hostgroup("members_with_state", List, "A list of all host names that are members of the hostgroup together with state and has_been_checked", |g| {
            Value::List(
                g.hosts
                    .iter()
                    .map(|h| {
                        Value::List(vec![
                            Value::from(&h.name),
                            Value::Int(h.state),
                            Value::Bool(h.has_been_checked),
                        ])
                    })
                    .collect(),
            )
        }),
        hostgroup("num_hosts", Int, "The total number of hosts in the group", |g| Value::from(g.hosts.len())),
        hostgroup("num_hosts_up", Int, "The number of hosts in the group that are up", |g| count_hosts(g, HOST_UP)),
        hostgroup("num_hosts_down", Int, "The number of hosts in the group that are down", |g| {
            count_hosts(g, HOST_DOWN)
        }),
        hostgroup("num_hosts_unreach", Int, "The number of hosts in the group that are unreachable", |g| {
            count_hosts(g, HOST_UNREACHABLE)
        }),
        hostgroup("num_hosts_pending", Int, "The number of hosts in the group that are pending", |g| {
            Value::from(g.hosts.iter().filter(|h| !h.has_been_checked).count())
        }),
        hostgroup("num_services", Int, "The total number of services of hosts in this group", |g| {
            Value::from(g.hosts.iter().map(|h| h.services.len()).sum::<usize>())
        }),
        hostgroup("num_services_ok", Int, "The total number of services with the state OK of hosts in this group", |g| {
            count_group_services(g, SERVICE_OK)
        }),
        hostgroup("num_services_warn", Int, "The total number of services with the state WARN of hosts in this group", |g| {
            count_group_services(g, SERVICE_WARNING)
        }),
        hostgroup("num_services_crit", Int, "The total number of services with the state CRIT of hosts in this group", |g| {
            count_group_services(g, SERVICE_CRITICAL)
        }),
        hostgroup("num_services_unknown", Int, "The total number of services with the state UNKNOWN of hosts in this group", |g| {
            count_group_services(g, SERVICE_UNKNOWN)
        }),
        hostgroup("num_services_pending", Int, "The total number of services with the state Pending of hosts in this group", |g| {
            Value::from(g.hosts.iter().map(|h| h.num_services_pending()).sum::<usize>())
        }),
        hostgroup("worst_host_state", Int, "The worst state of all of the groups' hosts (UP <= UNREACHABLE <= DOWN)", |g| {
            Value::Int(
                g.hosts
                    .iter()
                    .map(|h| h.state)
                    .max_by_key(|s| host_state_rank(*s))
                    .unwrap_or(HOST_UP),
            )
        }),
        hostgroup("worst_service_state", Int, "The worst state of all services that belong to a host of this group", |g| {
            Value::Int(
                g.hosts
                    .iter()
                    .map(|h| h.worst_service_state())
                    .max_by_key(|s| service_state_rank(*s))
                    .unwrap_or(SERVICE_OK),
            )
        }),
    ]
}

pub fn servicegroups() -> Vec<Column> {
    vec![
        servicegroup("name", Str, "The name of the service group", |g| Value::from(&g.name))
            .redirect("servicegroup_name"),
        servicegroup("alias", Str, "An alias of the service group", |g| Value::from(&g.alias)),
        servicegroup("notes", Str, "Optional additional notes about the service group", |g| {
            Value::from(&g.notes)
        }),
        servicegroup("notes_url", Str, "An optional URL to further notes on the service group", |g| {
            Value::from(&g.notes_url)
        }),
        servicegroup("action_url", Str, "An optional URL to custom notes or actions on the service group", |g| {
            Value::from(&g.action_url)
        }),
        servicegroup("members", List, "A list of all members of the service group as host/service pairs", |g| {
            Value::List(
                g.services
                    .iter()
                    .map(|s| Value::List(vec![Value::from(&s.host_name), Value::from(&s.description)]))
                    .collect(),
            )
        }),
        servicegroup("members_with_state", List, "A list of all members of the service group with state and has_been_checked", |g| {
            Value::List(
                g.services
                    .iter()
                    .map(|s| {
                        Value::List(vec![
                            Value::from(&s.host_name),
                            Value::from(&s.description),
                            Value::Int(s.state),
                            Value::Bool(s.has_been_checked),
                        ])
                    })
                    .collect(),
            )
        }),
        servicegroup("num_services", Int, "The total number of services in the group", |g| {
            Value::from(g.services.len())
        }),
        servicegroup("num_services_ok", Int, "The number of services in the group that are OK", |g| {
            count_servicegroup(g, SERVICE_OK)
        }),
        servicegroup("num_services_warn", Int, "The number of services in the group that are WARN", |g| {
            count_servicegroup(g, SERVICE_WARNING)
        }),
        servicegroup("num_services_crit", Int, "The number of services in the group that are CRIT", |g| {
            count_servicegroup(g, SERVICE_CRITICAL)
        }),
        servicegroup("num_services_unknown", Int, "The number of services in the group that are UNKNOWN", |g| {
            count_servicegroup(g, SERVICE_UNKNOWN)
        }),
        servicegroup("num_services_pending", Int, "The number of services in the group that are PENDING", |g| {
            Value::from(g.services.iter().filter(|s| !s.has_been_checked).count())
        }),
        servicegroup("worst_service_state", Int, "The worst soft state of all of the groups services (OK <= WARN <= UNKNOWN <= CRIT)", |g| {
            Value::Int(
                g.services
                    .iter()
                    .map(|s| s.state)
                    .max_by_key(|s| service_state_rank(*s))
                    .unwrap_or(SERVICE_OK),
            )
        }),
    ]
}

pub fn contactgroups() -> Vec<Column> {
    let group = |name: &str, datatype, description: &str, f: fn(&ContactGroup) -> Value| {
        Column::new(name, datatype, description, on(Item::as_contactgroup, f))
    };
    vec![
        group("name", Str, "The name of the contactgroup", |g| Value::from(&g.name))
            .redirect("contactgroup_name"),
        group("alias", Str, "The alias of the contactgroup", |g| Value::from(&g.alias)),
        group("members", List, "A list of all members of this contactgroup", |g| {
            Value::from(&g.members)
        }),
    ]
}

pub fn commands() -> Vec<Column> {
    let command = |name: &str, description: &str, f: fn(&Command) -> Value| {
        Column::new(name, Str, description, on(Item::as_command, f))
    };
    vec![
        command("name", "The name of the command", |c| Value::from(&c.name)).redirect("command_name"),
        command("line", "The shell command line", |c| Value::from(&c.line)),
    ]
}

pub fn timeperiods() -> Vec<Column> {
    let period = |name: &str, datatype, description: &str, f: fn(&Timeperiod) -> Value| {
        Column::new(name, datatype, description, on(Item::as_timeperiod, f))
    };
    vec![
        period("name", Str, "The name of the timeperiod", |t| Value::from(&t.name)).redirect("timeperiod_name"),
        period("alias", Str, "The alias of the timeperiod", |t| Value::from(&t.alias)),
        period("in", Bool, "Whether we are currently in this period (0/1)", |t| Value::Bool(t.in_period)),
    ]
}

fn entry_kind(item: &Item) -> Option<Value> {
    item.is_service_entry().map(|s| Value::Int(if s { 2 } else { 1 }))
}

pub fn comments() -> Vec<Column> {
    vec![
        comment("id", Int, "The id of the comment", |c| Value::Int(c.id)).redirect("comment_id"),
        comment("author", Str, "The contact that entered the comment", |c| Value::from(&c.author)),
        comment("comment", Str, "A comment text", |c| Value::from(&c.comment)),
        comment("entry_time", Int, "The time the entry was made as UNIX timestamp", |c| {
            Value::Int(c.entry_time)
        }),
        comment("entry_type", Int, "The type of the comment: 1 is user, 2 is downtime, 3 is flap and 4 is acknowledgement", |c| {
            Value::Int(c.entry_type)
        }),
        Column::new("type", Int, "The type of the comment: 1 is host, 2 is service", Accessor::new(entry_kind)),
        Column::new(
            "is_service",
            Bool,
            "0, if this entry is for a host, 1 if it is for a service",
            Accessor::new(|i| i.is_service_entry().map(Value::Bool)),
        ),
        comment("persistent", Bool, "Whether this comment is persistent (0/1)", |c| Value::Bool(c.persistent)),
        comment("source", Int, "The source of the comment (0 is internal and 1 is external)", |c| {
            Value::Int(c.source)
        }),
        comment("expires", Bool, "Whether this comment expires", |c| Value::Bool(c.expires)),
        comment("expire_time", Int, "The time of expiry of this comment as a UNIX timestamp", |c| {
            Value::Int(c.expire_time)
        }),
    ]
}

pub fn downtimes() -> Vec<Column> {
    vec![
        downtime("id", Int, "The id of the downtime", |d| Value::Int(d.id)).redirect("downtime_id"),
        downtime("author", Str, "The contact that scheduled the downtime", |d| Value::from(&d.author)),
        downtime("comment", Str, "A comment text", |d| Value::from(&d.comment)),
        downtime("entry_time", Int, "The time the entry was made as UNIX timestamp", |d| {
            Value::Int(d.entry_time)
        }),
        downtime("start_time", Int, "The start time of the downtime as UNIX timestamp", |d| {
            Value::Int(d.start_time)
        }),
        downtime("end_time", Int, "The end time of the downtime as UNIX timestamp", |d| {
            Value::Int(d.end_time)
        }),
        downtime("fixed", Bool, "A 1 if the downtime is fixed, a 0 if it is flexible", |d| Value::Bool(d.fixed)),
        downtime("duration", Int, "The duration of the downtime in seconds", |d| Value::Int(d.duration)),
        downtime("triggered_by", Int, "The id of the downtime this downtime was triggered by or 0 if it was not triggered by another downtime", |d| {
            Value::Int(d.triggered_by)
        }),
        downtime("type", Int, "1 for an active downtime, 0 for a pending one", |d| {
            Value::Int(i64::from(d.is_in_effect))
        }),
        Column::new(
            "is_service",
            Bool,
            "0, if this entry is for a host, 1 if it is for a service",
            Accessor::new(|i| i.is_service_entry().map(Value::Bool)),
        ),
    ]
}

pub fn problems() -> Vec<Column> {
    let problem = |name: &str, datatype, description: &str, f: fn(&Problem) -> Value| {
        Column::new(name, datatype, description, on(Item::as_problem, f))
    };
    vec![
        problem("source", Str, "The source name of the problem (host or service)", |p| {
            Value::from(&p.source)
        }),
        problem("impacts", List, "List of what the source impacts", |p| Value::from(&p.impacts)),
    ]
}

pub fn status() -> Vec<Column> {
    vec![
        program("program_version", Str, "The version of the monitoring daemon", |s| {
            Value::from(&s.program_version)
        }),
        program("livestatus_version", Str, "The version of the livestatus module", |s| {
            Value::from(&s.livestatus_version)
        }),
        program("program_start", Int, "The time of the last program start as UNIX timestamp", |s| {
            Value::Int(s.program_start)
        }),
        program("pid", Int, "The process ID of the monitoring core", |s| Value::Int(s.pid)),
        program("nagios_pid", Int, "The process ID of the monitoring core", |s| Value::Int(s.pid)),
        program("last_command_check", Int, "The time of the last check for a command as UNIX timestamp", |s| {
            Value::Int(s.last_command_check)
        }),
        program("last_log_rotation", Int, "Time time of the last log file rotation", |s| {
            Value::Int(s.last_log_rotation)
        }),
        program("interval_length", Int, "The default interval length from the core configuration", |s| {
            Value::Int(s.interval_length)
        }),
        program("enable_notifications", Bool, "Whether notifications are enabled in general (0/1)", |s| {
            Value::Bool(s.enable_notifications)
        }),
        program("execute_service_checks", Bool, "Whether active service checks are activated in general (0/1)", |s| {
            Value::Bool(s.execute_service_checks)
        }),
        program("accept_passive_service_checks", Bool, "Whether passive service checks are activated in general (0/1)", |s| {
            Value::Bool(s.accept_passive_service_checks)
        }),
        program("execute_host_checks", Bool, "Whether host checks are executed in general (0/1)", |s| {
            Value::Bool(s.execute_host_checks)
        }),
        program("accept_passive_host_checks", Bool, "Whether passive host checks are accepted in general (0/1)", |s| {
            Value::Bool(s.accept_passive_host_checks)
        }),
        program("enable_event_handlers", Bool, "Whether event handlers are activated in general (0/1)", |s| {
            Value::Bool(s.enable_event_handlers)
        }),
        program("obsess_over_services", Bool, "Whether the core will obsess over service checks and run the ocsp_command (0/1)", |s| {
            Value::Bool(s.obsess_over_services)
        }),
        program("obsess_over_hosts", Bool, "Whether the core will obsess over host checks (0/1)", |s| {
            Value::Bool(s.obsess_over_hosts)
        }),
        program("check_service_freshness", Bool, "Whether service freshness checking is activated in general (0/1)", |s| {
            Value::Bool(s.check_service_freshness)
        }),
        program("check_host_freshness", Bool, "Whether host freshness checking is activated in general (0/1)", |s| {
            Value::Bool(s.check_host_freshness)
        }),
        program("enable_flap_detection", Bool, "Whether flap detection is activated in general (0/1)", |s| {
            Value::Bool(s.enable_flap_detection)
        }),
        program("process_performance_data", Bool, "Whether processing of performance data is activated in general (0/1)", |s| {
            Value::Bool(s.process_performance_data)
        }),
        program("connections", Int, "The number of client connections to Livestatus since program start", |s| {
            Value::Int(s.connections)
        }),
        program("requests", Int, "The number of requests to Livestatus since program start", |s| {
            Value::Int(s.requests)
        }),
        program("cached_log_messages", Int, "The current number of log messages MK Livestatus keeps in memory", |s| {
            Value::Int(s.cached_log_messages)
        }),
        program("num_hosts", Int, "The total number of hosts", |s| Value::Int(s.num_hosts)),
        program("num_services", Int, "The total number of services", |s| Value::Int(s.num_services)),
    ]
}

pub fn columns() -> Vec<Column> {
    let info = |name: &str, description: &str, f: fn(&ColumnInfo) -> Value| {
        Column::new(name, Str, description, on(Item::as_column, f))
    };
    vec![
        info("table", "The name of the table", |c| Value::from(&c.table)),
        info("name", "The name of the column within the table", |c| Value::from(&c.name)),
        info("description", "A description of the column", |c| Value::from(&c.description)),
        info("type", "The data type of the column (int, float, string, list)", |c| {
            Value::from(&c.datatype)
        }),
    ]
}

pub fn log_lines() -> Vec<Column> {
    vec![
        log("time", Int, "Time of the log event (UNIX timestamp)", |l| Value::Int(l.time)),
        log("lineno", Int, "The number of the line in the log file", |l| Value::Int(l.lineno)),
        log("class", Int, "The class of the message as integer (0:info, 1:state, 2:program, 3:notification, 4:passive, 5:command)", |l| {
            Value::Int(l.class)
        }),
        log("type", Str, "The type of the message (text before the colon)", |l| Value::from(&l.log_type)),
        log("options", Str, "The part of the message after the ':'", |l| Value::from(&l.options)),
        log("message", Str, "The complete message line including the timestamp", |l| {
            Value::from(&l.message)
        }),
        log("state", Int, "The state of the host or service in question", |l| Value::Int(l.state)),
        log("state_type", Str, "The type of the state (varies on different log classes)", |l| {
            Value::from(&l.state_type)
        }),
        log("attempt", Int, "The number of the check attempt", |l| Value::Int(l.attempt)),
        log("host_name", Str, "The name of the host the log entry is about (might be empty)", |l| {
            Value::from(&l.host_name)
        }),
        log("service_description", Str, "The description of the service log entry is about (might be empty)", |l| {
            Value::from(&l.service_description)
        }),
        log("contact_name", Str, "The name of the contact the log entry is about (might be empty)", |l| {
            Value::from(&l.contact_name)
        }),
        log("plugin_output", Str, "The output of the check, if any is associated with the message", |l| {
            Value::from(&l.plugin_output)
        }),
        log("command_name", Str, "The name of the command of the log entry (e.g. for notifications)", |l| {
            Value::from(&l.command_name)
        }),
    ]
}
