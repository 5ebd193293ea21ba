//! Monitoring entities exposed through the LQL tables
//!
//! These are the objects the broker keeps in its live object graph:
//! - `Host`, `Service`: checked objects with state and relations
//! - `Contact`: notification targets, also used for authorization
//! - `HostGroup`, `ServiceGroup`, `ContactGroup`: named memberships
//! - `Comment`, `Downtime`: annotations attached to hosts and services
//! - `Command`, `Timeperiod`: configuration objects
//! - `ProgramStatus`: process-wide counters and settings
//! - `LogLine`: one entry of the monitoring log history
//!
//! All entities deserialize from a store snapshot; fields the snapshot
//! leaves out take their `Default` value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Host state as reported by the last check
pub const HOST_UP: i64 = 0;
pub const HOST_DOWN: i64 = 1;
pub const HOST_UNREACHABLE: i64 = 2;

/// Service states
pub const SERVICE_OK: i64 = 0;
pub const SERVICE_WARNING: i64 = 1;
pub const SERVICE_CRITICAL: i64 = 2;
pub const SERVICE_UNKNOWN: i64 = 3;

/// A monitored host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Host {
    /// Unique host name
    pub name: String,
    pub alias: String,
    pub display_name: String,
    pub address: String,
    /// 0 = up, 1 = down, 2 = unreachable
    pub state: i64,
    /// 0 = soft, 1 = hard
    pub state_type: i64,
    pub has_been_checked: bool,
    pub plugin_output: String,
    pub long_plugin_output: String,
    pub perf_data: String,
    pub max_check_attempts: i64,
    pub current_attempt: i64,
    /// Unix timestamps in seconds
    pub last_check: i64,
    pub next_check: i64,
    pub last_state_change: i64,
    pub latency: f64,
    pub execution_time: f64,
    pub percent_state_change: f64,
    pub acknowledged: bool,
    pub scheduled_downtime_depth: i64,
    pub is_flapping: bool,
    pub checks_enabled: bool,
    pub notifications_enabled: bool,
    pub active_checks_enabled: bool,
    pub accept_passive_checks: bool,
    pub check_command: String,
    pub notes: String,
    pub notes_url: String,
    pub action_url: String,
    pub icon_image: String,
    /// Hostgroup names
    pub groups: Vec<String>,
    pub contacts: Vec<String>,
    pub contact_groups: Vec<String>,
    pub parents: Vec<String>,
    pub childs: Vec<String>,
    pub custom_variables: BTreeMap<String, String>,
    /// Root-problem flag from business impact analysis
    pub is_problem: bool,
    pub business_impact: i64,
    /// Names of objects impacted by this host
    pub impacts: Vec<String>,
    pub source_problems: Vec<String>,
    pub comments: Vec<Arc<Comment>>,
    pub downtimes: Vec<Arc<Downtime>>,
    /// Summaries of this host's services, filled in by the store
    #[serde(skip)]
    pub services: Vec<ServiceSummary>,
}

impl Host {
    /// Create a host with the given name and defaults elsewhere
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            display_name: name.clone(),
            name,
            max_check_attempts: 1,
            checks_enabled: true,
            notifications_enabled: true,
            active_checks_enabled: true,
            accept_passive_checks: true,
            ..Default::default()
        }
    }

    /// Builder method: set alias
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Builder method: set state and mark the host as checked
    pub fn state(mut self, state: i64) -> Self {
        self.state = state;
        self.has_been_checked = true;
        self
    }

    /// Builder method: add a hostgroup membership
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Builder method: add a contact
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contacts.push(contact.into());
        self
    }

    /// Builder method: set max check attempts
    pub fn max_check_attempts(mut self, attempts: i64) -> Self {
        self.max_check_attempts = attempts;
        self
    }

    /// Count services in the given state; pending services are excluded
    pub fn num_services_in_state(&self, state: i64) -> usize {
        self.services
            .iter()
            .filter(|s| s.has_been_checked && s.state == state)
            .count()
    }

    /// Number of services that were never checked
    pub fn num_services_pending(&self) -> usize {
        self.services.iter().filter(|s| !s.has_been_checked).count()
    }

    /// Worst state among this host's services (critical ranks above unknown)
    pub fn worst_service_state(&self) -> i64 {
        self.services
            .iter()
            .map(|s| s.state)
            .max_by_key(|s| service_state_rank(*s))
            .unwrap_or(SERVICE_OK)
    }
}

/// Ordering used for "worst state" columns: ok < warning < unknown < critical
pub fn service_state_rank(state: i64) -> i64 {
    match state {
        SERVICE_OK => 0,
        SERVICE_WARNING => 1,
        SERVICE_UNKNOWN => 2,
        SERVICE_CRITICAL => 3,
        _ => 2,
    }
}

/// Ordering used for worst host state: up < unreachable < down
pub fn host_state_rank(state: i64) -> i64 {
    match state {
        HOST_UP => 0,
        HOST_UNREACHABLE => 1,
        HOST_DOWN => 2,
        _ => 1,
    }
}

/// Compact view of a service kept on its host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub description: String,
    pub state: i64,
    pub has_been_checked: bool,
}

/// A monitored service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub host_name: String,
    pub description: String,
    pub display_name: String,
    /// 0 = ok, 1 = warning, 2 = critical, 3 = unknown
    pub state: i64,
    pub state_type: i64,
    pub has_been_checked: bool,
    pub plugin_output: String,
    pub long_plugin_output: String,
    pub perf_data: String,
    pub max_check_attempts: i64,
    pub current_attempt: i64,
    pub last_check: i64,
    pub next_check: i64,
    pub last_state_change: i64,
    pub latency: f64,
    pub execution_time: f64,
    pub percent_state_change: f64,
    pub acknowledged: bool,
    pub scheduled_downtime_depth: i64,
    pub is_flapping: bool,
    pub checks_enabled: bool,
    pub notifications_enabled: bool,
    pub active_checks_enabled: bool,
    pub accept_passive_checks: bool,
    pub check_command: String,
    pub notes: String,
    pub notes_url: String,
    pub action_url: String,
    pub icon_image: String,
    /// Servicegroup names
    pub groups: Vec<String>,
    pub contacts: Vec<String>,
    pub contact_groups: Vec<String>,
    pub custom_variables: BTreeMap<String, String>,
    pub is_problem: bool,
    pub business_impact: i64,
    pub impacts: Vec<String>,
    pub source_problems: Vec<String>,
    pub comments: Vec<Arc<Comment>>,
    pub downtimes: Vec<Arc<Downtime>>,
    /// Owning host, resolved by the store
    #[serde(skip)]
    pub host: Arc<Host>,
}

impl Service {
    /// Create a service on the given host
    pub fn new(host_name: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            host_name: host_name.into(),
            display_name: description.clone(),
            description,
            max_check_attempts: 1,
            checks_enabled: true,
            notifications_enabled: true,
            active_checks_enabled: true,
            accept_passive_checks: true,
            ..Default::default()
        }
    }

    /// Builder method: set state and mark the service as checked
    pub fn state(mut self, state: i64) -> Self {
        self.state = state;
        self.has_been_checked = true;
        self
    }

    /// Builder method: add a servicegroup membership
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Builder method: add a contact
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contacts.push(contact.into());
        self
    }

    /// Builder method: set max check attempts
    pub fn max_check_attempts(mut self, attempts: i64) -> Self {
        self.max_check_attempts = attempts;
        self
    }

    /// `host;description` key used by hints and service membership lists
    pub fn key(&self) -> (String, String) {
        (self.host_name.clone(), self.description.clone())
    }
}

/// A notification contact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub name: String,
    pub alias: String,
    pub email: String,
    pub pager: String,
    pub can_submit_commands: bool,
    pub host_notifications_enabled: bool,
    pub service_notifications_enabled: bool,
    pub host_notification_period: String,
    pub service_notification_period: String,
    pub in_host_notification_period: bool,
    pub in_service_notification_period: bool,
    /// Contactgroup names
    pub groups: Vec<String>,
    pub custom_variables: BTreeMap<String, String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            host_notifications_enabled: true,
            service_notifications_enabled: true,
            ..Default::default()
        }
    }

    /// Builder method: add a contactgroup membership
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}

/// A named set of hosts; membership is derived from `Host::groups`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostGroup {
    pub name: String,
    pub alias: String,
    pub notes: String,
    pub notes_url: String,
    pub action_url: String,
    #[serde(skip)]
    pub hosts: Vec<Arc<Host>>,
}

impl HostGroup {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            ..Default::default()
        }
    }
}

/// A named set of services; membership is derived from `Service::groups`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceGroup {
    pub name: String,
    pub alias: String,
    pub notes: String,
    pub notes_url: String,
    pub action_url: String,
    #[serde(skip)]
    pub services: Vec<Arc<Service>>,
}

impl ServiceGroup {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            ..Default::default()
        }
    }
}

/// A named set of contacts; membership is derived from `Contact::groups`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactGroup {
    pub name: String,
    pub alias: String,
    #[serde(skip)]
    pub members: Vec<String>,
}

impl ContactGroup {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            ..Default::default()
        }
    }
}

/// A check or notification command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Command {
    pub name: String,
    pub line: String,
}

/// A timeperiod definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeperiod {
    pub name: String,
    pub alias: String,
    /// Whether the current time lies inside the period
    pub in_period: bool,
}

/// A comment attached to a host or service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub comment: String,
    pub entry_time: i64,
    /// 1 = user, 2 = downtime, 3 = flapping, 4 = acknowledgement
    pub entry_type: i64,
    pub persistent: bool,
    /// 0 = internal, 1 = external
    pub source: i64,
    pub expires: bool,
    pub expire_time: i64,
}

/// A scheduled downtime attached to a host or service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Downtime {
    pub id: i64,
    pub author: String,
    pub comment: String,
    pub entry_time: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub fixed: bool,
    /// Duration in seconds for flexible downtimes
    pub duration: i64,
    pub triggered_by: i64,
    pub is_in_effect: bool,
}

/// Process-wide status, a single row in the `status` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramStatus {
    pub program_version: String,
    pub livestatus_version: String,
    pub program_start: i64,
    pub pid: i64,
    pub last_command_check: i64,
    pub last_log_rotation: i64,
    pub interval_length: i64,
    pub enable_notifications: bool,
    pub execute_service_checks: bool,
    pub accept_passive_service_checks: bool,
    pub execute_host_checks: bool,
    pub accept_passive_host_checks: bool,
    pub enable_event_handlers: bool,
    pub obsess_over_services: bool,
    pub obsess_over_hosts: bool,
    pub check_service_freshness: bool,
    pub check_host_freshness: bool,
    pub enable_flap_detection: bool,
    pub process_performance_data: bool,
    pub connections: i64,
    pub requests: i64,
    pub cached_log_messages: i64,
    /// Object counts, filled in by the store
    #[serde(skip)]
    pub num_hosts: i64,
    #[serde(skip)]
    pub num_services: i64,
}

/// One line of the monitoring log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogLine {
    pub time: i64,
    pub lineno: i64,
    /// 0 = info, 1 = alert, 2 = program, 3 = notification, 4 = passive, 5 = command, 6 = state
    pub class: i64,
    #[serde(rename = "type")]
    pub log_type: String,
    pub options: String,
    pub message: String,
    pub state: i64,
    pub state_type: String,
    pub attempt: i64,
    pub host_name: String,
    pub service_description: String,
    pub contact_name: String,
    pub plugin_output: String,
    pub command_name: String,
}

/// A root problem and the objects it impacts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problem {
    /// Host name or `host/service` of the source
    pub source: String,
    pub impacts: Vec<String>,
}

/// One row of the `columns` meta-table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub table: String,
    pub name: String,
    pub description: String,
    pub datatype: String,
}
