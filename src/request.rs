//! Combined LQL requests
//!
//! One request may mix external commands, a query and wait lines:
//!
//! ```text
//! COMMAND [1700000000] SCHEDULE_FORCED_SVC_CHECK;web01;http;1700000000
//! GET services
//! WaitObject: web01;http
//! WaitTrigger: check
//! Columns: state
//! ```
//!
//! Accepted shapes: commands only, query alone, query + wait,
//! commands + query, commands + query + wait.

use crate::query::{QueryError, QueryResult};

/// A raw request split into its sub-requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveStatusRequest {
    /// Command text after the `COMMAND` keyword, forwarded verbatim
    pub commands: Vec<String>,
    /// Query lines in request order
    pub query: Vec<String>,
    pub wait: Vec<String>,
}

impl LiveStatusRequest {
    /// Split raw request text; a blank line ends the request
    pub fn parse(text: &str) -> QueryResult<Self> {
        let mut request = LiveStatusRequest::default();
        for line in text.lines().map(str::trim).take_while(|l| !l.is_empty()) {
            if let Some(command) = line.strip_prefix("COMMAND") {
                request.commands.push(command.trim().to_string());
            } else if line.starts_with("Wait") {
                request.wait.push(line.to_string());
            } else {
                request.query.push(line.to_string());
            }
        }
        request.validate()?;
        Ok(request)
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn has_wait(&self) -> bool {
        !self.wait.is_empty()
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    fn validate(&self) -> QueryResult<()> {
        if self.has_query() || (self.has_commands() && !self.has_wait()) {
            return Ok(());
        }
        let reason = if self.has_wait() {
            "wait lines need a query"
        } else {
            "empty request"
        };
        Err(QueryError::BadRequest(reason.to_string()))
    }

    /// Query lines joined back into request text
    pub fn query_text(&self) -> String {
        let mut text = self.query.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sub_requests() {
        let request = LiveStatusRequest::parse(
            "COMMAND [1] DISABLE_NOTIFICATIONS\nGET hosts\nWaitObject: web01\nColumns: name\n\nGET ignored\n",
        )
        .unwrap();
        assert_eq!(request.commands, vec!["[1] DISABLE_NOTIFICATIONS"]);
        assert_eq!(request.query, vec!["GET hosts", "Columns: name"]);
        assert_eq!(request.wait, vec!["WaitObject: web01"]);
        assert_eq!(request.query_text(), "GET hosts\nColumns: name\n");
    }

    #[test]
    fn test_allowed_combinations() {
        assert!(LiveStatusRequest::parse("COMMAND [1] A\nCOMMAND [2] B\n").is_ok());
        assert!(LiveStatusRequest::parse("GET hosts\n").is_ok());
        assert!(LiveStatusRequest::parse("GET hosts\nWaitTimeout: 10\n").is_ok());
        assert!(LiveStatusRequest::parse("COMMAND [1] A\nGET hosts\nWaitTimeout: 10\n").is_ok());
    }

    #[test]
    fn test_rejected_combinations() {
        let err = LiveStatusRequest::parse("COMMAND [1] A\nWaitTimeout: 10\n").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(LiveStatusRequest::parse("WaitObject: web01\n").is_err());
        assert!(LiveStatusRequest::parse("\n").is_err());
    }
}
