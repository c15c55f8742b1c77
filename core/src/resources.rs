//! One method per API operation.
//!
//! Each method only picks the verb, route, body and expected status and
//! defers to `send`, `send_record` or `fetch_all`. Collection listings
//! return every page unless `params` pins a `page`.
//!
//! Identifiers are taken as `impl Display` and stringified into the path
//! verbatim, so they must already be URL-safe.

use std::fmt::Display;

use serde_json::{Map, Value};

use crate::client::CbwClient;
use crate::diagnostics::Event;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod::{self, Delete, Get, Patch, Post, Put};
use crate::record::Record;
use crate::routes::*;
use crate::types::{Endpoint, ExpectedStatus, Outcome, Params};

const OK: ExpectedStatus = ExpectedStatus::Exactly(200);
const CREATED: ExpectedStatus = ExpectedStatus::Exactly(201);
const NO_CONTENT: ExpectedStatus = ExpectedStatus::Exactly(204);
const ANY_SUCCESS: ExpectedStatus = ExpectedStatus::Success;

impl CbwClient {
    fn item(&self, route: &str, id: impl Display) -> ApiResult<Record> {
        self.send_record(&Endpoint::new(Get, route).segment(id), OK)
    }

    fn list(&self, route: &str, params: &Params) -> ApiResult<Vec<Record>> {
        self.fetch_all(Get, route, params)
    }

    fn call(
        &self,
        endpoint: ApiResult<Endpoint>,
        expected: ExpectedStatus,
    ) -> ApiResult<Record> {
        self.send_record(&endpoint?, expected)
    }

    /// Reject empty identifiers before any request is made.
    fn require_id(&self, id: impl Display, what: &'static str) -> ApiResult<String> {
        let id = id.to_string();
        if id.trim().is_empty() {
            self.diagnostics().record(Event::MissingIdentifier { what });
            return Err(ApiError::MissingIdentifier(what));
        }
        Ok(id)
    }

    fn on(&self, method: HttpMethod, route: &str) -> Endpoint {
        Endpoint::new(method, route)
    }

    // ---------------------------------------------------------------------
    // Ping
    // ---------------------------------------------------------------------

    /// Check connectivity and credentials.
    pub fn ping(&self) -> ApiResult<Record> {
        self.send_record(&self.on(Get, ROUTE_PING), OK)
    }

    // ---------------------------------------------------------------------
    // Servers
    // ---------------------------------------------------------------------

    pub fn servers(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_SERVERS, params)
    }

    pub fn server(&self, server_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_SERVERS, server_id)
    }

    /// Relaunch the analysis script on a server.
    pub fn server_refresh(&self, server_id: impl Display) -> ApiResult<Record> {
        let endpoint = self.on(Put, ROUTE_SERVERS).segment(server_id).segment("refresh");
        self.send_record(&endpoint, OK)
    }

    /// Update a server's groups or other writable attributes.
    pub fn update_server(&self, server_id: impl Display, info: &Value) -> ApiResult<Outcome> {
        let id = self.require_id(server_id, "server id")?;
        let endpoint = self.on(Patch, ROUTE_SERVERS).segment(id).json(info)?;
        self.send(&endpoint, ANY_SUCCESS)
    }

    pub fn delete_server(&self, server_id: impl Display) -> ApiResult<Outcome> {
        let id = self.require_id(server_id, "server id")?;
        self.send(&self.on(Delete, ROUTE_SERVERS).segment(id), ANY_SUCCESS)
    }

    /// Schedule installation of fixes on a server.
    pub fn server_schedule_updates(&self, server_id: impl Display, params: Option<&Value>) -> ApiResult<Record> {
        let endpoint = self
            .on(Post, ROUTE_SERVERS)
            .segment(server_id)
            .segment("updates")
            .json_opt(params);
        self.call(endpoint, OK)
    }

    pub fn update_server_cve(
        &self,
        server_id: impl Display,
        cve_code: impl Display,
        params: Option<&Value>,
    ) -> ApiResult<Record> {
        let endpoint = self
            .on(Put, ROUTE_SERVERS)
            .segment(server_id)
            .segment("cve_announcements")
            .segment(cve_code)
            .json_opt(params);
        self.call(endpoint, OK)
    }

    // ---------------------------------------------------------------------
    // Agents
    // ---------------------------------------------------------------------

    pub fn agents(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_AGENTS, params)
    }

    pub fn agent(&self, agent_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_AGENTS, agent_id)
    }

    pub fn delete_agent(&self, agent_id: impl Display) -> ApiResult<Outcome> {
        let id = self.require_id(agent_id, "agent id")?;
        self.send(&self.on(Delete, ROUTE_AGENTS).segment(id), ANY_SUCCESS)
    }

    // ---------------------------------------------------------------------
    // Remote accesses
    // ---------------------------------------------------------------------

    pub fn remote_accesses(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_REMOTE_ACCESSES, params)
    }

    pub fn remote_access(&self, remote_access_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_REMOTE_ACCESSES, remote_access_id)
    }

    /// Create a remote access.
    ///
    /// When `info` references a stored credential (`credential_id`) it is
    /// sent unchanged; otherwise it is reshaped into the inline-credential
    /// form, see [`remote_access_payload`].
    pub fn create_remote_access(&self, info: &Value) -> ApiResult<Outcome> {
        let Some(fields) = info.as_object().filter(|f| !f.is_empty()) else {
            self.diagnostics().record(Event::MissingIdentifier { what: "remote access definition" });
            return Err(ApiError::MissingIdentifier("remote access definition"));
        };
        let body = remote_access_payload(fields);
        let endpoint = self.on(Post, ROUTE_REMOTE_ACCESSES).json(&body)?;
        self.send(&endpoint, ANY_SUCCESS)
    }

    pub fn update_remote_access(&self, remote_access_id: impl Display, info: &Value) -> ApiResult<Outcome> {
        let id = self.require_id(remote_access_id, "remote access id")?;
        let endpoint = self.on(Patch, ROUTE_REMOTE_ACCESSES).segment(id).json(info)?;
        self.send(&endpoint, ANY_SUCCESS)
    }

    pub fn delete_remote_access(&self, remote_access_id: impl Display) -> ApiResult<Outcome> {
        let id = self.require_id(remote_access_id, "remote access id")?;
        self.send(&self.on(Delete, ROUTE_REMOTE_ACCESSES).segment(id), ANY_SUCCESS)
    }

    /// Test an agentless deployment through a remote access.
    pub fn test_deploy_remote_access(&self, remote_access_id: impl Display) -> ApiResult<Record> {
        let endpoint = self
            .on(Put, ROUTE_REMOTE_ACCESSES)
            .segment(remote_access_id)
            .segment("test_deploy");
        self.send_record(&endpoint, OK)
    }

    // ---------------------------------------------------------------------
    // CVE announcements
    // ---------------------------------------------------------------------

    pub fn cve_announcements(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_CVE_ANNOUNCEMENTS, params)
    }

    pub fn cve_announcement(&self, cve_code: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_CVE_ANNOUNCEMENTS, cve_code)
    }

    /// Set `cvss_custom` / `score_custom` on a CVE announcement.
    pub fn update_cve_announcement(&self, cve_code: impl Display, params: Option<&Value>) -> ApiResult<Record> {
        let endpoint = self.on(Put, ROUTE_CVE_ANNOUNCEMENTS).segment(cve_code).json_opt(params);
        self.call(endpoint, OK)
    }

    /// Clear the custom scoring fields of a CVE announcement.
    pub fn delete_cve_announcement(&self, cve_code: impl Display) -> ApiResult<Record> {
        self.send_record(&self.on(Delete, ROUTE_CVE_ANNOUNCEMENTS).segment(cve_code), OK)
    }

    // ---------------------------------------------------------------------
    // Groups
    // ---------------------------------------------------------------------

    pub fn groups(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_GROUPS, params)
    }

    pub fn group(&self, group_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_GROUPS, group_id)
    }

    pub fn create_group(&self, params: &Value) -> ApiResult<Record> {
        self.call(self.on(Post, ROUTE_GROUPS).json(params), CREATED)
    }

    pub fn update_group(&self, group_id: impl Display, params: Option<&Value>) -> ApiResult<Record> {
        self.call(self.on(Put, ROUTE_GROUPS).segment(group_id).json_opt(params), OK)
    }

    pub fn delete_group(&self, group_id: impl Display) -> ApiResult<Record> {
        self.send_record(&self.on(Delete, ROUTE_GROUPS).segment(group_id), OK)
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    pub fn users(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_USERS, params)
    }

    pub fn user(&self, user_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_USERS, user_id)
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    pub fn nodes(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_NODES, params)
    }

    pub fn node(&self, node_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_NODES, node_id)
    }

    /// Delete a node and transfer its data to `new_node_id`.
    pub fn delete_node(&self, node_id: impl Display, new_node_id: impl Display) -> ApiResult<Record> {
        let body = serde_json::json!({ "new_id": new_node_id.to_string() });
        self.call(self.on(Delete, ROUTE_NODES).segment(node_id).json(&body), OK)
    }

    // ---------------------------------------------------------------------
    // Hosts
    // ---------------------------------------------------------------------

    pub fn hosts(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_HOSTS, params)
    }

    pub fn host(&self, host_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_HOSTS, host_id)
    }

    pub fn create_host(&self, params: &Value) -> ApiResult<Record> {
        self.call(self.on(Post, ROUTE_HOSTS).json(params), CREATED)
    }

    pub fn update_host(&self, host_id: impl Display, params: Option<&Value>) -> ApiResult<Record> {
        self.call(self.on(Put, ROUTE_HOSTS).segment(host_id).json_opt(params), OK)
    }

    pub fn delete_host(&self, host_id: impl Display) -> ApiResult<Record> {
        self.send_record(&self.on(Delete, ROUTE_HOSTS).segment(host_id), OK)
    }

    // ---------------------------------------------------------------------
    // Security issues
    // ---------------------------------------------------------------------

    pub fn security_issues(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_SECURITY_ISSUES, params)
    }

    pub fn security_issue(&self, security_issue_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_SECURITY_ISSUES, security_issue_id)
    }

    pub fn create_security_issue(&self, params: Option<&Value>) -> ApiResult<Record> {
        self.call(self.on(Post, ROUTE_SECURITY_ISSUES).json_opt(params), CREATED)
    }

    pub fn update_security_issue(&self, security_issue_id: impl Display, params: Option<&Value>) -> ApiResult<Record> {
        let endpoint = self.on(Put, ROUTE_SECURITY_ISSUES).segment(security_issue_id).json_opt(params);
        self.call(endpoint, OK)
    }

    pub fn delete_security_issue(&self, security_issue_id: impl Display) -> ApiResult<Record> {
        self.send_record(&self.on(Delete, ROUTE_SECURITY_ISSUES).segment(security_issue_id), OK)
    }

    // ---------------------------------------------------------------------
    // Importer (air-gapped scanning scripts)
    // ---------------------------------------------------------------------

    /// List the scanning scripts. Not paginated.
    pub fn fetch_importer_scripts(&self, params: &Params) -> ApiResult<Record> {
        self.send_record(&self.on(Get, ROUTE_IMPORTER).query(params), OK)
    }

    pub fn fetch_importer_script(&self, script_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_IMPORTER, script_id)
    }

    /// Upload scanning script output. The server acknowledges with
    /// `204 No Content`, so success is `Outcome::Empty`.
    pub fn upload_importer_results(&self, content: &Value) -> ApiResult<Outcome> {
        let endpoint = self.on(Post, ROUTE_IMPORTER).json(content)?;
        self.send(&endpoint, NO_CONTENT)
    }

    // ---------------------------------------------------------------------
    // Compliance
    // ---------------------------------------------------------------------

    pub fn compliance_servers(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_COMPLIANCE_ASSETS, params)
    }

    pub fn compliance_server(&self, server_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_COMPLIANCE_ASSETS, server_id)
    }

    /// Recheck every rule on one compliance asset.
    pub fn recheck_rules(&self, server_id: impl Display) -> ApiResult<Record> {
        let endpoint = self
            .on(Put, ROUTE_COMPLIANCE_ASSETS)
            .segment(server_id)
            .segment("recheck_rules");
        self.send_record(&endpoint, OK)
    }

    pub fn compliance_rules(&self, params: &Params) -> ApiResult<Vec<Record>> {
        self.list(ROUTE_COMPLIANCE_RULES, params)
    }

    pub fn compliance_rule(&self, rule_id: impl Display) -> ApiResult<Record> {
        self.item(ROUTE_COMPLIANCE_RULES, rule_id)
    }

    pub fn create_compliance_rule(&self, params: &Value) -> ApiResult<Record> {
        self.call(self.on(Post, ROUTE_COMPLIANCE_RULES).json(params), CREATED)
    }

    pub fn update_compliance_rule(&self, rule_id: impl Display, info: &Value) -> ApiResult<Outcome> {
        let id = self.require_id(rule_id, "compliance rule id")?;
        let endpoint = self.on(Put, ROUTE_COMPLIANCE_RULES).segment(id).json(info)?;
        self.send(&endpoint, ANY_SUCCESS)
    }

    pub fn delete_compliance_rule(&self, rule_id: impl Display) -> ApiResult<Outcome> {
        let id = self.require_id(rule_id, "compliance rule id")?;
        self.send(&self.on(Delete, ROUTE_COMPLIANCE_RULES).segment(id), ANY_SUCCESS)
    }

    /// Recheck one rule on every server.
    pub fn recheck_servers(&self, rule_id: impl Display) -> ApiResult<Record> {
        let endpoint = self
            .on(Put, ROUTE_COMPLIANCE_RULES)
            .segment(rule_id)
            .segment("recheck_servers");
        self.send_record(&endpoint, OK)
    }
}

/// Body for `create_remote_access`.
///
/// Definitions carrying a `credential_id` pass through. Inline definitions
/// keep `type`, `address`, `port`, `login` and `node_id`, take the password
/// from `auth_password` or `password`, the key from `priv_password` or
/// `key`, and default `server_groups` to an empty string.
pub fn remote_access_payload(info: &Map<String, Value>) -> Value {
    if info.get("credential_id").is_some_and(is_truthy) {
        return Value::Object(info.clone());
    }
    let field = |name: &str| info.get(name).cloned().unwrap_or(Value::Null);
    let first_truthy = |names: &[&str]| {
        names
            .iter()
            .filter_map(|n| info.get(*n))
            .find(|v| is_truthy(v))
            .cloned()
            .unwrap_or(Value::Null)
    };
    serde_json::json!({
        "type": field("type"),
        "address": field("address"),
        "port": field("port"),
        "login": field("login"),
        "password": first_truthy(&["auth_password", "password"]),
        "key": first_truthy(&["priv_password", "key"]),
        "node_id": field("node_id"),
        "server_groups": info.get("server_groups").cloned().unwrap_or_else(|| Value::String(String::new())),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
