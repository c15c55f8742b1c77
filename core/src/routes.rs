//! API route prefixes.

pub const ROUTE_AGENTS: &str = "/api/v3/agents";
pub const ROUTE_COMPLIANCE_ASSETS: &str = "/api/v3/compliance/servers";
pub const ROUTE_COMPLIANCE_RULES: &str = "/api/v3/compliance/rules";
pub const ROUTE_CVE_ANNOUNCEMENTS: &str = "/api/v3/cve_announcements";
pub const ROUTE_GROUPS: &str = "/api/v3/groups";
pub const ROUTE_HOSTS: &str = "/api/v3/hosts";
pub const ROUTE_IMPORTER: &str = "/api/v2/cbw_scans/scripts";
pub const ROUTE_NODES: &str = "/api/v3/nodes";
pub const ROUTE_PING: &str = "/api/v3/ping";
pub const ROUTE_REMOTE_ACCESSES: &str = "/api/v3/remote_accesses";
pub const ROUTE_SECURITY_ISSUES: &str = "/api/v3/security_issues";
pub const ROUTE_SERVERS: &str = "/api/v3/servers";
pub const ROUTE_USERS: &str = "/api/v3/users";
