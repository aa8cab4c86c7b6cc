// crates/rls-verify-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Local fake REST backend and a policy-enforcing in-memory world.
// Purpose: Exercise the harness end to end without a real database.
// Dependencies: rls-verify-core, tiny_http, serde_json, url
// ============================================================================

//! ## Overview
//! [`FakeBackend`] runs a `tiny_http` server on a loopback port, records every
//! request, and answers through a caller-supplied router. [`World`] is such a
//! router: a tiny multi-tenant dataset whose access rules match the policies
//! the harness verifies. [`Flaws`] switches individual rules off so failure
//! and compensation paths can be observed.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use rls_verify_core::Endpoint;
use rls_verify_core::SecretKey;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;

/// Public key the fake backend expects from end-user clients.
pub const ANON_KEY: &str = "anon-key";
/// Service key granting privileged access.
pub const SERVICE_KEY: &str = "service-key";

// ============================================================================
// SECTION: Fake Backend
// ============================================================================

/// One request as seen by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Decoded path.
    pub path: String,
    /// Decoded query pairs in request order.
    pub query: Vec<(String, String)>,
    /// Headers with lowercase names.
    pub headers: BTreeMap<String, String>,
    /// JSON body, when present.
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// Returns the first query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    /// Returns a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Returns the bearer token.
    pub fn bearer(&self) -> Option<&str> {
        self.header("authorization").and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Returns `eq.` filters (everything except `select` and `limit`).
    pub fn eq_filters(&self) -> Vec<(&str, &str)> {
        self.query
            .iter()
            .filter(|(name, _)| name != "select" && name != "limit")
            .filter_map(|(name, value)| {
                value.strip_prefix("eq.").map(|value| (name.as_str(), value))
            })
            .collect()
    }
}

/// Loopback HTTP server that records requests.
pub struct FakeBackend {
    /// Base URL of the server.
    url: Url,
    /// Requests received so far.
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Shutdown flag for the accept loop.
    stop: Arc<AtomicBool>,
    /// Accept loop thread.
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeBackend {
    /// Starts a backend answering through `router`.
    pub fn start<F>(router: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, Value) + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let url = Url::parse(&format!("http://{addr}")).unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let seen = Arc::clone(&requests);
        let stopping = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !stopping.load(Ordering::SeqCst) {
                let mut request = match server.recv_timeout(Duration::from_millis(20)) {
                    Ok(Some(request)) => request,
                    Ok(None) => continue,
                    Err(_) => break,
                };
                let recorded = record(&mut request);
                let (status, body) = router(&recorded);
                seen.lock().unwrap().push(recorded);
                let text = if body.is_null() { String::new() } else { body.to_string() };
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response =
                    Response::from_string(text).with_status_code(status).with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            url,
            requests,
            stop,
            handle: Some(handle),
        }
    }

    /// Returns an endpoint pointed at this backend.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.url.clone(), SecretKey::new(ANON_KEY), SecretKey::new(SERVICE_KEY))
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Captures method, path, query, headers, and body.
fn record(request: &mut tiny_http::Request) -> RecordedRequest {
    let parsed = Url::parse(&format!("http://fake{}", request.url())).unwrap();
    let headers = request
        .headers()
        .iter()
        .map(|header| {
            (header.field.as_str().as_str().to_ascii_lowercase(), header.value.as_str().to_string())
        })
        .collect();
    let mut text = String::new();
    let _ = request.as_reader().read_to_string(&mut text);
    RecordedRequest {
        method: request.method().as_str().to_string(),
        path: parsed.path().to_string(),
        query: parsed.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect(),
        headers,
        body: serde_json::from_str(&text).ok(),
    }
}

// ============================================================================
// SECTION: Policy World
// ============================================================================

/// Individual policy defects to inject.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flaws {
    /// Restricted users see rocks of every group.
    pub leak_rocks: bool,
    /// Restricted users may create groups.
    pub allow_group_insert: bool,
    /// The role-escalation trigger is missing.
    pub accept_escalation: bool,
    /// Privileged deletes fail.
    pub fail_cleanup: bool,
    /// Magic-link generation fails.
    pub reject_magic_link: bool,
    /// Magic-link generation fails for this email only.
    pub reject_magic_link_for: Option<&'static str>,
    /// Restricted users may insert rocks and issues into any group.
    pub accept_cross_group_insert: bool,
    /// Procedures run for any caller and any group.
    pub accept_foreign_rpc: bool,
    /// Privileged deletes report success but keep the rows.
    pub keep_deleted_rows: bool,
}

/// Who a request acts as.
enum Actor {
    /// Service key.
    Service,
    /// End user with a role label and group ids.
    User {
        /// User id.
        id: String,
        /// Role label at request time.
        role: String,
        /// Group ids.
        groups: BTreeSet<String>,
    },
    /// Unknown or missing credentials.
    Anonymous,
}

impl Actor {
    /// True when the actor reads every row.
    fn sees_all(&self) -> bool {
        match self {
            Self::Service => true,
            Self::User {
                role,
                ..
            } => role == "executive" || role == "system_admin",
            Self::Anonymous => false,
        }
    }

    /// True when the actor bypasses write scoping.
    fn is_admin(&self) -> bool {
        match self {
            Self::Service => true,
            Self::User {
                role,
                ..
            } => role == "system_admin",
            Self::Anonymous => false,
        }
    }
}

/// In-memory multi-tenant dataset with row-level rules.
pub struct World {
    /// Rows per table.
    pub tables: BTreeMap<String, Vec<Map<String, Value>>>,
    /// Injected defects.
    pub flaws: Flaws,
    /// Counter for generated ids.
    next_id: u64,
}

/// Builds a row from a JSON object literal.
fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Builds a profile row.
fn profile(id: &str, email: &str, full_name: Value, role: &str) -> Map<String, Value> {
    row(json!({"id": id, "email": email, "full_name": full_name, "role": role}))
}

/// Builds a membership row.
fn member(id: &str, group: &str, user: &str, role_in_group: &str) -> Map<String, Value> {
    row(json!({"id": id, "group_id": group, "user_id": user, "role_in_group": role_in_group}))
}

impl World {
    /// Seeds two groups, a restricted member of `g1`, an executive in both
    /// groups, and an administrator without memberships.
    pub fn seeded() -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(
            "profiles".to_string(),
            vec![
                profile("u-tm", "tm@example.test", json!("Tess Member"), "team_member"),
                profile("u-ex", "ex@example.test", json!("Eve Exec"), "executive"),
                profile("u-admin", "admin@example.test", Value::Null, "system_admin"),
            ],
        );
        tables.insert(
            "groups".to_string(),
            vec![
                row(json!({"id": "g1", "name": "North"})),
                row(json!({"id": "g2", "name": "South"})),
            ],
        );
        tables.insert(
            "group_members".to_string(),
            vec![
                member("m-1", "g1", "u-tm", "member"),
                member("m-2", "g1", "u-ex", "lead"),
                member("m-3", "g2", "u-ex", "lead"),
            ],
        );
        for (table, prefix) in
            [("rocks", "r"), ("issues", "i"), ("meetings", "mt"), ("focus_snapshots", "f")]
        {
            tables.insert(
                table.to_string(),
                vec![
                    row(json!({"id": format!("{prefix}1"), "group_id": "g1"})),
                    row(json!({"id": format!("{prefix}2"), "group_id": "g2"})),
                ],
            );
        }
        tables.insert(
            "quarters".to_string(),
            vec![row(json!({"id": "q1", "label": "Q1", "is_current": true}))],
        );
        tables.insert(
            "rock_ideas".to_string(),
            vec![row(json!({"id": "idea1", "description": "Expand", "group_id": "g2"}))],
        );
        Self {
            tables,
            flaws: Flaws::default(),
            next_id: 0,
        }
    }

    /// Applies defects.
    pub fn with_flaws(mut self, flaws: Flaws) -> Self {
        self.flaws = flaws;
        self
    }

    /// Removes a profile (and its memberships).
    pub fn without_profile(mut self, id: &str) -> Self {
        for table in ["profiles", "group_members"] {
            let key = if table == "profiles" { "id" } else { "user_id" };
            if let Some(rows) = self.tables.get_mut(table) {
                rows.retain(|row| row.get(key).and_then(Value::as_str) != Some(id));
            }
        }
        self
    }

    /// Returns the rows of `table`.
    pub fn rows(&self, table: &str) -> &[Map<String, Value>] {
        self.tables.get(table).map_or(&[], Vec::as_slice)
    }

    /// Returns a profile field.
    pub fn profile_field(&self, id: &str, field: &str) -> Option<Value> {
        self.rows("profiles")
            .iter()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            .and_then(|row| row.get(field).cloned())
    }

    /// Wraps the world as a shared router.
    pub fn serve(self) -> (FakeBackend, Arc<Mutex<World>>) {
        let world = Arc::new(Mutex::new(self));
        let shared = Arc::clone(&world);
        let backend = FakeBackend::start(move |request| shared.lock().unwrap().handle(request));
        (backend, world)
    }

    /// Routes one request.
    pub fn handle(&mut self, request: &RecordedRequest) -> (u16, Value) {
        let path = request.path.trim_start_matches('/').to_string();
        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            ["auth", "v1", "admin", "generate_link"] => self.generate_link(request),
            ["auth", "v1", "verify"] => verify(request),
            ["rest", "v1", "rpc", name] => self.rpc(request, name),
            ["rest", "v1", table] => self.rest(request, table),
            _ => (404, json!({"message": "not found"})),
        }
    }

    /// Resolves the acting identity from the bearer token.
    fn actor(&self, request: &RecordedRequest) -> Actor {
        let Some(token) = request.bearer() else {
            return Actor::Anonymous;
        };
        if token == SERVICE_KEY && request.header("apikey") == Some(SERVICE_KEY) {
            return Actor::Service;
        }
        if request.header("apikey") != Some(ANON_KEY) {
            return Actor::Anonymous;
        }
        let Some(id) = token.strip_prefix("token-") else {
            return Actor::Anonymous;
        };
        let Some(Value::String(role)) = self.profile_field(id, "role") else {
            return Actor::Anonymous;
        };
        let groups = self
            .rows("group_members")
            .iter()
            .filter(|row| row.get("user_id").and_then(Value::as_str) == Some(id))
            .filter_map(|row| row.get("group_id").and_then(Value::as_str).map(str::to_string))
            .collect();
        Actor::User {
            id: id.to_string(),
            role,
            groups,
        }
    }

    /// Issues a hashed magic-link token for a known email.
    fn generate_link(&self, request: &RecordedRequest) -> (u16, Value) {
        let email = request.body.as_ref().and_then(|body| body.get("email")).cloned();
        let rejected = self
            .flaws
            .reject_magic_link_for
            .is_some_and(|target| email.as_ref().and_then(Value::as_str) == Some(target));
        if self.flaws.reject_magic_link || rejected {
            return (500, json!({"msg": "link generation disabled"}));
        }
        if !matches!(self.actor(request), Actor::Service) {
            return (401, json!({"msg": "service key required"}));
        }
        let found = self
            .rows("profiles")
            .iter()
            .find(|row| row.get("email") == email.as_ref())
            .and_then(|row| row.get("id").and_then(Value::as_str));
        match found {
            Some(id) => (200, json!({"hashed_token": format!("hash-{id}")})),
            None => (404, json!({"msg": "user not found"})),
        }
    }

    /// Dispatches a table request.
    fn rest(&mut self, request: &RecordedRequest, table: &str) -> (u16, Value) {
        let actor = self.actor(request);
        if matches!(actor, Actor::Anonymous) {
            return (401, json!({"message": "JWT required"}));
        }
        match request.method.as_str() {
            "GET" => (200, Value::Array(self.select(&actor, request, table))),
            "POST" => self.insert(&actor, request, table),
            "PATCH" => self.update(&actor, request, table),
            "DELETE" => self.delete(&actor, request, table),
            _ => (405, Value::Null),
        }
    }

    /// Returns true when `actor` may read `row` of `table`.
    fn visible(&self, actor: &Actor, table: &str, row: &Map<String, Value>) -> bool {
        if actor.sees_all() {
            return true;
        }
        let Actor::User {
            groups,
            ..
        } = actor
        else {
            return false;
        };
        let scope_field = match table {
            "groups" => "id",
            "rocks" if self.flaws.leak_rocks => return true,
            "rocks" | "issues" | "meetings" | "focus_snapshots" | "rock_ideas" => "group_id",
            _ => return true,
        };
        row.get(scope_field).and_then(Value::as_str).is_some_and(|id| groups.contains(id))
    }

    /// Returns visible rows matching the request filters.
    fn matching(
        &self,
        actor: &Actor,
        request: &RecordedRequest,
        table: &str,
    ) -> Vec<Map<String, Value>> {
        let filters = request.eq_filters();
        self.rows(table)
            .iter()
            .filter(|row| self.visible(actor, table, row))
            .filter(|row| {
                filters.iter().all(|(field, value)| text(row, field).as_deref() == Some(*value))
            })
            .cloned()
            .collect()
    }

    /// Handles `GET`.
    fn select(&self, actor: &Actor, request: &RecordedRequest, table: &str) -> Vec<Value> {
        let columns: Option<Vec<&str>> = request
            .query_value("select")
            .filter(|columns| *columns != "*")
            .map(|columns| columns.split(',').collect());
        let limit = request.query_value("limit").and_then(|limit| limit.parse().ok());
        self.matching(actor, request, table)
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| match &columns {
                Some(columns) => Value::Object(
                    row.into_iter().filter(|(key, _)| columns.contains(&key.as_str())).collect(),
                ),
                None => Value::Object(row),
            })
            .collect()
    }

    /// Handles `POST`.
    fn insert(&mut self, actor: &Actor, request: &RecordedRequest, table: &str) -> (u16, Value) {
        let Some(Value::Object(mut record)) = request.body.clone() else {
            return (400, json!({"message": "body required"}));
        };
        let allowed = actor.is_admin()
            || match (table, actor) {
                ("groups", _) => self.flaws.allow_group_insert,
                ("quarters" | "profiles", _) => false,
                ("rocks" | "issues", _) if self.flaws.accept_cross_group_insert => true,
                (
                    _,
                    Actor::User {
                        groups,
                        ..
                    },
                ) => text(&record, "group_id").is_some_and(|id| groups.contains(&id)),
                _ => false,
            };
        if !allowed {
            return (403, json!({"message": "new row violates row-level security policy"}));
        }
        self.next_id += 1;
        record.insert("id".to_string(), json!(format!("{table}-new-{}", self.next_id)));
        self.tables.entry(table.to_string()).or_default().push(record.clone());
        (201, json!([record]))
    }

    /// Handles `PATCH`.
    fn update(&mut self, actor: &Actor, request: &RecordedRequest, table: &str) -> (u16, Value) {
        let Some(Value::Object(fields)) = request.body.clone() else {
            return (400, json!({"message": "body required"}));
        };
        let mut targets: Vec<String> = self
            .matching(actor, request, table)
            .iter()
            .filter_map(|row| text(row, "id"))
            .collect();
        if let Actor::User {
            id,
            role,
            ..
        } = actor
            && !actor.is_admin()
        {
            if table != "profiles" {
                return (403, json!({"message": "permission denied"}));
            }
            targets.retain(|target| target == id);
            let changes_role =
                fields.get("role").and_then(Value::as_str).is_some_and(|next| next != role);
            if changes_role && !targets.is_empty() && !self.flaws.accept_escalation {
                return (400, json!({"message": "role changes require system_admin"}));
            }
        }
        let mut updated = Vec::new();
        if let Some(rows) = self.tables.get_mut(table) {
            for row in rows.iter_mut() {
                if text(row, "id").is_some_and(|id| targets.contains(&id)) {
                    for (key, value) in &fields {
                        row.insert(key.clone(), value.clone());
                    }
                    updated.push(Value::Object(row.clone()));
                }
            }
        }
        (200, Value::Array(updated))
    }

    /// Handles `DELETE`.
    fn delete(&mut self, actor: &Actor, request: &RecordedRequest, table: &str) -> (u16, Value) {
        if !actor.is_admin() {
            return (403, json!({"message": "permission denied"}));
        }
        if self.flaws.fail_cleanup {
            return (500, json!({"message": "delete failed"}));
        }
        let targets: Vec<String> = self
            .matching(actor, request, table)
            .iter()
            .filter_map(|row| text(row, "id"))
            .collect();
        if self.flaws.keep_deleted_rows {
            return (204, Value::Null);
        }
        if let Some(rows) = self.tables.get_mut(table) {
            rows.retain(|row| !text(row, "id").is_some_and(|id| targets.contains(&id)));
        }
        (204, Value::Null)
    }

    /// Handles procedure calls with caller binding and group checks.
    fn rpc(&self, request: &RecordedRequest, name: &str) -> (u16, Value) {
        let actor = self.actor(request);
        let Actor::User {
            id,
            groups,
            ..
        } = &actor
        else {
            return (401, json!({"message": "JWT required"}));
        };
        let params = request.body.clone().unwrap_or(Value::Null);
        let param = |key: &str| params.get(key).and_then(Value::as_str).map(str::to_string);
        let group_of = |table: &str, row_id: Option<String>| {
            self.rows(table)
                .iter()
                .find(|row| text(row, "id") == row_id)
                .and_then(|row| text(row, "group_id"))
        };
        let permitted = match name {
            "start_new_week" => param("p_user_id").as_deref() == Some(id.as_str()),
            "roll_forward_rock" => {
                actor.is_admin()
                    || group_of("rocks", param("p_rock_id")).is_some_and(|g| groups.contains(&g))
            }
            "promote_rock_idea" => {
                actor.is_admin()
                    || group_of("rock_ideas", param("p_idea_id"))
                        .is_some_and(|g| groups.contains(&g))
            }
            _ => return (404, json!({"message": "unknown function"})),
        };
        if permitted || self.flaws.accept_foreign_rpc {
            (200, json!({"ok": true}))
        } else {
            (403, json!({"message": "not authorized"}))
        }
    }
}

/// Exchanges a hashed token for a session.
fn verify(request: &RecordedRequest) -> (u16, Value) {
    let hashed = request
        .body
        .as_ref()
        .and_then(|body| body.get("token_hash"))
        .and_then(Value::as_str)
        .and_then(|token| token.strip_prefix("hash-"));
    match hashed {
        Some(id) => (
            200,
            json!({
                "access_token": format!("token-{id}"),
                "refresh_token": format!("refresh-{id}"),
                "user": {"id": id},
            }),
        ),
        None => (403, json!({"msg": "invalid token"})),
    }
}

/// Renders a row field as text.
fn text(row: &Map<String, Value>, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(value) => Some(value.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
