// crates/rls-verify-cli/tests/common/mod.rs
// ============================================================================
// Module: CLI Test Helpers
// Description: Stub REST backend and binary invocation helpers.
// Purpose: Drive the rls-verify binary end to end against a loopback server.
// Dependencies: tiny_http, serde_json, tempfile
// ============================================================================

//! ## Overview
//! [`StubBackend`] answers discovery, auth, and table reads with a fixed
//! single-tenant dataset. The `empty_user_reads` switch makes every read
//! issued with a user session come back empty so failing runs can be driven.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Service key the stub expects on discovery reads.
pub const SERVICE_KEY: &str = "service-key";
/// Bearer token minted for the executive session.
pub const USER_TOKEN: &str = "user-token";

/// Loopback stub backend.
pub struct StubBackend {
    /// Base URL of the server.
    pub url: String,
    /// Shutdown flag for the accept loop.
    stop: Arc<AtomicBool>,
    /// Accept loop thread.
    handle: Option<thread::JoinHandle<()>>,
}

impl StubBackend {
    /// Starts the stub; `empty_user_reads` blanks every user-session read.
    pub fn start(empty_user_reads: bool) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind stub");
        let addr = server.server_addr().to_ip().expect("ip addr");
        let stop = Arc::new(AtomicBool::new(false));
        let stopping = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !stopping.load(Ordering::SeqCst) {
                let request = match server.recv_timeout(Duration::from_millis(20)) {
                    Ok(Some(request)) => request,
                    Ok(None) => continue,
                    Err(_) => break,
                };
                let path = request.url().split('?').next().unwrap_or_default().to_string();
                let user = request.headers().iter().any(|header| {
                    header.field.equiv("Authorization")
                        && header.value.as_str() == format!("Bearer {USER_TOKEN}")
                });
                let body = route(&path, user && empty_user_reads);
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response = Response::from_string(body.to_string()).with_header(header);
                let _ = request.respond(response);
            }
        });
        Self {
            url: format!("http://{addr}"),
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Answers one request by path.
fn route(path: &str, empty: bool) -> Value {
    match path {
        "/auth/v1/admin/generate_link" => json!({"hashed_token": "hash"}),
        "/auth/v1/verify" => json!({"access_token": USER_TOKEN, "refresh_token": "r"}),
        _ if empty => json!([]),
        "/rest/v1/profiles" => {
            json!([{"id": "u-ex", "email": "ex@example.test", "role": "executive"}])
        }
        "/rest/v1/group_members" => json!([{"id": "m1", "group_id": "g1", "user_id": "u-ex"}]),
        "/rest/v1/groups" => json!([{"id": "g1", "name": "One"}]),
        "/rest/v1/quarters" => json!([{"id": "q1", "label": "Q1"}]),
        _ => json!([{"id": "x1", "group_id": "g1"}]),
    }
}

/// Returns the rls-verify binary path.
pub fn rls_verify_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rls-verify"))
}

/// Writes a config file pointing at `base_url`.
pub fn write_config(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("rls-verify.toml");
    let content = format!(
        "[target]\nbase_url = \"{base_url}\"\nanon_key = \"anon-key\"\nservice_key = \
         \"{SERVICE_KEY}\"\n\n[http]\ntimeout_ms = 5000\n"
    );
    std::fs::write(&path, content).expect("write config");
    path
}

/// Runs the binary with harness env vars cleared.
pub fn run_cli(args: &[&str]) -> Output {
    Command::new(rls_verify_bin())
        .args(args)
        .env_remove("RLS_VERIFY_CONFIG")
        .env_remove("RLS_VERIFY_BASE_URL")
        .env_remove("RLS_VERIFY_ANON_KEY")
        .env_remove("RLS_VERIFY_SERVICE_KEY")
        .output()
        .expect("run rls-verify")
}
