// crates/rls-verify-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Temporary config files for loader tests.
// Purpose: Keep each test's config isolated in its own directory.
// Dependencies: tempfile
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::path::PathBuf;

use tempfile::TempDir;

/// Minimal valid target section.
pub const TARGET: &str = r#"
[target]
base_url = "https://db.example.test"
anon_key = "anon"
service_key = "service"
"#;

/// Config file written into a temporary directory.
pub struct ConfigFile {
    /// Owning directory; removed on drop.
    pub dir: TempDir,
    /// Path of the written file.
    pub path: PathBuf,
}

/// Writes `bytes` to `rls-verify.toml` in a fresh temporary directory.
pub fn write_config(bytes: impl AsRef<[u8]>) -> ConfigFile {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rls-verify.toml");
    std::fs::write(&path, bytes).expect("write config");
    ConfigFile {
        dir,
        path,
    }
}
