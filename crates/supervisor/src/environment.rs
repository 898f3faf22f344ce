//! Launch environment construction.
//!
//! Children are started with a cleared environment plus exactly the mapping
//! built here, so everything a child sees is visible in one [`LaunchEnv`].

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use abacus_core::env_names;

use crate::config::SupervisorConfig;

/// Ordered environment for a child process.
///
/// Immutable once built; [`LaunchEnv::with_degraded`] returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchEnv {
    vars: BTreeMap<String, String>,
}

impl LaunchEnv {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// `KEY=value` lines in key order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.vars {
            let _ = writeln!(out, "{key}={value}");
        }
        out
    }

    /// Copy of this environment marking the backend as unavailable.
    pub fn with_degraded(&self, reason: &str) -> LaunchEnv {
        let mut vars = self.vars.clone();
        vars.insert(env_names::BACKEND_DEGRADED.to_string(), "1".to_string());
        vars.insert(
            env_names::BACKEND_DEGRADED_REASON.to_string(),
            reason.to_string(),
        );
        LaunchEnv { vars }
    }
}

impl From<BTreeMap<String, String>> for LaunchEnv {
    fn from(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }
}

/// Snapshot of the supervisor's own environment.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
pub fn ambient_environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!(key = ?key, "Skipping non UTF-8 environment variable");
                None
            }
        })
        .collect()
}

/// Build the environment inherited by both children.
///
/// Starts from `ambient`, prepends `config.bin_dir` to `PATH` and sets the
/// backend address variables. Pure: identical inputs give identical output,
/// and feeding the result back in changes nothing.
pub fn configure_environment(
    ambient: &BTreeMap<String, String>,
    config: &SupervisorConfig,
) -> LaunchEnv {
    let mut vars = ambient.clone();

    // A degraded marker must only ever come from this run's readiness verdict.
    vars.remove(env_names::BACKEND_DEGRADED);
    vars.remove(env_names::BACKEND_DEGRADED_REASON);

    if let Some(dir) = &config.bin_dir {
        let current = vars.get(env_names::PATH).map(String::as_str);
        if let Some(path) = prepend_search_path(current, dir) {
            vars.insert(env_names::PATH.to_string(), path);
        }
    }

    vars.insert(env_names::API_URL.to_string(), config.backend_url());
    vars.insert(env_names::API_HOST.to_string(), config.backend_host.clone());
    vars.insert(
        env_names::API_PORT.to_string(),
        config.backend_port.to_string(),
    );
    vars.insert(
        env_names::PORT.to_string(),
        config.frontend_port.to_string(),
    );

    LaunchEnv { vars }
}

/// Put `dir` at the front of a search path unless it is already first.
///
/// Returns `None` when the path cannot be represented, leaving the caller's
/// value untouched.
fn prepend_search_path(current: Option<&str>, dir: &Path) -> Option<String> {
    let mut entries: Vec<PathBuf> = current
        .filter(|p| !p.is_empty())
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();

    if entries.first().map(PathBuf::as_path) == Some(dir) {
        return current.map(str::to_string);
    }

    entries.insert(0, dir.to_path_buf());

    match std::env::join_paths(entries) {
        Ok(joined) => joined.into_string().ok(),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot extend PATH, leaving it unchanged");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ambient(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config_with_bin_dir(dir: &str) -> SupervisorConfig {
        SupervisorConfig {
            bin_dir: Some(PathBuf::from(dir)),
            ..Default::default()
        }
    }

    #[test]
    fn sets_backend_address_variables() {
        let env = configure_environment(&ambient(&[]), &SupervisorConfig::default());

        assert_eq!(env.get("API_URL"), Some("http://127.0.0.1:8001"));
        assert_eq!(env.get("API_HOST"), Some("127.0.0.1"));
        assert_eq!(env.get("API_PORT"), Some("8001"));
        assert_eq!(env.get("PORT"), Some("8000"));
    }

    #[test]
    fn keeps_ambient_variables() {
        let env = configure_environment(
            &ambient(&[("HOME", "/home/app"), ("RUST_LOG", "debug")]),
            &SupervisorConfig::default(),
        );

        assert_eq!(env.get("HOME"), Some("/home/app"));
        assert_eq!(env.get("RUST_LOG"), Some("debug"));
    }

    #[test]
    fn supervisor_values_override_ambient() {
        let env = configure_environment(
            &ambient(&[("API_URL", "http://elsewhere:1"), ("PORT", "9999")]),
            &SupervisorConfig::default(),
        );

        assert_eq!(env.get("API_URL"), Some("http://127.0.0.1:8001"));
        assert_eq!(env.get("PORT"), Some("8000"));
    }

    #[cfg(unix)]
    #[test]
    fn prepends_bin_dir_to_path() {
        let env = configure_environment(
            &ambient(&[("PATH", "/usr/bin:/bin")]),
            &config_with_bin_dir("/opt/abacus/bin"),
        );

        assert_eq!(env.get("PATH"), Some("/opt/abacus/bin:/usr/bin:/bin"));
    }

    #[cfg(unix)]
    #[test]
    fn path_is_created_when_missing() {
        let env = configure_environment(&ambient(&[]), &config_with_bin_dir("/opt/abacus/bin"));

        assert_eq!(env.get("PATH"), Some("/opt/abacus/bin"));
    }

    #[test]
    fn no_bin_dir_leaves_path_alone() {
        let env = configure_environment(
            &ambient(&[("PATH", "/usr/bin")]),
            &SupervisorConfig::default(),
        );

        assert_eq!(env.get("PATH"), Some("/usr/bin"));
    }

    #[test]
    fn repeated_construction_is_byte_identical() {
        let ambient = ambient(&[("PATH", "/usr/bin"), ("LANG", "C.UTF-8")]);
        let config = config_with_bin_dir("/opt/abacus/bin");

        let first = configure_environment(&ambient, &config);
        let second = configure_environment(&ambient, &config);

        assert_eq!(first.render().as_bytes(), second.render().as_bytes());
        assert_eq!(first, second);
    }

    #[test]
    fn applying_to_own_output_is_a_no_op() {
        let config = config_with_bin_dir("/opt/abacus/bin");
        let once = configure_environment(&ambient(&[("PATH", "/usr/bin")]), &config);
        let vars: BTreeMap<String, String> = once
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let twice = configure_environment(&vars, &config);

        assert_eq!(once.render(), twice.render());
    }

    #[test]
    fn stale_degraded_marker_is_dropped() {
        let env = configure_environment(
            &ambient(&[("BACKEND_DEGRADED", "1"), ("BACKEND_DEGRADED_REASON", "old")]),
            &SupervisorConfig::default(),
        );

        assert!(!env.contains("BACKEND_DEGRADED"));
        assert!(!env.contains("BACKEND_DEGRADED_REASON"));
    }

    #[test]
    fn with_degraded_does_not_mutate_original() {
        let env = configure_environment(&ambient(&[]), &SupervisorConfig::default());
        let degraded = env.with_degraded("health check timed out");

        assert!(!env.contains("BACKEND_DEGRADED"));
        assert_eq!(degraded.get("BACKEND_DEGRADED"), Some("1"));
        assert_eq!(
            degraded.get("BACKEND_DEGRADED_REASON"),
            Some("health check timed out")
        );
        assert_eq!(degraded.get("API_URL"), env.get("API_URL"));
    }

    #[test]
    fn render_is_sorted_key_value_lines() {
        let env = LaunchEnv::from(ambient(&[("B", "2"), ("A", "1")]));
        assert_eq!(env.render(), "A=1\nB=2\n");
    }
}
