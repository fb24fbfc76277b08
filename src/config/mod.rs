/// Application configuration module
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_USGS_API_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

const DEFAULT_SHARED_LOG_PATH: &str = "/shared-logs";
const LOCAL_DASHBOARD_LOG_DIR: &str = "local_logs";
const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub usgs_api_url: String,
    pub bind_addr: String,
    pub user_agent: String,
    pub locations: LocationTable,
    pub logs: LogPaths,
}

/// Where the rotating log files are written
#[derive(Clone, Debug, PartialEq)]
pub struct LogPaths {
    /// `error.log` and `access.log`
    pub log_dir: PathBuf,
    /// `dashboard_access.log`, shared with other pods under Kubernetes
    pub dashboard_dir: PathBuf,
}

impl LogPaths {
    pub fn from_env() -> Self {
        let in_kubernetes = env::var_os("KUBERNETES_SERVICE_HOST").is_some()
            || Path::new(SERVICE_ACCOUNT_TOKEN).exists();

        Self {
            log_dir: PathBuf::from(env_or("LOG_DIR", "logs")),
            dashboard_dir: dashboard_log_dir(in_kubernetes, env::var("SHARED_LOG_PATH").ok()),
        }
    }
}

/// Shared volume inside Kubernetes, a local directory otherwise
pub fn dashboard_log_dir(in_kubernetes: bool, shared_log_path: Option<String>) -> PathBuf {
    if !in_kubernetes {
        return PathBuf::from(LOCAL_DASHBOARD_LOG_DIR);
    }

    shared_log_path
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SHARED_LOG_PATH))
}

/// Search center and radius for a named location
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
}

/// Static lookup from a human-readable name to a search area
#[derive(Clone, Debug, Default)]
pub struct LocationTable {
    entries: Vec<Location>,
}

impl LocationTable {
    pub fn new(entries: Vec<Location>) -> Self {
        Self { entries }
    }

    /// The five locations the dashboard ships with
    pub fn builtin() -> Self {
        let entry = |name: &str, lat: f64, lon: f64, radius_km: f64| Location {
            name: name.to_string(),
            lat,
            lon,
            radius_km,
        };

        Self::new(vec![
            entry("Tel Aviv, Israel", 32.0853, 34.7818, 100.0),
            entry("United States (California)", 36.7783, -119.4179, 300.0),
            entry("Japan", 36.2048, 138.2529, 300.0),
            entry("Indonesia", -0.7893, 113.9213, 300.0),
            entry("Chile", -35.6751, -71.5430, 300.0),
        ])
    }

    /// Exact, case-sensitive name lookup
    pub fn get(&self, name: &str) -> Option<&Location> {
        self.entries.iter().find(|l| l.name == name)
    }

    pub fn all(&self) -> &[Location] {
        &self.entries
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let usgs_api_url = env_or("USGS_API_URL", DEFAULT_USGS_API_URL);
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:5000");
        let user_agent = env_or(
            "HTTP_USER_AGENT",
            concat!("quake-dashboard/", env!("CARGO_PKG_VERSION")),
        );

        if usgs_api_url.trim().is_empty() {
            anyhow::bail!("USGS_API_URL must not be empty");
        }

        Ok(Self {
            usgs_api_url,
            bind_addr,
            user_agent,
            locations: LocationTable::builtin(),
            logs: LogPaths::from_env(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
