//! Deployment configuration: built once at startup, passed explicitly.
//!
//! Pure functions only: no I/O, no async, no filesystem access. The
//! environment arrives as an iterator of pairs so callers decide where it
//! comes from (the process environment in production, literals in tests).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::error::DeployError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Unit name, nginx site name and journal identifier.
pub const SERVICE_NAME: &str = "doge-quant";
pub const DEFAULT_UI_HOST: &str = "0.0.0.0";
pub const DEFAULT_UI_PORT: u16 = 8501;
pub const DEFAULT_SERVICE_USER: &str = "ubuntu";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_PROXY_PORT: u16 = 80;
pub const DEFAULT_SERVER_NAME: &str = "_";

/// Oldest interpreter the dashboard's dependency set supports.
pub const MIN_PYTHON_VERSION: semver::Version = semver::Version::new(3, 9, 0);

/// Top-level project directories that must exist before launching.
pub const REQUIRED_PROJECT_DIRS: &[&str] = &[
    "backtesting",
    "config",
    "core",
    "data",
    "execution",
    "strategies",
    "ui",
];

/// Credential keys the secrets file must define with non-empty values.
pub const REQUIRED_SECRET_KEYS: &[&str] = &["OKX_API_KEY", "OKX_SECRET_KEY", "OKX_PASSPHRASE"];

/// Installed when the project carries no `requirements.txt`.
pub const DEFAULT_DEPENDENCIES: &[&str] = &[
    "streamlit",
    "pandas",
    "numpy",
    "plotly",
    "requests",
    "python-dotenv",
    "nltk",
    "matplotlib",
];

pub const UI_ENTRYPOINT: &str = "ui/streamlit_ui.py";
pub const NLTK_DATASET: &str = "vader_lexicon";

pub const RESTART_DELAY_SECS: u64 = 10;
pub const START_LIMIT_INTERVAL_SECS: u64 = 600;
pub const START_LIMIT_BURST: u32 = 5;
pub const PROXY_TIMEOUT_SECS: u64 = 86_400;

// ── Environment ──────────────────────────────────────────────────────────────

/// Raw environment overrides. Every field is optional; empty strings count as unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub dashboard_host: Option<String>,
    pub dashboard_port: Option<String>,
    pub streamlit_server_address: Option<String>,
    pub streamlit_server_port: Option<String>,
    pub streamlit_browser_server_port: Option<String>,
    pub deploy_user: Option<String>,
    pub sudo_user: Option<String>,
    pub deploy_project_dir: Option<String>,
    pub deploy_secrets_file: Option<String>,
    pub deploy_python: Option<String>,
    pub proxy_listen_port: Option<String>,
    pub proxy_server_name: Option<String>,
}

impl EnvOverrides {
    /// Deserialize overrides from environment pairs. Unknown variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `envy` rejects the input.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, DeployError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs).map_err(|e| {
            DeployError::config(
                format!("cannot read deployment settings from the environment: {e}"),
                "check the DASHBOARD_*, STREAMLIT_*, DEPLOY_* and PROXY_* variables",
            )
        })
    }

    /// Runtime identity: `DEPLOY_USER`, then the invoking `SUDO_USER`, then `ubuntu`.
    #[must_use]
    pub fn service_user(&self) -> String {
        non_empty(self.deploy_user.as_deref())
            .or_else(|| non_empty(self.sudo_user.as_deref()).filter(|u| *u != "root"))
            .unwrap_or(DEFAULT_SERVICE_USER)
            .to_string()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_port(var: &str, value: &str) -> Result<u16, DeployError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(DeployError::config(
            format!("{var}={value} is not a valid TCP port"),
            format!("set {var} to a number between 1 and 65535, or unset it"),
        )),
    }
}

/// First set variable wins; falls back to `default` when none is set.
fn first_port(candidates: &[(&str, Option<&str>)], default: u16) -> Result<u16, DeployError> {
    for (var, value) in candidates {
        if let Some(v) = non_empty(*value) {
            return parse_port(var, v);
        }
    }
    Ok(default)
}

// ── Config schema ────────────────────────────────────────────────────────────

/// Where the UI binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    pub host: String,
    pub port: u16,
    /// Browser-facing port when it differs from the server port.
    pub browser_port: Option<u16>,
}

/// Reverse-proxy site settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub listen_port: u16,
    pub server_name: String,
    pub timeout_secs: u64,
}

/// Host locations owned by systemd and nginx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    pub unit_dir: PathBuf,
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self {
            unit_dir: PathBuf::from("/etc/systemd/system"),
            sites_available: PathBuf::from("/etc/nginx/sites-available"),
            sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
        }
    }
}

/// Everything provisioning and launching need to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub service_name: String,
    pub service_user: String,
    pub project_dir: PathBuf,
    pub secrets_file: PathBuf,
    pub ui_config_file: PathBuf,
    pub venv_dir: PathBuf,
    /// Absolute path of this binary, written into `ExecStart=`.
    pub launcher: PathBuf,
    pub python: String,
    pub ui: UiSettings,
    pub proxy: ProxySettings,
    pub system: SystemPaths,
}

impl DeployConfig {
    /// Combine environment overrides with the runtime user's home directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any port variable does not parse.
    pub fn resolve(env: &EnvOverrides, home: &Path, launcher: PathBuf) -> Result<Self, DeployError> {
        let project_dir = non_empty(env.deploy_project_dir.as_deref())
            .map_or_else(|| home.join("doge_quant"), PathBuf::from);
        let secrets_file = non_empty(env.deploy_secrets_file.as_deref()).map_or_else(
            || home.join(".config").join("doge_quant").join(".env"),
            PathBuf::from,
        );

        let host = non_empty(env.streamlit_server_address.as_deref())
            .or_else(|| non_empty(env.dashboard_host.as_deref()))
            .unwrap_or(DEFAULT_UI_HOST)
            .to_string();
        let port = first_port(
            &[
                ("STREAMLIT_SERVER_PORT", env.streamlit_server_port.as_deref()),
                ("DASHBOARD_PORT", env.dashboard_port.as_deref()),
            ],
            DEFAULT_UI_PORT,
        )?;
        let browser_port = non_empty(env.streamlit_browser_server_port.as_deref())
            .map(|v| parse_port("STREAMLIT_BROWSER_SERVER_PORT", v))
            .transpose()?;

        let listen_port = first_port(
            &[("PROXY_LISTEN_PORT", env.proxy_listen_port.as_deref())],
            DEFAULT_PROXY_PORT,
        )?;

        Ok(Self {
            service_name: SERVICE_NAME.to_string(),
            service_user: env.service_user(),
            venv_dir: project_dir.join("venv"),
            project_dir,
            secrets_file,
            ui_config_file: home.join(".streamlit").join("config.toml"),
            launcher,
            python: non_empty(env.deploy_python.as_deref())
                .unwrap_or(DEFAULT_PYTHON)
                .to_string(),
            ui: UiSettings {
                host,
                port,
                browser_port,
            },
            proxy: ProxySettings {
                listen_port,
                server_name: non_empty(env.proxy_server_name.as_deref())
                    .unwrap_or(DEFAULT_SERVER_NAME)
                    .to_string(),
                timeout_secs: PROXY_TIMEOUT_SECS,
            },
            system: SystemPaths::default(),
        })
    }

    /// Apply `--host` / `--port` given by hand, which win over the environment.
    ///
    /// The installed unit passes neither; under systemd the bind address comes
    /// from the environment alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `port` is not a valid TCP port.
    pub fn with_ui_overrides(
        mut self,
        host: Option<String>,
        port: Option<&str>,
    ) -> Result<Self, DeployError> {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.ui.host = host;
        }
        if let Some(port) = non_empty(port) {
            self.ui.port = parse_port("--port", port)?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn unit_path(&self) -> PathBuf {
        self.system
            .unit_dir
            .join(format!("{}.service", self.service_name))
    }

    #[must_use]
    pub fn proxy_site_path(&self) -> PathBuf {
        self.system.sites_available.join(&self.service_name)
    }

    #[must_use]
    pub fn proxy_link_path(&self) -> PathBuf {
        self.system.sites_enabled.join(&self.service_name)
    }

    #[must_use]
    pub fn requirements_file(&self) -> PathBuf {
        self.project_dir.join("requirements.txt")
    }

    /// Path of an executable inside the virtual runtime directory.
    #[must_use]
    pub fn venv_bin(&self, name: &str) -> PathBuf {
        self.venv_dir.join("bin").join(name)
    }

    /// `journalctl` invocation an operator uses to follow the service log.
    #[must_use]
    pub fn log_command(&self) -> String {
        format!("journalctl -u {} -f", self.service_name)
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
