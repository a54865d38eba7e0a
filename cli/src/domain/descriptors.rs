//! Descriptor generation: pure functions, no I/O, no async.
//!
//! Each function accepts the deployment configuration and returns a `String`
//! containing the descriptor. The caller is responsible for writing to disk.
//! Output is deterministic: the same configuration renders byte-identical text.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.

#![allow(clippy::format_push_string)]

use sha2::{Digest, Sha256};

use crate::domain::config::{
    DeployConfig, RESTART_DELAY_SECS, START_LIMIT_BURST, START_LIMIT_INTERVAL_SECS,
};

/// Generate the systemd unit for the dashboard service.
///
/// Host and port are exported as `Environment=` defaults and `ExecStart=`
/// carries no flags, so `launch` resolves the bind address when the service
/// starts. The secrets file is loaded after the inline defaults, so values
/// defined there (including `STREAMLIT_SERVER_*`) take precedence.
#[must_use]
pub fn service_unit(cfg: &DeployConfig) -> String {
    let name = &cfg.service_name;

    let mut out = String::new();
    out.push_str("# Generated by quant-deploy provision - DO NOT EDIT\n");
    out.push_str("[Unit]\n");
    out.push_str("Description=doge_quant trading dashboard\n");
    out.push_str("After=network-online.target\n");
    out.push_str("Wants=network-online.target\n");
    out.push_str(&format!("StartLimitIntervalSec={START_LIMIT_INTERVAL_SECS}\n"));
    out.push_str(&format!("StartLimitBurst={START_LIMIT_BURST}\n"));
    out.push('\n');
    out.push_str("[Service]\n");
    out.push_str("Type=simple\n");
    out.push_str(&format!("User={}\n", cfg.service_user));
    out.push_str(&format!("WorkingDirectory={}\n", cfg.project_dir.display()));
    out.push_str(&format!("Environment=DASHBOARD_HOST={}\n", cfg.ui.host));
    out.push_str(&format!("Environment=DASHBOARD_PORT={}\n", cfg.ui.port));
    out.push_str(&format!(
        "Environment=DEPLOY_PROJECT_DIR={}\n",
        cfg.project_dir.display()
    ));
    out.push_str(&format!(
        "Environment=DEPLOY_SECRETS_FILE={}\n",
        cfg.secrets_file.display()
    ));
    if let Some(browser_port) = cfg.ui.browser_port {
        out.push_str(&format!(
            "Environment=STREAMLIT_BROWSER_SERVER_PORT={browser_port}\n"
        ));
    }
    out.push_str("Environment=PYTHONUNBUFFERED=1\n");
    out.push_str(&format!("EnvironmentFile=-{}\n", cfg.secrets_file.display()));
    out.push_str(&format!(
        "ExecStart={} launch\n",
        cfg.launcher.display()
    ));
    out.push_str("Restart=always\n");
    out.push_str(&format!("RestartSec={RESTART_DELAY_SECS}\n"));
    out.push_str("StandardOutput=journal\n");
    out.push_str("StandardError=journal\n");
    out.push_str(&format!("SyslogIdentifier={name}\n"));
    out.push('\n');
    out.push_str("[Install]\n");
    out.push_str("WantedBy=multi-user.target\n");

    out
}

/// Generate the nginx site routing inbound traffic to the local UI port.
///
/// Upgrade headers are forwarded for the UI's websocket session, and read/send
/// timeouts are long enough to keep an idle dashboard tab connected.
#[must_use]
pub fn proxy_site(cfg: &DeployConfig) -> String {
    let port = cfg.ui.port;
    let timeout = cfg.proxy.timeout_secs;

    let mut out = String::new();
    out.push_str("# Generated by quant-deploy provision - DO NOT EDIT\n");
    out.push_str("server {\n");
    out.push_str(&format!("    listen {};\n", cfg.proxy.listen_port));
    out.push_str(&format!("    listen [::]:{};\n", cfg.proxy.listen_port));
    out.push_str(&format!("    server_name {};\n", cfg.proxy.server_name));
    out.push('\n');
    out.push_str(&format!(
        "    access_log /var/log/nginx/{}.access.log;\n",
        cfg.service_name
    ));
    out.push_str(&format!(
        "    error_log /var/log/nginx/{}.error.log;\n",
        cfg.service_name
    ));
    out.push('\n');
    out.push_str("    location / {\n");
    out.push_str(&format!("        proxy_pass http://127.0.0.1:{port};\n"));
    out.push_str("        proxy_http_version 1.1;\n");
    out.push_str("        proxy_set_header Upgrade $http_upgrade;\n");
    out.push_str("        proxy_set_header Connection \"upgrade\";\n");
    out.push_str("        proxy_set_header Host $host;\n");
    out.push_str("        proxy_set_header X-Real-IP $remote_addr;\n");
    out.push_str("        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n");
    out.push_str("        proxy_set_header X-Forwarded-Proto $scheme;\n");
    out.push_str(&format!("        proxy_read_timeout {timeout}s;\n"));
    out.push_str(&format!("        proxy_send_timeout {timeout}s;\n"));
    out.push_str("        proxy_buffering off;\n");
    out.push_str("    }\n");
    out.push_str("}\n");

    out
}

/// Generate the Streamlit `config.toml` written on first launch.
#[must_use]
pub fn ui_config(cfg: &DeployConfig) -> String {
    let mut out = String::new();
    out.push_str("# Created by quant-deploy launch; edits are preserved\n");
    out.push_str("[server]\n");
    out.push_str(&format!("port = {}\n", cfg.ui.port));
    out.push_str("headless = true\n");
    out.push_str("enableCORS = false\n");
    out.push_str("enableXsrfProtection = true\n");
    out.push('\n');
    out.push_str("[browser]\n");
    out.push_str("gatherUsageStats = false\n");
    if let Some(browser_port) = cfg.ui.browser_port {
        out.push_str(&format!("serverPort = {browser_port}\n"));
    }
    out
}

/// SHA-256 of descriptor content, hex-encoded.
#[must_use]
pub fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
