//! Environment readiness check.
//!
//! Reports where Chromium is and which version it is, whether the service
//! can bind its port and open its database, and the effective configuration.

use crate::cli::output::{self, Styled};
use crate::config::RuntimeConfig;
use crate::renderer::chromium::{chromium_version, find_chromium};
use crate::store::SqliteStore;
use anyhow::Result;
use std::path::PathBuf;

struct Report {
    chromium_path: Option<PathBuf>,
    chromium_version: Option<String>,
    listen: Result<String, String>,
    port_free: bool,
    database: Result<(), String>,
}

fn collect(config: &RuntimeConfig) -> Report {
    let chromium_path = config
        .chromium_path
        .clone()
        .filter(|p| p.exists())
        .or_else(find_chromium);
    let chromium_version = chromium_path.as_deref().and_then(chromium_version);

    let listen = config
        .listen_addr()
        .map(|a| a.to_string())
        .map_err(|e| e.to_string());
    let port_free = match config.listen_addr() {
        Ok(addr) => std::net::TcpListener::bind(addr).is_ok(),
        Err(_) => false,
    };
    let database = SqliteStore::open(&config.db_path)
        .map(|_| ())
        .map_err(|e| format!("{e:#}"));

    Report {
        chromium_path,
        chromium_version,
        listen,
        port_free,
        database,
    }
}

/// Run the doctor diagnostic.
pub fn run(config: &RuntimeConfig) -> Result<()> {
    let report = collect(config);
    if output::is_json() {
        print_json(config, &report);
        return Ok(());
    }

    let s = Styled::new();
    let mut ready = true;
    let mut has_warning = false;

    output::print_header(&s);

    output::print_section(&s, "System");
    output::print_check(
        s.ok_sym(),
        "OS:",
        &format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
    );
    eprintln!();

    output::print_section(&s, "Browser");
    match &report.chromium_path {
        Some(path) => {
            let version = report.chromium_version.as_deref().unwrap_or("unknown version");
            output::print_check(
                s.ok_sym(),
                "Chromium:",
                &format!("{version} at {}", path.display()),
            );
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Install Chrome or Chromium and put it on PATH,");
            output::print_detail("or set PAGESURE_CHROMIUM_PATH=/path/to/chrome");
            ready = false;
        }
    }
    eprintln!();

    output::print_section(&s, "Service");
    match &report.listen {
        Ok(addr) if report.port_free => {
            output::print_check(s.ok_sym(), "Listen:", &format!("{addr} (available)"));
        }
        Ok(addr) => {
            output::print_check(s.warn_sym(), "Listen:", &format!("{addr} (in use)"));
            output::print_detail("Another process holds the port. Set PORT to change it.");
            has_warning = true;
        }
        Err(e) => {
            output::print_check(s.fail_sym(), "Listen:", e);
            ready = false;
        }
    }
    match &report.database {
        Ok(()) => output::print_check(
            s.ok_sym(),
            "Database:",
            &config.db_path.display().to_string(),
        ),
        Err(e) => {
            output::print_check(s.fail_sym(), "Database:", e);
            output::print_detail("Set PAGESURE_DB_PATH to a writable location.");
            ready = false;
        }
    }
    output::print_check(
        s.ok_sym(),
        "Scrapes:",
        &format!(
            "{} at once, {} ms timeout",
            config.max_concurrent_scrapes, config.nav_timeout_ms
        ),
    );
    output::print_check(s.ok_sym(), "CORS origins:", &config.cors_origins.join(", "));
    if let Some(path) = &config.audit_log {
        output::print_check(s.ok_sym(), "Audit log:", &path.display().to_string());
    }

    if ready && !has_warning {
        output::print_status(&s, &s.green("READY"), "start with 'pagesure serve'");
    } else if ready {
        output::print_status(&s, "READY", "some warnings above");
    } else {
        output::print_status(&s, "NOT READY", "fix issues above");
    }
    Ok(())
}

fn print_json(config: &RuntimeConfig, report: &Report) {
    let json = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "chromium_path": report.chromium_path.as_ref().map(|p| p.display().to_string()),
        "chromium_version": report.chromium_version,
        "listen": report.listen.as_ref().ok(),
        "port_free": report.port_free,
        "db_path": config.db_path.display().to_string(),
        "db_error": report.database.as_ref().err(),
        "max_concurrent_scrapes": config.max_concurrent_scrapes,
        "nav_timeout_ms": config.nav_timeout_ms,
        "cors_origins": config.cors_origins,
        "audit_log": config.audit_log.as_ref().map(|p| p.display().to_string()),
    });
    output::print_json(&json);
}
