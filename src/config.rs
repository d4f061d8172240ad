// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::extraction::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::ledger::UnknownPolicy;
use crate::session::DEFAULT_POLL_INTERVAL;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` means the platform data dir.
    pub db_path: Option<PathBuf>,
    pub context: String,
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub unknown_policy: UnknownPolicy,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: None,
            context: "default".to_string(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(60),
            poll_interval: DEFAULT_POLL_INTERVAL,
            unknown_policy: UnknownPolicy::default(),
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Config::default();

        if let Some(p) = get("CHATLEDGER_DB") {
            cfg.db_path = Some(PathBuf::from(p));
        }
        if let Some(c) = get("CHATLEDGER_CONTEXT") {
            cfg.context = c;
        }
        cfg.api_key = get("GEMINI_API_KEY").or_else(|| get("API_KEY"));
        if let Some(b) = get("CHATLEDGER_API_BASE") {
            cfg.api_base = b;
        }
        if let Some(m) = get("CHATLEDGER_MODEL") {
            cfg.model = m;
        }
        if let Some(ms) = get("CHATLEDGER_POLL_INTERVAL_MS") {
            let ms: u64 = ms
                .parse()
                .with_context(|| format!("Invalid CHATLEDGER_POLL_INTERVAL_MS '{}'", ms))?;
            if ms == 0 {
                return Err(anyhow!("CHATLEDGER_POLL_INTERVAL_MS must be positive"));
            }
            cfg.poll_interval = Duration::from_millis(ms);
        }
        if let Some(p) = get("CHATLEDGER_UNKNOWN_POLICY") {
            cfg.unknown_policy = p.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(u) = get("CHATLEDGER_ADMIN_USER") {
            cfg.admin_username = u;
        }
        if let Some(p) = get("CHATLEDGER_ADMIN_PASSWORD") {
            cfg.admin_password = p;
        }
        Ok(cfg)
    }
}
