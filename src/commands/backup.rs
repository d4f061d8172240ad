// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use super::{App, confirm};
use crate::persistence::{Snapshot, StagedRestore};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("export", sub)) => export(app, sub).map(|_| ()),
        Some(("import", sub)) => import(app, sub),
        _ => Ok(()),
    }
}

/// Write the snapshot and return where it went.
pub fn export(app: &App, sub: &clap::ArgMatches) -> Result<PathBuf> {
    let me = app.current_account()?;
    let ledger = app.load_ledger(&me)?;
    let now = Utc::now();
    let snapshot = Snapshot::capture(&ledger, &me.username, now);
    let path = match sub.get_one::<String>("out") {
        Some(out) => PathBuf::from(out.trim()),
        None => {
            let dir = sub
                .get_one::<String>("dir")
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| ".".into());
            PathBuf::from(dir).join(Snapshot::file_name(&me.username, now.date_naive()))
        }
    };
    std::fs::write(&path, snapshot.to_json()?)
        .with_context(|| format!("Write backup to {}", path.display()))?;
    println!(
        "Backed up {} transaction(s) to {}",
        ledger.len(),
        path.display()
    );
    Ok(path)
}

fn import(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let path = sub.get_one::<String>("path").unwrap().trim();
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Read backup {}", path))?;
    let staged = StagedRestore::parse(&content)?;

    let prompt = format!(
        "Restore {} transaction(s) from {}{}? This replaces the current ledger and rates",
        staged.count(),
        staged.source_date().format("%Y-%m-%d %H:%M UTC"),
        staged
            .owner()
            .map(|o| format!(" (owner: {})", o))
            .unwrap_or_default(),
    );
    if !sub.get_flag("yes") && !confirm(&prompt)? {
        println!("Restore cancelled");
        return Ok(());
    }

    let count = staged.count();
    let mut ledger = app.load_ledger(&me)?;
    staged.apply(&mut ledger);
    app.save_ledger(&me, &ledger)?;
    tracing::info!(username = %me.username, count, "restore applied");
    println!("Restored {} transaction(s) from {}", count, path);
    Ok(())
}
