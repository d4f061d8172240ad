// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use serde::Serialize;

use super::App;
use crate::accounts::AccountPatch;
use crate::models::Role;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("rm", sub)) => remove(app, sub)?,
        Some(("edit", sub)) => edit(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn parse_role(s: &str) -> Result<Role> {
    s.parse::<Role>().map_err(|e| anyhow!(e))
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_admin()?;
    let username = sub.get_one::<String>("username").unwrap();
    let password = sub.get_one::<String>("password").unwrap();
    let role = parse_role(sub.get_one::<String>("role").unwrap())?;
    let account = app.accounts().create_account(username, password, role)?;
    println!("Added account '{}' ({})", account.username, account.role);
    Ok(())
}

#[derive(Serialize)]
pub struct AccountRow {
    pub username: String,
    pub role: String,
    pub online: bool,
}

pub fn account_rows(app: &App) -> Result<Vec<AccountRow>> {
    Ok(app
        .accounts()
        .list()?
        .into_iter()
        .map(|a| AccountRow {
            online: a.active_session_id.is_some(),
            username: a.username,
            role: a.role.to_string(),
        })
        .collect())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_admin()?;
    let data = account_rows(app)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.username.clone(),
                    r.role.clone(),
                    if r.online { "yes".into() } else { "".into() },
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Username", "Role", "Signed in"], rows));
    }
    Ok(())
}

fn remove(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.require_admin()?;
    let username = sub.get_one::<String>("username").unwrap();
    let target = app.accounts().find_by_username(username)?;
    let removed = app.accounts().delete_account(&me.id, &target.id)?;
    println!("Removed account '{}' and its ledger", removed.username);
    Ok(())
}

fn edit(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_admin()?;
    let username = sub.get_one::<String>("username").unwrap();
    let target = app.accounts().find_by_username(username)?;
    let patch = AccountPatch {
        username: sub.get_one::<String>("new-username").cloned(),
        password: sub.get_one::<String>("password").cloned(),
        role: sub
            .get_one::<String>("role")
            .map(|r| parse_role(r))
            .transpose()?,
    };
    let updated = app.accounts().update_account(&target.id, patch)?;
    println!("Updated account '{}' ({})", updated.username, updated.role);
    Ok(())
}
