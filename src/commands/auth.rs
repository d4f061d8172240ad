// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::App;
use crate::session::SessionWatcher;

pub fn login(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let username = m.get_one::<String>("username").unwrap();
    let password = m.get_one::<String>("password").unwrap();
    let account = app.session.login(username, password)?;
    println!(
        "Logged in as '{}' ({}) in context '{}'",
        account.username,
        account.role,
        app.session.context()
    );
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.session.logout()?;
    println!("Logged out of context '{}'", app.session.context());
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    let me = app.current_account()?;
    println!("{} ({})", me.username, me.role);
    Ok(())
}

/// Poll until another login takes the account over.
pub fn watch(app: &App) -> Result<()> {
    let me = app.current_account()?;
    println!(
        "Watching session of '{}' every {:?} (Ctrl-C to stop)",
        me.username, app.config.poll_interval
    );
    let session = app.session.clone();
    let watcher = SessionWatcher::spawn(
        app.config.poll_interval,
        move || session.check(),
        |outcome| match outcome {
            Ok(status) => println!("Session ended: {:?}", status),
            Err(e) => println!("Session ended: {}", e),
        },
    );
    watcher.join();
    Ok(())
}
