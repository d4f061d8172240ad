// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod backup;
pub mod exporter;
pub mod rates;
pub mod reports;
pub mod transactions;
pub mod users;

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::accounts::AccountStore;
use crate::config::Config;
use crate::db::KeyValueStore;
use crate::ledger::Ledger;
use crate::models::Account;
use crate::persistence::Persistence;
use crate::session::ContextSession;

/// Everything a command needs: settings, storage and this context's session.
pub struct App {
    pub config: Config,
    pub persistence: Persistence,
    pub session: ContextSession,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let persistence = Persistence::new(store);
        let accounts = AccountStore::new(persistence.clone());
        accounts.ensure_default_admin(&config.admin_username, &config.admin_password)?;
        let session = ContextSession::open(persistence.clone(), accounts, &config.context)?;
        Ok(App {
            config,
            persistence,
            session,
        })
    }

    pub fn accounts(&self) -> &AccountStore {
        self.session.accounts()
    }

    /// The logged-in account; fails when the session was superseded.
    pub fn current_account(&self) -> Result<Account> {
        Ok(self.session.current()?)
    }

    pub fn require_admin(&self) -> Result<Account> {
        let me = self.current_account()?;
        if !me.is_admin() {
            return Err(anyhow!("Only admins can manage accounts"));
        }
        Ok(me)
    }

    pub fn load_ledger(&self, account: &Account) -> Result<Ledger> {
        Ok(self
            .persistence
            .load_ledger(&account.id, self.config.unknown_policy)?)
    }

    pub fn save_ledger(&self, account: &Account, ledger: &Ledger) -> Result<()> {
        Ok(self.persistence.save_ledger(&account.id, ledger)?)
    }
}

/// Dispatch a parsed command line.
pub fn run(app: &App, matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            let location = match &app.config.db_path {
                Some(p) => p.clone(),
                None => crate::db::db_path()?,
            };
            println!("Store initialized at {}", location.display());
        }
        Some(("login", sub)) => auth::login(app, sub)?,
        Some(("logout", _)) => auth::logout(app)?,
        Some(("whoami", _)) => auth::whoami(app)?,
        Some(("watch", _)) => auth::watch(app)?,
        Some(("user", sub)) => users::handle(app, sub)?,
        Some(("tx", sub)) => transactions::handle(app, sub)?,
        Some(("rate", sub)) => rates::handle(app, sub)?,
        Some(("report", sub)) => reports::handle(app, sub)?,
        Some(("backup", sub)) => backup::handle(app, sub)?,
        Some(("export", sub)) => exporter::handle(app, sub)?,
        _ => {
            crate::cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

/// Ask on stdin; only an explicit "y"/"yes" confirms.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
