// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Local user accounts and the single active session marker each one carries.
//!
//! Every operation re-reads the account list from the store, so two contexts
//! sharing a store see each other's logins on their next read.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Account, Role};
use crate::persistence::Persistence;

/// Compares a supplied password with what was stored for the account.
pub trait CredentialCheck: Send + Sync {
    /// What gets stored for a new or changed password.
    fn prepare(&self, password: &str) -> String;
    fn verify(&self, stored: &str, supplied: &str) -> bool;
}

/// Stores passwords as given and compares them exactly.
pub struct PlaintextCredentials;

impl CredentialCheck for PlaintextCredentials {
    fn prepare(&self, password: &str) -> String {
        password.to_string()
    }

    fn verify(&self, stored: &str, supplied: &str) -> bool {
        stored == supplied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// The account's marker names a different session.
    Superseded,
    /// The account no longer exists.
    Missing,
}

/// An account mutation, as seen by the admin invariant.
#[derive(Debug, Clone, Copy)]
pub enum AccountChange<'a> {
    Delete(&'a str),
    Update(&'a Account),
}

/// True when `change` would take the admin count from at least one to zero.
pub fn admin_violation(accounts: &[Account], change: AccountChange<'_>) -> bool {
    let before = accounts.iter().filter(|a| a.is_admin()).count();
    let after = match change {
        AccountChange::Delete(id) => accounts
            .iter()
            .filter(|a| a.id != id && a.is_admin())
            .count(),
        AccountChange::Update(updated) => {
            accounts
                .iter()
                .filter(|a| a.id != updated.id && a.is_admin())
                .count()
                + usize::from(updated.is_admin())
        }
    };
    before > 0 && after == 0
}

/// Fields to change on an account. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct AccountStore {
    persistence: Persistence,
    credentials: Arc<dyn CredentialCheck>,
}

impl AccountStore {
    pub fn new(persistence: Persistence) -> Self {
        Self::with_credentials(persistence, Arc::new(PlaintextCredentials))
    }

    pub fn with_credentials(persistence: Persistence, credentials: Arc<dyn CredentialCheck>) -> Self {
        AccountStore {
            persistence,
            credentials,
        }
    }

    pub fn list(&self) -> Result<Vec<Account>> {
        self.persistence.load_accounts()
    }

    pub fn find(&self, id: &str) -> Result<Account> {
        self.list()?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::AccountNotFound(id.to_string()))
    }

    pub fn find_by_username(&self, username: &str) -> Result<Account> {
        self.list()?
            .into_iter()
            .find(|a| a.username == username)
            .ok_or_else(|| Error::AccountNotFound(username.to_string()))
    }

    /// Seed an admin when no account exists yet. Returns whether one was made.
    pub fn ensure_default_admin(&self, username: &str, password: &str) -> Result<bool> {
        if !self.list()?.is_empty() {
            return Ok(false);
        }
        self.create_account(username, password, Role::Admin)?;
        tracing::info!(username, "seeded default admin account");
        Ok(true)
    }

    /// Check credentials and make `session_token` the account's only session.
    pub fn login(&self, username: &str, password: &str, session_token: &str) -> Result<Account> {
        let mut accounts = self.list()?;
        let account = accounts
            .iter_mut()
            .find(|a| a.username == username && self.credentials.verify(&a.password, password))
            .ok_or(Error::InvalidCredentials)?;
        if account
            .active_session_id
            .as_deref()
            .is_some_and(|s| s != session_token)
        {
            tracing::info!(username, "login supersedes an existing session");
        }
        account.active_session_id = Some(session_token.to_string());
        let account = account.clone();
        self.persistence.save_accounts(&accounts)?;
        tracing::info!(username, "logged in");
        Ok(account)
    }

    pub fn logout(&self, account_id: &str) -> Result<()> {
        let mut accounts = self.list()?;
        let Some(a) = accounts.iter_mut().find(|a| a.id == account_id) else {
            return Ok(());
        };
        a.active_session_id = None;
        let username = a.username.clone();
        self.persistence.save_accounts(&accounts)?;
        tracing::info!(%username, "logged out");
        Ok(())
    }

    pub fn create_account(&self, username: &str, password: &str, role: Role) -> Result<Account> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(Error::EmptyCredentials);
        }
        let mut accounts = self.list()?;
        if accounts.iter().any(|a| a.username == username) {
            return Err(Error::DuplicateUsername(username.to_string()));
        }
        let account = Account {
            id: format!("user-{}", uuid::Uuid::new_v4().simple()),
            username: username.to_string(),
            password: self.credentials.prepare(password),
            role,
            active_session_id: None,
        };
        accounts.push(account.clone());
        self.persistence.save_accounts(&accounts)?;
        tracing::info!(username, %role, "account created");
        Ok(account)
    }

    /// Remove an account together with its ledger and rates.
    pub fn delete_account(&self, caller_id: &str, id: &str) -> Result<Account> {
        if caller_id == id {
            return Err(Error::SelfDelete);
        }
        let mut accounts = self.list()?;
        let pos = accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| Error::AccountNotFound(id.to_string()))?;
        if admin_violation(&accounts, AccountChange::Delete(id)) {
            tracing::warn!(id, "refused to delete the last admin");
            return Err(Error::LastAdmin);
        }
        let removed = accounts.remove(pos);
        self.persistence.save_accounts(&accounts)?;
        self.persistence.remove_ledger(id)?;
        tracing::info!(username = %removed.username, "account deleted");
        Ok(removed)
    }

    pub fn update_account(&self, id: &str, patch: AccountPatch) -> Result<Account> {
        let mut accounts = self.list()?;
        let current = accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::AccountNotFound(id.to_string()))?;

        let mut updated = current.clone();
        if let Some(username) = patch.username {
            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(Error::EmptyCredentials);
            }
            if accounts.iter().any(|a| a.id != id && a.username == username) {
                return Err(Error::DuplicateUsername(username));
            }
            updated.username = username;
        }
        if let Some(password) = patch.password {
            if password.is_empty() {
                return Err(Error::EmptyCredentials);
            }
            updated.password = self.credentials.prepare(&password);
        }
        if let Some(role) = patch.role {
            updated.role = role;
        }

        if admin_violation(&accounts, AccountChange::Update(&updated)) {
            tracing::warn!(id, "refused to demote the last admin");
            return Err(Error::LastAdmin);
        }
        if let Some(slot) = accounts.iter_mut().find(|a| a.id == id) {
            *slot = updated.clone();
        }
        self.persistence.save_accounts(&accounts)?;
        Ok(updated)
    }

    /// Compare the account's session marker with `session_token`. Only an
    /// exact match is active; a cleared marker means a newer session came
    /// and went.
    pub fn check_session(&self, account_id: &str, session_token: &str) -> Result<SessionStatus> {
        let accounts = self.list()?;
        let status = match accounts.iter().find(|a| a.id == account_id) {
            None => SessionStatus::Missing,
            Some(a) if a.active_session_id.as_deref() == Some(session_token) => {
                SessionStatus::Active
            }
            Some(_) => SessionStatus::Superseded,
        };
        Ok(status)
    }
}
