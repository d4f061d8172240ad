// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Maps accounts, ledgers and context sessions onto store keys, and reads and
//! writes ledger snapshots.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::ledger::{ExchangeRates, Ledger, UnknownPolicy};
use crate::models::{Account, Transaction};

pub const ACCOUNTS_KEY: &str = "accounts";

pub fn transactions_key(account_id: &str) -> String {
    format!("transactions_{}", account_id)
}

pub fn rates_key(account_id: &str) -> String {
    format!("exchange_rates_{}", account_id)
}

fn context_token_key(context: &str) -> String {
    format!("context_token_{}", context)
}

fn context_user_key(context: &str) -> String {
    format!("context_user_{}", context)
}

#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Persistence { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| Error::Serialization(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    pub fn load_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.read(ACCOUNTS_KEY)?.unwrap_or_default())
    }

    pub fn save_accounts(&self, accounts: &[Account]) -> Result<()> {
        self.write(ACCOUNTS_KEY, accounts)
    }

    /// A missing ledger loads as empty with the seeded rates.
    pub fn load_ledger(&self, account_id: &str, policy: UnknownPolicy) -> Result<Ledger> {
        let transactions: Vec<Transaction> = self
            .read(&transactions_key(account_id))?
            .unwrap_or_default();
        let rates: ExchangeRates = self
            .read(&rates_key(account_id))?
            .unwrap_or_else(ExchangeRates::seeded);
        Ok(Ledger::new(transactions, rates).with_unknown_policy(policy))
    }

    pub fn save_ledger(&self, account_id: &str, ledger: &Ledger) -> Result<()> {
        self.write(&transactions_key(account_id), ledger.transactions())?;
        self.write(&rates_key(account_id), ledger.rates())
    }

    pub fn remove_ledger(&self, account_id: &str) -> Result<()> {
        self.store.remove(&transactions_key(account_id))?;
        self.store.remove(&rates_key(account_id))
    }

    /// The stable token of a context, created on first use.
    pub fn context_token(&self, context: &str) -> Result<String> {
        let key = context_token_key(context);
        if let Some(token) = self.store.get(&key)? {
            return Ok(token);
        }
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.store.set(&key, &token)?;
        Ok(token)
    }

    pub fn context_user(&self, context: &str) -> Result<Option<String>> {
        self.store.get(&context_user_key(context))
    }

    pub fn set_context_user(&self, context: &str, account_id: &str) -> Result<()> {
        self.store.set(&context_user_key(context), account_id)
    }

    pub fn clear_context_user(&self, context: &str) -> Result<()> {
        self.store.remove(&context_user_key(context))
    }
}

/// Exported copy of one account's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub exchange_rates: ExchangeRates,
    pub export_date: DateTime<Utc>,
    #[serde(default)]
    pub owner: Option<String>,
}

impl Snapshot {
    pub fn capture(ledger: &Ledger, owner: &str, export_date: DateTime<Utc>) -> Self {
        Snapshot {
            transactions: ledger.transactions().to_vec(),
            exchange_rates: ledger.rates().clone(),
            export_date,
            owner: Some(owner.to_string()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn file_name(owner: &str, date: NaiveDate) -> String {
        let owner: String = owner
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("backup_{}_{}.json", owner, date.format("%Y-%m-%d"))
    }
}

/// A parsed snapshot waiting for the user to confirm the restore.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRestore {
    transactions: Vec<Transaction>,
    exchange_rates: ExchangeRates,
    source_date: DateTime<Utc>,
    owner: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    transactions: Vec<Transaction>,
    exchange_rates: ExchangeRates,
    #[serde(default)]
    export_date: Option<String>,
    #[serde(default)]
    owner: Option<String>,
}

impl StagedRestore {
    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| Error::InvalidBackupFile(format!("not valid JSON: {}", e)))?;
        for key in ["transactions", "exchangeRates"] {
            if value.get(key).is_none_or(|v| v.is_null()) {
                return Err(Error::InvalidBackupFile(format!("missing '{}'", key)));
            }
        }
        // Decode from the text so amounts keep every digit.
        let raw: RawSnapshot = serde_json::from_str(content)
            .map_err(|e| Error::InvalidBackupFile(e.to_string()))?;
        let source_date = raw
            .export_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Ok(StagedRestore {
            transactions: raw.transactions,
            exchange_rates: raw.exchange_rates,
            source_date,
            owner: raw.owner,
        })
    }

    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    pub fn source_date(&self) -> DateTime<Utc> {
        self.source_date
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Overwrite the ledger with the staged data. There is no merge.
    pub fn apply(self, ledger: &mut Ledger) {
        ledger.replace(self.transactions, self.exchange_rates);
    }
}
