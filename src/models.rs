// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Incoming,
    Outgoing,
    Unknown,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Incoming => "INCOMING",
            TransactionType::Outgoing => "OUTGOING",
            TransactionType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOMING" | "IN" => Ok(TransactionType::Incoming),
            "OUTGOING" | "OUT" => Ok(TransactionType::Outgoing),
            "UNKNOWN" => Ok(TransactionType::Unknown),
            other => Err(format!(
                "unknown transaction type '{}' (use incoming|outgoing|unknown)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
}

impl Transaction {
    /// Build a transaction with a fresh id and an upper-cased currency code.
    pub fn new(
        r#type: TransactionType,
        amount: Decimal,
        currency: &str,
        description: impl Into<String>,
    ) -> Self {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            r#type,
            amount,
            currency: crate::utils::normalize_currency(currency),
            description: description.into(),
        }
    }

    /// Checks applied to transactions typed in by hand. Extracted candidates
    /// skip this.
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(Error::InvalidAmount(self.amount.to_string()));
        }
        crate::utils::validate_currency(&self.currency)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{}' (use admin|user)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<String>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Per-currency aggregate derived from the ledger. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencySummary {
    pub currency: String,
    pub total_incoming: Decimal,
    pub total_outgoing: Decimal,
    pub total_unknown: Decimal,
    pub count: usize,
    pub balance: Decimal,
    pub usd_value: Decimal,
}

impl CurrencySummary {
    pub(crate) fn empty(currency: &str) -> Self {
        CurrencySummary {
            currency: currency.to_string(),
            total_incoming: Decimal::ZERO,
            total_outgoing: Decimal::ZERO,
            total_unknown: Decimal::ZERO,
            count: 0,
            balance: Decimal::ZERO,
            usd_value: Decimal::ZERO,
        }
    }
}
