// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-account ledger: the ordered transactions, the exchange-rate map and
//! the per-currency aggregation built from them.
//!
//! Rates are expressed as "units of this currency per 1 USD". A currency
//! without a positive rate contributes 0 to the USD total instead of failing.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{CurrencySummary, Transaction, TransactionType};
use crate::utils::{normalize_currency, validate_currency};

pub const USD: &str = "USD";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRates(BTreeMap<String, Decimal>);

impl ExchangeRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rates a brand new ledger starts with.
    pub fn seeded() -> Self {
        [
            (USD.to_string(), Decimal::ONE),
            ("TRY".to_string(), Decimal::new(345, 1)),
            ("SYP".to_string(), Decimal::from(14500)),
        ]
        .into_iter()
        .collect()
    }

    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.0.get(currency).copied()
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.0.contains_key(currency)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, currency: String, rate: Decimal) {
        self.0.insert(currency, rate);
    }
}

impl FromIterator<(String, Decimal)> for ExchangeRates {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        ExchangeRates(iter.into_iter().collect())
    }
}

/// How UNKNOWN transactions enter the per-currency totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Tracked in `total_unknown` only; neither incoming nor outgoing.
    #[default]
    Exclude,
    /// Folded into `total_outgoing`, like any non-incoming transaction.
    CountAsOutgoing,
}

impl FromStr for UnknownPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(UnknownPolicy::Exclude),
            "outgoing" => Ok(UnknownPolicy::CountAsOutgoing),
            other => Err(format!(
                "unknown policy '{}' (use exclude|outgoing)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    rates: ExchangeRates,
    unknown_policy: UnknownPolicy,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>, rates: ExchangeRates) -> Self {
        Ledger {
            transactions,
            rates,
            unknown_policy: UnknownPolicy::default(),
        }
    }

    pub fn with_unknown_policy(mut self, policy: UnknownPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    pub fn unknown_policy(&self) -> UnknownPolicy {
        self.unknown_policy
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn append(&mut self, transactions: impl IntoIterator<Item = Transaction>) {
        self.transactions.extend(transactions);
    }

    /// Replace the transaction with `id`, keeping its id. Unknown ids are
    /// ignored; the return value only tells whether anything changed.
    pub fn update(&mut self, id: &str, mut replacement: Transaction) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                replacement.id = slot.id.clone();
                *slot = replacement;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        before != self.transactions.len()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    /// Replace transactions and rates wholesale, as a restore does.
    pub fn replace(&mut self, transactions: Vec<Transaction>, rates: ExchangeRates) {
        self.transactions = transactions;
        self.rates = rates;
    }

    pub fn summarize(&self) -> Vec<CurrencySummary> {
        summarize(&self.transactions, &self.rates, self.unknown_policy)
    }

    pub fn total_usd(&self) -> Decimal {
        total_usd(&self.summarize())
    }

    /// Set a rate from raw user input. Input that is not a number leaves the
    /// map untouched.
    pub fn set_rate(&mut self, currency: &str, raw: &str) -> Result<Decimal> {
        let code = normalize_currency(currency);
        validate_currency(&code)?;
        let rate =
            Decimal::from_str(raw.trim()).map_err(|_| Error::InvalidRate(raw.to_string()))?;
        if code == USD && rate != Decimal::ONE {
            return Err(Error::InvalidRate(format!("{} (USD is fixed at 1)", raw)));
        }
        if rate <= Decimal::ZERO {
            tracing::warn!(currency = %code, %rate, "non-positive rate; balances in this currency count as 0 USD");
        }
        self.rates.insert(code, rate);
        Ok(rate)
    }

    /// Register a currency at rate 1. Existing codes are rejected.
    pub fn add_currency(&mut self, code: &str) -> Result<String> {
        let code = normalize_currency(code);
        validate_currency(&code)?;
        if self.rates.contains(&code) {
            return Err(Error::CurrencyExists(code));
        }
        self.rates.insert(code.clone(), Decimal::ONE);
        Ok(code)
    }
}

/// Group `transactions` by currency in first-seen order.
pub fn summarize(
    transactions: &[Transaction],
    rates: &ExchangeRates,
    policy: UnknownPolicy,
) -> Vec<CurrencySummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<CurrencySummary> = Vec::new();

    for t in transactions {
        let i = *index.entry(t.currency.as_str()).or_insert_with(|| {
            out.push(CurrencySummary::empty(&t.currency));
            out.len() - 1
        });
        let s = &mut out[i];
        s.count += 1;
        match t.r#type {
            TransactionType::Incoming => s.total_incoming = add(s.total_incoming, t.amount),
            TransactionType::Outgoing => s.total_outgoing = add(s.total_outgoing, t.amount),
            TransactionType::Unknown => {
                s.total_unknown = add(s.total_unknown, t.amount);
                if policy == UnknownPolicy::CountAsOutgoing {
                    s.total_outgoing = add(s.total_outgoing, t.amount);
                }
            }
        }
    }

    for s in &mut out {
        s.balance = s.total_incoming.checked_sub(s.total_outgoing).unwrap_or_else(|| {
            tracing::warn!(currency = %s.currency, "balance overflowed; saturating");
            s.total_incoming.saturating_sub(s.total_outgoing)
        });
        s.usd_value = to_usd(s.balance, rates.get(&s.currency));
    }
    out
}

/// Sums saturate at the decimal range instead of panicking.
fn add(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        tracing::warn!(%total, %amount, "sum overflowed; saturating");
        total.saturating_add(amount)
    })
}

pub fn total_usd(summaries: &[CurrencySummary]) -> Decimal {
    summaries
        .iter()
        .fold(Decimal::ZERO, |acc, s| add(acc, s.usd_value))
}

/// `amount / rate` for a positive rate, 0 otherwise. A quotient outside the
/// decimal range saturates.
pub fn to_usd(amount: Decimal, rate: Option<Decimal>) -> Decimal {
    match rate {
        Some(r) if r > Decimal::ZERO => amount.checked_div(r).unwrap_or_else(|| {
            tracing::warn!(%amount, rate = %r, "USD conversion overflowed; saturating");
            if amount.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        }),
        _ => Decimal::ZERO,
    }
}
