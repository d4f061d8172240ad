// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Read;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use super::{App, confirm};
use crate::extraction::{Extractor, GeminiExtractor, Ingestor};
use crate::models::{Transaction, TransactionType};
use crate::utils::{maybe_print_json, normalize_currency, parse_decimal, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("ingest", sub)) => ingest(app, sub)?,
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("edit", sub)) => edit(app, sub)?,
        Some(("rm", sub)) => remove(app, sub)?,
        Some(("clear", sub)) => clear(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn parse_type(s: &str) -> Result<TransactionType> {
    s.parse::<TransactionType>().map_err(|e| anyhow!(e))
}

fn read_text(sub: &clap::ArgMatches) -> Result<String> {
    if let Some(t) = sub.get_one::<String>("text") {
        return Ok(t.clone());
    }
    if let Some(path) = sub.get_one::<String>("file") {
        return std::fs::read_to_string(path.trim())
            .with_context(|| format!("Read chat text from {}", path));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Read chat text from stdin")?;
    Ok(buf)
}

fn ingest(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.current_account()?;
    let text = read_text(sub)?;
    if text.trim().is_empty() {
        println!("Nothing to ingest.");
        return Ok(());
    }
    let key = app
        .config
        .api_key
        .as_deref()
        .context("Set GEMINI_API_KEY to ingest chat text")?;
    let extractor = GeminiExtractor::new(
        &app.config.api_base,
        &app.config.model,
        key,
        app.config.request_timeout,
    )?;
    let n = ingest_with(app, &Ingestor::new(extractor), &text)?;
    println!("Added {} transaction(s)", n);
    Ok(())
}

/// Run one ingestion for the logged-in account and save the result.
pub fn ingest_with<E: Extractor>(app: &App, ingestor: &Ingestor<E>, text: &str) -> Result<usize> {
    let me = app.current_account()?;
    let mut ledger = app.load_ledger(&me)?;
    let n = ingestor.ingest_into(text, &mut ledger)?;
    if n > 0 {
        app.save_ledger(&me, &ledger)?;
    }
    Ok(n)
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let r#type = parse_type(sub.get_one::<String>("type").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let currency = sub.get_one::<String>("currency").unwrap();
    let description = sub.get_one::<String>("description").unwrap();

    let tx = Transaction::new(r#type, amount, currency, description.as_str());
    tx.validate()?;
    let mut ledger = app.load_ledger(&me)?;
    if !ledger.rates().contains(&tx.currency) {
        println!(
            "Note: no rate for {}; add one with `rate add --currency {}`",
            tx.currency, tx.currency
        );
    }
    println!("Recorded {} {} {} ({})", tx.r#type, tx.amount, tx.currency, tx.id);
    ledger.append([tx]);
    app.save_ledger(&me, &ledger)?;
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub r#type: String,
    pub amount: String,
    pub currency: String,
    pub description: String,
}

pub fn query_rows(app: &App, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let me = app.current_account()?;
    let ledger = app.load_ledger(&me)?;
    let currency = sub.get_one::<String>("currency").map(|c| normalize_currency(c));
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);
    Ok(ledger
        .transactions()
        .iter()
        .filter(|t| currency.as_ref().is_none_or(|c| &t.currency == c))
        .take(limit)
        .map(|t| TransactionRow {
            id: t.id.clone(),
            r#type: t.r#type.to_string(),
            amount: t.amount.to_string(),
            currency: t.currency.clone(),
            description: t.description.clone(),
        })
        .collect())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(app, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.clone(),
                    r.r#type.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Type", "Amount", "CCY", "Description"], rows)
        );
    }
    Ok(())
}

fn edit(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let id = sub.get_one::<String>("id").unwrap();
    let mut ledger = app.load_ledger(&me)?;
    let Some(existing) = ledger.find(id).cloned() else {
        println!("No transaction with id {}", id);
        return Ok(());
    };

    let mut replacement = existing;
    if let Some(t) = sub.get_one::<String>("type") {
        replacement.r#type = parse_type(t)?;
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        replacement.amount = parse_decimal(a)?;
    }
    if let Some(c) = sub.get_one::<String>("currency") {
        replacement.currency = normalize_currency(c);
    }
    if let Some(d) = sub.get_one::<String>("description") {
        replacement.description = d.clone();
    }
    replacement.validate()?;

    ledger.update(id, replacement);
    app.save_ledger(&me, &ledger)?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn remove(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let id = sub.get_one::<String>("id").unwrap();
    let mut ledger = app.load_ledger(&me)?;
    if ledger.remove(id) {
        app.save_ledger(&me, &ledger)?;
        println!("Removed transaction {}", id);
    } else {
        println!("No transaction with id {}", id);
    }
    Ok(())
}

fn clear(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let mut ledger = app.load_ledger(&me)?;
    if !sub.get_flag("yes")
        && !confirm(&format!("Delete all {} transaction(s)?", ledger.len()))?
    {
        println!("Cancelled");
        return Ok(());
    }
    ledger.clear();
    app.save_ledger(&me, &ledger)?;
    println!("Cleared all transactions");
    Ok(())
}
