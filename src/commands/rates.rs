// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use super::App;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(app, sub)?,
        Some(("set", sub)) => set(app, sub)?,
        Some(("add", sub)) => add(app, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct RateRow {
    currency: String,
    rate: String,
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let ledger = app.load_ledger(&me)?;
    let data: Vec<RateRow> = ledger
        .rates()
        .iter()
        .map(|(c, r)| RateRow {
            currency: c.clone(),
            rate: r.normalize().to_string(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| vec![r.currency.clone(), r.rate.clone()])
            .collect();
        println!("{}", pretty_table(&["Currency", "Per 1 USD"], rows));
    }
    Ok(())
}

/// Bad input is reported but not fatal; the stored rate stays as it was.
fn set(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let currency = sub.get_one::<String>("currency").unwrap();
    let value = sub.get_one::<String>("value").unwrap();
    let mut ledger = app.load_ledger(&me)?;
    match ledger.set_rate(currency, value) {
        Ok(rate) => {
            app.save_ledger(&me, &ledger)?;
            println!("Rate for {} set to {}", currency.trim().to_uppercase(), rate);
        }
        Err(e) if e.is_ignored_input() => println!("Ignored: {}", e),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let currency = sub.get_one::<String>("currency").unwrap();
    let mut ledger = app.load_ledger(&me)?;
    match ledger.add_currency(currency) {
        Ok(code) => {
            app.save_ledger(&me, &ledger)?;
            println!("Added {} at rate 1; set the real rate with `rate set`", code);
        }
        Err(e) if e.is_ignored_input() => println!("Ignored: {}", e),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
