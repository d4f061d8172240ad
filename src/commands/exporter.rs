// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::App;
use crate::models::Transaction;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("csv", sub)) => export_csv(app, sub),
        _ => Ok(()),
    }
}

/// One row per transaction: type, amount, currency, description.
pub fn write_csv<W: std::io::Write>(w: W, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(["type", "amount", "currency", "description"])?;
    for t in transactions {
        let amount = t.amount.to_string();
        wtr.write_record([
            t.r#type.as_str(),
            amount.as_str(),
            t.currency.as_str(),
            t.description.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn export_csv(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let ledger = app.load_ledger(&me)?;
    if ledger.is_empty() {
        println!("No transactions to export");
        return Ok(());
    }
    let out = sub.get_one::<String>("out").unwrap();
    let file = std::fs::File::create(out)?;
    write_csv(file, ledger.transactions())?;
    println!("Exported {} transaction(s) to {}", ledger.len(), out);
    Ok(())
}
