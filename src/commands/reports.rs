// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use super::App;
use crate::ledger::Ledger;
use crate::models::CurrencySummary;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub owner: String,
    pub summaries: Vec<CurrencySummary>,
    pub total_usd: Decimal,
}

pub fn build_report(owner: &str, ledger: &Ledger) -> Report {
    let summaries = ledger.summarize();
    let total_usd = crate::ledger::total_usd(&summaries);
    Report {
        owner: owner.to_string(),
        summaries,
        total_usd,
    }
}

/// Plain-text rendering of a report, used for the terminal and `--out`.
pub fn render_report(report: &Report, ledger: &Ledger) -> String {
    let rows = report
        .summaries
        .iter()
        .map(|s| {
            vec![
                s.currency.clone(),
                fmt_money(&s.total_incoming),
                fmt_money(&s.total_outgoing),
                fmt_money(&s.total_unknown),
                fmt_money(&s.balance),
                ledger
                    .rates()
                    .get(&s.currency)
                    .map(|r| r.normalize().to_string())
                    .unwrap_or_else(|| "-".into()),
                fmt_money(&s.usd_value),
            ]
        })
        .collect();
    let table = pretty_table(
        &["CCY", "Incoming", "Outgoing", "Unknown", "Balance", "Rate", "USD"],
        rows,
    );
    format!(
        "Ledger report for {} ({})\n{}\nTotal balance: {} USD\n",
        report.owner,
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        table,
        fmt_money(&report.total_usd)
    )
}

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let me = app.current_account()?;
    let ledger = app.load_ledger(&me)?;
    let report = build_report(&me.username, &ledger);

    if let Some(out) = m.get_one::<String>("out") {
        std::fs::write(out, render_report(&report, &ledger))
            .with_context(|| format!("Write report to {}", out))?;
        println!("Report written to {}", out);
    }
    if !maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &report)? {
        print!("{}", render_report(&report, &ledger));
    }
    Ok(())
}
