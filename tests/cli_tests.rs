// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use chatledger::commands::{self, App, reports, transactions};
use chatledger::config::Config;
use chatledger::db::{KeyValueStore, MemoryStore};
use chatledger::extraction::{Candidate, Extractor, Ingestor, parse_candidates};
use chatledger::{Error, cli};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn app_in(store: &Arc<dyn KeyValueStore>, context: &str) -> App {
    let config = Config {
        context: context.to_string(),
        ..Config::default()
    };
    App::new(config, store.clone()).unwrap()
}

fn logged_in_app() -> App {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let app = app_in(&store, "default");
    run(&app, &["login", "--username", "admin", "--password", "admin"]).unwrap();
    app
}

fn run(app: &App, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["chatledger"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().try_get_matches_from(argv)?;
    commands::run(app, &matches)
}

fn list_rows(app: &App) -> Vec<transactions::TransactionRow> {
    let matches = cli::build_cli().get_matches_from(["chatledger", "tx", "list"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            return transactions::query_rows(app, list_m).unwrap();
        }
    }
    panic!("no tx list subcommand");
}

#[test]
fn commands_require_login() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let app = app_in(&store, "default");
    let err = run(&app, &["tx", "list"]).unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NotLoggedIn));
}

#[test]
fn add_edit_and_remove_transactions() {
    let app = logged_in_app();
    run(
        &app,
        &["tx", "add", "--type", "in", "--amount", "100", "--currency", "usd", "--description", "salary"],
    )
    .unwrap();
    let rows = list_rows(&app);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].r#type, "INCOMING");
    assert_eq!(rows[0].currency, "USD");

    let id = rows[0].id.clone();
    run(&app, &["tx", "edit", "--id", &id, "--amount", "90", "--type", "outgoing"]).unwrap();
    let rows = list_rows(&app);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].amount, "90");
    assert_eq!(rows[0].r#type, "OUTGOING");

    // Unknown ids are not an error.
    run(&app, &["tx", "edit", "--id", "missing", "--amount", "1"]).unwrap();
    run(&app, &["tx", "rm", "--id", &id]).unwrap();
    assert!(list_rows(&app).is_empty());
}

#[test]
fn negative_manual_amount_is_rejected() {
    let app = logged_in_app();
    let err = run(
        &app,
        &["tx", "add", "--type", "outgoing", "--amount", "-5", "--currency", "USD"],
    )
    .unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidAmount(_))));
    assert!(list_rows(&app).is_empty());
}

#[test]
fn rate_commands_ignore_bad_input() {
    let app = logged_in_app();
    let me = app.current_account().unwrap();

    run(&app, &["rate", "set", "--currency", "TRY", "--value", "abc"]).unwrap();
    run(&app, &["rate", "add", "--currency", "eur"]).unwrap();
    run(&app, &["rate", "add", "--currency", "EUR"]).unwrap();
    run(&app, &["rate", "set", "--currency", "eur", "--value", "0.9"]).unwrap();

    let ledger = app.load_ledger(&me).unwrap();
    assert_eq!(ledger.rates().get("TRY"), Some(Decimal::new(345, 1)));
    assert_eq!(ledger.rates().get("EUR"), Some(Decimal::new(9, 1)));
}

#[test]
fn csv_export_has_one_row_per_transaction() {
    let app = logged_in_app();
    run(&app, &["tx", "add", "--type", "incoming", "--amount", "5000", "--currency", "TRY", "--description", "from Mehmet"]).unwrap();
    run(&app, &["tx", "add", "--type", "unknown", "--amount", "12.5", "--currency", "USD"]).unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("ledger.csv");
    let out_str = out.to_string_lossy().to_string();
    run(&app, &["export", "csv", "--out", &out_str]).unwrap();

    let contents = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        [
            "type,amount,currency,description",
            "INCOMING,5000,TRY,from Mehmet",
            "UNKNOWN,12.5,USD,",
        ]
    );
}

#[test]
fn backup_round_trip_through_files() {
    let app = logged_in_app();
    run(&app, &["tx", "add", "--type", "incoming", "--amount", "100", "--currency", "USD"]).unwrap();
    run(&app, &["tx", "add", "--type", "outgoing", "--amount", "30", "--currency", "USD"]).unwrap();
    run(&app, &["rate", "add", "--currency", "AED"]).unwrap();
    let me = app.current_account().unwrap();
    let before = app.load_ledger(&me).unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("backup.json");
    let out_str = out.to_string_lossy().to_string();
    run(&app, &["backup", "export", "--out", &out_str]).unwrap();

    run(&app, &["tx", "clear", "--yes"]).unwrap();
    run(&app, &["rate", "set", "--currency", "TRY", "--value", "40"]).unwrap();
    assert!(list_rows(&app).is_empty());

    run(&app, &["backup", "import", "--path", &out_str, "--yes"]).unwrap();
    let after = app.load_ledger(&me).unwrap();
    assert_eq!(after.transactions(), before.transactions());
    assert_eq!(after.rates(), before.rates());
}

#[test]
fn backup_export_names_file_after_owner() {
    let app = logged_in_app();
    let dir = tempdir().unwrap();
    let dir_str = dir.path().to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from(["chatledger", "backup", "export", "--dir", &dir_str]);
    let Some(("backup", backup_m)) = matches.subcommand() else {
        panic!("no backup subcommand");
    };
    let Some(("export", export_m)) = backup_m.subcommand() else {
        panic!("no export subcommand");
    };
    let path = commands::backup::export(&app, export_m).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("backup_admin_"), "{name}");
    assert!(path.exists());
}

#[test]
fn invalid_backup_is_rejected_and_ledger_kept() {
    let app = logged_in_app();
    run(&app, &["tx", "add", "--type", "incoming", "--amount", "1", "--currency", "USD"]).unwrap();
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"transactions": []}"#).unwrap();
    let bad_str = bad.to_string_lossy().to_string();

    let err = run(&app, &["backup", "import", "--path", &bad_str, "--yes"]).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidBackupFile(_))));
    assert_eq!(list_rows(&app).len(), 1);
}

#[test]
fn user_management_respects_admin_rules() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let admin = app_in(&store, "admin-term");
    run(&admin, &["login", "-u", "admin", "-p", "admin"]).unwrap();
    run(&admin, &["user", "add", "--username", "sam", "--password", "pw"]).unwrap();

    let err = run(&admin, &["user", "rm", "--username", "admin"]).unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::SelfDelete));
    let err = run(&admin, &["user", "edit", "--username", "admin", "--role", "user"]).unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::LastAdmin));

    let sam = app_in(&store, "sam-term");
    run(&sam, &["login", "-u", "sam", "-p", "pw"]).unwrap();
    assert!(run(&sam, &["user", "list"]).is_err());

    run(&admin, &["user", "rm", "--username", "sam"]).unwrap();
    let err = run(&sam, &["tx", "list"]).unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NotLoggedIn));
}

#[test]
fn login_elsewhere_logs_this_context_out() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let laptop = app_in(&store, "laptop");
    let phone = app_in(&store, "phone");
    run(&laptop, &["login", "-u", "admin", "-p", "admin"]).unwrap();
    run(&phone, &["login", "-u", "admin", "-p", "admin"]).unwrap();

    let err = run(&laptop, &["whoami"]).unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::SessionSuperseded));
    run(&phone, &["whoami"]).unwrap();
}

struct Canned;

impl Extractor for Canned {
    fn extract(&self, _text: &str) -> chatledger::Result<Vec<Candidate>> {
        parse_candidates(
            r#"[{"currency":"TRY","amount":5000,"type":"INCOMING","description":"lira from Mehmet"}]"#,
        )
    }
}

#[test]
fn ingestion_saves_into_the_current_ledger() {
    let app = logged_in_app();
    let ingestor = Ingestor::new(Canned);
    assert_eq!(transactions::ingest_with(&app, &ingestor, "Mehmet sent 5000 lira").unwrap(), 1);
    assert_eq!(transactions::ingest_with(&app, &ingestor, "  ").unwrap(), 0);

    let rows = list_rows(&app);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "lira from Mehmet");

    let me = app.current_account().unwrap();
    let report = reports::build_report(&me.username, &app.load_ledger(&me).unwrap());
    assert_eq!(report.total_usd.round_dp(2), Decimal::new(14493, 2));
}

#[test]
fn report_can_be_written_to_a_file() {
    let app = logged_in_app();
    run(&app, &["tx", "add", "--type", "incoming", "--amount", "100", "--currency", "USD"]).unwrap();
    let dir = tempdir().unwrap();
    let out = dir.path().join("report.txt");
    let out_str = out.to_string_lossy().to_string();
    run(&app, &["report", "--out", &out_str, "--json"]).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("Ledger report for admin"));
    assert!(text.contains("Total balance: 100.00 USD"));
}

#[test]
fn report_survives_amounts_at_the_decimal_limit() {
    let app = logged_in_app();
    for _ in 0..2 {
        run(
            &app,
            &["tx", "add", "--type", "incoming", "--amount", "79228162514264337593543950335", "--currency", "USD"],
        )
        .unwrap();
    }
    let me = app.current_account().unwrap();
    let report = reports::build_report(&me.username, &app.load_ledger(&me).unwrap());
    assert_eq!(report.total_usd, Decimal::MAX);
    run(&app, &["report", "--json"]).unwrap();
}

#[test]
fn superseded_context_stays_out_after_the_other_logs_out() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let laptop = app_in(&store, "laptop");
    let phone = app_in(&store, "phone");
    run(&laptop, &["login", "-u", "admin", "-p", "admin"]).unwrap();
    run(&phone, &["login", "-u", "admin", "-p", "admin"]).unwrap();
    run(&phone, &["logout"]).unwrap();

    let err = run(&laptop, &["tx", "list"]).unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::SessionSuperseded));
}
