// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use chatledger::Error;
use chatledger::extraction::{Candidate, Extractor, Ingestor, parse_candidates};
use chatledger::ledger::{ExchangeRates, Ledger};
use chatledger::models::TransactionType;
use rust_decimal::Decimal;

struct Scripted {
    reply: std::result::Result<String, Error>,
    calls: AtomicUsize,
}

impl Scripted {
    fn ok(body: &str) -> Self {
        Scripted {
            reply: Ok(body.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(err: Error) -> Self {
        Scripted {
            reply: Err(err),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Extractor for Scripted {
    fn extract(&self, _text: &str) -> chatledger::Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        parse_candidates(&self.reply.clone()?)
    }
}

const TWO: &str = r#"[
    {"currency": "usd", "amount": 100, "type": "INCOMING", "description": "Ali sent 100$"},
    {"currency": "TRY", "amount": 250.5, "type": "UNKNOWN", "description": "lira, unclear"}
]"#;

#[test]
fn candidates_get_fresh_ids_and_are_appended() {
    let ingestor = Ingestor::new(Scripted::ok(TWO));
    let mut ledger = Ledger::new(Vec::new(), ExchangeRates::seeded());

    assert_eq!(ingestor.ingest_into("Ali sent 100$", &mut ledger).unwrap(), 2);
    assert_eq!(ingestor.ingest_into("Ali sent 100$", &mut ledger).unwrap(), 2);
    assert_eq!(ledger.len(), 4);

    let ids: HashSet<_> = ledger.transactions().iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids.len(), 4);

    let first = &ledger.transactions()[0];
    assert_eq!(first.currency, "USD");
    assert_eq!(first.amount, Decimal::from(100));
    assert_eq!(first.r#type, TransactionType::Incoming);
    assert_eq!(ledger.transactions()[1].amount, Decimal::new(2505, 1));
}

#[test]
fn blank_text_does_not_call_the_service() {
    let scripted = Arc::new(Scripted::ok(TWO));
    let ingestor = Ingestor::new(scripted.clone());
    assert!(ingestor.ingest("   \n").unwrap().is_empty());
    assert_eq!(scripted.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn failures_append_nothing() {
    let cases = [
        Scripted::failing(Error::ExtractionFailure("connection refused".into())),
        Scripted::ok(""),
        Scripted::ok("{not json"),
        Scripted::ok(
            r#"[{"currency":"USD","amount":1,"type":"INCOMING","description":"ok"},
                {"currency":"USD","amount":2,"type":"DEBT","description":"bad"}]"#,
        ),
    ];
    for scripted in cases {
        let ingestor = Ingestor::new(scripted);
        let mut ledger = Ledger::new(Vec::new(), ExchangeRates::seeded());
        let err = ingestor.ingest_into("something", &mut ledger).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailure(_)), "{err:?}");
        assert!(ledger.is_empty());
        assert!(!ingestor.is_busy());
    }
}

#[test]
fn each_ingestion_calls_the_service_once() {
    let scripted = Arc::new(Scripted::failing(Error::ExtractionFailure("503".into())));
    let ingestor = Ingestor::new(scripted.clone());
    assert!(ingestor.ingest("text").is_err());
    assert_eq!(scripted.calls.load(Ordering::SeqCst), 1);
}

struct Gated {
    started: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Extractor for Gated {
    fn extract(&self, _text: &str) -> chatledger::Result<Vec<Candidate>> {
        self.started.lock().unwrap().send(()).unwrap();
        self.release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        parse_candidates(r#"[{"currency":"USD","amount":1,"type":"OUTGOING","description":"x"}]"#)
    }
}

#[test]
fn second_ingestion_while_pending_is_rejected() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let ingestor = Arc::new(Ingestor::new(Gated {
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    }));

    let pending = {
        let ingestor = ingestor.clone();
        thread::spawn(move || ingestor.ingest("first"))
    };
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(ingestor.is_busy());
    assert_eq!(
        ingestor.ingest("second").unwrap_err(),
        Error::IngestionInProgress
    );

    release_tx.send(()).unwrap();
    let first = pending.join().unwrap().unwrap();
    assert_eq!(first.len(), 1);
    assert!(!ingestor.is_busy());
}
