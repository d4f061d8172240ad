// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turning pasted chat text into transactions through a hosted language model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{Transaction, TransactionType};

/// One transaction as returned by the extraction service, before it gets an id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    pub currency: String,
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub description: String,
}

impl Candidate {
    pub fn into_transaction(self) -> Transaction {
        Transaction::new(self.r#type, self.amount, &self.currency, self.description)
    }
}

/// Anything that can turn free text into candidates in a single call.
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<Candidate>>;
}

impl<E: Extractor + ?Sized> Extractor for std::sync::Arc<E> {
    fn extract(&self, text: &str) -> Result<Vec<Candidate>> {
        (**self).extract(text)
    }
}

/// Decode the model's JSON answer. Unknown `type` values fail the whole batch.
pub fn parse_candidates(body: &str) -> Result<Vec<Candidate>> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::ExtractionFailure("empty response".to_string()));
    }
    serde_json::from_str(body)
        .map_err(|e| Error::ExtractionFailure(format!("malformed response: {}", e)))
}

const SYSTEM_INSTRUCTION: &str = "You are an expert accountant. Extract the financial \
transactions from unstructured WhatsApp messages.
- Identify the currency as an ISO code (USD for dollars, TRY for Turkish lira, SYP for Syrian pound).
- If the text only says \"lira\" in a Syrian context use SYP; in a Turkish context use TRY.
- Give the amount as a number.
- Set the type: INCOMING for money received or owed to the user, OUTGOING for money paid, \
spent or owed by the user, UNKNOWN when the direction is unclear so the user can fix it by hand.
- Add a short description of each transaction.
- Answer with a JSON list only.";

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Extractor backed by the Gemini `generateContent` endpoint.
pub struct GeminiExtractor {
    client: reqwest::blocking::Client,
    api_base: String,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiExtractor {
    pub fn new(api_base: &str, model: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(GeminiExtractor {
            client: crate::utils::http_client(timeout)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn request_body(text: &str) -> serde_json::Value {
        json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{
                "role": "user",
                "parts": [{
                    "text": format!(
                        "Analyse the following financial text taken from a WhatsApp chat and extract the transactions:\n\nText: \"{}\"",
                        text
                    )
                }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "currency": { "type": "STRING", "description": "Currency code (USD, TRY, SYP)" },
                            "amount": { "type": "NUMBER", "description": "Numeric amount" },
                            "type": {
                                "type": "STRING",
                                "enum": ["INCOMING", "OUTGOING", "UNKNOWN"],
                                "description": "Transaction direction"
                            },
                            "description": { "type": "STRING", "description": "Short description" }
                        },
                        "required": ["currency", "amount", "type", "description"]
                    }
                }
            }
        })
    }
}

impl Extractor for GeminiExtractor {
    fn extract(&self, text: &str) -> Result<Vec<Candidate>> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        tracing::debug!(%url, chars = text.len(), "calling extraction service");
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(text))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::ExtractionFailure(e.to_string()))?;
        let parsed: GenerateResponse = resp
            .json()
            .map_err(|e| Error::ExtractionFailure(format!("malformed response: {}", e)))?;
        let body: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        parse_candidates(&body)
    }
}

/// Runs ingestions against one extractor, one at a time.
pub struct Ingestor<E> {
    extractor: E,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<E: Extractor> Ingestor<E> {
    pub fn new(extractor: E) -> Self {
        Ingestor {
            extractor,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Extract transactions from `text`, each with a fresh id. Blank text
    /// returns nothing without calling the service. A second call while one
    /// is pending is rejected.
    pub fn ingest(&self, text: &str) -> Result<Vec<Transaction>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::IngestionInProgress);
        }
        let _guard = InFlight(&self.in_flight);

        let candidates = self.extractor.extract(text).inspect_err(|e| {
            tracing::warn!(error = %e, "ingestion failed");
        })?;
        let txs: Vec<Transaction> = candidates
            .into_iter()
            .map(Candidate::into_transaction)
            .collect();
        tracing::info!(count = txs.len(), "extracted transactions");
        Ok(txs)
    }

    /// Ingest and append in one step. Nothing is appended on failure.
    pub fn ingest_into(&self, text: &str, ledger: &mut Ledger) -> Result<usize> {
        let txs = self.ingest(text)?;
        let n = txs.len();
        ledger.append(txs);
        Ok(n)
    }
}
