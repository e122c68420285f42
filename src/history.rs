//! history.rs — bounded in-memory log of recent classifications for diagnostics.
//! Stores outcome fingerprints only; no answers and no user identity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

use crate::engine::ClassificationResult;
use crate::realm::Realm;
use crate::scoring::Confidence;
use crate::trio::TrioKey;

const HARD_CAP: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub primary: Realm,
    pub trio: TrioKey,
    pub confidence: Confidence,
    /// True when the trio had no authored insight.
    pub fallback: bool,
}

#[derive(Debug)]
pub struct History {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.min(HARD_CAP);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap)),
            cap,
        }
    }

    pub fn push(&self, r: &ClassificationResult) {
        let entry = HistoryEntry {
            at: r.timestamp,
            primary: r.primary_realm,
            trio: r.trio.key,
            confidence: r.confidence,
            fallback: r.trio.fallback,
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("history mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
