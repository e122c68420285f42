//! # Trio Resolver
//!
//! Turns the three highest-ranked realms into a canonical, order-independent
//! key and looks up the authored insight for it.
//!
//! - Key construction: sort the three identifiers lexicographically and join
//!   with `-` (e.g. `mist-oasis-trace`). Any other ordering breaks table
//!   addressing.
//! - Lookup goes through the `InsightLookup` trait, so tests and callers can
//!   plug in partial tables.
//! - A missing key is not an error: a generic fallback record is returned and
//!   a `warn!` (target `insights`) plus a counter flag it for content audits.

use anyhow::{anyhow, Context};
use metrics::counter;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::error::ScoringError;
use crate::realm::{Realm, RealmScores, REALM_COUNT};
use crate::scoring::rank;

pub const FALLBACK_TITLE: &str = "The Unique Journey";
pub const FALLBACK_NARRATIVE: &str = "Your emotional landscape represents a unique combination of experiences. The interplay between these realms suggests a complex inner world that defies simple categorization.";
const FALLBACK_STRENGTHS: [&str; 2] = [
    "Unique perspective combining multiple emotional viewpoints",
    "Capacity for empathy and understanding complexity",
];
const FALLBACK_CHALLENGES: [&str; 2] = [
    "Integration of conflicting emotional needs",
    "Finding coherence amid complexity",
];

/// Canonical identifier of an unordered set of three distinct realms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrioKey([Realm; 3]);

impl TrioKey {
    /// Build the key from three realms in any order.
    pub fn new(a: Realm, b: Realm, c: Realm) -> Result<Self, ScoringError> {
        if a == b || a == c {
            return Err(ScoringError::DuplicateRealm(a));
        }
        if b == c {
            return Err(ScoringError::DuplicateRealm(b));
        }
        Ok(Self::from_distinct([a, b, c]))
    }

    fn from_distinct(mut realms: [Realm; 3]) -> Self {
        debug_assert!(realms[0] != realms[1] && realms[0] != realms[2] && realms[1] != realms[2]);
        realms.sort_by_key(|r| r.as_str());
        Self(realms)
    }

    /// Parse a canonical key string. Non-canonical orderings are rejected.
    pub fn parse(s: &str) -> Result<Self, ScoringError> {
        let malformed = || ScoringError::MalformedTrioKey(s.to_string());
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(malformed());
        }
        let a: Realm = parts[0].parse().map_err(|_| malformed())?;
        let b: Realm = parts[1].parse().map_err(|_| malformed())?;
        let c: Realm = parts[2].parse().map_err(|_| malformed())?;
        let key = Self::new(a, b, c)?;
        if key.to_string() != s {
            return Err(malformed());
        }
        Ok(key)
    }

    /// Every possible key (C(10,3) = 120), in lexicographic order.
    pub fn all() -> Vec<TrioKey> {
        let mut sorted = Realm::ALL;
        sorted.sort_by_key(|r| r.as_str());
        let mut out = Vec::with_capacity(120);
        for i in 0..REALM_COUNT {
            for j in (i + 1)..REALM_COUNT {
                for k in (j + 1)..REALM_COUNT {
                    out.push(Self([sorted[i], sorted[j], sorted[k]]));
                }
            }
        }
        out
    }

    /// The three realms, sorted by identifier.
    pub fn realms(&self) -> [Realm; 3] {
        self.0
    }
}

impl fmt::Display for TrioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.0[0], self.0[1], self.0[2])
    }
}

impl Serialize for TrioKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TrioKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TrioKey::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Authored narrative content for one trio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub title: String,
    pub narrative: String,
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
}

impl InsightRecord {
    /// Generic, always well-formed record used when a key has no content.
    pub fn fallback() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            narrative: FALLBACK_NARRATIVE.to_string(),
            strengths: FALLBACK_STRENGTHS.iter().map(|s| s.to_string()).collect(),
            challenges: FALLBACK_CHALLENGES.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn validate(&self, key: &TrioKey) -> anyhow::Result<()> {
        let blank = |s: &String| s.trim().is_empty();
        if blank(&self.title) || blank(&self.narrative) {
            return Err(anyhow!("insight `{key}` has an empty title or narrative"));
        }
        if self.strengths.is_empty() || self.strengths.iter().any(blank) {
            return Err(anyhow!("insight `{key}` has empty strengths"));
        }
        if self.challenges.is_empty() || self.challenges.iter().any(blank) {
            return Err(anyhow!("insight `{key}` has empty challenges"));
        }
        Ok(())
    }
}

/// Read-only key -> insight store.
pub trait InsightLookup {
    fn resolve(&self, key: &TrioKey) -> Option<&InsightRecord>;
}

impl InsightLookup for HashMap<TrioKey, InsightRecord> {
    fn resolve(&self, key: &TrioKey) -> Option<&InsightRecord> {
        self.get(key)
    }
}

impl<T: InsightLookup + ?Sized> InsightLookup for Arc<T> {
    fn resolve(&self, key: &TrioKey) -> Option<&InsightRecord> {
        (**self).resolve(key)
    }
}

/// Immutable insight table. Built once, never mutated.
#[derive(Debug, Clone, Default)]
pub struct InsightTable {
    records: HashMap<TrioKey, InsightRecord>,
}

#[derive(Deserialize)]
struct InsightFile {
    insights: HashMap<String, InsightRecord>,
}

static EMBEDDED: Lazy<Arc<InsightTable>> = Lazy::new(|| {
    let raw = include_str!("../data/trio_insights.json");
    Arc::new(InsightTable::from_json_str(raw).expect("valid embedded trio insights"))
});

impl InsightTable {
    /// The table shipped with the crate (shared, loaded on first use).
    pub fn embedded() -> Arc<InsightTable> {
        EMBEDDED.clone()
    }

    /// Parse `{"insights": {"<key>": {title, narrative, strengths, challenges}}}`.
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let file: InsightFile = serde_json::from_str(s).context("parsing trio insights")?;
        let mut records = HashMap::with_capacity(file.insights.len());
        for (raw_key, record) in file.insights {
            let key = TrioKey::parse(&raw_key)
                .map_err(|e| anyhow!("insight key `{raw_key}`: {e}"))?;
            record.validate(&key)?;
            records.insert(key, record);
        }
        Ok(Self { records })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading trio insights from {}", path.display()))?;
        Self::from_json_str(&data)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys with no authored content, in lexicographic order.
    pub fn missing_keys(&self) -> Vec<TrioKey> {
        TrioKey::all()
            .into_iter()
            .filter(|k| !self.records.contains_key(k))
            .collect()
    }
}

impl FromIterator<(TrioKey, InsightRecord)> for InsightTable {
    fn from_iter<I: IntoIterator<Item = (TrioKey, InsightRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl InsightLookup for InsightTable {
    fn resolve(&self, key: &TrioKey) -> Option<&InsightRecord> {
        self.records.get(key)
    }
}

/// The insight attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrioInfo {
    pub key: TrioKey,
    pub title: String,
    pub narrative: String,
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
    /// True when no authored record existed and the fallback was used.
    #[serde(default)]
    pub fallback: bool,
}

/// Look up `key`, substituting the fallback record when it is absent.
pub fn lookup_insight(key: TrioKey, lookup: &(impl InsightLookup + ?Sized)) -> TrioInfo {
    match lookup.resolve(&key) {
        Some(rec) => TrioInfo {
            key,
            title: rec.title.clone(),
            narrative: rec.narrative.clone(),
            strengths: rec.strengths.clone(),
            challenges: rec.challenges.clone(),
            fallback: false,
        },
        None => {
            warn!(target: "insights", key = %key, "no insight for trio, using fallback");
            counter!("realm_insight_fallback_total").increment(1);
            let rec = InsightRecord::fallback();
            TrioInfo {
                key,
                title: rec.title,
                narrative: rec.narrative,
                strengths: rec.strengths,
                challenges: rec.challenges,
                fallback: true,
            }
        }
    }
}

/// A ranked realm with its reported (normalized) score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub realm: Realm,
    pub score: u32,
}

/// Output of trio resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrio {
    pub primary: Placement,
    pub secondary: Placement,
    pub tertiary: Placement,
    pub trio: TrioInfo,
}

/// Rank by raw score, report normalized scores, and attach the trio insight.
pub fn resolve_trio(
    raw: &RealmScores,
    normalized: &RealmScores,
    lookup: &(impl InsightLookup + ?Sized),
) -> ResolvedTrio {
    let ranked = rank(raw);
    let place = |realm: Realm| Placement {
        realm,
        score: normalized[realm],
    };
    let (p, s, t) = (ranked[0], ranked[1], ranked[2]);
    // ranking is a permutation of the registry, so the top three are distinct
    let key = TrioKey::from_distinct([p, s, t]);

    ResolvedTrio {
        primary: place(p),
        secondary: place(s),
        tertiary: place(t),
        trio: lookup_insight(key, lookup),
    }
}
