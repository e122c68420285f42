//! # Realm Registry
//!
//! The fixed, ordered set of realms the classifier maps answers into.
//! `Realm::ALL` is the authoritative enumeration order; ranking ties are
//! broken by it, never by map iteration order.
//!
//! Display metadata (name, color, lore, ...) is loaded once from
//! `data/realms.json` and exposed read-only through `Realm::profile()`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::ScoringError;

/// Number of realms in the registry.
pub const REALM_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    Abyss,
    Cavern,
    Dross,
    Ember,
    Glare,
    Languish,
    Mist,
    Oasis,
    Trace,
    Zenith,
}

impl Realm {
    /// Registry order. Also the tie-break order for equal scores.
    pub const ALL: [Realm; REALM_COUNT] = [
        Realm::Abyss,
        Realm::Cavern,
        Realm::Dross,
        Realm::Ember,
        Realm::Glare,
        Realm::Languish,
        Realm::Mist,
        Realm::Oasis,
        Realm::Trace,
        Realm::Zenith,
    ];

    /// Position in `Realm::ALL`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Realm::Abyss => "abyss",
            Realm::Cavern => "cavern",
            Realm::Dross => "dross",
            Realm::Ember => "ember",
            Realm::Glare => "glare",
            Realm::Languish => "languish",
            Realm::Mist => "mist",
            Realm::Oasis => "oasis",
            Realm::Trace => "trace",
            Realm::Zenith => "zenith",
        }
    }

    /// Display metadata for this realm.
    pub fn profile(self) -> &'static RealmProfile {
        &PROFILES[self.index()]
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Realm {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Realm::ALL
            .into_iter()
            .find(|r| r.as_str() == needle)
            .ok_or_else(|| ScoringError::UnknownRealm(s.to_string()))
    }
}

/// Read-only presentation data for a realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmProfile {
    pub id: Realm,
    pub name: String,
    /// Hex color, e.g. "#bf9dff".
    pub color: String,
    pub quote: String,
    pub core_emotions: Vec<String>,
    pub tone: String,
    pub lore: String,
}

#[derive(Deserialize)]
struct ProfileFile {
    realms: Vec<RealmProfile>,
}

/// Profiles in registry order (index == `Realm::index()`).
static PROFILES: Lazy<Vec<RealmProfile>> = Lazy::new(|| {
    let raw = include_str!("../data/realms.json");
    let file: ProfileFile = serde_json::from_str(raw).expect("valid realm profiles");
    let mut by_id: HashMap<Realm, RealmProfile> =
        file.realms.into_iter().map(|p| (p.id, p)).collect();
    Realm::ALL
        .iter()
        .map(|r| by_id.remove(r).expect("profile for every realm"))
        .collect()
});

/// All profiles in registry order.
pub fn profiles() -> &'static [RealmProfile] {
    &PROFILES
}

/// A total mapping from every realm to a non-negative integer.
///
/// Used both for raw accumulator totals and for normalized percentages.
/// Serializes as a JSON object in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RealmScores([u32; REALM_COUNT]);

impl RealmScores {
    /// All realms at zero.
    pub fn zeroed() -> Self {
        Self([0; REALM_COUNT])
    }

    pub fn from_array(values: [u32; REALM_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, realm: Realm) -> u32 {
        self.0[realm.index()]
    }

    /// Sum over all realms (widened so it never overflows).
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&v| u64::from(v)).sum()
    }

    /// `(realm, value)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (Realm, u32)> + '_ {
        Realm::ALL.iter().map(move |&r| (r, self.0[r.index()]))
    }

    pub fn as_array(&self) -> &[u32; REALM_COUNT] {
        &self.0
    }
}

impl Index<Realm> for RealmScores {
    type Output = u32;

    fn index(&self, realm: Realm) -> &u32 {
        &self.0[realm.index()]
    }
}

impl IndexMut<Realm> for RealmScores {
    fn index_mut(&mut self, realm: Realm) -> &mut u32 {
        &mut self.0[realm.index()]
    }
}

impl Serialize for RealmScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(REALM_COUNT))?;
        for (realm, value) in self.iter() {
            map.serialize_entry(realm.as_str(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RealmScores {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<Realm, u32>::deserialize(deserializer)?;
        let mut out = RealmScores::zeroed();
        for (realm, value) in raw {
            out[realm] = value;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_ten_realms_in_order() {
        assert_eq!(Realm::ALL.len(), 10);
        for (i, r) in Realm::ALL.iter().enumerate() {
            assert_eq!(r.index(), i);
        }
        assert_eq!(Realm::ALL[0], Realm::Abyss);
        assert_eq!(Realm::ALL[9], Realm::Zenith);
    }

    #[test]
    fn parse_is_case_insensitive_and_trimmed() {
        assert_eq!(" Trace ".parse::<Realm>().unwrap(), Realm::Trace);
        assert_eq!("OASIS".parse::<Realm>().unwrap(), Realm::Oasis);
        assert_eq!(
            "nowhere".parse::<Realm>(),
            Err(ScoringError::UnknownRealm("nowhere".into()))
        );
    }

    #[test]
    fn every_realm_has_a_profile() {
        for r in Realm::ALL {
            let p = r.profile();
            assert_eq!(p.id, r);
            assert!(!p.name.is_empty());
            assert!(p.color.starts_with('#'));
            assert!(!p.core_emotions.is_empty());
        }
        assert_eq!(profiles().len(), REALM_COUNT);
    }

    #[test]
    fn scores_serialize_in_registry_order() {
        let mut s = RealmScores::zeroed();
        s[Realm::Trace] = 18;
        let v = serde_json::to_string(&s).unwrap();
        assert!(v.starts_with(r#"{"abyss":0,"cavern":0"#), "got {v}");
        assert!(v.contains(r#""trace":18"#));

        let back: RealmScores = serde_json::from_str(&v).unwrap();
        assert_eq!(back, s);
    }
}
