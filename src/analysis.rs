//! Question-bank balance analysis.
//!
//! Checks that every realm gets a fair chance to win: the maximum points a
//! realm can collect across the bank, how many questions let it score a
//! "primary" (>= 3) or "secondary" (== 2) weight, and whether every trio is
//! plausibly reachable.

use serde::Serialize;

use crate::questions::QuestionBank;
use crate::realm::{Realm, REALM_COUNT};
use crate::trio::{InsightTable, TrioKey};

const PRIMARY_WEIGHT: u32 = 3;
const SECONDARY_WEIGHT: u32 = 2;
/// Primary opportunities a realm needs before its trios count as reachable.
const MIN_PRIMARY_OPPORTUNITIES: usize = 3;
const UNDER_RATIO: f64 = 0.7;
const OVER_RATIO: f64 = 1.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealmBalance {
    pub realm: Realm,
    pub max_points: u32,
    pub primary_opportunities: usize,
    pub secondary_opportunities: usize,
    pub questions_covering: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    /// Sorted by `max_points` descending; ties keep registry order.
    pub realms: Vec<RealmBalance>,
    pub total_questions: usize,
    /// 0–100, 100 when every realm has the same maximum.
    pub balance_score: u32,
    pub warnings: Vec<String>,
    pub all_combinations_reachable: bool,
}

pub fn analyze_balance(bank: &QuestionBank) -> BalanceReport {
    let mut rows: Vec<RealmBalance> = Realm::ALL
        .iter()
        .map(|&realm| RealmBalance {
            realm,
            max_points: 0,
            primary_opportunities: 0,
            secondary_opportunities: 0,
            questions_covering: Vec::new(),
        })
        .collect();

    for q in bank.questions() {
        // best weight each realm can get from this question
        let mut best = [0u32; REALM_COUNT];
        for w in q.weight_maps() {
            for (realm, weight) in w.entries() {
                best[realm.index()] = best[realm.index()].max(weight);
            }
        }
        for (i, &max) in best.iter().enumerate() {
            if max == 0 {
                continue;
            }
            let row = &mut rows[i];
            row.max_points += max;
            row.questions_covering.push(q.id.clone());
            if max >= PRIMARY_WEIGHT {
                row.primary_opportunities += 1;
            } else if max >= SECONDARY_WEIGHT {
                row.secondary_opportunities += 1;
            }
        }
    }

    let mean = rows.iter().map(|r| f64::from(r.max_points)).sum::<f64>() / REALM_COUNT as f64;
    let max_dev = rows
        .iter()
        .map(|r| (f64::from(r.max_points) - mean).abs())
        .fold(0.0f64, f64::max);
    let balance_score = if mean > 0.0 {
        (100.0 - max_dev / mean * 100.0).round().max(0.0) as u32
    } else {
        0
    };

    let mut warnings = Vec::new();
    for r in &rows {
        if r.primary_opportunities < MIN_PRIMARY_OPPORTUNITIES {
            warnings.push(format!(
                "{} has only {} primary ({}-point) opportunities - needs at least {}",
                r.realm, r.primary_opportunities, PRIMARY_WEIGHT, MIN_PRIMARY_OPPORTUNITIES
            ));
        }
        if f64::from(r.max_points) < mean * UNDER_RATIO {
            warnings.push(format!(
                "{} is underrepresented with only {} max points (avg: {:.1})",
                r.realm, r.max_points, mean
            ));
        }
        if f64::from(r.max_points) > mean * OVER_RATIO {
            warnings.push(format!(
                "{} is overrepresented with {} max points (avg: {:.1})",
                r.realm, r.max_points, mean
            ));
        }
    }

    let short: Vec<&str> = rows
        .iter()
        .filter(|r| r.primary_opportunities < MIN_PRIMARY_OPPORTUNITIES)
        .map(|r| r.realm.as_str())
        .collect();
    let all_combinations_reachable = short.is_empty();
    if !all_combinations_reachable {
        warnings.push(format!(
            "Realms with insufficient primary opportunities: {}",
            short.join(", ")
        ));
    }

    rows.sort_by(|a, b| b.max_points.cmp(&a.max_points));

    BalanceReport {
        realms: rows,
        total_questions: bank.len(),
        balance_score,
        warnings,
        all_combinations_reachable,
    }
}

/// Insight coverage for content audits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub expected: usize,
    pub present: usize,
    pub missing: Vec<TrioKey>,
}

pub fn insight_coverage(table: &InsightTable) -> CoverageReport {
    let missing = table.missing_keys();
    let expected = TrioKey::all().len();
    CoverageReport {
        expected,
        present: expected - missing.len(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_bank_is_reachable() {
        let report = analyze_balance(&QuestionBank::embedded());
        assert_eq!(report.total_questions, 30);
        assert_eq!(report.realms.len(), 10);
        assert!(report.all_combinations_reachable, "{:?}", report.warnings);
        assert!(report.balance_score <= 100);
        for pair in report.realms.windows(2) {
            assert!(pair[0].max_points >= pair[1].max_points);
        }
    }

    #[test]
    fn lopsided_bank_warns() {
        let bank = QuestionBank::from_json_str(
            r#"{"questions": [
                {"id":"a","kind":"scenario","text":"?","options":[
                    {"id":"a1","text":"t","weights":{"ember":3}},
                    {"id":"a2","text":"t","weights":{"mist":2}}
                ]}
            ]}"#,
        )
        .unwrap();
        let report = analyze_balance(&bank);
        assert!(!report.all_combinations_reachable);
        assert_eq!(report.realms[0].realm, Realm::Ember);
        assert_eq!(report.realms[0].primary_opportunities, 1);
        assert_eq!(report.realms[1].realm, Realm::Mist);
        assert_eq!(report.realms[1].secondary_opportunities, 1);
        assert_eq!(report.balance_score, 0);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.starts_with("Realms with insufficient primary opportunities")));
    }

    #[test]
    fn coverage_of_partial_table() {
        let key = TrioKey::parse("abyss-cavern-dross").unwrap();
        let table: InsightTable = [(key, crate::trio::InsightRecord::fallback())]
            .into_iter()
            .collect();
        let c = insight_coverage(&table);
        assert_eq!(c.expected, 120);
        assert_eq!(c.present, 1);
        assert_eq!(c.missing.len(), 119);
        assert!(!c.missing.contains(&key));
    }
}
