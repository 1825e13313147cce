// Vigil Engine — Trust Scoring & Tier Classification
//
// Pure functions. Trust depends on record age at query time, so it is
// recomputed per retrieval and never cached on the record:
//
//   trust = 0.5·outcome + 0.3·decay + 0.2·source credibility
//
// Decay is linear to the tier half-life with a hard floor — a strategic
// record takes 30 days to reach the floor a tactical record hits in two.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::atoms::constants::{
    DECAY_FLOOR, HALF_LIFE_STRATEGIC_HOURS, HALF_LIFE_TACTICAL_HOURS, OUTCOME_FAILURE_SCORE,
    OUTCOME_NEUTRAL_SCORE, OUTCOME_SUCCESS_SCORE, SOURCE_AUTHORITATIVE_CREDIBILITY,
    SOURCE_DEFAULT_CREDIBILITY, STRATEGIC_CONFIDENCE_MIN, STRATEGIC_MARKERS,
    TRUST_DECAY_WEIGHT, TRUST_OUTCOME_WEIGHT, TRUST_SOURCE_WEIGHT,
};
use crate::atoms::types::{MemoryRecord, Outcome, Tier};

/// Hours between a stored `%Y-%m-%d %H:%M:%S` timestamp and `now`. A
/// malformed timestamp reads as age zero — recency is assumed innocent
/// until shown otherwise.
fn age_hours(created_at: &str, now: DateTime<Utc>) -> f64 {
    match NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S") {
        Ok(ts) => (now - ts.and_utc()).num_seconds() as f64 / 3600.0,
        Err(_) => 0.0,
    }
}

fn half_life(tier: Tier) -> f64 {
    match tier {
        Tier::Strategic => HALF_LIFE_STRATEGIC_HOURS,
        Tier::Tactical => HALF_LIFE_TACTICAL_HOURS,
    }
}

/// Time-decay factor in [DECAY_FLOOR, 1.0].
pub fn decay(record: &MemoryRecord, now: DateTime<Utc>) -> f64 {
    let hours = age_hours(&record.created_at, now).max(0.0);
    (1.0 - hours / half_life(record.tier)).clamp(DECAY_FLOOR, 1.0)
}

fn outcome_score(outcome: Outcome) -> f64 {
    match outcome {
        Outcome::Success => OUTCOME_SUCCESS_SCORE,
        Outcome::Failure => OUTCOME_FAILURE_SCORE,
        Outcome::Neutral | Outcome::Unknown => OUTCOME_NEUTRAL_SCORE,
    }
}

fn source_credibility(record: &MemoryRecord) -> f64 {
    if record.source.is_authoritative() {
        SOURCE_AUTHORITATIVE_CREDIBILITY
    } else {
        SOURCE_DEFAULT_CREDIBILITY
    }
}

/// Composite trust in [0,1], rounded to two decimals.
pub fn trust(record: &MemoryRecord, now: DateTime<Utc>) -> f64 {
    let raw = TRUST_OUTCOME_WEIGHT * outcome_score(record.outcome)
        + TRUST_DECAY_WEIGHT * decay(record, now)
        + TRUST_SOURCE_WEIGHT * source_credibility(record);
    (raw * 100.0).round() / 100.0
}

/// Assign the retention tier, once, at record creation. Strategic when the
/// confidence is high or the content names a long-horizon concern; later
/// feedback never re-tiers a record.
pub fn classify_tier(content: &str, confidence: f64) -> Tier {
    if confidence >= STRATEGIC_CONFIDENCE_MIN {
        return Tier::Strategic;
    }
    let lower = content.to_lowercase();
    if STRATEGIC_MARKERS.iter().any(|marker| lower.contains(marker)) {
        Tier::Strategic
    } else {
        Tier::Tactical
    }
}
