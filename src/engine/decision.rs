// Vigil Engine — Decision Ranking ("conqueror score")
//
//           impact^1.5 · certainty · reversibility
//   score = ───────────────────────────────────────────────────
//           risk·(1 + 2·scars) · capital · time · hist. penalty
//
// Every recorded scar for an option's category doubles the effective risk
// weight: burn twice, fear thrice. A zero denominator yields 0 rather than
// an error. The score function never rounds — display formatting does.

use std::cmp::Ordering;

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{DecisionOption, RankedOption};
use crate::engine::store::MemoryStore;

/// Composite score for one option given its historical scar count.
pub fn conqueror_score(option: &DecisionOption, scar_count: i64) -> f64 {
    let adjusted_risk = option.risk * (1.0 + 2.0 * scar_count as f64);
    let denominator = adjusted_risk * option.capital * option.time_cost * option.penalty;
    if denominator == 0.0 {
        return 0.0;
    }
    let numerator = option.impact.powf(1.5) * option.certainty * option.reversibility;
    numerator / denominator
}

/// Score and rank a batch of options. The sort is stable, so equal scores
/// keep their input order; the top entry is flagged as the recommendation.
pub fn rank_options(
    store: &MemoryStore,
    options: &[DecisionOption],
) -> EngineResult<Vec<RankedOption>> {
    let mut ranked: Vec<RankedOption> = Vec::with_capacity(options.len());
    for option in options {
        let scar_count = store.scar_count_matching(&option.name)?;
        ranked.push(RankedOption {
            name: option.name.clone(),
            score: conqueror_score(option, scar_count),
            scar_count,
            recommended: false,
        });
    }
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    if let Some(top) = ranked.first_mut() {
        top.recommended = true;
    }
    Ok(ranked)
}

/// Extract the option list from a model reply. Replies are untrusted: prose
/// around the payload is tolerated (the slice between the first `[` and the
/// last `]` is parsed), but each object must carry exactly the expected
/// fields with numeric parameters, or the whole reply is rejected.
pub fn parse_options(reply: &str) -> EngineResult<Vec<DecisionOption>> {
    let start = reply
        .find('[')
        .ok_or_else(|| EngineError::validation("no JSON list in reply"))?;
    let end = reply
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| EngineError::validation("unterminated JSON list in reply"))?;

    let options: Vec<DecisionOption> = serde_json::from_str(&reply[start..=end])?;
    if options.is_empty() {
        return Err(EngineError::validation("reply contained no options"));
    }
    Ok(options)
}

/// Render a ranked batch for the operator.
pub fn format_ranking(ranked: &[RankedOption]) -> String {
    let mut out = String::from("STRATEGIC RANKING\n-----------------\n");
    for (i, option) in ranked.iter().enumerate() {
        let marker = if option.recommended {
            "WINNER".to_string()
        } else {
            format!("#{}", i + 1)
        };
        out.push_str(&format!(
            "{}: {} | score {:.2} (scars: {})\n",
            marker, option.name, option.score, option.scar_count
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str, risk: f64, capital: f64, time_cost: f64, penalty: f64) -> DecisionOption {
        DecisionOption {
            name: name.into(),
            impact: 4.0,
            certainty: 0.8,
            reversibility: 0.5,
            risk,
            capital,
            time_cost,
            penalty,
        }
    }

    #[test]
    fn zero_denominator_yields_zero() {
        for (risk, capital, time_cost, penalty) in [
            (0.0, 1.0, 1.0, 1.0),
            (1.0, 0.0, 1.0, 1.0),
            (1.0, 1.0, 0.0, 1.0),
            (1.0, 1.0, 1.0, 0.0),
        ] {
            let opt = option("x", risk, capital, time_cost, penalty);
            assert_eq!(conqueror_score(&opt, 0), 0.0);
        }
    }

    #[test]
    fn score_strictly_decreases_with_scars() {
        let opt = option("x", 2.0, 3.0, 1.0, 1.0);
        let mut previous = f64::INFINITY;
        for scars in 0..6 {
            let score = conqueror_score(&opt, scars);
            assert!(score < previous, "score must fall as scars accumulate");
            previous = score;
        }
    }

    #[test]
    fn each_scar_doubles_the_risk_weight() {
        let opt = option("x", 2.0, 1.0, 1.0, 1.0);
        let base = conqueror_score(&opt, 0);
        assert!((conqueror_score(&opt, 1) - base / 3.0).abs() < 1e-12);
        assert!((conqueror_score(&opt, 2) - base / 5.0).abs() < 1e-12);
    }

    #[test]
    fn ranking_flags_the_top_option_and_keeps_tie_order() {
        let store = MemoryStore::in_memory().unwrap();
        let options = vec![
            option("first", 2.0, 2.0, 1.0, 1.0),
            option("twin-a", 4.0, 1.0, 1.0, 1.0),
            option("twin-b", 1.0, 4.0, 1.0, 1.0),
        ];
        let ranked = rank_options(&store, &options).unwrap();

        // first: denominator 4; twins: denominator 4 as well — all tie, so
        // input order is preserved and the first entry is recommended.
        assert_eq!(ranked[0].name, "first");
        assert!(ranked[0].recommended);
        assert_eq!(ranked[1].name, "twin-a");
        assert_eq!(ranked[2].name, "twin-b");
        assert!(!ranked[1].recommended && !ranked[2].recommended);
    }

    #[test]
    fn scarred_option_loses_the_ranking() {
        let store = MemoryStore::in_memory().unwrap();
        store
            .register_scar("expand-overseas", 0.9, "expand-overseas burned capital")
            .unwrap();

        let options = vec![
            option("expand-overseas", 2.0, 1.0, 1.0, 1.0),
            option("consolidate", 2.0, 1.0, 1.0, 1.0),
        ];
        let ranked = rank_options(&store, &options).unwrap();
        assert_eq!(ranked[0].name, "consolidate");
        assert_eq!(ranked[1].scar_count, 1);
    }

    #[test]
    fn parse_tolerates_surrounding_prose() {
        let reply = r#"Here is my analysis:
        [{"name": "ship now", "impact": 6, "certainty": 0.7, "reversibility": 0.4,
          "risk": 3, "capital": 2, "time": 1, "penalty": 1.0}]
        Hope that helps!"#;
        let options = parse_options(reply).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].name, "ship now");
        assert_eq!(options[0].time_cost, 1.0);
    }

    #[test]
    fn parse_defaults_missing_penalty_to_one() {
        let reply = r#"[{"name": "a", "impact": 1, "certainty": 1, "reversibility": 1,
                         "risk": 1, "capital": 1, "time": 1}]"#;
        assert_eq!(parse_options(reply).unwrap()[0].penalty, 1.0);
    }

    #[test]
    fn parse_rejects_missing_fields() {
        let reply = r#"[{"name": "a", "impact": 1}]"#;
        assert!(parse_options(reply).is_err());
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let reply = r#"[{"name": "a", "impact": 1, "certainty": 1, "reversibility": 1,
                         "risk": 1, "capital": 1, "time": 1, "vibes": 11}]"#;
        assert!(parse_options(reply).is_err());
    }

    #[test]
    fn parse_rejects_non_numeric_parameters() {
        let reply = r#"[{"name": "a", "impact": "high", "certainty": 1, "reversibility": 1,
                         "risk": 1, "capital": 1, "time": 1}]"#;
        assert!(parse_options(reply).is_err());
    }

    #[test]
    fn parse_rejects_reply_without_list() {
        assert!(parse_options("I could not decide.").is_err());
        assert!(parse_options("]").is_err());
    }

    #[test]
    fn format_marks_the_winner() {
        let rendered = format_ranking(&[
            RankedOption {
                name: "a".into(),
                score: 1.234,
                scar_count: 0,
                recommended: true,
            },
            RankedOption {
                name: "b".into(),
                score: 0.5,
                scar_count: 2,
                recommended: false,
            },
        ]);
        assert!(rendered.contains("WINNER: a | score 1.23"));
        assert!(rendered.contains("#2: b | score 0.50 (scars: 2)"));
    }
}
