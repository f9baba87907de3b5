//! Quality-gate evaluator (§4.4) — tag-based and score-based dual-mode BUY
//! eligibility check.
//!
//! Per the sum-type rewrite noted in the design notes, the score-based mode
//! never throws: a security with no relevant signals at all conservatively
//! fails with [`FailReason::Unknown`] rather than being let through by
//! default.

use std::collections::HashMap;

use portfolio_core::Isin;

/// Why a security failed the quality gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailReason {
    /// Tagged as a value trap (or the ensemble equivalent).
    ValueTrap,
    /// Tagged bubble-risk without an offsetting quality-high-cagr tag.
    BubbleRisk,
    /// Tagged below-minimum-return.
    BelowMinimumReturn,
    /// Tagged quality-gate-fail directly.
    TaggedFail,
    /// None of the seven score-based paths succeeded, though at least one
    /// input score was available.
    AllPathsFailed,
    /// No input scores were available at all; conservative rejection.
    Unknown,
}

/// Quality-gate decision.
pub type GateResult = Result<(), FailReason>;

/// Per-security inputs the quality gate reasons over. Every field is
/// optional: absence means "no signal available" rather than zero.
#[derive(Clone, Debug, Default)]
pub struct QualityInputs {
    /// Tags attached to the security, when tag-based evaluation is enabled.
    pub tags: Option<Vec<String>>,
    pub fundamentals_score: Option<f64>,
    pub long_term_score: Option<f64>,
    pub opportunity_score: Option<f64>,
    pub momentum_score: Option<f64>,
    pub volatility: Option<f64>,
    pub cagr: Option<f64>,
    pub dividend_score: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
}

impl QualityInputs {
    fn has_any_input(&self) -> bool {
        self.fundamentals_score.is_some()
            || self.long_term_score.is_some()
            || self.opportunity_score.is_some()
            || self.momentum_score.is_some()
            || self.volatility.is_some()
            || self.cagr.is_some()
            || self.dividend_score.is_some()
            || self.dividend_yield.is_some()
            || self.sharpe.is_some()
            || self.sortino.is_some()
    }

    fn sharpe(&self) -> Option<f64> {
        self.sharpe.or_else(|| {
            let cagr = self.cagr?;
            let vol = self.volatility?;
            if vol <= 0.0 {
                return None;
            }
            Some((cagr - 0.04) / vol)
        })
    }

    fn sortino(&self) -> Option<f64> {
        self.sortino.or_else(|| {
            let sharpe = self.sharpe()?;
            if sharpe > 0.0 {
                Some(1.5 * sharpe)
            } else {
                None
            }
        })
    }
}

const VALUE_TRAP_TAGS: [&str; 2] = ["value-trap", "ensemble-value-trap"];
const BUBBLE_TAGS: [&str; 2] = ["bubble-risk", "ensemble-bubble-risk"];

/// Evaluates the quality gate for one security on a new BUY candidate.
///
/// `enable_tag_filtering` selects tag-based mode (when tags are present);
/// otherwise, or when tags are absent, score-based mode is used.
pub fn evaluate(inputs: &QualityInputs, enable_tag_filtering: bool, target_return: f64) -> GateResult {
    if enable_tag_filtering {
        if let Some(tags) = &inputs.tags {
            if !tags.is_empty() {
                return evaluate_tag_based(tags);
            }
        }
    }
    evaluate_score_based(inputs, target_return)
}

fn evaluate_tag_based(tags: &[String]) -> GateResult {
    let has = |candidates: &[&str]| candidates.iter().any(|c| tags.iter().any(|t| t == c));

    if has(&VALUE_TRAP_TAGS) {
        return Err(FailReason::ValueTrap);
    }
    if has(&BUBBLE_TAGS) && !tags.iter().any(|t| t == "quality-high-cagr") {
        return Err(FailReason::BubbleRisk);
    }
    if tags.iter().any(|t| t == "below-minimum-return") {
        return Err(FailReason::BelowMinimumReturn);
    }
    if tags.iter().any(|t| t == "quality-gate-fail") {
        return Err(FailReason::TaggedFail);
    }
    Ok(())
}

fn evaluate_score_based(inputs: &QualityInputs, target_return: f64) -> GateResult {
    if !inputs.has_any_input() {
        return Err(FailReason::Unknown);
    }

    let f = inputs.fundamentals_score;
    let lt = inputs.long_term_score;
    let opp = inputs.opportunity_score;
    let vol = inputs.volatility;
    let cagr = inputs.cagr;
    let div_score = inputs.dividend_score;
    let div_yield = inputs.dividend_yield;
    let sharpe = inputs.sharpe();
    let sortino = inputs.sortino();

    // Path 1: Balanced
    let path1 = matches!((f, lt), (Some(f), Some(lt)) if f >= 0.55 && lt >= 0.45);
    // Path 2: Exceptional
    let path2 = f.is_some_and(|f| f >= 0.75) || lt.is_some_and(|lt| lt >= 0.75);
    // Path 3: Quality value
    let path3 = matches!((f, opp, lt), (Some(f), Some(opp), Some(lt)) if f >= 0.60 && opp >= 0.65 && lt >= 0.30);
    // Path 4: Dividend income
    let path4 = matches!(
        (f, div_score, div_yield),
        (Some(f), Some(ds), Some(dy)) if f >= 0.55 && ds >= 0.65 && dy >= 0.035
    );
    // Path 5: Risk-adjusted
    let path5 = matches!((lt, vol), (Some(lt), Some(vol)) if lt >= 0.55 && vol <= 0.35)
        && (sharpe.is_some_and(|s| s >= 0.9) || sortino.is_some_and(|s| s >= 0.9));
    // Path 6: Composite
    let path6 = matches!(
        (f, lt),
        (Some(f), Some(lt)) if 0.6 * f + 0.4 * lt >= 0.52 && f >= 0.45
    );
    // Path 7: Growth
    let path7 = matches!(
        (cagr, f, vol),
        (Some(cagr), Some(f), Some(vol)) if cagr >= 0.13 && f >= 0.50 && vol <= 0.40
    );

    if path1 || path2 || path3 || path4 || path5 || path6 || path7 {
        return Ok(());
    }

    // Surfacing below-minimum-return and bubble-risk independent of path
    // failure keeps score-based mode's rejections as specific as tag-based
    // mode's, per §4.4.
    if let Some(cagr) = cagr {
        if cagr < (0.06_f64).max(target_return * 0.50) {
            return Err(FailReason::BelowMinimumReturn);
        }
    }
    if let (Some(cagr), Some(f)) = (cagr, f) {
        if cagr > 0.15 && f < 0.55 {
            return Err(FailReason::BubbleRisk);
        }
    }

    Err(FailReason::AllPathsFailed)
}

/// Detects whether a security is a value trap per §4.4: a high opportunity
/// score undermined by weak fundamentals, weak long-term quality, negative
/// momentum, or excess volatility.
pub fn is_value_trap(inputs: &QualityInputs) -> bool {
    let Some(opp) = inputs.opportunity_score else {
        return false;
    };
    if opp < 0.70 {
        return false;
    }
    inputs.fundamentals_score.is_some_and(|f| f < 0.55)
        || inputs.long_term_score.is_some_and(|lt| lt < 0.45)
        || inputs.momentum_score.is_some_and(|m| m < -0.05)
        || inputs.volatility.is_some_and(|v| v > 0.35)
}

/// Stock-level quality inputs keyed by ISIN, for batch evaluation against a
/// context's signal maps.
pub fn inputs_from_signal_maps(
    isin: &Isin,
    fundamentals_scores: &HashMap<Isin, f64>,
    long_term_scores: &HashMap<Isin, f64>,
    opportunity_scores: &HashMap<Isin, f64>,
    momentum_scores: &HashMap<Isin, f64>,
    volatility: &HashMap<Isin, f64>,
    cagrs: &HashMap<Isin, f64>,
) -> QualityInputs {
    QualityInputs {
        tags: None,
        fundamentals_score: fundamentals_scores.get(isin).copied(),
        long_term_score: long_term_scores.get(isin).copied(),
        opportunity_score: opportunity_scores.get(isin).copied(),
        momentum_score: momentum_scores.get(isin).copied(),
        volatility: volatility.get(isin).copied(),
        cagr: cagrs.get(isin).copied(),
        dividend_score: None,
        dividend_yield: None,
        sharpe: None,
        sortino: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_based_rejects_value_trap() {
        let inputs = QualityInputs {
            tags: Some(vec!["value-trap".to_string()]),
            ..Default::default()
        };
        assert_eq!(evaluate(&inputs, true, 0.11), Err(FailReason::ValueTrap));
    }

    #[test]
    fn tag_based_bubble_risk_rescued_by_high_cagr_tag() {
        let inputs = QualityInputs {
            tags: Some(vec![
                "bubble-risk".to_string(),
                "quality-high-cagr".to_string(),
            ]),
            ..Default::default()
        };
        assert_eq!(evaluate(&inputs, true, 0.11), Ok(()));
    }

    #[test]
    fn tag_based_bubble_risk_without_rescue_fails() {
        let inputs = QualityInputs {
            tags: Some(vec!["bubble-risk".to_string()]),
            ..Default::default()
        };
        assert_eq!(evaluate(&inputs, true, 0.11), Err(FailReason::BubbleRisk));
    }

    #[test]
    fn score_based_path1_balanced_passes() {
        let inputs = QualityInputs {
            fundamentals_score: Some(0.60),
            long_term_score: Some(0.50),
            ..Default::default()
        };
        assert_eq!(evaluate(&inputs, false, 0.11), Ok(()));
    }

    #[test]
    fn score_based_path2_exceptional_passes_on_fundamentals_alone() {
        let inputs = QualityInputs {
            fundamentals_score: Some(0.80),
            ..Default::default()
        };
        assert_eq!(evaluate(&inputs, false, 0.11), Ok(()));
    }

    #[test]
    fn score_based_no_inputs_is_unknown() {
        let inputs = QualityInputs::default();
        assert_eq!(evaluate(&inputs, false, 0.11), Err(FailReason::Unknown));
    }

    #[test]
    fn score_based_all_paths_fail_with_weak_scores() {
        let inputs = QualityInputs {
            fundamentals_score: Some(0.10),
            long_term_score: Some(0.10),
            ..Default::default()
        };
        assert_eq!(
            evaluate(&inputs, false, 0.11),
            Err(FailReason::AllPathsFailed)
        );
    }

    #[test]
    fn score_based_path5_risk_adjusted_via_derived_sharpe() {
        let inputs = QualityInputs {
            long_term_score: Some(0.60),
            volatility: Some(0.20),
            cagr: Some(0.30), // sharpe = (0.30 - 0.04)/0.20 = 1.3
            ..Default::default()
        };
        assert_eq!(evaluate(&inputs, false, 0.11), Ok(()));
    }

    #[test]
    fn value_trap_requires_high_opportunity_and_weak_signal() {
        let inputs = QualityInputs {
            opportunity_score: Some(0.75),
            fundamentals_score: Some(0.40),
            ..Default::default()
        };
        assert!(is_value_trap(&inputs));
    }

    #[test]
    fn value_trap_false_when_opportunity_below_threshold() {
        let inputs = QualityInputs {
            opportunity_score: Some(0.50),
            fundamentals_score: Some(0.10),
            ..Default::default()
        };
        assert!(!is_value_trap(&inputs));
    }
}
