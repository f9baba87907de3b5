//! Priority adjustment pipeline (§4.7) — quantum-bubble-warning penalty,
//! regime-aware tag boosts, and market-regime detection.

use crate::data::Category;

/// Detected market regime, tallied from security tags across the universe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Regime {
    /// `regime-bull-growth` majority.
    Bull,
    /// `regime-bear-safe` majority.
    Bear,
    /// `regime-sideways-value` majority.
    Sideways,
    /// More than 10 securities tagged `regime-volatile`.
    Volatile,
    /// No clear majority among bull/bear/sideways tallies (including ties).
    Neutral,
}

/// Tallies regime tags across every security's tag list and classifies the
/// market regime.
///
/// Volatile takes precedence whenever more than 10 securities carry
/// `regime-volatile`; otherwise the strict majority among the remaining
/// three tags wins, with ties resolving to [`Regime::Neutral`].
pub fn detect_regime<'a>(all_tags: impl Iterator<Item = &'a [String]>) -> Regime {
    let mut bull = 0u32;
    let mut bear = 0u32;
    let mut sideways = 0u32;
    let mut volatile = 0u32;

    for tags in all_tags {
        for tag in tags {
            match tag.as_str() {
                "regime-bull-growth" => bull += 1,
                "regime-bear-safe" => bear += 1,
                "regime-sideways-value" => sideways += 1,
                "regime-volatile" => volatile += 1,
                _ => {}
            }
        }
    }

    if volatile > 10 {
        return Regime::Volatile;
    }

    let max = bull.max(bear).max(sideways);
    if max == 0 {
        return Regime::Neutral;
    }
    let winners = [bull == max, bear == max, sideways == max]
        .iter()
        .filter(|&&w| w)
        .count();
    if winners > 1 {
        return Regime::Neutral;
    }
    if bull == max {
        Regime::Bull
    } else if bear == max {
        Regime::Bear
    } else {
        Regime::Sideways
    }
}

/// All sixteen tag-based multipliers of the §4.7 boost table, as a typed
/// struct rather than free-floating constants — per the config note in §6.1,
/// a temperament-adjusted override replaces the whole table at once.
///
/// `Default` reproduces the table's literal values.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CalculatorBoosts {
    /// `low-risk` tag, buy calculators.
    pub low_risk: f64,
    /// `medium-risk` tag, buy calculators.
    pub medium_risk: f64,
    /// `high-risk` tag, buy calculators.
    pub high_risk: f64,
    /// `growth` tag when the detected regime matches (bull).
    pub growth_matching_regime: f64,
    /// `growth` tag otherwise (neutral/non-matching fallback).
    pub growth_neutral: f64,
    /// `value` tag when the detected regime matches (bear).
    pub value_matching_regime: f64,
    /// `value` tag otherwise.
    pub value_neutral: f64,
    /// `dividend-focused` tag when the detected regime matches (sideways).
    pub dividend_focused_matching_regime: f64,
    /// `dividend-focused` tag otherwise.
    pub dividend_focused_neutral: f64,
    /// `strong-fundamentals` tag, any calculator.
    pub strong_fundamentals: f64,
    /// `consistent-grower` tag, any calculator.
    pub consistent_grower: f64,
    /// `stable` tag, any calculator.
    pub stable: f64,
    /// `dividend-total-return` tag, any calculator.
    pub dividend_total_return: f64,
    /// `unsustainable-gains` tag, sell calculators.
    pub unsustainable_gains: f64,
    /// `stagnant` tag, sell calculators.
    pub stagnant: f64,
    /// `underperforming` tag, sell calculators.
    pub underperforming: f64,
    /// `meets-target-return` tag, buy calculators.
    pub meets_target_return: f64,
}

impl Default for CalculatorBoosts {
    fn default() -> Self {
        Self {
            low_risk: 1.15,
            medium_risk: 1.05,
            high_risk: 0.90,
            growth_matching_regime: 1.15,
            growth_neutral: 1.08,
            value_matching_regime: 1.15,
            value_neutral: 1.08,
            dividend_focused_matching_regime: 1.12,
            dividend_focused_neutral: 1.10,
            strong_fundamentals: 1.12,
            consistent_grower: 1.10,
            stable: 1.08,
            dividend_total_return: 1.12,
            unsustainable_gains: 1.25,
            stagnant: 1.15,
            underperforming: 1.20,
            meets_target_return: 1.10,
        }
    }
}

fn is_buy_scope(category: Category) -> bool {
    matches!(
        category,
        Category::AveragingDown
            | Category::OpportunityBuys
            | Category::RebalanceBuys
            | Category::WeightBased
    )
}

fn is_sell_scope(category: Category) -> bool {
    matches!(category, Category::ProfitTaking | Category::RebalanceSells)
}

/// Applies the quantum-bubble-warning penalty (step 1 of §4.7).
fn quantum_penalty(category: Category, has_quantum_warning: bool) -> f64 {
    if !has_quantum_warning {
        return 1.0;
    }
    match category {
        Category::AveragingDown => 0.90,
        Category::OpportunityBuys | Category::RebalanceBuys | Category::WeightBased => 0.70,
        Category::ProfitTaking | Category::RebalanceSells => 1.00,
    }
}

/// Applies the full tag-based boost table (step 2 of §4.7).
fn tag_boosts(category: Category, tags: &[String], regime: Regime, boosts: &CalculatorBoosts) -> f64 {
    let has = |t: &str| tags.iter().any(|x| x == t);
    let mut multiplier = 1.0_f64;

    if is_buy_scope(category) {
        if has("low-risk") {
            multiplier *= boosts.low_risk;
        } else if has("medium-risk") {
            multiplier *= boosts.medium_risk;
        } else if has("high-risk") {
            multiplier *= boosts.high_risk;
        }

        if has("growth") {
            multiplier *= if regime == Regime::Bull {
                boosts.growth_matching_regime
            } else {
                boosts.growth_neutral
            };
        }
        if has("value") {
            multiplier *= if regime == Regime::Bear {
                boosts.value_matching_regime
            } else {
                boosts.value_neutral
            };
        }
        if has("dividend-focused") {
            multiplier *= if regime == Regime::Sideways {
                boosts.dividend_focused_matching_regime
            } else {
                boosts.dividend_focused_neutral
            };
        }

        if has("meets-target-return") {
            multiplier *= boosts.meets_target_return;
        }
    }

    if has("strong-fundamentals") {
        multiplier *= boosts.strong_fundamentals;
    }
    if has("consistent-grower") {
        multiplier *= boosts.consistent_grower;
    }
    if has("stable") {
        multiplier *= boosts.stable;
    }
    if has("dividend-total-return") {
        multiplier *= boosts.dividend_total_return;
    }

    if is_sell_scope(category) {
        if has("unsustainable-gains") {
            multiplier *= boosts.unsustainable_gains;
        }
        if has("stagnant") {
            multiplier *= boosts.stagnant;
        }
        if has("underperforming") {
            multiplier *= boosts.underperforming;
        }
    }

    multiplier
}

/// Applies the full §4.7 pipeline to a base priority value.
///
/// # Examples
///
/// ```
/// use portfolio_engine::data::Category;
/// use portfolio_engine::gates::priority::{adjust, CalculatorBoosts, Regime};
///
/// let boosts = CalculatorBoosts::default();
/// let adjusted = adjust(0.5, Category::OpportunityBuys, &["low-risk".to_string()], Regime::Neutral, false, &boosts);
/// assert!(adjusted > 0.5);
/// ```
pub fn adjust(
    base_priority: f64,
    category: Category,
    tags: &[String],
    regime: Regime,
    has_quantum_warning: bool,
    boosts: &CalculatorBoosts,
) -> f64 {
    let mut priority = base_priority;
    priority *= quantum_penalty(category, has_quantum_warning);
    priority *= tag_boosts(category, tags, regime, boosts);
    priority
}
