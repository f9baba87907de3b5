//! Sell-quality scorer (§4.6) — combines stability and long-term quality
//! into a composite score, then a priority boost driven by the security's
//! tags.

const NEGATIVE_TAGS: [&str; 6] = [
    "stagnant",
    "underperforming",
    "value-trap",
    "ensemble-value-trap",
    "below-minimum-return",
    "unsustainable-gains",
];

const PROTECTED_TAGS: [&str; 6] = [
    "high-quality",
    "quality-high-cagr",
    "high-stability",
    "consistent-grower",
    "meets-target-return",
    "dividend-grower",
];

/// Output of the sell-quality scorer.
#[derive(Clone, Debug, PartialEq)]
pub struct SellQuality {
    /// Composite quality: `stability * 0.6 + long_term * 0.4`.
    pub quality_score: f64,
    /// Multiplier applied to a SELL candidate's priority.
    pub sell_priority_boost: f64,
    /// Whether any negative tag was present.
    pub has_negative_tags: bool,
    /// Whether the composite quality, or a protected tag, marks this as
    /// high quality.
    pub is_high_quality: bool,
}

/// Scores a position for sell prioritization.
///
/// # Examples
///
/// ```
/// use portfolio_engine::gates::sell_quality::score;
///
/// let result = score(0.8, 0.8, &["high-quality".to_string()]);
/// assert!(result.is_high_quality);
/// assert!(result.sell_priority_boost < 1.0);
/// ```
pub fn score(stability: f64, long_term: f64, tags: &[String]) -> SellQuality {
    let quality_score = stability * 0.6 + long_term * 0.4;
    let mut boost = 1.0_f64;
    let mut has_negative_tags = false;
    let mut is_high_quality = false;

    for tag in tags {
        if NEGATIVE_TAGS.contains(&tag.as_str()) {
            boost *= 1.25;
            has_negative_tags = true;
        }
        if PROTECTED_TAGS.contains(&tag.as_str()) {
            boost *= 0.75;
            is_high_quality = true;
        }
    }

    if quality_score < 0.5 {
        boost *= 1.0 + (0.5 - quality_score).min(0.5);
    }
    if quality_score > 0.7 {
        boost *= 1.0 - (quality_score - 0.7) * 0.5;
        is_high_quality = true;
    }

    SellQuality {
        quality_score,
        sell_priority_boost: boost,
        has_negative_tags,
        is_high_quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn composite_quality_is_weighted_average() {
        let result = score(1.0, 0.0, &[]);
        assert_relative_eq!(result.quality_score, 0.6);
    }

    #[test]
    fn negative_tags_increase_boost() {
        let result = score(0.8, 0.8, &["stagnant".to_string()]);
        assert!(result.has_negative_tags);
        assert!(result.sell_priority_boost > 1.0);
    }

    #[test]
    fn protected_tags_decrease_boost_and_mark_high_quality() {
        let result = score(0.8, 0.8, &["high-quality".to_string()]);
        assert!(!result.has_negative_tags);
        assert!(result.is_high_quality);
        assert!(result.sell_priority_boost < 1.0);
    }

    #[test]
    fn low_quality_below_half_gets_extra_boost() {
        let result = score(0.2, 0.2, &[]);
        assert!(result.quality_score < 0.5);
        assert!(result.sell_priority_boost > 1.0);
    }

    #[test]
    fn high_quality_above_seventy_gets_protection_and_is_high_quality() {
        let result = score(0.9, 0.9, &[]);
        assert!(result.quality_score > 0.7);
        assert!(result.is_high_quality);
        assert!(result.sell_priority_boost < 1.0);
    }
}
