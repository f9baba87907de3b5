//! Concentration guardrail (§4.5) — per-position and per-geography caps.

/// Result of a concentration check: whether the trade passes, and if not,
/// why.
#[derive(Clone, Debug, PartialEq)]
pub struct GuardrailResult {
    /// Whether the trade may proceed.
    pub passes: bool,
    /// Populated when `passes` is `false`.
    pub reason: Option<String>,
}

impl GuardrailResult {
    fn pass() -> Self {
        Self {
            passes: true,
            reason: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            passes: false,
            reason: Some(reason.into()),
        }
    }
}

/// Checks whether adding `value_eur` to a position (already holding
/// `current_position_value`) would breach `position_cap` as a fraction of
/// `total_portfolio_value_eur`.
pub fn check_position_cap(
    current_position_value: f64,
    value_eur: f64,
    total_portfolio_value_eur: f64,
    position_cap: f64,
) -> GuardrailResult {
    if total_portfolio_value_eur <= 0.0 {
        return GuardrailResult::fail("portfolio has no value to compute concentration against");
    }
    let projected = (current_position_value + value_eur) / total_portfolio_value_eur;
    if projected > position_cap {
        return GuardrailResult::fail(format!(
            "position concentration {:.1}% would exceed the {:.1}% cap",
            projected * 100.0,
            position_cap * 100.0
        ));
    }
    GuardrailResult::pass()
}

/// Checks every CSV-separated geography tag against `geo_cap`, using
/// `current_geo_value` to look up each region's existing allocation.
pub fn check_geography_cap(
    geographies: &[&str],
    current_geo_value: impl Fn(&str) -> f64,
    value_eur: f64,
    total_portfolio_value_eur: f64,
    geo_cap: f64,
) -> GuardrailResult {
    if total_portfolio_value_eur <= 0.0 {
        return GuardrailResult::fail("portfolio has no value to compute concentration against");
    }
    for geography in geographies {
        let projected = (current_geo_value(geography) + value_eur) / total_portfolio_value_eur;
        if projected > geo_cap {
            return GuardrailResult::fail(format!(
                "{} geography concentration {:.1}% would exceed the {:.1}% cap",
                geography,
                projected * 100.0,
                geo_cap * 100.0
            ));
        }
    }
    GuardrailResult::pass()
}

/// Runs both the position and geography caps; typical calculator entry
/// point.
pub fn check(
    current_position_value: f64,
    geographies: &[&str],
    current_geo_value: impl Fn(&str) -> f64,
    value_eur: f64,
    total_portfolio_value_eur: f64,
    position_cap: f64,
    geo_cap: f64,
) -> GuardrailResult {
    let position_check = check_position_cap(
        current_position_value,
        value_eur,
        total_portfolio_value_eur,
        position_cap,
    );
    if !position_check.passes {
        return position_check;
    }
    check_geography_cap(
        geographies,
        current_geo_value,
        value_eur,
        total_portfolio_value_eur,
        geo_cap,
    )
}
