//! Minimum trade amount and sell-cap helpers shared across calculators.

/// Computes the minimum notional a trade must clear so that fixed
/// transaction costs stay below `max_cost_ratio` of the trade value.
///
/// `min_notional = transaction_cost_fixed / max_cost_ratio`.
///
/// # Examples
///
/// ```
/// use portfolio_core::min_trade_amount;
///
/// let min_notional = min_trade_amount(1.0, 0.01);
/// assert_eq!(min_notional, 100.0);
/// ```
pub fn min_trade_amount(transaction_cost_fixed: f64, max_cost_ratio: f64) -> f64 {
    transaction_cost_fixed / max_cost_ratio
}

/// Returns the absolute sell-percentage ceiling: the smaller of a
/// calculator-supplied `max_sell_percentage` and the hard 80% backstop no
/// sell plan may exceed regardless of configuration.
///
/// # Examples
///
/// ```
/// use portfolio_core::absolute_sell_ceiling;
///
/// assert_eq!(absolute_sell_ceiling(0.20), 0.20);
/// assert_eq!(absolute_sell_ceiling(0.95), 0.80);
/// ```
pub fn absolute_sell_ceiling(max_sell_percentage: f64) -> f64 {
    max_sell_percentage.min(0.80)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn computes_min_notional() {
        assert_relative_eq!(min_trade_amount(1.0, 0.01), 100.0);
    }

    #[test]
    fn ceiling_binds_at_eighty_percent() {
        assert_relative_eq!(absolute_sell_ceiling(0.95), 0.80);
        assert_relative_eq!(absolute_sell_ceiling(0.20), 0.20);
    }
}
