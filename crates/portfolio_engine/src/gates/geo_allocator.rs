//! Geographic sell-plan allocator (§4.8) — proportionally distributes a
//! target sell value across an overweight region's positions, sorted
//! weakest-quality-first, under a hard absolute ceiling.

use portfolio_core::{absolute_sell_ceiling, floor_to_lot, Isin};

use crate::data::EnrichedPosition;
use crate::gates::sell_quality::SellQuality;

/// One position's slice of a geographic sell plan.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionSellPlan {
    /// ISIN of the position to sell.
    pub isin: Isin,
    /// Quantity to sell, a multiple of the position's `min_lot`.
    pub quantity: i64,
    /// `sell_priority_boost` this position was sorted and scaled by.
    pub sell_priority_boost: f64,
}

/// Allocates a geography-level sell target across the positions held in
/// that region.
///
/// `positions_with_quality` pairs each candidate position with its
/// pre-computed [`SellQuality`] (the caller runs the sell-quality scorer
/// once per position before calling this).
///
/// # Examples
///
/// ```
/// use portfolio_core::{Currency, Isin, Symbol};
/// use portfolio_engine::data::EnrichedPosition;
/// use portfolio_engine::gates::geo_allocator::allocate;
/// use portfolio_engine::gates::sell_quality::score;
///
/// let position = EnrichedPosition {
///     isin: Isin::new("US1234567890"),
///     symbol: Symbol::new("TEST.US"),
///     name: "Test Corp".into(),
///     quantity: 200.0,
///     average_cost: 50.0,
///     current_price: 100.0,
///     market_value_eur: 20_000.0,
///     weight_in_portfolio: 0.20,
///     currency: Currency::USD,
///     geography: "US".into(),
///     industry: "Technology".into(),
///     min_lot: 1,
///     allow_buy: true,
///     allow_sell: true,
/// };
/// let quality = score(0.5, 0.5, &[]);
///
/// let plans = allocate(0.50, 100_000.0, &[(&position, quality)], 0.20);
/// assert!(plans[0].quantity <= 40);
/// ```
pub fn allocate(
    overweight_percent: f64,
    total_portfolio_value_eur: f64,
    positions_with_quality: &[(&EnrichedPosition, SellQuality)],
    max_sell_percentage: f64,
) -> Vec<PositionSellPlan> {
    let absolute_ceiling = absolute_sell_ceiling(max_sell_percentage);
    let total_value_to_reduce = overweight_percent * total_portfolio_value_eur;

    let mut candidates: Vec<&(&EnrichedPosition, SellQuality)> =
        positions_with_quality.iter().collect();
    candidates.sort_by(|a, b| {
        b.1.sell_priority_boost
            .partial_cmp(&a.1.sell_priority_boost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_region_value: f64 = candidates
        .iter()
        .map(|(p, _)| market_value(p))
        .sum();

    if total_region_value <= 0.0 {
        return Vec::new();
    }

    let mut remaining = total_value_to_reduce;
    let mut plans = Vec::new();

    for (position, quality) in candidates {
        if remaining <= 0.0 {
            break;
        }
        if !position.allow_sell || position.quantity <= 0.0 || position.current_price <= 0.0 {
            continue;
        }

        let value = market_value(position);
        let max_sell_value = value * absolute_ceiling;
        let proportional = total_value_to_reduce * (value / total_region_value);
        let adjusted = proportional * quality.sell_priority_boost;
        let actual = adjusted.min(max_sell_value).min(remaining);

        let mut quantity = floor_to_lot(actual / position.current_price, position.min_lot);

        // Re-clamp: the proportional share may still sit above a binding cap
        // (the ceiling or the position's own holdings) even after flooring.
        let max_quantity_for_ceiling =
            (max_sell_value / position.current_price).floor() as i64;
        let max_quantity_held = position.quantity.floor() as i64;
        let hard_cap = max_quantity_for_ceiling.min(max_quantity_held);
        if quantity > hard_cap {
            quantity = floor_to_lot(hard_cap as f64, position.min_lot);
        }

        if quantity <= 0 {
            continue;
        }

        remaining -= quantity as f64 * position.current_price;
        plans.push(PositionSellPlan {
            isin: position.isin.clone(),
            quantity,
            sell_priority_boost: quality.sell_priority_boost,
        });
    }

    plans
}

fn market_value(position: &EnrichedPosition) -> f64 {
    if position.market_value_eur > 0.0 {
        position.market_value_eur
    } else {
        position.quantity_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio_core::{Currency, Symbol};
    use crate::gates::sell_quality::score;

    fn position(quantity: f64, price: f64, value: f64) -> EnrichedPosition {
        EnrichedPosition {
            isin: Isin::new("US1234567890"),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            quantity,
            average_cost: price * 0.8,
            current_price: price,
            market_value_eur: value,
            weight_in_portfolio: value / 100_000.0,
            currency: Currency::USD,
            geography: "US".into(),
            industry: "Technology".into(),
            min_lot: 1,
            allow_buy: true,
            allow_sell: true,
        }
    }

    #[test]
    fn scenario_s5_absolute_ceiling_binds() {
        let p = position(200.0, 100.0, 20_000.0);
        let quality = score(0.5, 0.5, &[]);
        let plans = allocate(0.50, 100_000.0, &[(&p, quality)], 0.20);
        assert_eq!(plans.len(), 1);
        assert!(plans[0].quantity <= 40);
        let sell_fraction = (plans[0].quantity as f64 * 100.0) / 20_000.0;
        assert!(sell_fraction <= 0.20 + 1e-9);
    }

    #[test]
    fn scenario_s6_old_formula_not_used() {
        // overweight=0.30, min_overweight_threshold=0.05 in the legacy
        // formula overweight/(overweight+threshold) = 0.857, which this
        // allocator must not reproduce.
        let p = position(1_000.0, 50.0, 50_000.0);
        let quality = score(0.5, 0.5, &[]);
        let plans = allocate(0.30, 100_000.0, &[(&p, quality)], 0.20);
        assert_eq!(plans.len(), 1);
        let sell_fraction = (plans[0].quantity as f64) / 1_000.0;
        assert!(sell_fraction <= 0.20 + 1e-9);
    }

    #[test]
    fn skips_positions_that_disallow_sell() {
        let mut p = position(200.0, 100.0, 20_000.0);
        p.allow_sell = false;
        let quality = score(0.5, 0.5, &[]);
        let plans = allocate(0.50, 100_000.0, &[(&p, quality)], 0.20);
        assert!(plans.is_empty());
    }

    #[test]
    fn sub_one_lot_allocation_is_skipped_rather_than_rounded_up() {
        let mut p = position(2_000.0, 10.0, 20_000.0);
        p.min_lot = 1_000;
        let quality = score(0.5, 0.5, &[]);
        // actual sell value clamps to the 20% ceiling (4000), which is only
        // 400 shares at a price of 10 -- below the 1000-share lot, so this
        // must floor to zero rather than round up to a full lot.
        let plans = allocate(0.01, 1_000_000.0, &[(&p, quality)], 0.20);
        assert!(plans.is_empty());
    }

    #[test]
    fn weakest_quality_sorted_first() {
        let strong = position(100.0, 100.0, 10_000.0);
        let mut weak = position(100.0, 100.0, 10_000.0);
        weak.isin = Isin::new("US0000000000");

        let strong_quality = score(0.9, 0.9, &[]); // low boost
        let weak_quality = score(0.1, 0.1, &[]); // high boost

        let plans = allocate(
            0.05,
            200_000.0,
            &[(&strong, strong_quality), (&weak, weak_quality)],
            0.80,
        );
        assert_eq!(plans[0].isin, weak.isin);
    }
}
