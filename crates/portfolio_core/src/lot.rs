//! Lot-size rounding for trade quantities.

/// Rounds a raw quantity down to the nearest multiple of `lot_size`,
/// falling back to rounding up when the floor would produce zero.
///
/// `lot_size <= 0` is treated as "no lot constraint" and the quantity is
/// returned unchanged (truncated to an integer). Otherwise the floor-to-lot
/// value is used when it is at least one lot; if the floor rounds all the
/// way to zero (the raw quantity was smaller than one lot), the ceiling is
/// tried instead; if even the ceiling can't produce a full lot (pathological
/// `lot_size`), zero is returned.
///
/// # Examples
///
/// ```
/// use portfolio_core::round_to_lot;
///
/// assert_eq!(round_to_lot(88.8, 1), 88);
/// assert_eq!(round_to_lot(133.33, 1), 133);
/// assert_eq!(round_to_lot(7.0, 10), 10);
/// assert_eq!(round_to_lot(100.0, 0), 100);
/// ```
pub fn round_to_lot(quantity: f64, lot_size: i64) -> i64 {
    if lot_size <= 0 {
        return quantity.trunc() as i64;
    }

    let floored = ((quantity / lot_size as f64).floor() as i64) * lot_size;
    if floored >= lot_size {
        return floored;
    }

    let ceiled = ((quantity / lot_size as f64).ceil() as i64) * lot_size;
    if ceiled >= lot_size {
        return ceiled;
    }

    0
}

/// Rounds a raw quantity down to the nearest multiple of `lot_size`, never
/// rounding up. `lot_size <= 0` is treated as "no lot constraint" and the
/// quantity is returned unchanged (truncated to an integer).
///
/// Unlike [`round_to_lot`], a sub-one-lot quantity floors to zero rather than
/// rounding up to a full lot — the caller is expected to skip the trade in
/// that case rather than take on a larger-than-intended position.
///
/// # Examples
///
/// ```
/// use portfolio_core::floor_to_lot;
///
/// assert_eq!(floor_to_lot(88.8, 1), 88);
/// assert_eq!(floor_to_lot(7.0, 10), 0);
/// ```
pub fn floor_to_lot(quantity: f64, lot_size: i64) -> i64 {
    if lot_size <= 0 {
        return quantity.trunc() as i64;
    }
    ((quantity / lot_size as f64).floor() as i64) * lot_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_to_whole_lots() {
        assert_eq!(round_to_lot(888.0 * 0.10, 1), 88);
    }

    #[test]
    fn rounds_up_when_floor_would_be_zero() {
        assert_eq!(round_to_lot(7.0, 10), 10);
    }

    #[test]
    fn unconstrained_lot_size_truncates() {
        assert_eq!(round_to_lot(100.9, 0), 100);
        assert_eq!(round_to_lot(100.9, -1), 100);
    }

    #[test]
    fn exact_multiple_is_unchanged() {
        assert_eq!(round_to_lot(50.0, 10), 50);
    }

    #[test]
    fn kelly_sizing_example() {
        // Scenario S2: Kelly target 133.33 shares, 100 currently held.
        let additional = 133.33_f64 - 100.0;
        assert_eq!(round_to_lot(additional, 1), 33);
    }

    #[test]
    fn floor_to_lot_never_rounds_up() {
        assert_eq!(floor_to_lot(7.0, 10), 0);
        assert_eq!(floor_to_lot(19.9, 10), 10);
    }

    #[test]
    fn floor_to_lot_unconstrained_truncates() {
        assert_eq!(floor_to_lot(100.9, 0), 100);
    }
}
