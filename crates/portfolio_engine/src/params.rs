//! Parameter extractor — typed getters over an untyped parameter bag.
//!
//! Per the map-based-polymorphism design note, the registry hands each
//! calculator an untyped bag (`serde_json::Value`) before dispatch; the
//! calculator then extracts a typed parameter struct from it, falling back
//! to its own defaults. No extraction ever errors: a missing key, a `null`,
//! or a value of the wrong type all resolve to the supplied default.

use serde_json::Value;

/// A calculator's parameter bag: an arbitrary JSON object (or `None`).
pub type ParamBag = Option<Value>;

/// Reads a floating-point parameter, accepting a JSON integer via
/// widening. Anything else (missing key, wrong type, non-object bag)
/// returns `default`.
///
/// # Examples
///
/// ```
/// use portfolio_engine::params::get_f64;
/// use serde_json::json;
///
/// let bag = Some(json!({ "min_gain_threshold": 15 }));
/// assert_eq!(get_f64(&bag, "min_gain_threshold", 0.0), 15.0);
/// assert_eq!(get_f64(&bag, "missing", 0.20), 0.20);
/// ```
pub fn get_f64(bag: &ParamBag, key: &str, default: f64) -> f64 {
    bag.as_ref()
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_f64())
        .unwrap_or(default)
}

/// Reads an integer parameter, accepting a JSON real via truncation toward
/// zero. Anything else returns `default`.
///
/// # Examples
///
/// ```
/// use portfolio_engine::params::get_i64;
/// use serde_json::json;
///
/// let bag = Some(json!({ "max_positions": 3.9 }));
/// assert_eq!(get_i64(&bag, "max_positions", 5), 3);
/// assert_eq!(get_i64(&bag, "missing", 5), 5);
/// ```
pub fn get_i64(bag: &ParamBag, key: &str, default: i64) -> i64 {
    bag.as_ref()
        .and_then(|v| v.get(key))
        .and_then(|v| {
            if let Some(i) = v.as_i64() {
                Some(i)
            } else {
                v.as_f64().map(|f| f.trunc() as i64)
            }
        })
        .unwrap_or(default)
}

/// Reads a boolean parameter. Anything other than a JSON bool returns
/// `default`.
///
/// # Examples
///
/// ```
/// use portfolio_engine::params::get_bool;
/// use serde_json::json;
///
/// let bag = Some(json!({ "exclude_existing": true }));
/// assert!(get_bool(&bag, "exclude_existing", false));
/// assert!(!get_bool(&bag, "missing", false));
/// ```
pub fn get_bool(bag: &ParamBag, key: &str, default: bool) -> bool {
    bag.as_ref()
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_bool())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_bag_returns_default() {
        assert_eq!(get_f64(&None, "anything", 1.5), 1.5);
        assert_eq!(get_i64(&None, "anything", 3), 3);
        assert!(!get_bool(&None, "anything", false));
    }

    #[test]
    fn real_requests_accept_integer_widening() {
        let bag = Some(json!({ "threshold": 15 }));
        assert_eq!(get_f64(&bag, "threshold", 0.0), 15.0);
    }

    #[test]
    fn int_requests_accept_real_via_truncation() {
        let bag = Some(json!({ "count": 3.9 }));
        assert_eq!(get_i64(&bag, "count", 0), 3);
        let bag_negative = Some(json!({ "count": -3.9 }));
        assert_eq!(get_i64(&bag_negative, "count", 0), -3);
    }

    #[test]
    fn wrong_type_falls_back_to_default() {
        let bag = Some(json!({ "count": "not a number" }));
        assert_eq!(get_i64(&bag, "count", 7), 7);
        let bag = Some(json!({ "flag": "not a bool" }));
        assert!(!get_bool(&bag, "flag", false));
    }

    #[test]
    fn null_bag_value_falls_back_to_default() {
        let bag = Some(json!({ "count": null }));
        assert_eq!(get_i64(&bag, "count", 9), 9);
    }
}
