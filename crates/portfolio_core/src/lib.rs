//! # Portfolio Core (L1: Foundation)
//!
//! Foundation types shared by the opportunity identification engine and its
//! callers: currency codes, strongly-typed identifiers, and the small pure
//! numeric helpers (lot-size rounding, minimum trade amount) every
//! calculator relies on.
//!
//! ## Feature Flags
//!
//! - `serde` (default): derive `Serialize`/`Deserialize` on `Isin`, `Symbol`
//!   and `Currency` for wire/API use.
//!
//! ## Glossary
//!
//! - **ISIN** — International Securities Identification Number, the stable
//!   cross-market identifier used as the internal key for every signal and
//!   allocation map in the engine.
//! - **Lot size** — the minimum tradable increment (`min_lot`) for a
//!   security; every emitted quantity is a multiple of it.
//! - **Kelly size** — a fractional-Kelly position-sizing signal, expressed
//!   as a fraction of total portfolio value.
//! - **Regime** — a coarse market-state classification (`bull` / `bear` /
//!   `sideways` / `neutral` / `volatile`) derived from security tag tallies.
//! - **Value trap** — a security with a high opportunity score undermined by
//!   weak fundamentals, weak long-term quality, negative momentum, or high
//!   volatility.
//! - **Quality gate** — the pass/fail evaluation a BUY candidate must clear,
//!   either via explicit tags or via a set of score-based paths.
//! - **Priority** — the unbounded (typically ≤ ~2) real-valued ranking score
//!   attached to every action candidate.
//! - **Opportunity** — a scored BUY candidate surfaced by the opportunity
//!   score signal.
//! - **Windfall** — a profit-taking gain so large (≥ the windfall threshold)
//!   that the full maximum sell percentage applies regardless of
//!   sell-quality protection.

#![warn(missing_docs)]

mod currency;
mod error;
mod ids;
mod lot;
mod min_trade;

pub use currency::Currency;
pub use error::{CurrencyError, IsinError};
pub use ids::{Isin, Symbol};
pub use lot::{floor_to_lot, round_to_lot};
pub use min_trade::{absolute_sell_ceiling, min_trade_amount};
