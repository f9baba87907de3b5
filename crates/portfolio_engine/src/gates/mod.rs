//! Shared evaluators used across calculators: the quality gate, the
//! concentration guardrail, the sell-quality scorer, the priority
//! adjustment pipeline, and the geographic sell-plan allocator.

pub mod geo_allocator;
pub mod guardrail;
pub mod priority;
pub mod quality_gate;
pub mod sell_quality;
