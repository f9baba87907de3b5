//! The core planning endpoint: accepts a portfolio snapshot and returns
//! ranked BUY/SELL action candidates.

use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use portfolio_engine::context::OpportunityContextBuilder;
use portfolio_engine::data::{Category, EnrichedPosition, Security};
use portfolio_engine::registry::CategoryResults;
use portfolio_engine::PlannerConfig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::AppState;
use crate::error::ServerError;

/// Request body for `POST /recommendations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsRequest {
    /// Securities forming the tradable universe.
    pub securities: Vec<Security>,
    /// Currently held positions.
    pub positions: Vec<EnrichedPosition>,
    /// Total portfolio value in EUR.
    pub total_portfolio_value_eur: f64,
    /// Available cash in EUR.
    pub available_cash_eur: f64,
    /// Planning configuration for this run. Falls back to the server's
    /// `default_planner_config` when omitted.
    #[serde(default)]
    pub planner_config: Option<PlannerConfig>,
}

/// Response body for `POST /recommendations`.
///
/// Per §6.2/§7, a successful response always carries both the accepted
/// candidates and the `pre_filtered` exclusions for every category a
/// calculator ran against — even a fully empty `candidates` list still
/// reports why each considered security was rejected, so the caller can
/// offer "dismiss this reason" without a follow-up request.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    /// Per-category candidates and pre-filtered exclusions, in the same
    /// registration/execution order the registry produced them in — the
    /// wire shape is still `{category: {candidates, pre_filtered}}`, but
    /// unlike a plain `HashMap` the key order is reproducible across runs.
    #[serde(serialize_with = "serialize_results", deserialize_with = "deserialize_results")]
    pub results: CategoryResults,
}

fn serialize_results<S>(results: &CategoryResults, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(results.len()))?;
    for (category, result) in results {
        map.serialize_entry(category.as_str(), result)?;
    }
    map.end()
}

fn deserialize_results<'de, D>(deserializer: D) -> Result<CategoryResults, D::Error>
where
    D: Deserializer<'de>,
{
    let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
    object
        .into_iter()
        .map(|(key, value)| {
            let category: Category = serde_json::from_value(serde_json::Value::String(key))
                .map_err(serde::de::Error::custom)?;
            let result = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            Ok((category, result))
        })
        .collect()
}

/// Builds the recommendations route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/recommendations", post(recommend))
}

/// `POST /recommendations` — assembles an [`portfolio_engine::OpportunityContext`]
/// from the request body and runs every enabled calculator against it.
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationsRequest>,
) -> Result<Json<RecommendationsResponse>, ServerError> {
    let ctx = OpportunityContextBuilder::new()
        .total_portfolio_value_eur(request.total_portfolio_value_eur)
        .available_cash_eur(request.available_cash_eur)
        .add_securities(request.securities)
        .add_positions(request.positions)
        .build()
        .map_err(ServerError::InvalidContext)?;

    let config = request
        .planner_config
        .unwrap_or_else(|| state.config.default_planner_config.clone());

    let results = state.registry.identify_opportunities_with_exclusions(&ctx, &config);

    Ok(Json(RecommendationsResponse { results }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use portfolio_core::{Currency, Isin, Symbol};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;

    fn test_state() -> AppState {
        AppState::new(Arc::new(ServerConfig::default()))
    }

    fn security() -> Security {
        Security {
            isin: Isin::new("US1234567890"),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            currency: Currency::USD,
            geography: "US".into(),
            industry: "Technology".into(),
            min_lot: 1,
            allow_buy: true,
            allow_sell: true,
        }
    }

    fn position() -> EnrichedPosition {
        EnrichedPosition {
            isin: Isin::new("US1234567890"),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            quantity: 1000.0,
            average_cost: 10.0,
            current_price: 15.0,
            market_value_eur: 15_000.0,
            weight_in_portfolio: 0.15,
            currency: Currency::USD,
            geography: "US".into(),
            industry: "Technology".into(),
            min_lot: 1,
            allow_buy: true,
            allow_sell: true,
        }
    }

    #[tokio::test]
    async fn valid_request_with_no_enabled_calculators_returns_empty_results() {
        let router = routes().with_state(test_state());
        let request = RecommendationsRequest {
            securities: vec![security()],
            positions: vec![position()],
            total_portfolio_value_eur: 100_000.0,
            available_cash_eur: 10_000.0,
            planner_config: None,
        };
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/recommendations")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: RecommendationsResponse = serde_json::from_slice(&body).unwrap();
        assert!(parsed.results.is_empty());
    }

    #[tokio::test]
    async fn inconsistent_context_returns_400() {
        let router = routes().with_state(test_state());
        let request = RecommendationsRequest {
            securities: vec![],
            positions: vec![position()],
            total_portfolio_value_eur: 100_000.0,
            available_cash_eur: 10_000.0,
            planner_config: None,
        };
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/recommendations")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn enabling_profit_taking_yields_candidates_for_a_windfall_gain() {
        let router = routes().with_state(test_state());
        let mut config = PlannerConfig::default();
        config.enabled_calculators = vec!["profit_taking".to_string()];
        let request = RecommendationsRequest {
            securities: vec![security()],
            positions: vec![position()],
            total_portfolio_value_eur: 100_000.0,
            available_cash_eur: 10_000.0,
            planner_config: Some(config),
        };
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/recommendations")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: RecommendationsResponse = serde_json::from_slice(&body).unwrap();
        let profit_taking = parsed
            .results
            .iter()
            .find(|(category, _)| *category == portfolio_engine::data::Category::ProfitTaking)
            .map(|(_, result)| result)
            .expect("profit_taking ran and should have a merged entry");
        assert_eq!(profit_taking.candidates.len(), 1);
    }

    #[tokio::test]
    async fn rejected_security_is_reported_in_pre_filtered_not_silently_dropped() {
        let router = routes().with_state(test_state());
        let mut config = PlannerConfig::default();
        config.enabled_calculators = vec!["profit_taking".to_string()];
        let mut flat_position = position();
        flat_position.current_price = flat_position.average_cost; // no gain, rejected
        let request = RecommendationsRequest {
            securities: vec![security()],
            positions: vec![flat_position],
            total_portfolio_value_eur: 100_000.0,
            available_cash_eur: 10_000.0,
            planner_config: Some(config),
        };
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/recommendations")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: RecommendationsResponse = serde_json::from_slice(&body).unwrap();
        let profit_taking = parsed
            .results
            .iter()
            .find(|(category, _)| *category == portfolio_engine::data::Category::ProfitTaking)
            .map(|(_, result)| result)
            .expect("profit_taking ran and should have a merged entry");
        assert!(profit_taking.candidates.is_empty());
        assert_eq!(profit_taking.pre_filtered.len(), 1);
    }
}
