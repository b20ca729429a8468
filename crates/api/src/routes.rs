use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stocklens_core::analysis::{self, Analyzer};
use stocklens_core::domain::analysis::Analysis;
use stocklens_core::domain::market::{PricePoint, SearchMatch};
use stocklens_core::domain::request::AnalysisRequest;
use stocklens_core::market::{fetch_stock_data, MarketDataProvider, OutputSize};

const MIN_QUERY_LEN: usize = 2;

#[derive(Clone)]
pub struct AppState {
    pub market: Option<Arc<dyn MarketDataProvider>>,
    /// `None` when no model is configured; analysis then runs offline only.
    pub analyzer: Option<Analyzer>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/search", get(search))
        .route("/api/stock/:symbol", get(get_stock))
        .route("/api/ai-analysis", post(ai_analysis))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(err: anyhow::Error, message: &str) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "{message}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

fn market(state: &AppState) -> Result<&Arc<dyn MarketDataProvider>, ApiError> {
    state.market.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Market data provider is not configured",
        )
    })
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<SearchMatch>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Query must be at least 2 characters",
        ));
    }

    let market = market(&state)?;
    let results = match market.search_symbols(query).await {
        Ok(results) => results,
        Err(err) => {
            tracing::warn!(%query, error = %err, "symbol search failed; returning no results");
            Vec::new()
        }
    };

    Ok(Json(SearchResponse { results }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StockResponse {
    symbol: String,
    current_price: f64,
    change: f64,
    change_percent: f64,
    volume: u64,
    previous_close: f64,
    historical_data: Vec<PricePoint>,
    company_name: Option<String>,
}

async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Stock symbol is required",
        ));
    }

    let market = market(&state)?;
    let data = fetch_stock_data(market.as_ref(), &symbol, OutputSize::Compact)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch stock data"))?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "Stock not found or API limit reached. Please try again later.",
            )
        })?;

    Ok(Json(StockResponse {
        symbol,
        current_price: data.quote.current_price,
        change: data.quote.change,
        change_percent: data.quote.change_percent,
        volume: data.quote.volume,
        previous_close: data.quote.previous_close,
        historical_data: data.historical_data,
        company_name: data.company.and_then(|c| c.name),
    }))
}

async fn ai_analysis(
    State(state): State<AppState>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", rejection.body_text()),
        )
    })?;

    let analysis = match &state.analyzer {
        Some(analyzer) => analyzer.analyze(request).await,
        None => request.validate().map(|r| analysis::offline(&r)),
    }
    .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::info!(
        tier = ?analysis.tier,
        recommendation = %analysis.result.recommendation,
        "analysis served"
    );
    Ok(Json(analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{Duration, NaiveDate};
    use serde_json::{json, Value};
    use stocklens_core::domain::market::{CompanyInfo, StockQuote};
    use stocklens_core::llm::{LlmClient, Provider};
    use tower::ServiceExt;

    struct FakeMarket;

    #[async_trait::async_trait]
    impl MarketDataProvider for FakeMarket {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn search_symbols(&self, query: &str) -> anyhow::Result<Vec<SearchMatch>> {
            if query == "fail" {
                anyhow::bail!("rate limited");
            }
            Ok(vec![SearchMatch {
                symbol: "IBM".to_string(),
                name: "International Business Machines".to_string(),
                kind: "Equity".to_string(),
                region: "United States".to_string(),
            }])
        }

        async fn quote(&self, symbol: &str) -> anyhow::Result<Option<StockQuote>> {
            Ok((symbol == "IBM").then(|| StockQuote {
                symbol: "IBM".to_string(),
                current_price: 242.5,
                change: 3.4,
                change_percent: 1.42,
                volume: 1_000,
                previous_close: 239.1,
            }))
        }

        async fn daily_history(
            &self,
            _symbol: &str,
            _size: OutputSize,
        ) -> anyhow::Result<Vec<PricePoint>> {
            Ok(history(&[240.0, 241.0]))
        }

        async fn company_overview(&self, _symbol: &str) -> anyhow::Result<Option<CompanyInfo>> {
            Ok(Some(CompanyInfo {
                name: Some("International Business Machines".to_string()),
                ..Default::default()
            }))
        }
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl LlmClient for FailingLlm {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("upstream unavailable")
        }
    }

    fn history(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10,
            })
            .collect()
    }

    fn app() -> Router {
        router(AppState {
            market: Some(Arc::new(FakeMarket)),
            analyzer: Some(Analyzer::new(Arc::new(FailingLlm))),
        })
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn search_requires_two_characters() {
        let (status, body) = send(app(), get("/api/search?q=a")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Query must be at least 2 characters");

        let (status, _) = send(app(), get("/api/search")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_returns_matches() {
        let (status, body) = send(app(), get("/api/search?q=ibm")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["symbol"], "IBM");
        assert_eq!(body["results"][0]["type"], "Equity");
    }

    #[tokio::test]
    async fn search_failure_degrades_to_empty_list() {
        let (status, body) = send(app(), get("/api/search?q=fail")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"results": []}));
    }

    #[tokio::test]
    async fn stock_lookup_reshapes_quote() {
        let (status, body) = send(app(), get("/api/stock/ibm")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "IBM");
        assert_eq!(body["currentPrice"], 242.5);
        assert_eq!(body["previousClose"], 239.1);
        assert_eq!(body["companyName"], "International Business Machines");
        assert_eq!(body["historicalData"].as_array().unwrap().len(), 2);
        assert_eq!(body["historicalData"][0]["date"], "2026-01-01");
    }

    #[tokio::test]
    async fn unknown_stock_is_404() {
        let (status, body) = send(app(), get("/api/stock/NOPE")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"],
            "Stock not found or API limit reached. Please try again later."
        );
    }

    #[tokio::test]
    async fn analysis_rejects_missing_fields() {
        let (status, body) = send(app(), post_json("/api/ai-analysis", json!({"symbol": "IBM"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Missing required fields: currentPrice, historicalData"
        );
    }

    #[tokio::test]
    async fn analysis_rejects_malformed_json() {
        let req = Request::post("/api/ai-analysis")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn analysis_falls_back_when_model_fails() {
        let payload = json!({
            "symbol": "IBM",
            "currentPrice": 242.5,
            "historicalData": history(&[240.0, 241.0, 239.5]),
        });
        let (status, body) = send(app(), post_json("/api/ai-analysis", payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "deterministic");
        assert_eq!(body["recommendation"], "HOLD");
        assert_eq!(body["riskLevel"], "LOW");
        assert_eq!(body["keyPoints"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn analysis_runs_offline_without_model() {
        let app = router(AppState {
            market: None,
            analyzer: None,
        });
        let payload = json!({
            "symbol": "IBM",
            "currentPrice": 242.5,
            "historicalData": history(&[240.0, 241.0]),
        });
        let (status, body) = send(app, post_json("/api/ai-analysis", payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "deterministic");
    }

    #[tokio::test]
    async fn market_routes_unavailable_without_provider() {
        let app = router(AppState {
            market: None,
            analyzer: None,
        });
        let (status, _) = send(app, get("/api/stock/IBM")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
