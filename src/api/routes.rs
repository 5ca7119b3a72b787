use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::docs::VOTING_GUIDE;
use crate::api::latency::LatencyStats;
use crate::api::middleware::{admin_auth, rate_limit, record_latency, ADMIN_KEY_HEADER};
use crate::config::{cache_ttl, clamp_limit, page_limits, BODY_LIMIT_BYTES};
use crate::db::{MarketFilter, Store};
use crate::error::{AppError, Result};
use crate::state::{keys, RateLimiter, ResponseCache};
use crate::types::{CastVote, NewMarket, VoteChoice, VoteOutcome};

#[derive(Clone)]
pub struct ApiState {
    pub store: Store,
    pub cache: Arc<ResponseCache>,
    pub limiter: Arc<RateLimiter>,
    pub latency: Arc<LatencyStats>,
    pub admin_key: Option<Arc<str>>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(
        store: Store,
        cache: Arc<ResponseCache>,
        limiter: Arc<RateLimiter>,
        admin_key: Option<String>,
    ) -> Self {
        Self {
            store,
            cache,
            limiter,
            latency: Arc::new(LatencyStats::new()),
            admin_key: admin_key.map(Arc::from),
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    let admin = Router::new()
        .route("/api/admin/markets", post(create_market))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ADMIN_KEY_HEADER)]);

    Router::new()
        .route("/health", get(health))
        .route("/api/docs", get(docs))
        .route("/api/markets", get(list_markets))
        .route("/api/markets/:id", get(get_market))
        .route("/api/markets/:id/vote", post(cast_vote))
        .route("/api/votes/recent", get(recent_votes))
        .route("/api/stats", get(stats))
        .route("/api/stats/latency", get(stats_latency))
        .route("/api/leaderboard", get(leaderboard))
        .merge(admin)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn_with_state(state.clone(), record_latency))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MarketsQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Fields are optional so that missing ones surface as our 400, not a serde rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub vote: Option<String>,
    pub comment: Option<String>,
}

impl VoteRequest {
    pub fn validate(self, market_id: i64) -> Result<CastVote> {
        let agent_id = non_empty(self.agent_id)
            .ok_or_else(|| AppError::Validation("agentId is required".to_string()))?;
        let agent_name = non_empty(self.agent_name)
            .ok_or_else(|| AppError::Validation("agentName is required".to_string()))?;
        let vote = self
            .vote
            .as_deref()
            .and_then(|v| v.parse::<VoteChoice>().ok())
            .ok_or_else(|| AppError::Validation("vote must be \"YES\" or \"NO\"".to_string()))?;

        Ok(CastVote {
            market_id,
            agent_id,
            agent_name,
            vote,
            comment: self.comment.filter(|c| !c.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketRequest {
    pub question: Option<String>,
    pub category: Option<String>,
    pub end_date: Option<String>,
    pub is_hot: Option<bool>,
}

impl CreateMarketRequest {
    pub fn validate(self) -> Result<NewMarket> {
        match (
            non_empty(self.question),
            non_empty(self.category),
            non_empty(self.end_date),
        ) {
            (Some(question), Some(category), Some(end_date)) => Ok(NewMarket {
                question,
                category,
                end_date,
                is_hot: self.is_hot.unwrap_or(false),
            }),
            _ => Err(AppError::Validation("Missing fields".to_string())),
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub cache_entries: usize,
    pub tracked_clients: usize,
}

#[derive(Serialize)]
pub struct LatencyResponse {
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub sample_count: u64,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

// ---------------------------------------------------------------------------
// Cache helper
// ---------------------------------------------------------------------------

/// Serve `key` from the cache, or await `load`, cache its JSON for `ttl` and return it.
async fn cached<T, F>(cache: &ResponseCache, key: String, ttl: Duration, load: F) -> Result<Json<Value>>
where
    T: Serialize,
    F: Future<Output = Result<T>>,
{
    let generation = cache.generation();
    if let Some(hit) = cache.get(&key) {
        return Ok(Json(hit));
    }
    let value = serde_json::to_value(load.await?)?;
    cache.insert_if_fresh(key, value.clone(), ttl, generation);
    Ok(Json(value))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        cache_entries: state.cache.len(),
        tracked_clients: state.limiter.tracked_clients(),
    })
}

async fn docs() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], VOTING_GUIDE)
}

async fn list_markets(
    State(state): State<ApiState>,
    params: std::result::Result<Query<MarketsQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(params) = params?;
    let limit = clamp_limit(params.limit, page_limits::MARKETS);
    let offset = params.offset.unwrap_or(0).max(0);
    let key = keys::markets(params.category.as_deref(), limit, offset);

    let filter = MarketFilter {
        category: params.category,
        limit: Some(limit),
        offset,
    };
    let ttl = state.cache.default_ttl();
    cached(&state.cache, key, ttl, state.store.list_markets(&filter)).await
}

async fn get_market(
    State(state): State<ApiState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(id) = id?;
    let key = keys::market(id);

    let generation = state.cache.generation();
    if let Some(hit) = state.cache.get(&key) {
        return Ok(Json(hit));
    }
    // Misses are not cached, so a market created later is visible at once.
    let market = state.store.get_market(id).await?.ok_or(AppError::NotFound)?;
    let value = serde_json::to_value(&market)?;
    state.cache.insert_if_fresh(
        key,
        value.clone(),
        Duration::from_millis(cache_ttl::MARKET_MS),
        generation,
    );
    Ok(Json(value))
}

async fn cast_vote(
    State(state): State<ApiState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteOutcome>> {
    let Path(market_id) = id?;
    let Json(body) = body?;
    let vote = body.validate(market_id)?;

    let tally = state.store.cast_vote(&vote).await?;
    let invalidated = state.cache.invalidate_for_vote(market_id);

    info!(
        market_id,
        agent_id = %vote.agent_id,
        vote = %vote.vote,
        yes_percent = tally.yes_percent,
        total_votes = tally.total_votes,
        invalidated,
        "Vote recorded"
    );

    Ok(Json(VoteOutcome {
        success: true,
        market_id,
        tally,
    }))
}

async fn recent_votes(
    State(state): State<ApiState>,
    params: std::result::Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(params) = params?;
    let limit = clamp_limit(params.limit, page_limits::RECENT_VOTES);
    let ttl = state.cache.default_ttl();
    cached(&state.cache, keys::recent_votes(limit), ttl, state.store.recent_votes(limit)).await
}

async fn stats(State(state): State<ApiState>) -> Result<Json<Value>> {
    cached(
        &state.cache,
        keys::STATS.to_string(),
        Duration::from_millis(cache_ttl::STATS_MS),
        state.store.stats(),
    )
    .await
}

async fn stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50, p95, p99) = state.latency.percentiles();
    let to_ms = |us: Option<u64>| us.map(|v| v as f64 / 1000.0);
    Json(LatencyResponse {
        p50_ms: to_ms(p50),
        p95_ms: to_ms(p95),
        p99_ms: to_ms(p99),
        sample_count: state.latency.len(),
    })
}

async fn leaderboard(
    State(state): State<ApiState>,
    params: std::result::Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(params) = params?;
    let limit = clamp_limit(params.limit, page_limits::LEADERBOARD);
    cached(
        &state.cache,
        keys::leaderboard(limit),
        Duration::from_millis(cache_ttl::LEADERBOARD_MS),
        state.store.leaderboard(limit),
    )
    .await
}

async fn create_market(
    State(state): State<ApiState>,
    body: std::result::Result<Json<CreateMarketRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>> {
    let Json(body) = body?;
    let market = body.validate()?;

    let id = state.store.create_market(&market).await?;
    state.cache.clear();
    info!(id, category = %market.category, is_hot = market.is_hot, "Market created");

    Ok(Json(CreatedResponse { success: true, id }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::test_store;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use std::net::SocketAddr;
    use tower::ServiceExt;

    const ADMIN_KEY: &str = "test-admin-key";

    async fn app_with_limit(max: u32, window: Duration) -> (Router, ApiState) {
        let store = test_store().await;
        let state = ApiState::new(
            store,
            Arc::new(ResponseCache::new(Duration::from_secs(10))),
            Arc::new(RateLimiter::new(max, window)),
            Some(ADMIN_KEY.to_string()),
        );
        (router(state.clone()), state)
    }

    async fn app() -> (Router, ApiState) {
        app_with_limit(10_000, Duration::from_secs(60)).await
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn admin_create(body: Value) -> Request<Body> {
        let mut req = post_json("/api/admin/markets", body);
        req.headers_mut()
            .insert(ADMIN_KEY_HEADER, ADMIN_KEY.parse().unwrap());
        req
    }

    async fn create(app: &Router, question: &str, category: &str) -> i64 {
        let (status, body) = send(
            app,
            admin_create(json!({
                "question": question,
                "category": category,
                "endDate": "2026-12-31",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        body["id"].as_i64().unwrap()
    }

    async fn vote(app: &Router, id: i64, agent: &str, choice: &str) -> (StatusCode, Value) {
        send(
            app,
            post_json(
                &format!("/api/markets/{id}/vote"),
                json!({ "agentId": agent, "agentName": format!("{agent}-bot"), "vote": choice }),
            ),
        )
        .await
    }

    fn percents(m: &Value) -> (i64, i64, i64) {
        (
            m["yes_percent"].as_i64().unwrap(),
            m["no_percent"].as_i64().unwrap(),
            m["total_votes"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn three_yes_one_no_reads_back_75_25() {
        let (app, _) = app().await;
        let id = create(&app, "Is a hot dog a sandwich?", "meme").await;

        for agent in ["a", "b", "c"] {
            let (status, _) = vote(&app, id, agent, "YES").await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = vote(&app, id, "d", "NO").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(percents(&body), (75, 25, 4));

        let (_, market) = send(&app, get(&format!("/api/markets/{id}"))).await;
        assert_eq!(percents(&market), (75, 25, 4));
    }

    #[tokio::test]
    async fn vote_invalidates_cached_market_and_lists() {
        let (app, _) = app().await;
        let id = create(&app, "Will GPT-5 be released in 2026?", "tech").await;

        // Warm the caches.
        let (_, before) = send(&app, get(&format!("/api/markets/{id}"))).await;
        assert_eq!(percents(&before), (50, 50, 0));
        let (_, list_before) = send(&app, get("/api/markets")).await;
        assert_eq!(list_before[0]["total_votes"], json!(0));
        let (_, stats_before) = send(&app, get("/api/stats")).await;
        assert_eq!(stats_before["total_votes"], json!(0));

        vote(&app, id, "a", "NO").await;

        let (_, after) = send(&app, get(&format!("/api/markets/{id}"))).await;
        assert_eq!(percents(&after), (0, 100, 1));
        let (_, list_after) = send(&app, get("/api/markets")).await;
        assert_eq!(list_after[0]["total_votes"], json!(1));
        let (_, stats_after) = send(&app, get("/api/stats")).await;
        assert_eq!(stats_after["total_votes"], json!(1));
        let (_, recent) = send(&app, get("/api/votes/recent")).await;
        assert_eq!(recent.as_array().unwrap().len(), 1);
        assert_eq!(recent[0]["question"], json!("Will GPT-5 be released in 2026?"));
    }

    #[tokio::test]
    async fn repeated_reads_are_served_from_cache() {
        let (app, state) = app().await;
        let id = create(&app, "Q", "tech").await;
        send(&app, get(&format!("/api/markets/{id}"))).await;
        assert!(state.cache.get(&keys::market(id)).is_some());

        // Write behind the cache's back: the cached payload is still served.
        sqlx::query("UPDATE markets SET question = 'changed' WHERE id = ?")
            .bind(id)
            .execute(state.store.pool())
            .await
            .unwrap();
        let (_, body) = send(&app, get(&format!("/api/markets/{id}"))).await;
        assert_eq!(body["question"], json!("Q"));
    }

    #[tokio::test]
    async fn invalid_votes_are_rejected_without_side_effects() {
        let (app, _) = app().await;
        let id = create(&app, "Q", "crypto").await;
        vote(&app, id, "a", "YES").await;

        for choice in ["MAYBE", "yes", "", " YES"] {
            let (status, body) = vote(&app, id, "b", choice).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "vote={choice:?}");
            assert!(body["error"].is_string());
        }

        let missing_agent = post_json(
            &format!("/api/markets/{id}/vote"),
            json!({ "agentName": "x", "vote": "YES" }),
        );
        assert_eq!(send(&app, missing_agent).await.0, StatusCode::BAD_REQUEST);

        let missing_name = post_json(
            &format!("/api/markets/{id}/vote"),
            json!({ "agentId": "x", "vote": "NO" }),
        );
        assert_eq!(send(&app, missing_name).await.0, StatusCode::BAD_REQUEST);

        let wrong_type = post_json(
            &format!("/api/markets/{id}/vote"),
            json!({ "agentId": "x", "agentName": "x", "vote": 1 }),
        );
        assert_eq!(send(&app, wrong_type).await.0, StatusCode::BAD_REQUEST);

        let (_, market) = send(&app, get(&format!("/api/markets/{id}"))).await;
        assert_eq!(percents(&market), (100, 0, 1));
    }

    #[tokio::test]
    async fn same_agent_revote_keeps_total() {
        let (app, _) = app().await;
        let id = create(&app, "Q", "crypto").await;

        let (_, first) = vote(&app, id, "a", "YES").await;
        let (_, second) = vote(&app, id, "a", "NO").await;
        assert_eq!(first["total_votes"], json!(1));
        assert_eq!(percents(&second), (0, 100, 1));

        let (_, board) = send(&app, get("/api/leaderboard")).await;
        assert_eq!(board[0]["id"], json!("a"));
        assert_eq!(board[0]["total_votes"], json!(2));
    }

    #[tokio::test]
    async fn unknown_market_is_404() {
        let (app, _) = app().await;
        assert_eq!(send(&app, get("/api/markets/42")).await.0, StatusCode::NOT_FOUND);
        assert_eq!(vote(&app, 42, "a", "YES").await.0, StatusCode::NOT_FOUND);
        assert_eq!(send(&app, get("/api/markets/abc")).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_requires_matching_key() {
        let (app, _) = app().await;
        let body = json!({ "question": "Q", "category": "c", "endDate": "2027-01-01" });

        let no_key = post_json("/api/admin/markets", body.clone());
        assert_eq!(send(&app, no_key).await.0, StatusCode::UNAUTHORIZED);

        let mut wrong = post_json("/api/admin/markets", body.clone());
        wrong.headers_mut().insert(ADMIN_KEY_HEADER, "nope".parse().unwrap());
        assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

        let (status, created) = send(&app, admin_create(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(created["id"].as_i64().is_some());
    }

    #[tokio::test]
    async fn admin_disabled_without_configured_key() {
        let store = test_store().await;
        let state = ApiState::new(
            store,
            Arc::new(ResponseCache::new(Duration::from_secs(10))),
            Arc::new(RateLimiter::new(100, Duration::from_secs(60))),
            None,
        );
        let app = router(state);
        let req = admin_create(json!({ "question": "Q", "category": "c", "endDate": "2027-01-01" }));
        assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_create_validates_and_clears_cache() {
        let (app, state) = app().await;
        create(&app, "First", "tech").await;
        let (_, list) = send(&app, get("/api/markets?category=tech")).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert!(!state.cache.is_empty());

        let (status, _) = send(&app, admin_create(json!({ "question": "Q", "category": "tech" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(
            &app,
            admin_create(json!({ "question": "  ", "category": "tech", "endDate": "2027-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            admin_create(json!({
                "question": "Second", "category": "tech", "endDate": "2027-01-01", "isHot": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, list) = send(&app, get("/api/markets?category=tech")).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 2);
        // Hot markets sort first.
        assert_eq!(list[0]["question"], json!("Second"));
        assert_eq!(list[0]["is_hot"], json!(true));
    }

    #[tokio::test]
    async fn rate_limit_rejects_excess_then_recovers() {
        let window = Duration::from_millis(300);
        let (app, _) = app_with_limit(3, window).await;
        let from = |ip: [u8; 4]| {
            Request::builder()
                .uri("/health")
                .extension(ConnectInfo(SocketAddr::from((ip, 40000))))
                .body(Body::empty())
                .unwrap()
        };

        for _ in 0..3 {
            assert_eq!(send(&app, from([10, 0, 0, 1])).await.0, StatusCode::OK);
        }
        let resp = app.clone().oneshot(from([10, 0, 0, 1])).await.unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key(header::RETRY_AFTER));

        // Another client has its own window.
        assert_eq!(send(&app, from([10, 0, 0, 2])).await.0, StatusCode::OK);

        tokio::time::sleep(window + Duration::from_millis(50)).await;
        assert_eq!(send(&app, from([10, 0, 0, 1])).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn list_limits_are_clamped_and_validated() {
        let (app, _) = app().await;
        for i in 0..3 {
            create(&app, &format!("Q{i}"), "meme").await;
        }
        let (_, page) = send(&app, get("/api/markets?limit=2&offset=1")).await;
        assert_eq!(page.as_array().unwrap().len(), 2);
        let (_, all) = send(&app, get("/api/markets?limit=1000")).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
        let (status, _) = send(&app, get("/api/votes/recent?limit=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_docs_and_latency() {
        let (app, _) = app().await;
        let (status, health) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], json!("ok"));

        let resp = app.clone().oneshot(get("/api/docs")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let (_, latency) = send(&app, get("/api/stats/latency")).await;
        // The two earlier requests were recorded.
        assert!(latency["sample_count"].as_u64().unwrap() >= 2);
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let (app, _) = app().await;
        for uri in ["/health", "/api/markets/999"] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff", "{uri}");
            assert_eq!(resp.headers()[header::X_FRAME_OPTIONS], "DENY", "{uri}");
        }
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let (app, _) = app().await;
        let comment = "x".repeat(BODY_LIMIT_BYTES + 1);
        let req = post_json(
            "/api/markets/1/vote",
            json!({ "agentId": "a", "agentName": "a", "vote": "YES", "comment": comment }),
        );
        assert_eq!(send(&app, req).await.0, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
