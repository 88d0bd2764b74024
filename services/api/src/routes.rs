use crate::infra::{AppState, EngineState};
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use movie_expert::engine::{DatasetOverview, PreferenceRequest, RecommendationView};
use movie_expert::error::AppError;
use serde_json::json;
use std::sync::atomic::Ordering;
use tracing::debug;

pub(crate) fn router(engine: EngineState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/config", get(config_endpoint))
        .route("/api/recommend", post(recommend_endpoint))
        .layer(Extension(engine))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "unavailable" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn config_endpoint(
    Extension(engine): Extension<EngineState>,
) -> Result<Json<DatasetOverview>, AppError> {
    Ok(Json(engine.recommender()?.overview()))
}

pub(crate) async fn recommend_endpoint(
    Extension(engine): Extension<EngineState>,
    payload: Result<Json<PreferenceRequest>, JsonRejection>,
) -> Result<Json<RecommendationView>, AppError> {
    let recommender = engine.recommender()?;
    let Json(request) =
        payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let view = recommender.respond(request);
    debug!(
        candidates = view.summary.candidates,
        returned = view.results.len(),
        "recommendation served"
    );
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::load_recommender;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use movie_expert::config::DatasetConfig;
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn fixture_engine() -> EngineState {
        let config = DatasetConfig {
            data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("../../crates/movie-expert/tests/fixtures/movielens-100k"),
            kind: None,
        };
        let recommender = load_recommender(&config).expect("fixture dataset loads");
        EngineState::Ready(Arc::new(recommender))
    }

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = router(fixture_engine())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let response = router(fixture_engine())
            .layer(Extension(app_state(false)))
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "unavailable");
    }

    #[tokio::test]
    async fn config_describes_the_loaded_dataset() {
        let response = router(fixture_engine())
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["dataset"], "movielens-100k");
        assert_eq!(body["ratingScaleMax"], 5.0);
        assert_eq!(body["hasRuntime"], false);
        assert_eq!(body["yearMin"], 1977);
    }

    #[tokio::test]
    async fn recommend_returns_ranked_explanations() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/recommend")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"preferredGenres":["Action","Sci-Fi"],"topK":1}"#,
            ))
            .expect("request");

        let response = router(fixture_engine())
            .oneshot(request)
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["summary"]["candidates"], 2);
        let results = body["results"].as_array().expect("results");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Star Wars (1977)");
        assert_eq!(results[0]["why"][0]["ruleId"], "QUALITY_EXCELLENT");
    }

    async fn recommend(body: &'static str) -> axum::response::Response {
        let request = Request::builder()
            .method("POST")
            .uri("/api/recommend")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request");
        router(fixture_engine())
            .oneshot(request)
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn wrongly_typed_preferences_are_clamped_not_rejected() {
        let unconstrained = json_body(recommend("{}").await).await;

        for body in [
            r#"{"preferredGenres":null}"#,
            r#"{"preferredGenres":"Action"}"#,
            r#"{"minRating":"4"}"#,
            r#"{"yearRange":"1990"}"#,
        ] {
            let response = recommend(body).await;
            assert_eq!(response.status(), StatusCode::OK, "{body}");
            let view = json_body(response).await;
            assert_eq!(view["summary"], unconstrained["summary"], "{body}");
        }

        let response = recommend(r#"{"topK":1.5,"yearRange":[1990.5,1977]}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["results"].as_array().expect("results").len(), 1);
        assert!(view["results"][0]["year"].as_i64().expect("year") <= 1990);
    }

    #[tokio::test]
    async fn unreadable_bodies_are_reported_as_json() {
        let response = recommend(r#"["Action"]"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"]
            .as_str()
            .expect("error text")
            .starts_with("invalid request:"));
    }

    #[tokio::test]
    async fn unavailable_dataset_is_reported_as_json() {
        let engine = EngineState::Unavailable(Arc::from("no compatible dataset found in data"));
        let response = router(engine)
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "no compatible dataset found in data");
    }

    #[tokio::test]
    async fn metrics_render_prometheus_text() {
        let response = router(fixture_engine())
            .layer(Extension(app_state(true)))
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
