use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    middleware::{api_key_auth, log_errors},
    routes,
};

// 公开路由：位置检查和健康检查
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/location/check", post(routes::location::check_location))
        .route("/location/nearby", post(routes::location::find_nearby_incidents))
        .route("/health", get(routes::system::health))
}

// 后台管理路由，需要 X-API-Key
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/incidents",
            post(routes::incident::create_incident).get(routes::incident::list_incidents),
        )
        .route(
            "/admin/incidents/{id}",
            get(routes::incident::get_incident)
                .put(routes::incident::update_incident)
                .delete(routes::incident::delete_incident),
        )
        .route("/admin/stats", get(routes::incident::incident_stats))
        .layer(axum::middleware::from_fn_with_state(state, api_key_auth))
}

// 创建主路由，限流和 CORS 由启动代码按环境追加
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(admin_routes(state.clone()));

    Router::new()
        .nest(&state.config.api_base_uri, api)
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        middleware::API_KEY_HEADER,
        services::{AdminService, LocationService, SnapshotRefresher, StatsService},
        testing::{MemoryIncidentCache, MemoryIncidentRepository, MemoryQueue, MemoryRecorder, cached},
        workers::{LocationChecker, TaskRegistry},
    };

    const USER: &str = "00000000-0000-0000-0000-000000000001";

    struct Harness {
        app: Router,
        cache: Arc<MemoryIncidentCache>,
        queue: Arc<MemoryQueue>,
        repo: Arc<MemoryIncidentRepository>,
        registry: TaskRegistry,
    }

    fn harness() -> Harness {
        let config = Config::from_lookup(|name| match name {
            "DATABASE_URL" => Some("postgres://localhost/test".into()),
            "REDIS_URL" => Some("redis://localhost".into()),
            "API_KEY" => Some("secret".into()),
            _ => None,
        })
        .unwrap();

        let cache = Arc::new(MemoryIncidentCache::with(vec![cached(10.0, 10.0, 5.0)]));
        let queue = Arc::new(MemoryQueue::default());
        let recorder = Arc::new(MemoryRecorder::default());
        let repo = Arc::new(MemoryIncidentRepository::default());
        let refresher = Arc::new(SnapshotRefresher::new(
            repo.clone(),
            cache.clone(),
            config.cache_ttl(),
        ));

        let mut registry = TaskRegistry::new(CancellationToken::new());
        let (checker, handle) = LocationChecker::new(cache.clone(), 2, 10, registry.token());
        checker.spawn(&mut registry);

        let state = AppState {
            config,
            location: Arc::new(LocationService::new(
                cache.clone(),
                recorder.clone(),
                queue.clone(),
            )),
            admin: Arc::new(AdminService::new(repo.clone(), refresher)),
            stats: Arc::new(StatsService::new(recorder)),
            checker: handle,
        };

        Harness {
            app: create_router(state),
            cache,
            queue,
            repo,
            registry,
        }
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn location_check_returns_hits_and_enqueues() {
        let h = harness();
        let body = format!(r#"{{"user_id":"{USER}","lat":10.0,"lng":10.01}}"#);
        let response = h
            .app
            .oneshot(json_request("POST", "/api/v1/location/check", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["code"], 0);
        assert_eq!(json["resp_data"]["incidents"].as_array().unwrap().len(), 1);
        assert_eq!(h.queue.len(), 1);
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn location_check_rejects_bad_coordinates() {
        let h = harness();
        let body = format!(r#"{{"user_id":"{USER}","lat":91.0,"lng":0.0}}"#);
        let response = h
            .app
            .oneshot(json_request("POST", "/api/v1/location/check", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], 1000);
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn location_check_maps_cache_outage_to_503() {
        let h = harness();
        h.cache.fail.store(true, Ordering::SeqCst);
        let body = format!(r#"{{"user_id":"{USER}","lat":0.0,"lng":0.0}}"#);
        let response = h
            .app
            .oneshot(json_request("POST", "/api/v1/location/check", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn nearby_returns_distances_from_pool() {
        let h = harness();
        let response = h
            .app
            .oneshot(json_request(
                "POST",
                "/api/v1/location/nearby",
                r#"{"lat":10.0,"lng":10.0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let hits = json["resp_data"].as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["distance_km"], 0.0);
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn admin_routes_require_api_key() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/incidents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn admin_create_refreshes_snapshot() {
        let h = harness();
        let mut request = json_request(
            "POST",
            "/api/v1/admin/incidents",
            r#"{"lat":1.0,"lng":2.0,"radius_km":3.0}"#,
        );
        request
            .headers_mut()
            .insert(API_KEY_HEADER, "secret".parse().unwrap());

        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.repo.incidents.lock().unwrap().len(), 1);
        let snapshot = h.cache.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].radius_km, 3.0);
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn admin_stats_validates_window() {
        let h = harness();
        let request = Request::builder()
            .uri("/api/v1/admin/stats?minutes=0")
            .header(API_KEY_HEADER, "secret")
            .body(Body::empty())
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        h.registry.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_incident_is_404() {
        let h = harness();
        let request = Request::builder()
            .uri(format!("/api/v1/admin/incidents/{}", uuid::Uuid::new_v4()))
            .header(API_KEY_HEADER, "secret")
            .body(Body::empty())
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        tokio::time::timeout(Duration::from_secs(1), h.registry.shutdown())
            .await
            .unwrap();
    }
}
