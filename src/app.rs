use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    middleware::auth::JwtSecret,
    routes,
    services::{blob::BlobStore, menu::MenuRepository},
    store::DocumentStore,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub menus: MenuRepository,
    /// Contact-form rate limiting is skipped when Redis is unavailable.
    pub redis: Option<redis::aio::MultiplexedConnection>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        redis: Option<redis::aio::MultiplexedConnection>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            menus: MenuRepository::new(store.clone()),
            store,
            blobs,
            redis,
            config,
        }
    }
}

/// Whether a browser origin may call the API: the site itself, its
/// subdomains, or a local dev server on any port.
pub fn origin_allowed(origin: &str, base: &str) -> bool {
    for local in ["http://localhost", "http://127.0.0.1"] {
        if let Some(rest) = origin.strip_prefix(local) {
            if rest.is_empty() || rest.starts_with(':') {
                return true;
            }
        }
    }
    if origin == base {
        return true;
    }
    let Some((scheme, rest)) = base.split_once("://") else {
        return false;
    };
    let host = rest.split('/').next().unwrap_or(rest);
    let domain = host.split(':').next().unwrap_or(host);
    if domain.is_empty() {
        return false;
    }
    origin
        .strip_prefix(scheme)
        .and_then(|o| o.strip_prefix("://"))
        .map(|o| o.split(':').next().unwrap_or(o))
        .is_some_and(|o| o.ends_with(&format!(".{domain}")))
}

pub fn build_router(state: AppState) -> Router {
    let base = state.config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin
            .to_str()
            .map(|o| origin_allowed(o, &base))
            .unwrap_or(false)
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());
    let media = ServeDir::new(&state.config.media_dir);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Public site
        .route("/menus/current", get(routes::menu::get_current))
        .route("/schedule", get(routes::schedule::get_schedule))
        .route("/contacts", post(routes::contact::submit_contact))
        .route("/news", get(routes::news::list_published))
        .route("/news/{id}", get(routes::news::get_published))
        .route("/announcements", get(routes::announcements::list_published))
        .route("/announcements/{id}", get(routes::announcements::get_published))
        .route("/settings/general", get(routes::settings::get_general))
        .route("/settings/ws", get(routes::websocket::settings_ws))
        .nest_service("/media/files", media)
        // Admin panel: menus
        .route("/admin/menus", get(routes::menu::get_month))
        .route("/admin/menus/week", put(routes::menu::save_week))
        .route(
            "/admin/menus/attachment",
            get(routes::menu::get_attachment)
                .post(routes::menu::upload_attachment)
                .delete(routes::menu::delete_attachment),
        )
        // Admin panel: schedule
        .route("/admin/schedule", put(routes::schedule::replace_schedule))
        // Admin panel: contact leads
        .route("/admin/contacts", get(routes::contact::list_contacts))
        .route("/admin/contacts/stats", get(routes::contact::contact_stats))
        .route("/admin/contacts/ws", get(routes::websocket::contacts_ws))
        .route("/admin/contacts/{id}", delete(routes::contact::delete_contact))
        .route("/admin/contacts/{id}/status", post(routes::contact::update_status))
        // Admin panel: news
        .route(
            "/admin/news",
            get(routes::news::list_all).post(routes::news::create),
        )
        .route("/admin/news/ws", get(routes::websocket::news_ws))
        .route("/admin/news/cover", post(routes::news::upload_cover))
        .route("/admin/news/images", post(routes::news::upload_content_image))
        .route(
            "/admin/news/{id}",
            put(routes::news::update).delete(routes::news::delete),
        )
        // Admin panel: announcements
        .route(
            "/admin/announcements",
            get(routes::announcements::list_all).post(routes::announcements::create),
        )
        .route("/admin/announcements/ws", get(routes::websocket::announcements_ws))
        .route(
            "/admin/announcements/images",
            post(routes::announcements::upload_image),
        )
        .route(
            "/admin/announcements/{id}",
            put(routes::announcements::update).delete(routes::announcements::delete),
        )
        // Admin panel: settings
        .route("/admin/settings/general", put(routes::settings::update_general))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Monthly menu sheets are scans or PDFs; 25 MB is plenty.
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        models::auth::{Claims, StaffRole},
        services::blob::LocalBlobStore,
        store::MemoryDocumentStore,
    };

    const SECRET: &str = "test-secret";

    fn test_config() -> Config {
        Config {
            database_url: None,
            redis_url: "redis://127.0.0.1:6379".into(),
            jwt_secret: SECRET.into(),
            media_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            public_base_url: "http://localhost:8080".into(),
            host: "127.0.0.1".into(),
            port: 0,
            app_base_url: "http://localhost".into(),
            contact_rate_limit: 5,
        }
    }

    fn test_app() -> (Arc<MemoryDocumentStore>, Router) {
        let config = Arc::new(test_config());
        let store = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(LocalBlobStore::new(&config.media_dir, &config.public_base_url));
        let state = AppState::new(store.clone(), blobs, None, config);
        (store, build_router(state))
    }

    fn bearer(role: StaffRole) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "staff-1".into(),
            email: None,
            role,
            exp: (now + 600) as usize,
            iat: now as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_store_state() {
        let (store, app) = test_app();
        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        store.set_offline(true);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let (_, app) = test_app();
        let response = app
            .oneshot(
                Request::get("/admin/menus?year=2024&month=6")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn public_menu_falls_back_to_sample_week() {
        let (_, app) = test_app();
        let response = app
            .oneshot(Request::get("/menus/current").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["isSample"], json!(true));
        assert_eq!(body["days"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn saved_week_shows_up_in_month_view() {
        let (_, app) = test_app();
        let days: Vec<Value> = (2..=6)
            .map(|d| json!({ "dayOfWeek": d, "mainMeal": format!("Món {d}") }))
            .collect();
        let payload = json!({ "year": 2024, "month": 6, "week": 2, "days": days });

        let response = app
            .clone()
            .oneshot(
                Request::put("/admin/menus/week")
                    .header("Authorization", bearer(StaffRole::Staff))
                    .header("Content-Type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["days"][0]["id"], json!("menu_2024_6_week2_day2"));
        assert_eq!(body["days"][0]["date"], json!("10/06"));
        assert_eq!(body["notice"]["level"], json!("success"));

        let response = app
            .oneshot(
                Request::get("/admin/menus?year=2024&month=6")
                    .header("Authorization", bearer(StaffRole::Staff))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let week2 = &body["weeks"][1];
        assert_eq!(week2["week"], json!(2));
        assert_eq!(week2["days"][4]["mainMeal"], json!("Món 6"));
    }

    #[tokio::test]
    async fn invalid_week_is_a_bad_request() {
        let (_, app) = test_app();
        let payload = json!({ "year": 2024, "month": 6, "week": 5, "days": [] });
        let response = app
            .oneshot(
                Request::put("/admin/menus/week")
                    .header("Authorization", bearer(StaffRole::Staff))
                    .header("Content-Type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_admins_delete_contacts() {
        let (_, app) = test_app();
        let lead = json!({ "parentName": "Chị Lan", "phone": "0901234567" });
        let response = app
            .clone()
            .oneshot(
                Request::post("/contacts")
                    .header("Content-Type", "application/json")
                    .body(Body::from(lead.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let delete = |role| {
            Request::delete(format!("/admin/contacts/{id}"))
                .header("Authorization", bearer(role))
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(delete(StaffRole::Staff)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = app.oneshot(delete(StaffRole::Admin)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    fn media_app() -> (std::path::PathBuf, Router) {
        let sandbox = std::env::temp_dir().join(format!("vanganh-media-{}", uuid::Uuid::new_v4()));
        let root = sandbox.join("media");
        std::fs::create_dir_all(root.join("menus")).unwrap();
        std::fs::write(root.join("menus/june.pdf"), b"%PDF-1.4 june").unwrap();
        std::fs::write(sandbox.join("secret.txt"), b"top secret").unwrap();

        let mut config = test_config();
        config.media_dir = root.to_string_lossy().into_owned();
        let config = Arc::new(config);
        let store = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(LocalBlobStore::new(&config.media_dir, &config.public_base_url));
        let state = AppState::new(store, blobs, None, config);
        (sandbox, build_router(state))
    }

    #[tokio::test]
    async fn media_files_are_served_from_the_media_dir() {
        let (sandbox, app) = media_app();
        let response = app
            .oneshot(
                Request::get("/media/files/menus/june.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/pdf");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"%PDF-1.4 june");
        std::fs::remove_dir_all(sandbox).ok();
    }

    #[tokio::test]
    async fn missing_media_file_is_not_found() {
        let (sandbox, app) = media_app();
        let response = app
            .oneshot(
                Request::get("/media/files/menus/july.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        std::fs::remove_dir_all(sandbox).ok();
    }

    #[tokio::test]
    async fn media_paths_cannot_leave_the_media_dir() {
        let (sandbox, app) = media_app();
        for path in ["/media/files/../secret.txt", "/media/files/menus/../../secret.txt"] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
        std::fs::remove_dir_all(sandbox).ok();
    }

    #[tokio::test]
    async fn media_range_request_returns_partial_content() {
        let (sandbox, app) = media_app();
        let response = app
            .oneshot(
                Request::get("/media/files/menus/june.pdf")
                    .header("Range", "bytes=0-3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()["content-range"], "bytes 0-3/13");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"%PDF");
        std::fs::remove_dir_all(sandbox).ok();
    }

    #[test]
    fn site_and_subdomains_are_allowed_origins() {
        let base = "https://vanganh.edu.vn";
        assert!(origin_allowed("https://vanganh.edu.vn", base));
        assert!(origin_allowed("https://admin.vanganh.edu.vn", base));
        assert!(!origin_allowed("https://evilvanganh.edu.vn", base));
        assert!(!origin_allowed("https://vanganh.edu.vn.evil.com", base));
        assert!(!origin_allowed("http://admin.vanganh.edu.vn", base));
    }

    #[test]
    fn local_dev_servers_are_allowed_on_any_port() {
        let base = "https://vanganh.edu.vn";
        assert!(origin_allowed("http://localhost", base));
        assert!(origin_allowed("http://localhost:5173", base));
        assert!(origin_allowed("http://127.0.0.1:3000", base));
        assert!(!origin_allowed("http://localhost.evil.com", base));
        assert!(!origin_allowed("http://127.0.0.1.nip.io", base));
    }

    #[tokio::test]
    async fn cors_preflight_echoes_allowed_origin_only() {
        let (_, app) = test_app();
        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/news")
                .header("Origin", origin)
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(preflight("http://localhost:5173")).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
        let response = app.oneshot(preflight("http://localhost.evil.com")).await.unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn public_news_only_lists_published_articles() {
        let (_, app) = test_app();
        for (title, status) in [("Ngày hội trăng rằm", "active"), ("Bản nháp", "hidden")] {
            let body = json!({ "title": title, "summary": "", "content": "<p></p>", "status": status });
            let response = app
                .clone()
                .oneshot(
                    Request::post("/admin/news")
                        .header("Authorization", bearer(StaffRole::Staff))
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(Request::get("/news").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Ngày hội trăng rằm"]);
        assert_eq!(body[0]["tag"], json!("Hoạt động"));

        let response = app
            .oneshot(
                Request::get("/admin/news")
                    .header("Authorization", bearer(StaffRole::Staff))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn writing_news_requires_a_token() {
        let (_, app) = test_app();
        let response = app
            .oneshot(
                Request::post("/admin/news")
                    .header("Content-Type", "application/json")
                    .body(Body::from(json!({ "title": "x" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_announcement_is_hidden_from_parents() {
        let (_, app) = test_app();
        let body = json!({ "title": "Nghỉ lễ 2/9", "summary": "", "content": "", "status": "expired" });
        let response = app
            .clone()
            .oneshot(
                Request::post("/admin/announcements")
                    .header("Authorization", bearer(StaffRole::Staff))
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(Request::get("/announcements").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!([]));
        let response = app
            .oneshot(
                Request::get(format!("/announcements/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn general_settings_are_public_but_admin_edited() {
        let (_, app) = test_app();
        let response = app
            .clone()
            .oneshot(Request::get("/settings/general").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["schoolName"],
            json!("Trường Mẫu Giáo Vàng Anh")
        );

        let update = |role| {
            Request::put("/admin/settings/general")
                .header("Authorization", bearer(role))
                .header("Content-Type", "application/json")
                .body(Body::from(json!({ "hotline": "028 3822 0000" }).to_string()))
                .unwrap()
        };
        let response = app.clone().oneshot(update(StaffRole::Staff)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = app.clone().oneshot(update(StaffRole::Admin)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/settings/general").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["hotline"], json!("028 3822 0000"));
        assert_eq!(body["schoolName"], json!("Trường Mẫu Giáo Vàng Anh"));
    }
}
