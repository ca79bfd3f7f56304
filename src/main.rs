use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use stages_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{
        auth::require_bearer_auth,
        rate_limit::{rps_middleware, RateLimiter},
        service_role::require_service_role,
    },
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    // Unauthenticated surface: catalog reads and the sign-in/sign-up pair.
    let public_api = Router::new()
        .route("/api/offers", get(routes::offer::list_offers))
        .route("/api/offers/:id", get(routes::offer::get_offer))
        .route("/api/companies", get(routes::company::list_companies))
        .route("/api/companies/:id", get(routes::company::get_company))
        .route(
            "/api/companies/:id/offers",
            get(routes::company::company_offers),
        )
        .route("/api/auth/sign-up", post(routes::auth::sign_up))
        .route("/api/auth/sign-in", post(routes::auth::sign_in))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::per_second(config.public_rps),
            rps_middleware,
        ));

    // Everything behind a bearer token. Paths shared with the public
    // surface carry disjoint methods, so the merge below is well-formed.
    let account_api = Router::new()
        .route("/api/auth/sign-out", post(routes::auth::sign_out))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/dashboard", get(routes::dashboard::dashboard))
        .route("/api/offers", post(routes::offer::create_offer))
        .route(
            "/api/offers/:id",
            patch(routes::offer::update_offer).delete(routes::offer::delete_offer),
        )
        .route("/api/companies", post(routes::company::create_company))
        .route(
            "/api/companies/:id",
            patch(routes::company::update_company).delete(routes::company::delete_company),
        )
        .route(
            "/api/offers/:id/application-status",
            get(routes::application::application_status),
        )
        .route(
            "/api/offers/:id/applications",
            get(routes::application::offer_applications).post(routes::application::apply),
        )
        .route("/api/applications", get(routes::application::my_applications))
        .route(
            "/api/applications/:id/status",
            patch(routes::application::update_application_status),
        )
        .layer(axum::middleware::from_fn(require_bearer_auth))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::per_second(config.account_rps),
            rps_middleware,
        ));

    // Privileged flow keyed by the service-role header, not a user session.
    let admin_api = Router::new()
        .route(
            "/api/admin/companies/:id",
            axum::routing::delete(routes::company::delete_company_admin),
        )
        .layer(axum::middleware::from_fn(require_service_role));

    info!("Serving uploads from: {}", config.uploads_dir);

    let app = base_routes
        .merge(public_api)
        .merge(account_api)
        .merge(admin_api)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(&config.uploads_dir),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
