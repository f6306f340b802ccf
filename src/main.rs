use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{Extension, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use coursework_rag_server::config::Settings;
use coursework_rag_server::handlers;
use coursework_rag_server::services::Services;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,coursework_rag_server=debug".to_string()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .init();

    info!("starting course-material rag core");

    let settings = Settings::load()?;
    info!("configuration loaded");

    let services = Arc::new(Services::build(settings).await?);
    info!("services initialized");

    let addr = SocketAddr::from((
        services.settings.host.parse::<std::net::IpAddr>()?,
        services.settings.port,
    ));

    let app = build_router(services);

    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(services: Arc<Services>) -> Router {
    let rag_routes = Router::new()
        .route("/rag/index", post(handlers::rag::index_handler))
        .route("/rag/collections", get(handlers::rag::list_collections_handler))
        .route("/rag/collections/{name}", get(handlers::rag::get_collection_handler))
        .route("/rag/collections/{name}", delete(handlers::rag::delete_collection_handler))
        .route("/rag/collections/{name}/count", get(handlers::rag::collection_count_handler))
        .route("/rag/documents/course/{course_id}", delete(handlers::rag::delete_by_course_handler))
        .route(
            "/rag/documents/material/{course_id}/{course_material_id}",
            delete(handlers::rag::delete_by_material_handler),
        );

    let conversation_routes = Router::new()
        .route("/conversation/chat", post(handlers::conversation::chat_handler))
        .route(
            "/conversation/conversations/{id}",
            delete(handlers::conversation::delete_conversation_handler),
        )
        .route("/conversation/engines", get(handlers::conversation::engines_handler))
        .route("/conversation/health", get(handlers::conversation::conversation_health_handler));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(rag_routes)
        .merge(conversation_routes)
        .layer(Extension(services))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(true)))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}
