use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oauth2_link_axum::{O2L_ROUTE_PREFIX, oauth2_link_router};

mod handlers;
mod server;

use crate::{
    handlers::{index, protected},
    server::spawn_http_server,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,oauth2_link=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ctx = oauth2_link_axum::init().await?;

    let app = Router::new()
        .route("/", get(index))
        .route("/protected", get(protected))
        .with_state(ctx.clone())
        .nest(O2L_ROUTE_PREFIX.as_str(), oauth2_link_router(ctx));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    spawn_http_server(port, app).await??;
    Ok(())
}
