use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use sitemap_kit_core::SitemapConfig;
use sitemap_kit_generator::{SitemapAssembler, SitemapOutput, render_robots, render_sitemap_index, render_urlset};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{ConfigArgs, build_assembler};

#[derive(Clone)]
struct AppState {
    assembler: Arc<SitemapAssembler>,
}

/// Serve the sitemap the way the site's route handler does.
///
/// This command:
/// - Assembles `/sitemap.xml` per request through one shared category cache
/// - Answers with an index document when the URL count forces a split
/// - Serves the chunk files written to the public directory
/// - Serves `/robots.txt`
///
/// # Arguments
///
/// * `args` - Config file and URL overrides
/// * `port` - Port to serve on (default: 8080)
pub async fn run(args: ConfigArgs, port: u16) -> Result<()> {
    let config = args.resolve()?;

    println!("🌐 Starting sitemap server...");
    println!("   Site: {}", config.site.base_url);
    println!("   API: {}", config.api.base_url);
    println!("   Cache TTL: {}s", config.cache.ttl.as_secs());

    let app = router(&config)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Sitemap ready at: http://localhost:{}/sitemap.xml", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(config: &SitemapConfig) -> Result<Router> {
    let state = AppState {
        assembler: Arc::new(build_assembler(config)?),
    };

    Ok(Router::new()
        .route("/sitemap.xml", get(sitemap_handler))
        .route("/robots.txt", get(robots_handler))
        .fallback_service(ServeDir::new(&config.site.public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn sitemap_handler(State(state): State<AppState>) -> Response {
    match state.assembler.assemble().await {
        Ok(assembly) => {
            let xml = match &assembly.output {
                SitemapOutput::Complete(entries) => render_urlset(entries),
                SitemapOutput::Split(index) => render_sitemap_index(index),
            };
            ([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "sitemap generation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Sitemap generation failed: {}", e)).into_response()
        }
    }
}

/// `/sitemap.xml` always answers with a document here, so robots.txt never
/// needs to name the index file.
async fn robots_handler(State(state): State<AppState>) -> Response {
    let robots = render_robots(state.assembler.base_url(), false);
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], robots).into_response()
}
