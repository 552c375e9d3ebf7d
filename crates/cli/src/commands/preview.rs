use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    handler::Handler,
    http::{StatusCode, Uri},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use sardis_site_core::AccordionState;
use sardis_site_generator::{build_page, page::html_escape};
use std::collections::HashMap;
use std::{net::SocketAddr, path::PathBuf};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::load_site;

const RELOAD_SCRIPT: &str = r#"    <div class="preview-badge">PREVIEW MODE - Live Reload Active</div>
    <script>
        // Hot reload via Server-Sent Events
        const eventSource = new EventSource('/_reload');
        eventSource.onmessage = () => {
            console.log('Reloading...');
            location.reload();
        };
        eventSource.onerror = () => {
            console.log('Preview server disconnected');
            eventSource.close();
        };
    </script>
"#;

#[derive(Clone)]
struct AppState {
    site_path: PathBuf,
    reload_tx: broadcast::Sender<()>,
}

/// Start preview server with hot reload for local development.
///
/// This command:
/// - Validates and loads site.toml
/// - Renders each page on request from the current site.toml
/// - Serves files from static/ at the same paths `build` copies them to
/// - Watches for file changes and triggers hot reload
///
/// # Arguments
///
/// * `path` - Path to site directory containing site.toml
/// * `port` - Port to serve on (default: 8080)
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("🌐 Starting preview server...");
    println!("   Site: {}", path.display());

    let site = load_site(&path)?;

    println!("   ✓ Loaded: {}", site.info.name);
    println!("   ✓ Pages: {}", sardis_site_generator::routes(&site).len());

    // Create broadcast channel for reload events
    let (reload_tx, _) = broadcast::channel::<()>(100);

    let app = app(path.clone(), reload_tx.clone());

    // Start file watcher
    let watcher_path = path.clone();
    let watcher_tx = reload_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_files(watcher_path, watcher_tx).await {
            warn!(error = %e, "file watcher stopped");
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Static files win over pages, matching `build`, which copies static/
/// over the generated output.
fn app(site_path: PathBuf, reload_tx: broadcast::Sender<()>) -> Router {
    let state = AppState {
        site_path: site_path.clone(),
        reload_tx,
    };
    let pages = page_handler.with_state(state.clone());

    Router::new()
        .route("/_reload", get(sse_handler))
        .fallback_service(ServeDir::new(site_path.join("static")).fallback(pages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch for file changes and trigger reload
async fn watch_files(path: PathBuf, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                // Filter out temporary files and hidden files
                if event.paths.iter().any(|p| {
                    let filename = p.file_name().unwrap_or_default().to_string_lossy();
                    !filename.starts_with('.') && !filename.ends_with('~')
                }) {
                    println!("   📝 File changed, reloading...");
                    let _ = reload_tx.send(());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Render any page route from the current site.toml.
///
/// `?category=<key>` applies the category filter on listing pages.
async fn page_handler(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let site_path = state.site_path.clone();
    let site = match tokio::task::spawn_blocking(move || load_site(&site_path)).await {
        Ok(Ok(site)) => site,
        Ok(Err(e)) => {
            return error_page(StatusCode::INTERNAL_SERVER_ERROR, "Configuration Error", &format!("{:#}", e));
        }
        Err(e) => {
            return error_page(StatusCode::INTERNAL_SERVER_ERROR, "Preview Error", &e.to_string());
        }
    };

    let mut accordion = AccordionState::new();
    if let Some(key) = params.get("category") {
        match site.taxonomy.by_key(key) {
            Some(category) => accordion.set_filter(Some(category)),
            None => {
                return error_page(
                    StatusCode::BAD_REQUEST,
                    "Unknown Category",
                    &format!("No category with key '{}'", key),
                );
            }
        }
    }

    let rendered = build_page(&site, uri.path(), &accordion)
        .and_then(|page| page.map(|p| p.render(&site.info, Some(RELOAD_SCRIPT))).transpose());

    match rendered {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => error_page(
            StatusCode::NOT_FOUND,
            "Not Found",
            &format!("No page at {}", uri.path()),
        ),
        Err(e) => error_page(StatusCode::INTERNAL_SERVER_ERROR, "Content Error", &e.to_string()),
    }
}

fn error_page(status: StatusCode, title: &str, detail: &str) -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html><head><title>{title}</title></head><body>
<h1>{title}</h1>
<pre>{detail}</pre>
{script}</body></html>"#,
        title = html_escape(title),
        detail = html_escape(detail),
        script = RELOAD_SCRIPT,
    );
    (status, Html(html)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SITE_TOML;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SITE: &str = r##"
[site]
name = "Sardis"
base_url = "https://sardis.sh"
description = "Payments for AI agents"
logo = "/logo.png"

[[category]]
label = "General"
color = "slate"

[[faq]]
category = "General"
question = "What is Sardis?"
answer = "A payment layer."
"##;

    fn site_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SITE_TOML), SITE).unwrap();
        let images = dir.path().join("static").join("images");
        fs::create_dir_all(&images).unwrap();
        fs::write(dir.path().join("static").join("logo.png"), b"logo").unwrap();
        fs::write(images.join("og.png"), b"og").unwrap();
        dir
    }

    async fn fetch(dir: &TempDir, uri: &str) -> (StatusCode, String) {
        let (reload_tx, _) = broadcast::channel(1);
        let response = app(dir.path().to_path_buf(), reload_tx)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_static_files_served_at_build_paths() {
        let dir = site_dir();

        assert_eq!(fetch(&dir, "/logo.png").await, (StatusCode::OK, "logo".to_string()));
        assert_eq!(fetch(&dir, "/images/og.png").await, (StatusCode::OK, "og".to_string()));
    }

    #[tokio::test]
    async fn test_pages_render_with_reload_script() {
        let dir = site_dir();

        let (status, html) = fetch(&dir, "/faq").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#""@type":"FAQPage""#));
        assert!(html.contains("/_reload"));

        let (status, html) = fetch(&dir, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#""logo":"https://sardis.sh/logo.png""#));
    }

    #[tokio::test]
    async fn test_category_filter() {
        let dir = site_dir();

        assert_eq!(fetch(&dir, "/faq?category=general").await.0, StatusCode::OK);
        let (status, html) = fetch(&dir, "/faq?category=nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("No category with key &#x27;nope&#x27;"));
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let dir = site_dir();
        assert_eq!(fetch(&dir, "/pricing").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_broken_site_toml_is_server_error() {
        let dir = site_dir();
        fs::write(dir.path().join(SITE_TOML), "[site\n").unwrap();

        let (status, html) = fetch(&dir, "/faq").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("Configuration Error"));
    }
}
