// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::clock::Clock;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::inflight::InFlight;
use crate::review::api;
use crate::review::get::get_handler;
use crate::review::post::post_handler;
use crate::review::state::MutableState;
use crate::review::state::ServerState;
use crate::session::ReviewSession;

pub async fn start_server(
    coll: Collection,
    port: u16,
    open_browser: bool,
    clock: Arc<dyn Clock>,
) -> Fallible<()> {
    let scheduler = coll.config.scheduler();
    log::debug!(
        "Serving {} with pass threshold {}.",
        coll.directory.display(),
        scheduler.pass_threshold()
    );
    let state = ServerState {
        daily_goal: coll.config.daily_goal,
        db: coll.db,
        clock,
        in_flight: InFlight::new(),
        mutable: Arc::new(Mutex::new(MutableState {
            session: ReviewSession::new(scheduler),
            cards: HashMap::new(),
            reveal: false,
            message: None,
        })),
    };
    let app = Router::new();
    let app = app.route("/", get(get_handler));
    let app = app.route("/", post(post_handler));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.route("/api/items", get(api::list_items));
    let app = app.route("/api/items", post(api::create_item));
    let app = app.route("/api/items/{id}/cards", post(api::add_cards));
    let app = app.route("/api/due", get(api::due));
    let app = app.route("/api/stats", get(api::stats));
    let app = app.route("/api/session", get(api::session));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{port}");

    // Start a separate task to open the browser.
    if open_browser {
        let url = format!("http://{bind}/");
        let bind = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&bind).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            let _ = open::that(url);
        });
    }

    // Start the server.
    log::info!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
