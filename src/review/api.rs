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

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

use crate::cmd::due::DueCard;
use crate::cmd::due::collect_due;
use crate::cmd::stats::Stats;
use crate::cmd::stats::collect_stats;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::ingest::attach_cards;
use crate::ingest::capture_item;
use crate::review::state::ServerState;
use crate::session::Progress;
use crate::types::hash::ItemId;
use crate::types::item::GeneratedCards;
use crate::types::item::Item;
use crate::types::item::ItemPage;
use crate::types::item::ItemQuery;
use crate::types::item::NewItem;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// An error rendered as a JSON body with a matching status code.
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ErrorReport> for AppError {
    fn from(value: ErrorReport) -> Self {
        let (status, code) = match value.kind() {
            ErrorKind::InvalidQuality | ErrorKind::InvalidInput => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
            ErrorKind::Persistence | ErrorKind::Other => {
                log::error!("{value}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code,
            message: value.message().to_string(),
        }
    }
}

pub async fn create_item(
    State(state): State<ServerState>,
    Json(new): Json<NewItem>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let item = capture_item(&state.db, new, state.clock.now())?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<ServerState>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<ItemPage>, AppError> {
    let page = state.db.list_items(&query)?;
    Ok(Json(page))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardsAdded {
    item_id: ItemId,
    added: usize,
}

pub async fn add_cards(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(generated): Json<GeneratedCards>,
) -> Result<(StatusCode, Json<CardsAdded>), AppError> {
    let item_id = ItemId::from_hex(&id)
        .map_err(|e| e.reclassify(ErrorKind::NotFound))?;
    let added = attach_cards(
        &state.db,
        &state.in_flight,
        item_id,
        generated,
        state.clock.now(),
    )?;
    Ok((StatusCode::CREATED, Json(CardsAdded { item_id, added })))
}

pub async fn due(State(state): State<ServerState>) -> Result<Json<Vec<DueCard>>, AppError> {
    let due = collect_due(&state.db, state.clock.now())?;
    Ok(Json(due))
}

pub async fn stats(State(state): State<ServerState>) -> Result<Json<Stats>, AppError> {
    let stats = collect_stats(&state.db, state.daily_goal, state.clock.now())?;
    Ok(Json(stats))
}

/// The progress of the review in course, or `null` when idle.
pub async fn session(State(state): State<ServerState>) -> Json<Option<Progress>> {
    let mutable = state.mutable.lock().unwrap();
    Json(mutable.session.progress())
}
