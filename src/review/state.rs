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

use crate::clock::Clock;
use crate::db::Database;
use crate::inflight::InFlight;
use crate::session::ReviewSession;
use crate::types::card::Card;
use crate::types::hash::CardId;

#[derive(Clone)]
pub struct ServerState {
    pub daily_goal: usize,
    pub db: Database,
    pub clock: Arc<dyn Clock>,
    pub in_flight: InFlight,
    pub mutable: Arc<Mutex<MutableState>>,
}

pub struct MutableState {
    pub session: ReviewSession,
    /// The content of the cards queued in the current session.
    pub cards: HashMap<CardId, Card>,
    pub reveal: bool,
    /// Shown once on the next page render.
    pub message: Option<String>,
}
