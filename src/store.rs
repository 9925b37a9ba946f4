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

use crate::error::Fallible;
use crate::types::hash::CardId;
use crate::types::quality::Quality;
use crate::types::schedule::CardScheduleState;
use crate::types::timestamp::Timestamp;

/// Where per-card scheduling state lives. Writes are per card: each `put`
/// either stores the whole state or fails without changing anything.
pub trait ScheduleStore {
    /// The card's current state, or `None` if the card is unknown.
    fn get(&self, card_id: CardId) -> Fallible<Option<CardScheduleState>>;

    /// Replace the card's state. Fails if the card is unknown.
    fn put(&self, card_id: CardId, state: &CardScheduleState) -> Fallible<()>;

    /// Store the state a rating produced. Stores that keep a review log
    /// write the log entry together with the state, or neither.
    fn put_rated(
        &self,
        card_id: CardId,
        state: &CardScheduleState,
        _quality: Quality,
        _reviewed_at: Timestamp,
    ) -> Fallible<()> {
        self.put(card_id, state)
    }
}
