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

use crate::types::card::Card;
use crate::types::scheduled_card::ScheduledCard;
use crate::types::timestamp::Timestamp;

/// Find the cards due at `now`, in the order they were given. The database
/// hands cards over in creation order, so that is the review order. No
/// weighting by how overdue a card is.
pub fn select_due(cards: &[ScheduledCard], now: Timestamp) -> Vec<&Card> {
    select_due_scheduled(cards, now)
        .into_iter()
        .map(|sc| &sc.card)
        .collect()
}

/// Like [`select_due`], keeping each card's schedule.
pub fn select_due_scheduled(cards: &[ScheduledCard], now: Timestamp) -> Vec<&ScheduledCard> {
    cards
        .iter()
        .filter(|sc| sc.schedule.is_due(now))
        .collect()
}
