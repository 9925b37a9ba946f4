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

use serde::Serialize;

use crate::collection::Collection;
use crate::db::Database;
use crate::due::select_due_scheduled;
use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::schedule::CardScheduleState;
use crate::types::timestamp::Timestamp;

pub fn print_due(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let due = collect_due(&coll.db, Timestamp::now())?;
    let json = serde_json::to_string_pretty(&due)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCard {
    card: Card,
    schedule: CardScheduleState,
    days_until_review: i64,
}

/// The due cards, in review order.
pub fn collect_due(db: &Database, now: Timestamp) -> Fallible<Vec<DueCard>> {
    let cards = db.scheduled_cards()?;
    let due = select_due_scheduled(&cards, now)
        .into_iter()
        .map(|sc| DueCard {
            days_until_review: sc.schedule.days_until_review(now),
            card: sc.card.clone(),
            schedule: sc.schedule,
        })
        .collect();
    Ok(due)
}
