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
use crate::due::select_due;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

pub fn print_stats(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let stats = collect_stats(&coll.db, coll.config.daily_goal, Timestamp::now())?;
    let stats_json = serde_json::to_string_pretty(&stats)?;
    println!("{}", stats_json);
    Ok(())
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub item_count: usize,
    pub card_count: usize,
    pub due_count: usize,
    /// Cards with at least one successful recall since their last lapse.
    pub learned_count: usize,
    pub reviewed_today: usize,
    pub daily_goal: usize,
}

pub fn collect_stats(db: &Database, daily_goal: usize, now: Timestamp) -> Fallible<Stats> {
    let cards = db.scheduled_cards()?;
    Ok(Stats {
        item_count: db.item_count()?,
        card_count: db.card_count()?,
        due_count: select_due(&cards, now).len(),
        learned_count: cards.iter().filter(|sc| sc.schedule.repetitions > 0).count(),
        reviewed_today: db.rated_since(now.start_of_day())?,
        daily_goal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflight::InFlight;
    use crate::ingest::attach_cards;
    use crate::ingest::capture_item;
    use crate::store::ScheduleStore;
    use crate::types::item::GeneratedCard;
    use crate::types::item::GeneratedCards;
    use crate::types::item::NewItem;
    use crate::types::quality::Quality;

    #[test]
    fn test_collect_stats() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let then = Timestamp::from_millis(1_700_000_000_000)?;
        let now = then.plus_days(3);
        let item = capture_item(
            &db,
            NewItem {
                title: Some("Derivatives".into()),
                ..Default::default()
            },
            then,
        )?;
        let generated = GeneratedCards {
            summary: None,
            tags: vec![],
            category: None,
            cards: vec![
                GeneratedCard {
                    front: "d/dx sin(x)".into(),
                    back: "cos(x)".into(),
                },
                GeneratedCard {
                    front: "d/dx cos(x)".into(),
                    back: "-sin(x)".into(),
                },
            ],
        };
        attach_cards(&db, &InFlight::new(), item.id, generated, then)?;
        let first = db.scheduled_cards()?[0].clone();
        let mut learned = first.schedule;
        learned.repetitions = 1;
        learned.next_review_at = now.plus_days(1);
        db.put_rated(first.card.id(), &learned, Quality::Easy, now)?;
        // A rating from an earlier day.
        let second = db.scheduled_cards()?[1].clone();
        db.put_rated(second.card.id(), &second.schedule, Quality::Again, then)?;

        let stats = collect_stats(&db, 20, now)?;
        assert_eq!(
            stats,
            Stats {
                item_count: 1,
                card_count: 2,
                due_count: 1,
                learned_count: 1,
                reviewed_today: 1,
                daily_goal: 20,
            }
        );
        Ok(())
    }
}
