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

use crate::db::Database;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::inflight::InFlight;
use crate::types::card::Card;
use crate::types::hash::ItemId;
use crate::types::item::GeneratedCards;
use crate::types::item::Item;
use crate::types::item::ItemOutput;
use crate::types::item::NewItem;
use crate::types::timestamp::Timestamp;

/// Store a newly captured item.
pub fn capture_item(db: &Database, new: NewItem, now: Timestamp) -> Fallible<Item> {
    let item = new
        .into_item(now)
        .map_err(|e| e.reclassify(ErrorKind::InvalidInput))?;
    db.insert_item(&item)?;
    log::info!("Captured item {}", item.id.short());
    Ok(item)
}

/// Attach the generated flashcards to an item. Each item is processed once:
/// an item that already has cards, or that is being processed by another
/// request, is rejected. Returns the number of cards added.
pub fn attach_cards(
    db: &Database,
    in_flight: &InFlight,
    item_id: ItemId,
    generated: GeneratedCards,
    now: Timestamp,
) -> Fallible<usize> {
    let _guard = in_flight.try_begin(item_id).ok_or_else(|| {
        ErrorReport::with_kind(
            ErrorKind::Conflict,
            format!("item is already being processed: {item_id}"),
        )
    })?;
    if db.get_item(item_id)?.is_none() {
        return Err(ErrorReport::with_kind(
            ErrorKind::NotFound,
            format!("item not found: {item_id}"),
        ));
    }
    if db.item_card_count(item_id)? > 0 {
        return Err(ErrorReport::with_kind(
            ErrorKind::InvalidInput,
            format!("item already processed: {item_id}"),
        ));
    }
    let tags: Vec<String> = generated
        .tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let category = generated
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let cards: Vec<Card> = generated
        .cards
        .into_iter()
        .filter(|c| !c.front.trim().is_empty() && !c.back.trim().is_empty())
        .map(|c| Card::new(item_id, c.front, c.back, tags.clone(), category.clone(), now))
        .collect();
    if cards.is_empty() {
        return Err(ErrorReport::with_kind(
            ErrorKind::InvalidInput,
            "no cards to add.",
        ));
    }
    let output = ItemOutput {
        summary: generated
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        tags,
        processed_at: now,
    };
    let added = db.add_cards(item_id, &output, &cards)?;
    log::info!("Added {added} cards to item {}", item_id.short());
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::item::GeneratedCard;

    fn now() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000).unwrap()
    }

    fn new_item() -> NewItem {
        NewItem {
            url: Some("https://example.com/venus".into()),
            title: Some("The Birth of Venus".into()),
            text: Some("Painted by Botticelli.".into()),
            source: Some("extension".into()),
        }
    }

    fn generated(fronts: &[&str]) -> GeneratedCards {
        GeneratedCards {
            summary: Some(" A painting by Botticelli. ".into()),
            tags: vec!["Art".into(), " ".into()],
            category: Some("Art".into()),
            cards: fronts
                .iter()
                .map(|f| GeneratedCard {
                    front: f.to_string(),
                    back: "Botticelli".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_capture_and_attach() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let item = capture_item(&db, new_item(), now())?;
        let added = attach_cards(
            &db,
            &InFlight::new(),
            item.id,
            generated(&["Who painted it?", "When?"]),
            now(),
        )?;
        assert_eq!(added, 2);
        let cards = db.scheduled_cards()?;
        assert_eq!(cards[0].card.tags(), &["Art".to_string()]);
        assert_eq!(cards[0].card.category(), Some("Art"));
        let stored = db.get_item(item.id)?.unwrap();
        assert_eq!(stored.summary.as_deref(), Some("A painting by Botticelli."));
        assert_eq!(stored.tags, vec!["Art".to_string()]);
        assert_eq!(stored.processed_at, Some(now()));
        Ok(())
    }

    #[test]
    fn test_duplicate_capture() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        capture_item(&db, new_item(), now())?;
        let err = capture_item(&db, new_item(), now()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        Ok(())
    }

    #[test]
    fn test_empty_capture() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let err = capture_item(&db, NewItem::default(), now()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        Ok(())
    }

    #[test]
    fn test_unknown_item() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let id = new_item().into_item(now())?.id;
        let err = attach_cards(&db, &InFlight::new(), id, generated(&["Q"]), now())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_already_processed() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let in_flight = InFlight::new();
        let item = capture_item(&db, new_item(), now())?;
        attach_cards(&db, &in_flight, item.id, generated(&["Q"]), now())?;
        let err = attach_cards(&db, &in_flight, item.id, generated(&["Q2"]), now())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(db.card_count()?, 1);
        Ok(())
    }

    #[test]
    fn test_in_flight() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let in_flight = InFlight::new();
        let item = capture_item(&db, new_item(), now())?;
        let guard = in_flight.try_begin(item.id).unwrap();
        let err = attach_cards(&db, &in_flight, item.id, generated(&["Q"]), now())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        drop(guard);
        attach_cards(&db, &in_flight, item.id, generated(&["Q"]), now())?;
        assert!(!in_flight.is_processing(item.id));
        Ok(())
    }

    #[test]
    fn test_no_usable_cards() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let item = capture_item(&db, new_item(), now())?;
        let err = attach_cards(&db, &InFlight::new(), item.id, generated(&["  "]), now())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        Ok(())
    }
}
