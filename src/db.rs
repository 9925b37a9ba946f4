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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::session::SessionSummary;
use crate::store::ScheduleStore;
use crate::types::card::Card;
use crate::types::hash::CardId;
use crate::types::hash::ItemId;
use crate::types::item::Item;
use crate::types::item::ItemOutput;
use crate::types::item::ItemPage;
use crate::types::item::ItemQuery;
use crate::types::item::Pagination;
use crate::types::quality::Quality;
use crate::types::schedule::CardScheduleState;
use crate::types::scheduled_card::ScheduledCard;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Store a newly captured item. Fails if an item with the same content
    /// already exists.
    pub fn insert_item(&self, item: &Item) -> Fallible<()> {
        log::debug!("Adding new item: {}", item.id);
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        if item_exists(&tx, item.id)? {
            return Err(ErrorReport::with_kind(
                ErrorKind::Conflict,
                format!("item already exists: {}", item.id),
            ));
        }
        let sql = "insert into items (item_id, created_at, url, title, raw_text, source) values (?, ?, ?, ?, ?, ?);";
        tx.execute(
            sql,
            (
                item.id,
                item.created_at,
                &item.url,
                &item.title,
                &item.raw_text,
                &item.source,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_item(&self, item_id: ItemId) -> Fallible<Option<Item>> {
        let conn = self.acquire();
        let sql = format!("{ITEM_SELECT} where i.item_id = ?;");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([item_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_item(row)?)),
            None => Ok(None),
        }
    }

    /// Items matching the query, newest first.
    pub fn list_items(&self, query: &ItemQuery) -> Fallible<ItemPage> {
        let limit = query.limit();
        let offset = query.offset.unwrap_or(0);
        let pattern = query.text().map(|q| format!("%{q}%"));
        let conn = self.acquire();
        let sql = format!(
            "{ITEM_SELECT} where (?1 is null or i.title like ?1 or i.raw_text like ?1) and (?2 is null or exists (select 1 from json_each(o.tags) where json_each.value = ?2)) order by i.created_at desc, i.rowid desc limit ?3 offset ?4;"
        );
        let mut stmt = conn.prepare(&sql)?;
        // One extra row tells whether there is another page.
        let mut rows = stmt.query((pattern, query.tag(), limit as i64 + 1, offset as i64))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(read_item(row)?);
        }
        let has_more = items.len() > limit;
        items.truncate(limit);
        Ok(ItemPage {
            items,
            pagination: Pagination {
                limit,
                offset,
                has_more,
            },
        })
    }

    /// The number of cards generated from an item.
    pub fn item_card_count(&self, item_id: ItemId) -> Fallible<usize> {
        let conn = self.acquire();
        let sql = "select count(*) from cards where item_id = ?;";
        let count: i64 = conn.query_row(sql, [item_id], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Add cards to an existing item, each with a fresh schedule, and store
    /// the model's summary and tags for it. Cards that already exist are
    /// skipped. Returns the number of cards added.
    pub fn add_cards(
        &self,
        item_id: ItemId,
        output: &ItemOutput,
        cards: &[Card],
    ) -> Fallible<usize> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        if !item_exists(&tx, item_id)? {
            return fail(format!("no such item: {item_id}"));
        }
        let tags = serde_json::to_string(&output.tags)?;
        let sql = "insert into item_outputs (item_id, summary, tags, processed_at) values (?, ?, ?, ?) on conflict (item_id) do update set summary = excluded.summary, tags = excluded.tags, processed_at = excluded.processed_at;";
        tx.execute(
            sql,
            (item_id, &output.summary, tags, output.processed_at),
        )?;
        let mut added = 0;
        for card in cards {
            if card.item_id() != item_id {
                return fail("card belongs to a different item.");
            }
            if insert_card(&tx, card)? {
                let schedule = CardScheduleState::new(card.created_at());
                insert_schedule(&tx, card.id(), &schedule)?;
                added += 1;
            } else {
                log::debug!("Skipping duplicate card: {}", card.id().short());
            }
        }
        tx.commit()?;
        Ok(added)
    }

    /// Every card with its schedule, in creation order.
    pub fn scheduled_cards(&self) -> Fallible<Vec<ScheduledCard>> {
        let conn = self.acquire();
        let sql = "select c.card_id, c.item_id, c.front, c.back, c.tags, c.category, c.created_at, s.interval_days, s.repetitions, s.ease_factor, s.next_review_at from cards c inner join schedules s on s.card_id = c.card_id order by c.created_at, c.rowid;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            let tags: String = row.get(4)?;
            let tags: Vec<String> = serde_json::from_str(&tags)?;
            let card = Card::from_parts(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                tags,
                row.get(5)?,
                row.get(6)?,
            );
            let schedule = read_schedule(row, 7)?;
            cards.push(ScheduledCard { card, schedule });
        }
        Ok(cards)
    }

    pub fn item_count(&self) -> Fallible<usize> {
        self.count("select count(*) from items;")
    }

    pub fn card_count(&self) -> Fallible<usize> {
        self.count("select count(*) from cards;")
    }

    /// Record a finished or abandoned review session.
    pub fn save_session(&self, summary: &SessionSummary) -> Fallible<()> {
        let conn = self.acquire();
        let sql =
            "insert into sessions (started_at, ended_at, total, rated) values (?, ?, ?, ?);";
        conn.execute(
            sql,
            (
                summary.started_at,
                summary.ended_at,
                summary.total as i64,
                summary.rated as i64,
            ),
        )?;
        Ok(())
    }

    /// The number of ratings made at or after `since`, whether or not their
    /// session has ended.
    pub fn rated_since(&self, since: Timestamp) -> Fallible<usize> {
        let conn = self.acquire();
        let mut stmt = conn.prepare("select reviewed_at from reviews;")?;
        let mut rows = stmt.query([])?;
        let mut total = 0;
        while let Some(row) = rows.next()? {
            let reviewed_at: Timestamp = row.get(0)?;
            if reviewed_at >= since {
                total += 1;
            }
        }
        Ok(total)
    }

    fn count(&self, sql: &str) -> Fallible<usize> {
        let conn = self.acquire();
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

impl ScheduleStore for Database {
    fn get(&self, card_id: CardId) -> Fallible<Option<CardScheduleState>> {
        let conn = self.acquire();
        let sql = "select interval_days, repetitions, ease_factor, next_review_at from schedules where card_id = ?;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([card_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_schedule(row, 0)?)),
            None => Ok(None),
        }
    }

    fn put(&self, card_id: CardId, state: &CardScheduleState) -> Fallible<()> {
        let conn = self.acquire();
        update_schedule(&conn, card_id, state)
    }

    fn put_rated(
        &self,
        card_id: CardId,
        state: &CardScheduleState,
        quality: Quality,
        reviewed_at: Timestamp,
    ) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        update_schedule(&tx, card_id, state)?;
        let sql = "insert into reviews (card_id, quality, reviewed_at, interval_days, ease_factor, next_review_at) values (?, ?, ?, ?, ?, ?);";
        tx.execute(
            sql,
            (
                card_id,
                quality.as_str(),
                reviewed_at,
                state.interval_days,
                state.ease_factor,
                state.next_review_at,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }
}

const ITEM_SELECT: &str = "select i.item_id, i.created_at, i.url, i.title, i.raw_text, i.source, o.summary, o.tags, o.processed_at from items i left join item_outputs o on o.item_id = i.item_id";

fn read_item(row: &Row) -> Fallible<Item> {
    let tags: Option<String> = row.get(7)?;
    let tags: Vec<String> = match tags {
        Some(tags) => serde_json::from_str(&tags)?,
        None => Vec::new(),
    };
    Ok(Item {
        id: row.get(0)?,
        created_at: row.get(1)?,
        url: row.get(2)?,
        title: row.get(3)?,
        raw_text: row.get(4)?,
        source: row.get(5)?,
        summary: row.get(6)?,
        tags,
        processed_at: row.get(8)?,
    })
}

fn update_schedule(conn: &Connection, card_id: CardId, state: &CardScheduleState) -> Fallible<()> {
    let sql = "update schedules set interval_days = ?, repetitions = ?, ease_factor = ?, next_review_at = ? where card_id = ?;";
    let changed = conn.execute(
        sql,
        (
            state.interval_days,
            state.repetitions,
            state.ease_factor,
            state.next_review_at,
            card_id,
        ),
    )?;
    if changed == 0 {
        return Err(ErrorReport::with_kind(
            ErrorKind::Persistence,
            format!("no schedule for card {card_id}"),
        ));
    }
    Ok(())
}

fn read_schedule(row: &Row, offset: usize) -> Fallible<CardScheduleState> {
    let state = CardScheduleState {
        interval_days: row.get(offset)?,
        repetitions: row.get(offset + 1)?,
        ease_factor: row.get(offset + 2)?,
        next_review_at: row.get(offset + 3)?,
    };
    state.validate()?;
    Ok(state)
}

fn item_exists(tx: &Transaction, item_id: ItemId) -> Fallible<bool> {
    let sql = "select count(*) from items where item_id = ?;";
    let count: i64 = tx.query_row(sql, [item_id], |row| row.get(0))?;
    Ok(count > 0)
}

/// Insert a card. Returns false if a card with the same identifier exists.
fn insert_card(tx: &Transaction, card: &Card) -> Fallible<bool> {
    let tags = serde_json::to_string(card.tags())?;
    let sql = "insert into cards (card_id, item_id, front, back, tags, category, created_at) values (?, ?, ?, ?, ?, ?, ?) on conflict (card_id) do nothing;";
    let inserted = tx.execute(
        sql,
        (
            card.id(),
            card.item_id(),
            card.front(),
            card.back(),
            tags,
            card.category(),
            card.created_at(),
        ),
    )?;
    Ok(inserted > 0)
}

fn insert_schedule(tx: &Transaction, card_id: CardId, state: &CardScheduleState) -> Fallible<()> {
    let sql = "insert into schedules (card_id, interval_days, repetitions, ease_factor, next_review_at) values (?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            card_id,
            state.interval_days,
            state.repetitions,
            state.ease_factor,
            state.next_review_at,
        ),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
