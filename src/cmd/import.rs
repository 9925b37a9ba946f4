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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use crate::collection::Collection;
use crate::db::Database;
use crate::error::Fallible;
use crate::inflight::InFlight;
use crate::ingest::attach_cards;
use crate::ingest::capture_item;
use crate::types::item::GeneratedCards;
use crate::types::item::NewItem;
use crate::types::timestamp::Timestamp;

/// Import a file of generated cards as a new item.
pub fn import_file(
    file: String,
    directory: Option<String>,
    title: Option<String>,
    url: Option<String>,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let added = import_cards(&coll.db, &PathBuf::from(file), title, url, Timestamp::now())?;
    println!("Imported {added} cards.");
    Ok(())
}

pub fn import_cards(
    db: &Database,
    path: &Path,
    title: Option<String>,
    url: Option<String>,
    now: Timestamp,
) -> Fallible<usize> {
    let content = read_to_string(path)?;
    let generated: GeneratedCards = serde_json::from_str(&content)?;
    let title = title.or_else(|| {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.to_string())
    });
    let item = capture_item(
        db,
        NewItem {
            url,
            title,
            text: generated.summary.clone(),
            source: Some("import".to_string()),
        },
        now,
    )?;
    attach_cards(db, &InFlight::new(), item.id, generated, now)
}
