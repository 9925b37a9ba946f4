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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::hash::Hasher;
use crate::types::hash::ItemId;
use crate::types::timestamp::Timestamp;

/// A piece of captured content: a clipped page, a selection, or text
/// recovered from a screenshot.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub created_at: Timestamp,
    pub url: Option<String>,
    pub title: Option<String>,
    pub raw_text: Option<String>,
    pub source: Option<String>,
    /// Filled in once cards have been generated for the item.
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub processed_at: Option<Timestamp>,
}

/// What the model said about an item, besides the cards themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemOutput {
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub processed_at: Timestamp,
}

/// An item as submitted by the capture client.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewItem {
    pub url: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub source: Option<String>,
}

impl NewItem {
    pub fn into_item(self, now: Timestamp) -> Fallible<Item> {
        let url = non_empty(self.url);
        let title = non_empty(self.title);
        let raw_text = non_empty(self.text);
        let source = non_empty(self.source);
        if title.is_none() && raw_text.is_none() {
            return fail("an item needs a title or some text.");
        }
        let mut hasher = Hasher::new();
        hasher.update(b"Item");
        for field in [&url, &title, &raw_text] {
            hasher.update_field(field.as_deref().unwrap_or(""));
        }
        Ok(Item {
            id: hasher.finalize(),
            created_at: now,
            url,
            title,
            raw_text,
            source,
            summary: None,
            tags: Vec::new(),
            processed_at: None,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The flashcards generated for an item, in the shape the language model
/// returns them.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneratedCards {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub cards: Vec<GeneratedCard>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneratedCard {
    pub front: String,
    pub back: String,
}

pub const DEFAULT_PAGE_SIZE: usize = 50;

pub const MAX_PAGE_SIZE: usize = 200;

/// Filters for listing items. Blank strings count as absent.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ItemQuery {
    /// Matched against the title and text.
    pub q: Option<String>,
    /// Matched exactly against the item's tags.
    pub tag: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ItemQuery {
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}
