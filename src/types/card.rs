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

use maud::Markup;
use maud::PreEscaped;
use maud::html;
use serde::Serialize;

use crate::markdown::markdown_to_html;
use crate::types::hash::CardId;
use crate::types::hash::Hasher;
use crate::types::hash::ItemId;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// The hash of the card's item and content.
    id: CardId,
    /// The captured item this card was generated from.
    item_id: ItemId,
    front: String,
    back: String,
    tags: Vec<String>,
    category: Option<String>,
    created_at: Timestamp,
}

impl Card {
    pub fn new(
        item_id: ItemId,
        front: impl Into<String>,
        back: impl Into<String>,
        tags: Vec<String>,
        category: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        let front = front.into().trim().to_string();
        let back = back.into().trim().to_string();
        let id = card_id(item_id, &front, &back);
        Self {
            id,
            item_id,
            front,
            back,
            tags,
            category,
            created_at,
        }
    }

    /// Rebuild a card from a stored row, trusting its stored identifier.
    pub fn from_parts(
        id: CardId,
        item_id: ItemId,
        front: String,
        back: String,
        tags: Vec<String>,
        category: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            item_id,
            front,
            back,
            tags,
            category,
            created_at,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn html_front(&self) -> Markup {
        html! {
            (PreEscaped(markdown_to_html(&self.front)))
        }
    }

    pub fn html_back(&self) -> Markup {
        html! {
            (PreEscaped(markdown_to_html(&self.back)))
        }
    }
}

fn card_id(item_id: ItemId, front: &str, back: &str) -> CardId {
    let mut hasher = Hasher::new();
    hasher.update(b"Card");
    hasher.update(item_id.to_hex().as_bytes());
    hasher.update_field(front);
    hasher.update_field(back);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hash::Hash;

    #[test]
    fn test_identity_ignores_surrounding_whitespace() {
        let item = Hash::hash_bytes(b"item");
        let now = Timestamp::now();
        let a = Card::new(item, "What is 2+2?", "4", vec![], None, now);
        let b = Card::new(item, "  What is 2+2?\n", " 4 ", vec!["Math".into()], None, now);
        assert_eq!(a.id(), b.id());
        assert_eq!(b.front(), "What is 2+2?");
    }

    #[test]
    fn test_identity_depends_on_item() {
        let now = Timestamp::now();
        let a = Card::new(Hash::hash_bytes(b"a"), "Q", "A", vec![], None, now);
        let b = Card::new(Hash::hash_bytes(b"b"), "Q", "A", vec![], None, now);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_html() {
        let card = Card::new(
            Hash::hash_bytes(b"item"),
            "What is *emphasis*?",
            "`code`",
            vec![],
            None,
            Timestamp::now(),
        );
        assert_eq!(
            card.html_front().into_string(),
            "<p>What is <em>emphasis</em>?</p>\n"
        );
        assert_eq!(card.html_back().into_string(), "<p><code>code</code></p>\n");
    }
}
