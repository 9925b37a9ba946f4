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

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use crate::types::hash::ItemId;

/// The set of items currently being processed. Holding a guard marks the
/// item as in flight; dropping it clears the mark, including on early
/// returns.
#[derive(Clone, Default)]
pub struct InFlight {
    items: Arc<Mutex<HashSet<ItemId>>>,
}

pub struct InFlightGuard {
    items: Arc<Mutex<HashSet<ItemId>>>,
    item_id: ItemId,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the item as in flight. Returns `None` if it already is.
    pub fn try_begin(&self, item_id: ItemId) -> Option<InFlightGuard> {
        let mut items = self.items.lock().unwrap();
        if items.insert(item_id) {
            Some(InFlightGuard {
                items: self.items.clone(),
                item_id,
            })
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn is_processing(&self, item_id: ItemId) -> bool {
        self.items.lock().unwrap().contains(&item_id)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.remove(&self.item_id);
    }
}
