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

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::MILLIS_PER_DAY;
use crate::types::timestamp::Timestamp;

/// The ease factor of a card that has never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// The ease factor never drops below this.
pub const MINIMUM_EASE_FACTOR: f64 = 1.3;

/// The interval of a card that has never been reviewed, in days.
pub const DEFAULT_INTERVAL: u32 = 1;

/// Scheduling state of a single card.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(try_from = "ScheduleJson", into = "ScheduleJson")]
pub struct CardScheduleState {
    /// Days until the next review, counted from the last update.
    pub interval_days: u32,
    /// Consecutive successful recalls since the last lapse.
    pub repetitions: u32,
    /// Multiplier controlling how fast the interval grows.
    pub ease_factor: f64,
    /// When the card becomes due again.
    pub next_review_at: Timestamp,
}

impl CardScheduleState {
    /// The state of a freshly created card. It first comes due one day after
    /// it is created.
    pub fn new(now: Timestamp) -> Self {
        Self {
            interval_days: DEFAULT_INTERVAL,
            repetitions: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            next_review_at: now.plus_days(DEFAULT_INTERVAL),
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review_at <= now
    }

    /// Whole days until the card is due, rounded up. Zero or negative when
    /// the card is already due.
    pub fn days_until_review(&self, now: Timestamp) -> i64 {
        let diff = self.next_review_at.as_millis() - now.as_millis();
        diff.div_euclid(MILLIS_PER_DAY) + i64::from(diff.rem_euclid(MILLIS_PER_DAY) != 0)
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.interval_days < 1 {
            return fail(format!(
                "invalid schedule: interval of {} days",
                self.interval_days
            ));
        }
        if !self.ease_factor.is_finite() || self.ease_factor < MINIMUM_EASE_FACTOR {
            return fail(format!(
                "invalid schedule: ease factor {}",
                self.ease_factor
            ));
        }
        Ok(())
    }
}

/// The wire format: millisecond timestamps and camel-cased names.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleJson {
    interval: u32,
    repetitions: u32,
    ease_factor: f64,
    next_review: i64,
}

impl TryFrom<ScheduleJson> for CardScheduleState {
    type Error = ErrorReport;

    fn try_from(value: ScheduleJson) -> Result<Self, Self::Error> {
        let state = CardScheduleState {
            interval_days: value.interval,
            repetitions: value.repetitions,
            ease_factor: value.ease_factor,
            next_review_at: Timestamp::from_millis(value.next_review)?,
        };
        state.validate()?;
        Ok(state)
    }
}

impl From<CardScheduleState> for ScheduleJson {
    fn from(value: CardScheduleState) -> Self {
        ScheduleJson {
            interval: value.interval_days,
            repetitions: value.repetitions,
            ease_factor: value.ease_factor,
            next_review: value.next_review_at.as_millis(),
        }
    }
}
