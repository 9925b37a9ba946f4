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

//! An SM-2 style scheduler.
//!
//! A review below the pass threshold is a lapse: the card goes back to a one
//! day interval and its repetition count is reset, but its ease factor is
//! kept. A passing review grows the interval (1 day, then 6 days, then the
//! previous interval times the ease factor) and adjusts the ease factor with
//! the SM-2 formula, using the quality ordinal (`again=0` .. `easy=3`).
//!
//! By default only `easy` passes. This is the historical behaviour of the
//! application, under which `good` counts as a lapse; a collection can opt
//! into treating `good` as a pass through its configuration.

use crate::types::quality::Quality;
use crate::types::schedule::CardScheduleState;
use crate::types::schedule::MINIMUM_EASE_FACTOR;
use crate::types::timestamp::Timestamp;

/// Interval after the first successful recall, in days.
const FIRST_INTERVAL: u32 = 1;

/// Interval after the second successful recall, in days.
const SECOND_INTERVAL: u32 = 6;

/// The longest interval the scheduler will produce, in days.
const MAX_INTERVAL: u32 = 36_500;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Scheduler {
    /// The lowest quality that counts as a successful recall.
    pass_threshold: Quality,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            pass_threshold: Quality::Easy,
        }
    }
}

impl Scheduler {
    pub fn new(pass_threshold: Quality) -> Self {
        Self { pass_threshold }
    }

    pub fn pass_threshold(&self) -> Quality {
        self.pass_threshold
    }

    pub fn is_lapse(&self, quality: Quality) -> bool {
        quality.ordinal() < self.pass_threshold.ordinal()
    }

    /// Compute a card's next state after a review at `now`. The input state
    /// is left untouched.
    pub fn update(
        &self,
        state: &CardScheduleState,
        quality: Quality,
        now: Timestamp,
    ) -> CardScheduleState {
        let q = quality.ordinal();
        let (interval_days, repetitions, ease_factor) = if self.is_lapse(quality) {
            (FIRST_INTERVAL, 0, state.ease_factor)
        } else {
            let repetitions = state.repetitions + 1;
            let interval_days = match repetitions {
                1 => FIRST_INTERVAL,
                2 => SECOND_INTERVAL,
                _ => grow(state.interval_days, state.ease_factor),
            };
            (interval_days, repetitions, new_ease_factor(state.ease_factor, q))
        };
        CardScheduleState {
            interval_days,
            repetitions,
            ease_factor,
            next_review_at: now.plus_days(interval_days),
        }
    }
}

fn grow(interval_days: u32, ease_factor: f64) -> u32 {
    let grown = (interval_days as f64 * ease_factor).round();
    grown.clamp(FIRST_INTERVAL as f64, MAX_INTERVAL as f64) as u32
}

fn new_ease_factor(ease_factor: f64, q: u8) -> f64 {
    let d = 5.0 - q as f64;
    let ease_factor = ease_factor + (0.1 - d * (0.08 + d * 0.02));
    ease_factor.max(MINIMUM_EASE_FACTOR)
}
