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

//! The review session state machine.
//!
//! A session is either idle or active. Starting a review snapshots the due
//! set into a fixed queue, which is never re-filtered while the session
//! runs. Each rating updates the current card through the scheduler, writes
//! it to the store, and only then advances. When the queue is exhausted, or
//! the user resets, the session goes back to idle.

use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::srs::Scheduler;
use crate::store::ScheduleStore;
use crate::types::hash::CardId;
use crate::types::quality::Quality;
use crate::types::schedule::CardScheduleState;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Index of the card being shown. Equal to `total` once complete.
    pub position: usize,
    /// Number of cards in the session.
    pub total: usize,
    /// Number of cards rated so far.
    pub rated: usize,
    pub completed: bool,
}

/// A record of a session that has ended, either by running out of cards or
/// by being reset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SessionSummary {
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub total: usize,
    pub rated: usize,
}

/// The result of a successful rating.
#[derive(Clone, Debug)]
pub struct Rated {
    pub card_id: CardId,
    pub state: CardScheduleState,
    pub progress: Progress,
    /// Present if this rating completed the session.
    pub summary: Option<SessionSummary>,
}

enum SessionState {
    Idle,
    Active(ActiveSession),
}

struct ActiveSession {
    started_at: Timestamp,
    queue: Vec<CardId>,
    position: usize,
    rated: usize,
}

impl ActiveSession {
    fn progress(&self) -> Progress {
        Progress {
            position: self.position,
            total: self.queue.len(),
            rated: self.rated,
            completed: self.position >= self.queue.len(),
        }
    }

    fn summary(&self, ended_at: Timestamp) -> SessionSummary {
        SessionSummary {
            started_at: self.started_at,
            ended_at,
            total: self.queue.len(),
            rated: self.rated,
        }
    }
}

pub struct ReviewSession {
    scheduler: Scheduler,
    state: SessionState,
}

impl ReviewSession {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            state: SessionState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Start reviewing the given cards, in the given order. An empty queue
    /// gives a session that is complete from the start, and the controller
    /// stays idle. Starting over an active session discards it.
    pub fn start_review(&mut self, due: Vec<CardId>, now: Timestamp) -> Progress {
        if due.is_empty() {
            self.state = SessionState::Idle;
            return Progress {
                position: 0,
                total: 0,
                rated: 0,
                completed: true,
            };
        }
        log::debug!("Starting review of {} cards.", due.len());
        let session = ActiveSession {
            started_at: now,
            queue: due,
            position: 0,
            rated: 0,
        };
        let progress = session.progress();
        self.state = SessionState::Active(session);
        progress
    }

    /// The card awaiting a rating.
    pub fn current(&self) -> Option<CardId> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Active(session) => session.queue.get(session.position).copied(),
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Active(session) => Some(session.progress()),
        }
    }

    /// Rate the current card. The new state is written to the store before
    /// the session advances; if the write fails, the error is returned and
    /// the same card stays current so the rating can be retried.
    pub fn rate<S: ScheduleStore + ?Sized>(
        &mut self,
        store: &S,
        quality: Quality,
        now: Timestamp,
    ) -> Fallible<Rated> {
        let session = match &mut self.state {
            SessionState::Idle => {
                return Err(ErrorReport::new("no review in progress."));
            }
            SessionState::Active(session) => session,
        };
        let card_id = session.queue[session.position];
        let current = store.get(card_id)?.ok_or_else(|| {
            ErrorReport::with_kind(
                ErrorKind::Persistence,
                format!("no schedule for card {card_id}"),
            )
        })?;
        let state = self.scheduler.update(&current, quality, now);
        store.put_rated(card_id, &state, quality, now)?;
        log::debug!(
            "{} {} interval={}d reps={} ease={:.2} due={}",
            card_id.short(),
            quality,
            state.interval_days,
            state.repetitions,
            state.ease_factor,
            state.next_review_at
        );
        session.position += 1;
        session.rated += 1;
        let progress = session.progress();
        let summary = if progress.completed {
            log::debug!("Session completed");
            let summary = session.summary(now);
            self.state = SessionState::Idle;
            Some(summary)
        } else {
            None
        };
        Ok(Rated {
            card_id,
            state,
            progress,
            summary,
        })
    }

    /// Abandon the session. Cards not yet rated keep their stored state.
    pub fn reset(&mut self, now: Timestamp) -> Option<SessionSummary> {
        let previous = std::mem::replace(&mut self.state, SessionState::Idle);
        match previous {
            SessionState::Idle => None,
            SessionState::Active(session) => Some(session.summary(now)),
        }
    }
}
