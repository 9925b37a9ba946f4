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

use std::collections::HashMap;

use axum::Form;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::due::select_due;
use crate::error::Fallible;
use crate::error::fail;
use crate::review::state::MutableState;
use crate::review::state::ServerState;
use crate::session::SessionSummary;
use crate::types::card::Card;
use crate::types::hash::CardId;
use crate::types::quality::Quality;

#[derive(Debug, Deserialize)]
enum Action {
    Start,
    Reveal,
    Rate,
    Reset,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
    quality: Option<String>,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> Redirect {
    match action_handler(&state, form) {
        Ok(_) => {}
        Err(e) => {
            log::error!("{e}");
            let mut mutable = state.mutable.lock().unwrap();
            mutable.message = Some(e.to_string());
        }
    }
    Redirect::to("/")
}

fn action_handler(state: &ServerState, form: FormData) -> Fallible<()> {
    let now = state.clock.now();
    let mut mutable = state.mutable.lock().unwrap();
    match form.action {
        Action::Start => {
            if mutable.session.is_active() {
                mutable.message = Some("A review is already in progress.".to_string());
                return Ok(());
            }
            let cards = state.db.scheduled_cards()?;
            let due: Vec<Card> = select_due(&cards, now).into_iter().cloned().collect();
            let ids: Vec<CardId> = due.iter().map(Card::id).collect();
            let progress = mutable.session.start_review(ids, now);
            mutable.cards = due.into_iter().map(|card| (card.id(), card)).collect();
            mutable.reveal = false;
            if progress.completed {
                mutable.message = Some("No cards are due.".to_string());
            }
        }
        Action::Reveal => {
            if mutable.session.is_active() {
                mutable.reveal = true;
            }
        }
        Action::Rate => {
            // Parse before touching the session, so a bad label changes nothing.
            let quality: Quality = form.quality.as_deref().unwrap_or_default().parse()?;
            if !mutable.reveal {
                return fail("reveal the card before rating it.");
            }
            let rated = mutable.session.rate(&state.db, quality, now)?;
            mutable.reveal = false;
            mutable.cards.remove(&rated.card_id);
            log::debug!(
                "{} of {} cards rated.",
                rated.progress.rated,
                rated.progress.total
            );
            mutable.message = Some(next_review_message(rated.state.interval_days));
            if let Some(summary) = rated.summary {
                finish(state, &mut mutable, &summary)?;
                mutable.message = Some(format!(
                    "Session completed: {} of {} cards rated.",
                    summary.rated, summary.total
                ));
            }
        }
        Action::Reset => {
            if let Some(summary) = mutable.session.reset(now) {
                finish(state, &mut mutable, &summary)?;
                mutable.message = Some(format!(
                    "Session reset after {} of {} cards.",
                    summary.rated, summary.total
                ));
            }
            mutable.reveal = false;
        }
    }
    Ok(())
}

fn next_review_message(interval_days: u32) -> String {
    if interval_days == 1 {
        "Next review tomorrow.".to_string()
    } else {
        format!("Next review in {interval_days} days.")
    }
}

fn finish(state: &ServerState, mutable: &mut MutableState, summary: &SessionSummary) -> Fallible<()> {
    mutable.cards = HashMap::new();
    state.db.save_session(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_review_message() {
        assert_eq!(next_review_message(1), "Next review tomorrow.");
        assert_eq!(next_review_message(6), "Next review in 6 days.");
    }
}
