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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::html;

use crate::cmd::stats::Stats;
use crate::cmd::stats::collect_stats;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::review::state::ServerState;
use crate::review::template::page_template;
use crate::session::Progress;
use crate::types::card::Card;
use crate::types::quality::Quality;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let body = match render(&state) {
        Ok(body) => body,
        Err(e) => {
            log::error!("{e}");
            html! {
                div.root {
                    div.dashboard {
                        div.message {
                            (e.to_string())
                        }
                    }
                }
            }
        }
    };
    let html = page_template(body);
    (StatusCode::OK, Html(html.into_string()))
}

fn render(state: &ServerState) -> Fallible<Markup> {
    let mut mutable = state.mutable.lock().unwrap();
    let message = mutable.message.take();
    let current = mutable.session.current().zip(mutable.session.progress());
    match current {
        Some((card_id, progress)) => {
            let card = mutable
                .cards
                .get(&card_id)
                .ok_or_else(|| ErrorReport::new(format!("card not loaded: {card_id}")))?;
            Ok(card_view(card, progress, mutable.reveal, message))
        }
        None => {
            let stats = collect_stats(&state.db, state.daily_goal, state.clock.now())?;
            Ok(dashboard(&stats, message))
        }
    }
}

fn dashboard(stats: &Stats, message: Option<String>) -> Markup {
    html! {
        div.root {
            div.dashboard {
                div.header {
                    h1 {
                        "learninghub"
                    }
                    div.progress {
                        (stats.reviewed_today) " / " (stats.daily_goal) " reviewed today"
                    }
                }
                @if let Some(message) = message {
                    div.message {
                        (message)
                    }
                }
                div.stats {
                    (stat(stats.due_count, "Due"))
                    (stat(stats.card_count, "Cards"))
                    (stat(stats.learned_count, "Learned"))
                }
                @if stats.due_count == 0 {
                    p.caught-up {
                        "All caught up. Nothing is due for review."
                    }
                } @else {
                    div.controls {
                        form action="/" method="post" {
                            input id="start" type="submit" name="action" value="Start";
                        }
                    }
                }
            }
        }
    }
}

fn stat(value: usize, label: &str) -> Markup {
    html! {
        div.stat {
            div.value {
                (value)
            }
            div.label {
                (label)
            }
        }
    }
}

fn card_view(card: &Card, progress: Progress, reveal: bool, message: Option<String>) -> Markup {
    let position = format!("Card {} of {}", progress.position + 1, progress.total);
    html! {
        div.root {
            div.card {
                div.header {
                    h1 {
                        (card.category().unwrap_or("Review"))
                    }
                    div.progress {
                        (position)
                    }
                }
                @if let Some(message) = message {
                    div.message {
                        (message)
                    }
                }
                div.content {
                    div.question .rich-text {
                        (card.html_front())
                    }
                    @if reveal {
                        div.answer .rich-text {
                            (card.html_back())
                        }
                    }
                }
                @if !card.tags().is_empty() {
                    div.tags {
                        (card.tags().join(", "))
                    }
                }
                div.controls {
                    @if reveal {
                        form action="/" method="post" {
                            input type="hidden" name="action" value="Rate";
                            @for quality in Quality::ALL {
                                button id=(quality.as_str()) type="submit" name="quality" value=(quality.as_str()) {
                                    (quality.label())
                                }
                            }
                        }
                    } @else {
                        form action="/" method="post" {
                            input id="reveal" type="submit" name="action" value="Reveal";
                        }
                    }
                    div.spacer {}
                    form action="/" method="post" {
                        input id="reset" type="submit" name="action" value="Reset";
                    }
                }
            }
        }
    }
}
