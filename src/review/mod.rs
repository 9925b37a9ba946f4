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

mod api;
mod get;
mod post;
pub mod server;
mod state;
mod template;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use reqwest::Client;
    use reqwest::StatusCode;
    use serde_json::Value;
    use serde_json::json;
    use tempfile::TempDir;
    use tempfile::tempdir;
    use tokio::net::TcpStream;
    use tokio::spawn;
    use tokio::time::sleep;

    use crate::clock::Clock;
    use crate::clock::FixedClock;
    use crate::collection::Collection;
    use crate::db::Database;
    use crate::error::Fallible;
    use crate::inflight::InFlight;
    use crate::ingest::attach_cards;
    use crate::ingest::capture_item;
    use crate::review::server::start_server;
    use crate::store::ScheduleStore;
    use crate::types::item::GeneratedCard;
    use crate::types::item::GeneratedCards;
    use crate::types::item::NewItem;
    use crate::types::timestamp::Timestamp;

    fn then() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000).unwrap()
    }

    /// Start a server on a free port over the collection in `dir`, and wait
    /// until it accepts connections. Returns the base URL and the database.
    async fn start(dir: &TempDir, now: Timestamp) -> Fallible<(String, Database)> {
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        let db = coll.db.clone();
        let port = portpicker::pick_unused_port().unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(now));
        spawn(async move { start_server(coll, port, false, clock).await });
        let bind = format!("127.0.0.1:{port}");
        loop {
            if let Ok(stream) = TcpStream::connect(&bind).await {
                drop(stream);
                break;
            }
            sleep(Duration::from_millis(1)).await;
        }
        Ok((format!("http://{bind}"), db))
    }

    fn client() -> Fallible<Client> {
        Ok(Client::builder().no_proxy().build()?)
    }

    async fn post_form(client: &Client, url: &str, form: &[(&str, &str)]) -> Fallible<String> {
        let response = client.post(format!("{url}/")).form(form).send().await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        Ok(response.text().await?)
    }

    fn seed(dir: &TempDir) -> Fallible<()> {
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        let item = capture_item(
            &coll.db,
            NewItem {
                title: Some("Geography".into()),
                text: Some("Capitals and arithmetic.".into()),
                ..Default::default()
            },
            then(),
        )?;
        let generated = GeneratedCards {
            summary: None,
            tags: vec!["Trivia".into()],
            category: Some("General".into()),
            cards: vec![
                GeneratedCard {
                    front: "What is the capital of France?".into(),
                    back: "Paris".into(),
                },
                GeneratedCard {
                    front: "What is 2 + 2?".into(),
                    back: "Four".into(),
                },
            ],
        };
        attach_cards(&coll.db, &InFlight::new(), item.id, generated, then())?;
        Ok(())
    }

    #[tokio::test]
    async fn test_static_and_not_found() -> Fallible<()> {
        let dir = tempdir()?;
        let (url, _) = start(&dir, then()).await?;
        let client = client()?;

        let response = client.get(format!("{url}/style.css")).send().await?;
        assert!(response.status().is_success());
        assert_eq!(response.headers().get("content-type").unwrap(), "text/css");

        let response = client.get(format!("{url}/herp-derp")).send().await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_nothing_due() -> Fallible<()> {
        let dir = tempdir()?;
        let (url, _) = start(&dir, then()).await?;
        let client = client()?;

        let html = client.get(format!("{url}/")).send().await?.text().await?;
        assert!(html.contains("All caught up"));

        let html = post_form(&client, &url, &[("action", "Start")]).await?;
        assert!(html.contains("No cards are due."));
        let session: Value = client
            .get(format!("{url}/api/session"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(session, Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn test_e2e() -> Fallible<()> {
        let dir = tempdir()?;
        seed(&dir)?;
        let now = then().plus_days(3);
        let (url, db) = start(&dir, now).await?;
        let client = client()?;

        // The dashboard offers to start.
        let html = client.get(format!("{url}/")).send().await?.text().await?;
        assert!(html.contains("id=\"start\""));

        // Start the session.
        let html = post_form(&client, &url, &[("action", "Start")]).await?;
        assert!(html.contains("Card 1 of 2"));
        assert!(html.contains("What is the capital of France?"));
        assert!(!html.contains("Paris"));

        // Rating before revealing is rejected.
        let html = post_form(&client, &url, &[("action", "Rate"), ("quality", "easy")]).await?;
        assert!(html.contains("reveal the card before rating it."));
        assert!(html.contains("Card 1 of 2"));

        // Reveal.
        let html = post_form(&client, &url, &[("action", "Reveal")]).await?;
        assert!(html.contains("Paris"));
        assert!(html.contains("Easy"));

        // An unknown label changes nothing.
        let html = post_form(&client, &url, &[("action", "Rate"), ("quality", "bogus")]).await?;
        assert!(html.contains("invalid review quality"));
        assert!(html.contains("Card 1 of 2"));

        // Rate 'easy'.
        let html = post_form(&client, &url, &[("action", "Rate"), ("quality", "easy")]).await?;
        assert!(html.contains("Card 2 of 2"));
        assert!(html.contains("What is 2 + 2?"));

        let session: Value = client
            .get(format!("{url}/api/session"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(
            session,
            json!({"position": 1, "total": 2, "rated": 1, "completed": false})
        );

        // Reveal and rate 'good'.
        post_form(&client, &url, &[("action", "Reveal")]).await?;
        let html = post_form(&client, &url, &[("action", "Rate"), ("quality", "Good")]).await?;
        assert!(html.contains("Session completed: 2 of 2 cards rated."));
        assert!(html.contains("All caught up"));

        // The new states were written.
        let cards = db.scheduled_cards()?;
        let first = db.get(cards[0].card.id())?.unwrap();
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.repetitions, 1);
        assert!((first.ease_factor - 2.36).abs() < 1e-9);
        assert_eq!(first.next_review_at, now.plus_days(1));
        let second = db.get(cards[1].card.id())?.unwrap();
        assert_eq!(second.repetitions, 0);
        assert_eq!(second.ease_factor, 2.5);

        let stats: Value = client
            .get(format!("{url}/api/stats"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(stats["reviewedToday"], 2);
        assert_eq!(stats["dueCount"], 0);
        assert_eq!(stats["learnedCount"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_ratings_count_before_session_ends() -> Fallible<()> {
        let dir = tempdir()?;
        seed(&dir)?;
        let now = then().plus_days(3);
        let (url, _) = start(&dir, now).await?;
        let client = client()?;

        post_form(&client, &url, &[("action", "Start")]).await?;
        post_form(&client, &url, &[("action", "Reveal")]).await?;
        let html = post_form(&client, &url, &[("action", "Rate"), ("quality", "easy")]).await?;
        assert!(html.contains("Card 2 of 2"));
        assert!(html.contains("Next review tomorrow."));

        let stats: Value = client
            .get(format!("{url}/api/stats"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(stats["reviewedToday"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_start_while_active() -> Fallible<()> {
        let dir = tempdir()?;
        seed(&dir)?;
        let (url, _) = start(&dir, then().plus_days(3)).await?;
        let client = client()?;

        post_form(&client, &url, &[("action", "Start")]).await?;
        let html = post_form(&client, &url, &[("action", "Start")]).await?;
        assert!(html.contains("A review is already in progress."));
        assert!(html.contains("Card 1 of 2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset() -> Fallible<()> {
        let dir = tempdir()?;
        seed(&dir)?;
        let now = then().plus_days(3);
        let (url, db) = start(&dir, now).await?;
        let client = client()?;
        let before = db.scheduled_cards()?;

        post_form(&client, &url, &[("action", "Start")]).await?;
        let html = post_form(&client, &url, &[("action", "Reset")]).await?;
        assert!(html.contains("Session reset after 0 of 2 cards."));
        assert!(html.contains("id=\"start\""));

        // Nothing was rated, so nothing changed.
        let after = db.scheduled_cards()?;
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.schedule, a.schedule);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_capture_api() -> Fallible<()> {
        let dir = tempdir()?;
        let now = then();
        let (url, _) = start(&dir, now).await?;
        let client = client()?;

        let item = json!({
            "url": "https://example.com/photosynthesis",
            "title": "Photosynthesis",
            "text": "Plants turn light into chemical energy.",
            "source": "extension"
        });
        let response = client
            .post(format!("{url}/api/items"))
            .json(&item)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Value = response.json().await?;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["title"], "Photosynthesis");

        // Same content, same item.
        let response = client
            .post(format!("{url}/api/items"))
            .json(&item)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = response.json().await?;
        assert_eq!(body["error"]["code"], "conflict");

        // Neither title nor text.
        let response = client
            .post(format!("{url}/api/items"))
            .json(&json!({"url": "https://example.com"}))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let cards = json!({
            "summary": "How plants make food.",
            "tags": ["Biology"],
            "category": "Science",
            "cards": [
                {"front": "Where does photosynthesis happen?", "back": "In the chloroplasts."},
                {"front": "What gas is released?", "back": "Oxygen."}
            ]
        });

        // Unknown and malformed identifiers.
        let unknown = "0".repeat(64);
        let response = client
            .post(format!("{url}/api/items/{unknown}/cards"))
            .json(&cards)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = client
            .post(format!("{url}/api/items/nope/cards"))
            .json(&cards)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = client
            .post(format!("{url}/api/items/{id}/cards"))
            .json(&cards)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let added: Value = response.json().await?;
        assert_eq!(added["added"], 2);

        // An item is processed once.
        let response = client
            .post(format!("{url}/api/items/{id}/cards"))
            .json(&cards)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // New cards are not due until tomorrow.
        let due: Value = client
            .get(format!("{url}/api/due"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(due, json!([]));
        let stats: Value = client
            .get(format!("{url}/api/stats"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(stats["itemCount"], 1);
        assert_eq!(stats["cardCount"], 2);
        assert_eq!(stats["dueCount"], 0);

        // The item is listed with the model's summary and tags.
        let listed: Value = client
            .get(format!("{url}/api/items?q=light&tag=Biology"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(listed["items"][0]["id"], id.as_str());
        assert_eq!(listed["items"][0]["summary"], "How plants make food.");
        assert_eq!(listed["items"][0]["tags"], json!(["Biology"]));
        assert_eq!(listed["pagination"]["hasMore"], false);
        let none: Value = client
            .get(format!("{url}/api/items?tag=Physics"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(none["items"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_items_pages() -> Fallible<()> {
        let dir = tempdir()?;
        let (url, _) = start(&dir, then()).await?;
        let client = client()?;
        for title in ["Mercury", "Venus", "Earth"] {
            let response = client
                .post(format!("{url}/api/items"))
                .json(&json!({"title": title}))
                .send()
                .await?;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let first: Value = client
            .get(format!("{url}/api/items?limit=2"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(first["items"][0]["title"], "Earth");
        assert_eq!(first["items"][1]["title"], "Venus");
        assert_eq!(
            first["pagination"],
            json!({"limit": 2, "offset": 0, "hasMore": true})
        );

        let rest: Value = client
            .get(format!("{url}/api/items?limit=2&offset=2"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(rest["items"][0]["title"], "Mercury");
        assert_eq!(rest["pagination"]["hasMore"], false);
        Ok(())
    }
}
