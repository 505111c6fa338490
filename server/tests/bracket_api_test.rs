use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use server::api::ApiOptions;
use server::history::HistoryStore;
use std::time::Duration;

mod support;
use support::{bracket_app, TestClient};

const ROCK: u8 = 1;
const PAPER: u8 = 2;
const SCISSORS: u8 = 3;

async fn play(client: &TestClient, player_id: u32, mv: u8) -> Result<StatusCode> {
    let (status, _) = client
        .post(&format!("/api/players/{}/move", player_id), json!({ "Move": mv }))
        .await?;
    Ok(status)
}

#[tokio::test]
async fn test_registration_fills_and_starts_bracket() -> Result<()> {
    let app = bracket_app(4, ApiOptions::default());
    let client = &app.client;

    let (status, body) = client.post("/api/players/register", json!({ "name": "Ada" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playerId"], 1);
    assert_eq!(body["tournamentId"], 1);

    let (status, _) = client.post("/api/players/register", json!({ "name": "ada" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.get("/api/players/1/current-match").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, state) = client.get("/api/tournament/state").await?;
    assert_eq!(state["status"], 0);
    assert_eq!(state["requiredPlayers"], 4);

    let (status, body) = client
        .post(
            "/api/players/register-bulk",
            json!({ "count": 3, "useAutoNames": true, "names": ["Bob"] }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 3);
    assert_eq!(players[0]["name"], "Bob");

    let (_, state) = client.get("/api/tournament/state").await?;
    assert_eq!(state["status"], 1);
    assert_eq!(state["currentRound"], 1);
    assert_eq!(state["currentRoundStatus"], 0);
    let matches = state["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["player1"]["id"], 1);
    assert_eq!(matches[0]["player2"]["id"], 2);
    assert_eq!(matches[1]["player1"]["id"], 3);
    assert_eq!(matches[1]["player2"]["id"], 4);

    let (status, _) = client.post("/api/players/register", json!({ "name": "Late" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_bulk_registration_is_all_or_nothing() -> Result<()> {
    let app = bracket_app(4, ApiOptions::default());
    let client = &app.client;

    client.post("/api/players/register", json!({ "name": "Ada" })).await?;
    let (status, _) = client
        .post("/api/players/register-bulk", json!({ "count": 4, "useAutoNames": true }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post("/api/players/register-bulk", json!({ "count": 2, "names": ["Bob"] }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, state) = client.get("/api/tournament/state").await?;
    assert_eq!(state["players"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_generate_name() -> Result<()> {
    let app = bracket_app(4, ApiOptions::default());
    let (status, body) = app.client.get("/api/players/generate-name").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["name"].as_str().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_bracket_plays_to_a_champion() -> Result<()> {
    let app = bracket_app(4, ApiOptions::default());
    let client = &app.client;

    client
        .post(
            "/api/players/register-bulk",
            json!({ "count": 4, "names": ["Ada", "Bob", "Cy", "Di"] }),
        )
        .await?;

    // Moves are refused until the referee opens the round
    assert_eq!(play(client, 1, ROCK).await?, StatusCode::BAD_REQUEST);

    let (status, _) = client.post_empty("/api/referee/start-round").await?;
    assert_eq!(status, StatusCode::OK);

    let (status, m) = client.get("/api/players/1/current-match").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(m["status"], 1);
    assert_eq!(m["player2"]["name"], "Bob");

    assert_eq!(play(client, 1, ROCK).await?, StatusCode::OK);
    assert_eq!(play(client, 1, PAPER).await?, StatusCode::BAD_REQUEST);
    assert_eq!(play(client, 2, 9).await?, StatusCode::BAD_REQUEST);

    // A tie clears both moves for a replay
    assert_eq!(play(client, 2, ROCK).await?, StatusCode::OK);
    let (_, m) = client.get("/api/players/1/current-match").await?;
    assert_eq!(m["ties"], 1);
    assert_eq!(m["player1Move"], 0);
    assert_eq!(m["player2Move"], 0);

    assert_eq!(play(client, 1, PAPER).await?, StatusCode::OK);
    assert_eq!(play(client, 2, ROCK).await?, StatusCode::OK);

    let (status, m) = client.get("/api/players/2/current-match-completed").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(m["winner"]["name"], "Ada");
    assert_eq!(m["status"], 2);

    // Advancing waits for every match in the round
    let (status, _) = client.post_empty("/api/referee/advance").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(play(client, 3, SCISSORS).await?, StatusCode::OK);
    assert_eq!(play(client, 4, PAPER).await?, StatusCode::OK);
    assert_eq!(play(client, 2, ROCK).await?, StatusCode::BAD_REQUEST);

    let (_, state) = client.get("/api/tournament/state").await?;
    assert_eq!(state["currentRoundStatus"], 2);

    let (status, _) = client.post_empty("/api/referee/advance").await?;
    assert_eq!(status, StatusCode::OK);
    client.post_empty("/api/referee/start-round").await?;

    let (_, m) = client.get("/api/players/3/current-match").await?;
    assert_eq!(m["round"], 2);
    assert_eq!(m["player1"]["name"], "Ada");
    assert_eq!(m["player2"]["name"], "Cy");

    assert_eq!(play(client, 1, ROCK).await?, StatusCode::OK);
    assert_eq!(play(client, 3, PAPER).await?, StatusCode::OK);
    client.post_empty("/api/referee/advance").await?;

    let (_, state) = client.get("/api/tournament/state").await?;
    assert_eq!(state["status"], 2);
    assert_eq!(state["winner"]["name"], "Cy");

    let mut archived = Vec::new();
    for _ in 0..50 {
        archived = app.history.list(10).await?;
        if !archived.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].mode, "bracket");
    assert_eq!(archived[0].standings[0].name, "Cy");
    assert_eq!(archived[0].standings[0].score, 2);

    let (status, body) = client.post_empty("/api/referee/reset").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let (_, state) = client.get("/api/tournament/state").await?;
    assert_eq!(state["tournamentId"], 2);
    assert_eq!(state["status"], 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_move_gets_json_error() -> Result<()> {
    let app = bracket_app(2, ApiOptions::default());
    let client = &app.client;
    client
        .post("/api/players/register-bulk", json!({ "count": 2, "useAutoNames": true }))
        .await?;
    client.post_empty("/api/referee/start-round").await?;

    let (status, body) = client.post("/api/players/1/move", json!({ "move": 300 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = client.post("/api/players/1/move", json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("missing field `move`"));

    let (status, body) = client.post("/api/players/register-bulk", json!({ "names": [] })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, m) = client.get("/api/players/1/current-match").await?;
    assert_eq!(m["player1Move"], 0);
    Ok(())
}
