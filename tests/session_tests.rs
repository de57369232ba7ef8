// tests/session_tests.rs

mod common;

use std::sync::{Arc, atomic::Ordering};

use chrono::{TimeDelta, Utc};
use common::{MemoryStore, capitals_store, spawn_app};
use quiz_api::lifecycle::{self, SweepReport};

#[tokio::test]
async fn test_quiz_flow() {
    // Arrange
    let app = spawn_app(capitals_store(), None).await;
    let (participant_id, token) = app.register("Ada", "ada@example.com").await;

    // 1. Start a session
    let start = app
        .client
        .post(app.url("/api/quiz/sessions"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(start.status().as_u16(), 201);

    let body: serde_json::Value = start.json().await.unwrap();
    let session_id = body["session_id"].as_str().unwrap().to_string();
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert!(
        questions.iter().all(|q| q.get("answer").is_none()),
        "answers must not be sent to the participant"
    );

    // 2. Answer: Q1 right (different case), Q2 right then overwritten with a wrong answer
    assert_eq!(app.answer(&token, &session_id, 1, "paris").await.status().as_u16(), 204);
    assert_eq!(app.answer(&token, &session_id, 2, "42").await.status().as_u16(), 204);
    assert_eq!(app.answer(&token, &session_id, 2, "41").await.status().as_u16(), 204);

    let status: serde_json::Value = app
        .client
        .get(app.url(&format!("/api/quiz/sessions/{}", session_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["state"], "open");
    assert_eq!(status["answered"], serde_json::json!([1, 2]));

    // 3. Submit
    let submit = app.submit(&token, &session_id).await;
    assert_eq!(submit.status().as_u16(), 200);

    let result: serde_json::Value = submit.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(result["max_score"], 2);
    assert!(result["time_taken"].as_u64().unwrap() < 5);

    let graded = result["answers"].as_array().unwrap();
    assert_eq!(graded[0]["is_correct"], true);
    assert_eq!(graded[1]["submitted"], "41");
    assert_eq!(graded[1]["correct_answer"], "42");

    // 4. The result landed on the participant as integers
    let saved = app.store.participant(participant_id).unwrap();
    assert_eq!(saved.score, 1);
    assert_eq!(i64::from(saved.time_taken), result["time_taken"].as_i64().unwrap());

    // 5. The finished session is gone
    assert_eq!(app.submit(&token, &session_id).await.status().as_u16(), 404);
    assert_eq!(app.answer(&token, &session_id, 1, "Paris").await.status().as_u16(), 404);
}

#[tokio::test]
async fn submit_without_answers_scores_zero() {
    let app = spawn_app(capitals_store(), None).await;
    let (participant_id, token) = app.register("Ada", "ada@example.com").await;
    let session_id = app.start_session(&token).await;

    let result: serde_json::Value = app.submit(&token, &session_id).await.json().await.unwrap();

    assert_eq!(result["score"], 0);
    assert_eq!(result["time_taken"], 0);
    assert_eq!(app.store.participant(participant_id).unwrap().score, 0);
}

#[tokio::test]
async fn unknown_question_is_accepted_but_not_scored() {
    let app = spawn_app(capitals_store(), None).await;
    let (_, token) = app.register("Ada", "ada@example.com").await;
    let session_id = app.start_session(&token).await;

    let response = app.answer(&token, &session_id, 999, "Paris").await;
    assert_eq!(response.status().as_u16(), 204);

    let result: serde_json::Value = app.submit(&token, &session_id).await.json().await.unwrap();
    assert_eq!(result["score"], 0);
    assert_eq!(result["answers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn sessions_are_private() {
    let app = spawn_app(capitals_store(), None).await;
    let (_, ada) = app.register("Ada", "ada@example.com").await;
    let (_, grace) = app.register("Grace", "grace@example.com").await;
    let session_id = app.start_session(&ada).await;

    assert_eq!(app.answer(&grace, &session_id, 1, "Paris").await.status().as_u16(), 404);
    assert_eq!(app.submit(&grace, &session_id).await.status().as_u16(), 404);

    // Still usable by its owner
    assert_eq!(app.answer(&ada, &session_id, 1, "Paris").await.status().as_u16(), 204);
}

#[tokio::test]
async fn start_without_questions_is_rejected() {
    let app = spawn_app(Arc::new(MemoryStore::default()), None).await;
    let (_, token) = app.register("Ada", "ada@example.com").await;

    let response = app
        .client
        .post(app.url("/api/quiz/sessions"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn failed_save_keeps_session_for_retry() {
    let app = spawn_app(capitals_store(), None).await;
    let (participant_id, token) = app.register("Ada", "ada@example.com").await;
    let session_id = app.start_session(&token).await;
    app.answer(&token, &session_id, 1, "Paris").await;

    app.store.fail_saves.store(true, Ordering::SeqCst);
    assert_eq!(app.submit(&token, &session_id).await.status().as_u16(), 500);

    // The session finished, so it no longer takes answers...
    assert_eq!(app.answer(&token, &session_id, 2, "42").await.status().as_u16(), 409);

    // ...but submitting again persists the same result.
    app.store.fail_saves.store(false, Ordering::SeqCst);
    let result: serde_json::Value = app.submit(&token, &session_id).await.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(app.store.participant(participant_id).unwrap().score, 1);
}

#[tokio::test]
async fn answering_after_time_limit_submits_at_deadline() {
    let app = spawn_app(capitals_store(), Some(0)).await;
    let (participant_id, token) = app.register("Ada", "ada@example.com").await;
    let session_id = app.start_session(&token).await;

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let response = app.answer(&token, &session_id, 1, "Paris").await;
    assert_eq!(response.status().as_u16(), 409);

    let saved = app.store.participant(participant_id).unwrap();
    assert_eq!(saved.score, 0);
    assert_eq!(saved.time_taken, 0);
    assert_eq!(app.submit(&token, &session_id).await.status().as_u16(), 404);
}

#[tokio::test]
async fn sweeper_closes_expired_sessions_at_deadline() {
    let app = spawn_app(capitals_store(), Some(60)).await;
    let (participant_id, token) = app.register("Ada", "ada@example.com").await;
    let session_id = app.start_session(&token).await;
    app.answer(&token, &session_id, 1, "Paris").await;

    // Nothing is due yet
    let report = lifecycle::close_expired(&app.state, Utc::now()).await;
    assert_eq!(report, SweepReport::default());

    let later = Utc::now() + TimeDelta::seconds(120);
    let report = lifecycle::close_expired(&app.state, later).await;
    assert_eq!(report.persisted, 1);
    assert_eq!(report.abandoned, 0);

    let saved = app.store.participant(participant_id).unwrap();
    assert_eq!(saved.score, 1);
    assert_eq!(saved.time_taken, 60);
    assert!(app.state.sessions.is_empty().await);
}

#[tokio::test]
async fn starting_again_replaces_open_session() {
    let app = spawn_app(capitals_store(), None).await;
    let (_, token) = app.register("Ada", "ada@example.com").await;

    let first = app.start_session(&token).await;
    for _ in 0..49 {
        app.start_session(&token).await;
    }
    let latest = app.start_session(&token).await;

    assert_eq!(app.state.sessions.len().await, 1);
    assert_eq!(app.answer(&token, &first, 1, "Paris").await.status().as_u16(), 404);
    assert_eq!(app.answer(&token, &latest, 1, "Paris").await.status().as_u16(), 204);
}

#[tokio::test]
async fn idle_sessions_are_dropped_without_time_limit() {
    let app = spawn_app(capitals_store(), None).await;
    for i in 0..50 {
        let (_, token) = app
            .register(&format!("Player {}", i), &format!("player{}@example.com", i))
            .await;
        app.start_session(&token).await;
    }
    assert_eq!(app.state.sessions.len().await, 50);

    // Still within the idle TTL
    let report = lifecycle::close_expired(&app.state, Utc::now()).await;
    assert_eq!(report, SweepReport::default());
    assert_eq!(app.state.sessions.len().await, 50);

    let next_year = Utc::now() + TimeDelta::days(365);
    let report = lifecycle::close_expired(&app.state, next_year).await;

    assert_eq!(report.abandoned, 50);
    assert_eq!(report.persisted, 0);
    assert!(app.state.sessions.is_empty().await);
}

#[tokio::test]
async fn sweeper_retries_failed_save_without_time_limit() {
    let app = spawn_app(capitals_store(), None).await;
    let (participant_id, token) = app.register("Ada", "ada@example.com").await;
    let session_id = app.start_session(&token).await;
    app.answer(&token, &session_id, 2, "42").await;

    app.store.fail_saves.store(true, Ordering::SeqCst);
    assert_eq!(app.submit(&token, &session_id).await.status().as_u16(), 500);

    // Still failing: the session is kept for the next pass
    let report = lifecycle::close_expired(&app.state, Utc::now()).await;
    assert_eq!(report.persisted, 0);
    assert_eq!(app.state.sessions.len().await, 1);

    app.store.fail_saves.store(false, Ordering::SeqCst);
    let report = lifecycle::close_expired(&app.state, Utc::now()).await;

    assert_eq!(report.persisted, 1);
    assert_eq!(app.store.participant(participant_id).unwrap().score, 1);
    assert!(app.state.sessions.is_empty().await);
}

#[tokio::test]
async fn answers_during_submit_see_closed_session() {
    let app = spawn_app(capitals_store(), None).await;
    let (participant_id, token) = app.register("Ada", "ada@example.com").await;
    let session_id = app.start_session(&token).await;
    app.answer(&token, &session_id, 1, "Paris").await;

    app.store.hold_saves.store(true, Ordering::SeqCst);
    let pending = {
        let client = app.client.clone();
        let url = app.url(&format!("/api/quiz/sessions/{}/submit", session_id));
        let token = token.clone();
        tokio::spawn(async move { client.post(url).bearer_auth(token).send().await.unwrap() })
    };
    app.store.save_started.notified().await;

    // The session is closed but still there while its result is being saved
    assert_eq!(app.answer(&token, &session_id, 2, "42").await.status().as_u16(), 409);
    assert_eq!(app.submit(&token, &session_id).await.status().as_u16(), 409);

    app.store.release_save.notify_one();
    let response = pending.await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(app.store.participant(participant_id).unwrap().score, 1);
    assert!(app.state.sessions.is_empty().await);
}
