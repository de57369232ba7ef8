// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use quiz_api::{
    config::Config,
    error::AppError,
    models::{
        participant::{Participant, ResultRecord},
        question::Question,
    },
    registry::SessionRegistry,
    routes,
    state::AppState,
    store::QuizStore,
};
use sqlx::types::Json;
use tokio::sync::Notify;

/// In-memory stand-in for the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    participants: Mutex<Vec<Participant>>,
    questions: Vec<Question>,
    /// When set, `save_result` fails like a lost database connection.
    pub fail_saves: AtomicBool,
    /// When set, `save_result` signals `save_started` and waits for `release_save`.
    pub hold_saves: AtomicBool,
    pub save_started: Notify,
    pub release_save: Notify,
}

impl MemoryStore {
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    pub fn participant(&self, id: i64) -> Option<Participant> {
        self.participants
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn upsert_participant(&self, name: &str, email: &str) -> Result<Participant, AppError> {
        let mut participants = self.participants.lock().unwrap();
        if let Some(existing) = participants
            .iter()
            .find(|p| p.name == name && p.email == email)
        {
            return Ok(existing.clone());
        }

        let participant = Participant {
            id: participants.len() as i64 + 1,
            name: name.to_string(),
            email: email.to_string(),
            score: 0,
            time_taken: 0,
        };
        participants.push(participant.clone());
        Ok(participant)
    }

    async fn find_participant(&self, id: i64) -> Result<Option<Participant>, AppError> {
        Ok(self.participant(id))
    }

    async fn sample_questions(&self, limit: i64) -> Result<Vec<Question>, AppError> {
        Ok(self
            .questions
            .iter()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn save_result(&self, record: ResultRecord) -> Result<(), AppError> {
        if self.hold_saves.load(Ordering::SeqCst) {
            self.save_started.notify_one();
            self.release_save.notified().await;
        }

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError("connection lost".to_string()));
        }

        let mut participants = self.participants.lock().unwrap();
        let participant = participants
            .iter_mut()
            .find(|p| p.id == record.participant_id)
            .ok_or(AppError::NotFound("Participant not found".to_string()))?;
        participant.score = record.score;
        participant.time_taken = record.time_taken;
        Ok(())
    }
}

pub fn question(id: i64, content: &str, answer: &str) -> Question {
    Question {
        id,
        content: content.to_string(),
        image_name: None,
        options: Json(vec![]),
        answer: answer.to_string(),
        points: Some(1),
    }
}

/// Q1: "Paris", Q2: "42", one point each.
pub fn capitals_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_questions(vec![
        question(1, "What is the capital of France?", "Paris"),
        question(2, "What is six times seven?", "42"),
    ]))
}

pub fn test_config(session_time_limit: Option<u64>) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        question_count: 5,
        session_time_limit,
        session_idle_ttl: 3600,
    }
}

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port, backed by `store`.
pub async fn spawn_app(store: Arc<MemoryStore>, session_time_limit: Option<u64>) -> TestApp {
    let state = AppState {
        store: store.clone(),
        config: test_config(session_time_limit),
        sessions: SessionRegistry::new(),
    };

    let app = routes::create_router(state.clone());

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        state,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a participant and returns `(participant_id, token)`.
    pub async fn register(&self, name: &str, email: &str) -> (i64, String) {
        let body: serde_json::Value = self
            .client
            .post(self.url("/api/participants"))
            .json(&serde_json::json!({ "name": name, "email": email }))
            .send()
            .await
            .expect("Register failed")
            .json()
            .await
            .expect("Failed to parse register json");

        let id = body["participant"]["id"].as_i64().expect("id not found");
        let token = body["token"].as_str().expect("Token not found").to_string();
        (id, token)
    }

    /// Starts a session and returns its id.
    pub async fn start_session(&self, token: &str) -> String {
        let body: serde_json::Value = self
            .client
            .post(self.url("/api/quiz/sessions"))
            .bearer_auth(token)
            .send()
            .await
            .expect("Start failed")
            .json()
            .await
            .expect("Failed to parse start json");

        body["session_id"]
            .as_str()
            .expect("session_id not found")
            .to_string()
    }

    pub async fn answer(
        &self,
        token: &str,
        session_id: &str,
        question_id: i64,
        answer: &str,
    ) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/quiz/sessions/{}/answers", session_id)))
            .bearer_auth(token)
            .json(&serde_json::json!({ "question_id": question_id, "answer": answer }))
            .send()
            .await
            .expect("Answer failed")
    }

    pub async fn submit(&self, token: &str, session_id: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/quiz/sessions/{}/submit", session_id)))
            .bearer_auth(token)
            .send()
            .await
            .expect("Submit failed")
    }
}
