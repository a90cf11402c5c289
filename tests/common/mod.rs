#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::extract::connect_info::MockConnectInfo;
use chrono::Utc;
use shortcode::application::services::{AuthService, LinkPolicy, LinkService, hash_token};
use shortcode::domain::analytics_recorder::AnalyticsRecorder;
use shortcode::domain::entities::{NewAnalyticsEntry, User};
use shortcode::domain::repositories::{AnalyticsRepository, ApiToken, TokenRepository};
use shortcode::error::AppError;
use shortcode::infrastructure::memory::{InMemoryAnalyticsRepository, InMemoryUrlRepository};
use shortcode::routes::router;
use shortcode::state::AppState;
use shortcode::utils::code_generator::{CodeGenerator, RandomCodeGenerator};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "http://sho.rt/";

/// Token of user 42, standard tier.
pub const ALICE_TOKEN: &str = "alice-token";
pub const ALICE_ID: i64 = 42;

/// Token of user 7, premium tier.
pub const BOB_TOKEN: &str = "bob-token";
pub const BOB_ID: i64 = 7;

/// Hands out queued codes first, then random ones.
#[derive(Default)]
pub struct ScriptedGenerator {
    codes: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RandomCodeGenerator::default().generate())
    }
}

/// Token store seeded with Alice and Bob.
pub struct StaticTokenRepository {
    users: HashMap<String, User>,
}

impl StaticTokenRepository {
    pub fn seeded() -> Self {
        let mut users = HashMap::new();
        for (token, id, name, premium) in [
            (ALICE_TOKEN, ALICE_ID, "alice", false),
            (BOB_TOKEN, BOB_ID, "bob", true),
        ] {
            users.insert(
                hash_token(SIGNING_SECRET, token),
                User {
                    id,
                    name: name.to_string(),
                    premium,
                    created_at: Utc::now(),
                },
            );
        }
        Self { users }
    }
}

#[async_trait]
impl TokenRepository for StaticTokenRepository {
    async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(token_hash).cloned())
    }

    async fn update_last_used(&self, _token_hash: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_token(
        &self,
        _user_id: i64,
        _name: &str,
        _token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        unimplemented!("tokens are seeded")
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(None)
    }

    async fn find_by_name(&self, _name: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(None)
    }

    async fn revoke_token(&self, _id: i64) -> Result<(), AppError> {
        Ok(())
    }
}

/// A fully wired service over in-memory storage.
pub struct TestApp {
    pub state: AppState,
    pub link_service: Arc<LinkService>,
    pub urls: Arc<InMemoryUrlRepository>,
    pub analytics: Arc<InMemoryAnalyticsRepository>,
    pub generator: Arc<ScriptedGenerator>,
    analytics_rx: mpsc::Receiver<NewAnalyticsEntry>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(ScriptedGenerator::default(), LinkPolicy::default())
    }

    pub fn with_generator(generator: ScriptedGenerator, policy: LinkPolicy) -> Self {
        let urls = Arc::new(InMemoryUrlRepository::new());
        let analytics = Arc::new(InMemoryAnalyticsRepository::linked_to(urls.clone()));
        let generator = Arc::new(generator);
        let (recorder, analytics_rx) = AnalyticsRecorder::channel(100);

        let link_service = Arc::new(LinkService::new(
            urls.clone(),
            analytics.clone(),
            recorder,
            generator.clone(),
            policy,
        ));
        let auth_service = Arc::new(AuthService::new(
            Arc::new(StaticTokenRepository::seeded()),
            SIGNING_SECRET.to_string(),
        ));

        let state = AppState::new(link_service.clone(), auth_service, BASE_URL);

        Self {
            state,
            link_service,
            urls,
            analytics,
            generator,
            analytics_rx,
        }
    }

    /// Router with a fixed peer address for `ConnectInfo`.
    pub fn router(&self) -> Router {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        router(self.state.clone()).layer(MockConnectInfo(addr))
    }

    /// Persists every queued analytics entry, returning how many were written.
    ///
    /// Entries whose mapping has been deleted meanwhile are rejected by the store
    /// and not counted.
    pub async fn drain_analytics(&mut self) -> usize {
        let mut written = 0;
        while let Ok(entry) = self.analytics_rx.try_recv() {
            if self.analytics.insert(entry).await.is_ok() {
                written += 1;
            }
        }
        written
    }
}
