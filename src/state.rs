//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService};

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub auth_service: Arc<AuthService>,
    /// Prefix joined with a short code to form the public short URL.
    pub base_url: Arc<str>,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService>,
        auth_service: Arc<AuthService>,
        base_url: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            link_service,
            auth_service,
            base_url: base_url.into(),
        }
    }

    /// Public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}{}", self.base_url, code)
    }
}
