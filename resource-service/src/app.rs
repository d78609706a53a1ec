use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use common_auth::{ensure_role, AuthContext, AuthenticationPipeline, ROLE_ADMIN};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AuthenticationPipeline>,
}

impl FromRef<AppState> for Arc<AuthenticationPipeline> {
    fn from_ref(state: &AppState) -> Self {
        state.pipeline.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/public", get(public_content))
        .route("/protected", get(protected_content))
        .route("/admin", get(admin_content))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn public_content() -> &'static str {
    "Public content"
}

async fn protected_content(auth: AuthContext) -> String {
    format!("Protected content for {}", auth.subject())
}

async fn admin_content(auth: AuthContext) -> Result<String, (StatusCode, String)> {
    ensure_role(&auth.principal, &[ROLE_ADMIN])?;
    Ok(format!("Admin only content for {}", auth.subject()))
}
