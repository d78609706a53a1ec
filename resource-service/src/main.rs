use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common_auth::{
    AuthenticationPipeline, AuthorityMapper, InMemorySubjectRolesResolver, IssuerConfig,
    IssuerRegistry, SharedSecret, ROLE_ADMIN, ROLE_USER,
};
use resource_service::app::{router, AppState};
use resource_service::config::Settings;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let settings = Settings::from_env();

    let secret = match &settings.private_secret {
        Some(encoded) => SharedSecret::from_base64(encoded)?,
        None => SharedSecret::generate()?,
    };

    let registry = IssuerRegistry::from_configs(vec![
        IssuerConfig::shared_secret(&settings.private_issuer, secret),
        IssuerConfig::jwks(&settings.oidc_issuer, &settings.oidc_jwks_url),
    ])?;
    info!(
        issuers = ?registry.issuers().collect::<Vec<_>>(),
        "issuer registry built"
    );

    // Demo role table; a deployment would back this with a real store.
    let resolver = InMemorySubjectRolesResolver::new()
        .with_role("bob", ROLE_USER)
        .with_role("admin", ROLE_ADMIN)
        .with_role("dGVzdEBleGFtcGxlLmNvbQ==", ROLE_USER)
        .with_role("YWRtaW5AZXhhbXBsZS5jb20=", ROLE_ADMIN);

    let pipeline =
        AuthenticationPipeline::new(Arc::new(registry), AuthorityMapper::new(Arc::new(resolver)));
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = router(state);

    let ip: std::net::IpAddr = settings.host.parse()?;
    let addr = SocketAddr::from((ip, settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "resource service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
