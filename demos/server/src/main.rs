//! Development server: stub identity, auto-fill bots, logged results.
//!
//! Credentials are `"<id>:<name>[:<college>]"` — no real validation,
//! so any WebSocket client can connect and play. A lone player who
//! queues gets three bot opponents immediately.
//!
//! ```text
//! RUST_LOG=info cargo run -p gamehub-demo-server
//! ```

use std::sync::Arc;

use gamehub::prelude::*;

/// Parses the credential instead of validating it. Development only —
/// a production deployment plugs in a real account-system client here.
struct DevIdentity;

impl IdentityProvider for DevIdentity {
    async fn resolve(
        &self,
        credential: &str,
    ) -> Result<PlayerProfile, SessionError> {
        let mut parts = credential.splitn(3, ':');
        let id = parts
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                SessionError::AuthFailed(
                    "expected '<id>:<name>[:<college>]'".into(),
                )
            })?;
        let name = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| {
            SessionError::AuthFailed("display name required".into())
        })?;
        let college = parts.next().unwrap_or_default();

        Ok(PlayerProfile {
            id: PlayerId(id),
            display_name: name.to_string(),
            college_id: college.to_string(),
            is_bot: false,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), GamehubError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = GamehubServer::builder(DevIdentity)
        .bind("127.0.0.1:8080")
        .queue_config(QueueConfig {
            capacity: 4,
            fill: FillStrategy::AutoBots,
        })
        .result_sink(Arc::new(LogSink))
        .build()
        .await?;

    tracing::info!(
        addr = %server.local_addr().map(|a| a.to_string()).unwrap_or_default(),
        "demo server listening"
    );
    server.run().await
}
