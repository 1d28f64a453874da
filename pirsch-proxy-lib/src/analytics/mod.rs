//! Client for the remote analytics API and the payloads sent to it.

mod client;
mod error;
mod request;
mod types;

pub use client::{endpoints, AnalyticsClient};
pub use error::AnalyticsError;
pub use request::{is_do_not_track, referrer_or_fallback, REFERRER_QUERY_PARAMS};
pub use types::{Domain, Event, PageView};

use tracing::info;

use crate::config::Config;

/// Build one client per configured credential pair.
///
/// OAuth clients are verified against the API so that bad credentials fail
/// at startup rather than on the first page view.
pub async fn setup_clients(cfg: &Config) -> crate::error::Result<Vec<AnalyticsClient>> {
    let mut clients = Vec::with_capacity(cfg.clients.len());

    for client_cfg in &cfg.clients {
        info!(id = %client_cfg.id, base_url = %cfg.base_url, "adding client");
        let client = AnalyticsClient::new(client_cfg, &cfg.base_url, &cfg.upstream)?;

        if client.uses_oauth() {
            let domain = client.verify().await?;
            info!(id = %client_cfg.id, hostname = %domain.hostname, "client connected");
        }

        clients.push(client);
    }

    Ok(clients)
}
