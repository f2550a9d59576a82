use anyhow::{Context, Result};
use shared::protocol::{ConnectionDetails, ConnectionDetailsRequest};
use url::Url;

pub const CONNECTION_DETAILS_ROUTE: &str = "/api/connection-details";

/// Asks the token server for a room, identity and access token.
pub async fn fetch_connection_details(
    http: &reqwest::Client,
    base_url: &str,
    request: &ConnectionDetailsRequest,
) -> Result<ConnectionDetails> {
    let endpoint = Url::parse(base_url)
        .with_context(|| format!("invalid token server url '{base_url}'"))?
        .join(CONNECTION_DETAILS_ROUTE)
        .context("failed to build connection details url")?;

    let details = http
        .post(endpoint.clone())
        .json(request)
        .send()
        .await
        .with_context(|| format!("failed to reach {endpoint}"))?
        .error_for_status()
        .context("token server rejected connection details request")?
        .json::<ConnectionDetails>()
        .await
        .context("token server returned malformed connection details")?;

    Ok(details)
}
