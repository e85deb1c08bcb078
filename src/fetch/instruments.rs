use eyre::Result;
use log::info;
use serde::Deserialize;

use crate::config::Config;

const SCOPE: &str = "fetch:instruments";

#[derive(Debug, Deserialize)]
struct InstrumentsResponse {
    instruments: Vec<InstrumentEntry>,
}

#[derive(Debug, Deserialize)]
struct InstrumentEntry {
    instrument: String,
}

/// Fetch the currently available instrument list.
///
/// There is no guarantee the listed currencies form cycles; postprocessing
/// with the pruner is strongly recommended.
///
/// # Errors
///
/// On transport failure, a non-success status, or an undecodable body.
pub async fn list(config: &Config) -> Result<Vec<String>> {
    let url = format!("{}/v1/instruments", config.api_url);
    info!(target: SCOPE, "GET {url}");

    let client = super::client(config.http_timeout)?;
    let body: InstrumentsResponse = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    info!(target: SCOPE, "{} instruments listed", body.instruments.len());
    Ok(body
        .instruments
        .into_iter()
        .map(|entry| entry.instrument)
        .collect())
}
