use eyre::{ensure, Result};
use log::info;
use serde::Deserialize;

use crate::arb::rate::Rate;
use crate::config::Config;

const SCOPE: &str = "fetch:rates";

#[derive(Debug, Deserialize)]
struct PricesResponse {
    prices: Vec<Rate>,
}

/// Fetch the current bid/ask quotes for a set of instruments.
///
/// # Errors
///
/// If the instrument list is empty, and on transport failure, a
/// non-success status or an undecodable body.
pub async fn get(config: &Config, instruments: &[String]) -> Result<Vec<Rate>> {
    ensure!(!instruments.is_empty(), "empty instrument list");

    let url = format!("{}/v1/prices", config.api_url);
    let wanted = instruments.join(",");
    info!(target: SCOPE, "GET {url}?instruments={wanted}");

    let client = super::client(config.http_timeout)?;
    let body: PricesResponse = client
        .get(&url)
        .query(&[("instruments", wanted.as_str())])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    info!(target: SCOPE, "{} prices fetched", body.prices.len());
    Ok(body.prices)
}
