/*!
 * # Fetch Module
 *
 * Thin HTTP clients for the two upstream feeds: the instrument catalogue
 * and the rate snapshot for a set of instruments. The engine only ever
 * sees the decoded records; transport and decoding stay here.
 */

use std::time::Duration;

use eyre::Result;
use reqwest::Client;

/// Instrument list fetching
pub mod instruments;
/// Rate snapshot fetching
pub mod rates;

/// Build an HTTP client with the configured timeout.
pub(crate) fn client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}
