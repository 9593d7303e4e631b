//! HTTP transport used by the SMS gateway.
//!
//! Requests go through the [`HttpClient`] trait so credentials can be layered
//! on with wrappers from [`auth`] and tests can substitute a fake transport.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Executes `req` and decodes a JSON body, failing on non-2xx statuses.
pub async fn execute_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    req: reqwest::Request,
) -> Result<T> {
    let url = req.url().clone();
    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()?;
    Ok(resp.json::<T>().await?)
}
