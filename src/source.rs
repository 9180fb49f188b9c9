use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::LoadError;

/// Where the slider's URL list comes from.
pub trait MediaListSource: Send + 'static {
    fn fetch(&self) -> Result<Vec<String>, LoadError>;
}

/// `GET <endpoint>` returning a JSON array of URL strings.
#[derive(Debug, Clone)]
pub struct HttpMediaList {
    client: Client,
    endpoint: String,
}

impl HttpMediaList {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }
}

impl MediaListSource for HttpMediaList {
    fn fetch(&self) -> Result<Vec<String>, LoadError> {
        log::info!("Fetching media list from {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }
        let body = response.bytes()?;
        parse_media_list(&body)
    }
}

/// Accepts only a JSON array whose entries are all strings.
pub fn parse_media_list(body: &[u8]) -> Result<Vec<String>, LoadError> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Array(entries) = value else {
        return Err(LoadError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Value::String(url) => Ok(url),
            _ => Err(LoadError::NotAString(i)),
        })
        .collect()
}

/// Runs the fetch on a background thread; the result arrives once on the
/// returned channel.
pub fn spawn_fetch<S: MediaListSource>(source: S) -> Receiver<Result<Vec<String>, LoadError>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver is gone if the window closed mid-fetch
        let _ = tx.send(source.fetch());
    });
    rx
}

pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}
