//! Fire-and-forget logging of completed selections
//!
//! Each selection is POSTed as `{institution_name, sponsor_code?}` on a
//! detached thread. Failures end up in the log file and nowhere else; the
//! search UI never waits on or hears about them.

use crate::directory::InstitutionRecord;
use crate::logging;
use parking_lot::Mutex;
use serde::Serialize;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Body of the search-log POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchLogEntry {
    pub institution_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_code: Option<String>,
}

impl SearchLogEntry {
    pub fn for_record(record: &InstitutionRecord) -> Self {
        Self {
            institution_name: record.name.clone(),
            sponsor_code: record.sponsor_code.clone(),
        }
    }
}

/// Receives one entry per completed selection. Must not block.
pub trait SearchLogSink {
    fn record(&self, entry: SearchLogEntry);

    /// Wait for posts still in flight. Called before a short-lived process
    /// exits; the TUI never needs it.
    fn flush(&self) {}
}

/// Sink used when no search-log endpoint is configured
pub struct DisabledSearchLog;

impl SearchLogSink for DisabledSearchLog {
    fn record(&self, entry: SearchLogEntry) {
        logging::debug(
            "SEARCHLOG",
            &format!("Search log disabled, dropping '{}'", entry.institution_name),
        );
    }
}

/// POSTs entries to the search-log endpoint
pub struct HttpSearchLog {
    client: reqwest::blocking::Client,
    endpoint: String,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpSearchLog {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Option<Self> {
        let endpoint = endpoint.into();
        match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(client) => Some(Self {
                client,
                endpoint,
                in_flight: Mutex::new(Vec::new()),
            }),
            Err(e) => {
                logging::warn("SEARCHLOG", &format!("Search log unavailable: {}", e));
                None
            }
        }
    }
}

impl SearchLogSink for HttpSearchLog {
    fn record(&self, entry: SearchLogEntry) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        let handle = thread::spawn(move || {
            let result = client.post(&endpoint).json(&entry).send();
            match result {
                Ok(resp) if resp.status().is_success() => {
                    logging::debug(
                        "SEARCHLOG",
                        &format!("Logged selection '{}'", entry.institution_name),
                    );
                }
                Ok(resp) => {
                    logging::warn(
                        "SEARCHLOG",
                        &format!("Error logging search: status {}", resp.status().as_u16()),
                    );
                }
                Err(e) => {
                    logging::warn("SEARCHLOG", &format!("Error logging search: {}", e));
                }
            }
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    fn flush(&self) {
        let handles: Vec<_> = self.in_flight.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }
}

/// Build the sink for an optional endpoint.
pub fn sink_for(endpoint: Option<&str>, timeout: Duration) -> Box<dyn SearchLogSink> {
    match endpoint.and_then(|url| HttpSearchLog::new(url, timeout)) {
        Some(sink) => Box::new(sink),
        None => Box::new(DisabledSearchLog),
    }
}
