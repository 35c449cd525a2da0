//! Institution Directory Store
//!
//! Loads the full institution listing exactly once and hands out an
//! immutable snapshot. There is no retry and no partial result: any failure
//! leaves the directory empty for the rest of the session.

pub mod mapping;
pub mod record;
pub mod transport;

pub use mapping::FieldMapping;
pub use record::{InstitutionRecord, TriState};
pub use transport::{parse_listing, DirectoryTransport, HttpTransport, RawResponse};

use crate::error::FetchError;
use crate::logging;
use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;
use std::thread;

/// Immutable, shared directory snapshot
pub type Directory = Arc<[InstitutionRecord]>;

/// Outcome of the one-shot load
pub type LoadResult = Result<Directory, FetchError>;

// ============================================================================
// Load State
// ============================================================================

/// Where the directory load stands.
///
/// Moves `NotStarted -> Loading -> Ready | Failed` and never goes back.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    NotStarted,
    Loading,
    Ready(Directory),
    Failed(FetchError),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LoadState::Ready(_) | LoadState::Failed(_))
    }

    /// Records if loaded, otherwise an empty directory.
    pub fn directory(&self) -> Directory {
        match self {
            LoadState::Ready(records) => Arc::clone(records),
            _ => Arc::from(Vec::new()),
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            LoadState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Mark the load as in flight. Returns false if it already started.
    pub fn begin(&mut self) -> bool {
        if matches!(self, LoadState::NotStarted) {
            *self = LoadState::Loading;
            true
        } else {
            false
        }
    }

    /// Record the single completion. Ignored unless a load is in flight.
    pub fn complete(&mut self, result: LoadResult) {
        if !self.is_loading() {
            logging::warn("STORE", "Ignoring directory result outside of a load");
            return;
        }
        *self = match result {
            Ok(records) => LoadState::Ready(records),
            Err(e) => LoadState::Failed(e),
        };
    }
}

// ============================================================================
// Directory Store
// ============================================================================

/// Owns the transport and the single request it is allowed to make.
pub struct DirectoryStore {
    transport: Option<Box<dyn DirectoryTransport>>,
    mapping: FieldMapping,
    state: LoadState,
}

impl DirectoryStore {
    pub fn new(transport: Box<dyn DirectoryTransport>, mapping: FieldMapping) -> Self {
        Self {
            transport: Some(transport),
            mapping,
            state: LoadState::NotStarted,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Fetch and cache the directory.
    ///
    /// Only the first call touches the network; later calls replay the
    /// cached outcome.
    pub fn load(&mut self) -> LoadResult {
        if let LoadState::Ready(records) = &self.state {
            return Ok(Arc::clone(records));
        }
        if let LoadState::Failed(e) = &self.state {
            return Err(e.clone());
        }

        let Some(transport) = self.transport.take() else {
            return Err(FetchError::Network("directory request already issued".to_string()));
        };

        self.state.begin();
        logging::info("STORE", "Loading institution directory");

        let result = transport
            .get()
            .and_then(|resp| parse_listing(resp, &self.mapping))
            .map(Directory::from);

        match &result {
            Ok(records) => {
                logging::info("STORE", &format!("Loaded {} institutions", records.len()))
            }
            Err(e) => logging::error("STORE", &format!("Error fetching data: {}", e)),
        }

        self.state.complete(result.clone());
        result
    }

    /// Run [`load`](Self::load) on a background thread.
    ///
    /// The receiver yields exactly one message.
    pub fn spawn_load(mut self) -> Receiver<LoadResult> {
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let _ = tx.send(self.load());
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: Arc<AtomicUsize>,
        response: Result<RawResponse, FetchError>,
    }

    impl DirectoryTransport for CountingTransport {
        fn get(&self) -> Result<RawResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn store(response: Result<RawResponse, FetchError>) -> (DirectoryStore, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = CountingTransport {
            calls: Arc::clone(&calls),
            response,
        };
        (
            DirectoryStore::new(Box::new(transport), FieldMapping::default()),
            calls,
        )
    }

    #[test]
    fn loads_once_and_replays() {
        let (mut store, calls) = store(Ok(RawResponse::json(r#"[{"name":"A"},{"name":"B"}]"#)));
        assert_eq!(store.load().unwrap().len(), 2);
        assert_eq!(store.load().unwrap().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.state().is_finished());
    }

    #[test]
    fn failure_is_terminal_and_empty() {
        let (mut store, calls) = store(Err(FetchError::Network("refused".into())));
        assert!(store.load().is_err());
        assert!(store.load().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.state().directory().is_empty());
        assert!(matches!(store.state().error(), Some(FetchError::Network(_))));
    }

    #[test]
    fn spawned_load_delivers_one_result() {
        let (store, _) = store(Ok(RawResponse::json("[]")));
        let rx = store.spawn_load();
        assert!(rx.recv().unwrap().unwrap().is_empty());
        assert!(rx.recv().is_err());
    }

    #[test]
    fn load_state_never_reenters_loading() {
        let mut state = LoadState::default();
        assert!(state.begin());
        state.complete(Err(FetchError::HttpStatus(500)));
        assert!(!state.begin());
        state.complete(Ok(Arc::from(vec![InstitutionRecord::new("A", "", "")])));
        assert_eq!(state.error(), Some(&FetchError::HttpStatus(500)));
    }
}
