//! Search & Selection
//!
//! Filtering lives in [`filter`]; the state machine that drives the search
//! box, suggestion list and selection lives in [`controller`].

pub mod controller;
pub mod filter;

pub use controller::{
    Controller, ControllerOptions, Direction, EscapeSubscription, FocusView, NoFocus, Phase,
    SearchKey, SearchState,
};
pub use filter::{filter_directory, find_by_name, is_searchable, MAX_SUGGESTIONS, MIN_QUERY_CHARS};
