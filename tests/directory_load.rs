//! Directory loading against stub transports

use fertilikey::directory::{DirectoryStore, DirectoryTransport, FieldMapping, RawResponse};
use fertilikey::search::{Controller, NoFocus, Phase};
use fertilikey::{FetchError, LoadState, TriState};
use std::sync::Arc;

struct StubTransport(Result<RawResponse, FetchError>);

impl DirectoryTransport for StubTransport {
    fn get(&self) -> Result<RawResponse, FetchError> {
        self.0.clone()
    }
}

fn store(response: Result<RawResponse, FetchError>) -> DirectoryStore {
    DirectoryStore::new(Box::new(StubTransport(response)), FieldMapping::default())
}

#[test]
fn server_error_leaves_search_empty() {
    let mut store = store(Ok(RawResponse {
        status: 500,
        content_type: Some("text/html".into()),
        body: "<html>Internal Server Error</html>".into(),
    }));

    let err = store.load().unwrap_err();
    assert_eq!(err, FetchError::HttpStatus(500));
    assert!(matches!(store.state(), LoadState::Failed(FetchError::HttpStatus(500))));

    let mut controller = Controller::default().with_directory(store.state().directory());
    controller.set_query("mercy", &mut NoFocus);
    controller.reveal_all(&mut NoFocus);
    assert!(controller.state().suggestions.is_empty());
    assert_eq!(controller.phase(), Phase::Typing);
}

#[test]
fn html_with_ok_status_is_malformed() {
    let mut store = store(Ok(RawResponse {
        status: 200,
        content_type: Some("text/html; charset=utf-8".into()),
        body: "<!doctype html><p>Login</p>".into(),
    }));
    assert!(matches!(store.load(), Err(FetchError::MalformedResponse(_))));
}

#[test]
fn network_failure_is_reported() {
    let mut store = store(Err(FetchError::Network("connection refused".into())));
    assert!(matches!(store.load(), Err(FetchError::Network(_))));
    assert!(store.state().directory().is_empty());
}

#[test]
fn sponsor_export_rows_map_to_records() {
    let body = r#"{
        "data": [
            {
                "SponsorCode": "0401",
                "SponsorName": "Mercy General",
                "SponsorCity": "Austin",
                "SponsorStateName": "Texas",
                "SponsorUrl": "https://www.mercy.example.org",
                "Maternal leave (wks)": "12",
                "Paternal leave (wks)": "-",
                "Fertility Benefits offered? (Yes/No)": "Yes",
                "Benefit amount": "$12,500",
                "Elective treatment covered": "1",
                "Data method": "HR survey; https://mercy.example.org/benefits"
            },
            { "SponsorName": "", "SponsorCity": "Nowhere" }
        ]
    }"#;
    let mut store = store(Ok(RawResponse::json(body)));
    let directory = store.load().unwrap();

    assert_eq!(directory.len(), 1);
    let record = &directory[0];
    assert_eq!(record.sponsor_code.as_deref(), Some("0401"));
    assert_eq!(record.maternal_leave_weeks, Some(12));
    assert_eq!(record.paternal_leave_weeks, None);
    assert_eq!(record.has_fertility_benefits, TriState::Yes);
    assert_eq!(record.benefit_amount, Some(12500.0));
    assert_eq!(record.is_elective_treatment_covered, TriState::Yes);
}

#[test]
fn spawned_load_feeds_controller() {
    let body = r#"[
        {"name": "Mercy General", "city": "Austin", "state_name": "Texas"},
        {"name": "St. Mercy", "city": "Dallas", "state_name": "Texas"}
    ]"#;
    let rx = store(Ok(RawResponse::json(body))).spawn_load();
    let directory = rx.recv().unwrap().unwrap();

    let mut controller = Controller::default();
    controller.set_query("mercy", &mut NoFocus);
    controller.set_directory(Arc::clone(&directory), &mut NoFocus);
    assert_eq!(controller.state().suggestions.len(), 2);
}
