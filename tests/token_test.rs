mod common;

use std::sync::Arc;

use common::*;
use tastemaker::{db::Session, management::TokenManager, utils::now_timestamp};

fn manager(connector: FakeConnector) -> (Arc<FakeConnector>, TokenManager) {
    let connector = Arc::new(connector);
    let manager = TokenManager::new(connector.clone(), 60);
    (connector, manager)
}

fn session_expiring_in(secs: i64) -> Session {
    Session::new(
        "s1".to_string(),
        "alice".to_string(),
        Some(token("old-access", now_timestamp() + secs)),
    )
}

#[test]
fn test_needs_refresh_within_margin() {
    let (_, manager) = manager(FakeConnector::new(FakeApi::new("alice")));
    let now = 1_000_000;

    assert!(manager.needs_refresh(&token("a", now + 30), now));
    assert!(manager.needs_refresh(&token("a", now - 5), now));
    assert!(!manager.needs_refresh(&token("a", now + 120), now));
}

#[tokio::test]
async fn test_token_close_to_expiry_is_refreshed() {
    let (connector, manager) = manager(FakeConnector::new(FakeApi::new("alice")));
    let mut session = session_expiring_in(30);

    let token = manager.valid_token(&mut session).await.unwrap();

    assert_eq!(token.access_token, "refreshed-access");
    assert_eq!(token.refresh_token, "refresh-token");
    assert_eq!(connector.refreshes(), 1);
    assert!(session.is_dirty());
    assert_eq!(session.token().unwrap().access_token, "refreshed-access");
}

#[tokio::test]
async fn test_fresh_token_is_used_as_is() {
    let (connector, manager) = manager(FakeConnector::new(FakeApi::new("alice")));
    let mut session = session_expiring_in(120);

    let token = manager.valid_token(&mut session).await.unwrap();

    assert_eq!(token.access_token, "old-access");
    assert_eq!(connector.refreshes(), 0);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let mut connector = FakeConnector::new(FakeApi::new("alice"));
    connector.rotate_refresh_token = true;
    let (_, manager) = manager(connector);
    let mut session = session_expiring_in(10);

    manager.valid_token(&mut session).await.unwrap();

    assert_eq!(session.token().unwrap().refresh_token, "rotated-refresh");
}

#[tokio::test]
async fn test_failed_refresh_is_unauthorized() {
    let mut connector = FakeConnector::new(FakeApi::new("alice"));
    connector.fail_refresh = true;
    let (_, manager) = manager(connector);
    let mut session = session_expiring_in(10);

    let err = manager.valid_token(&mut session).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!session.is_dirty());
    assert_eq!(session.token().unwrap().access_token, "old-access");
}

#[tokio::test]
async fn test_session_without_token_is_unauthorized() {
    let (connector, manager) = manager(FakeConnector::new(FakeApi::new("alice")));
    let mut session = Session::new("s1".to_string(), "alice".to_string(), None);

    let err = manager.authorize(&mut session).await.err().unwrap();

    assert!(err.is_unauthorized());
    assert_eq!(connector.refreshes(), 0);
}

#[tokio::test]
async fn test_authorize_binds_client_to_current_token() {
    let (connector, manager) = manager(FakeConnector::new(FakeApi::new("alice")));
    let mut session = session_expiring_in(10);

    let api = manager.authorize(&mut session).await.unwrap();

    assert_eq!(api.current_user().await.unwrap().id, "alice");
    assert_eq!(
        *connector.api_tokens.lock().unwrap(),
        vec!["refreshed-access".to_string()]
    );
}
