use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use starberry_grant::oauth_core::replay::{ReplayGuard, ReplayedCredential};
use starberry_grant::oauth_core::types::{AccessToken, Lineage, LineageParent};
use starberry_grant::{
    AccessTokenStore, Client, ClientAuthenticator, InMemoryAccessTokenStore, InMemoryClientAuthenticator,
    InMemoryRefreshTokenStore, IncidentLogger, MemoryIncidentLogger, TokenHash,
};

fn access_token(secret: &str, parent: Option<LineageParent>) -> AccessToken {
    let now = Utc::now();
    AccessToken {
        id: Uuid::new_v4(),
        hash: TokenHash::of(secret),
        client_id: "cid".into(),
        user_id: "uid".into(),
        scope: "read".into(),
        issued_at: now,
        expires_at: now + Duration::days(30),
        lineage: Lineage { parent, sibling: None },
    }
}

#[tokio::test]
async fn test_in_memory_client_authenticator() {
    let clients = InMemoryClientAuthenticator::new(vec![Client::new("client1", "secret", vec![])]);
    assert!(clients.authenticate("client1", "secret").await.unwrap());
    assert!(!clients.authenticate("client1", "Secret").await.unwrap());
    assert!(!clients.authenticate("missing", "secret").await.unwrap());

    clients.register(Client::new("client2", "other", vec![]));
    assert!(clients.authenticate("client2", "other").await.unwrap());
}

#[tokio::test]
async fn test_delete_is_compare_and_delete() {
    let store = InMemoryAccessTokenStore::new();
    let token = access_token("a1", None);
    let hash = token.hash.clone();
    store.put(token).await.unwrap();
    assert!(store.delete(&hash).await.unwrap());
    assert!(!store.delete(&hash).await.unwrap());
}

#[tokio::test]
async fn test_find_by_lineage_matches_parent_only() {
    let store = InMemoryAccessTokenStore::new();
    let code = TokenHash::of("code");
    store.put(access_token("child", Some(LineageParent::AuthorizationCode(code.clone())))).await.unwrap();
    store.put(access_token("other", Some(LineageParent::RefreshToken(TokenHash::of("r"))))).await.unwrap();
    store.put(access_token("orphan", None)).await.unwrap();

    let children = store.find_by_lineage(&code).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].hash, TokenHash::of("child"));
}

#[tokio::test]
async fn test_replay_guard_revokes_direct_children() {
    let access = InMemoryAccessTokenStore::new();
    let refresh = InMemoryRefreshTokenStore::new();
    let incidents = MemoryIncidentLogger::new();
    let guard = ReplayGuard::new(Arc::new(access.clone()), Arc::new(refresh.clone()), Arc::new(incidents.clone()));

    let child = access_token("child", Some(LineageParent::RefreshToken(TokenHash::of("spent"))));
    let child_id = child.id;
    access.put(child).await.unwrap();
    access.put(access_token("unrelated", None)).await.unwrap();

    let revoked = guard.revoke_descendants(ReplayedCredential::RefreshToken, "spent").await;
    assert_eq!(revoked.access, vec![child_id]);
    assert!(revoked.refresh.is_empty());
    assert_eq!(access.len(), 1);

    let log = incidents.entries();
    assert_eq!(log.len(), 1);
    assert!(log[0].starts_with("Refresh token not found"));

    // Nothing left to revoke, but the incident is still recorded.
    let again = guard.revoke_descendants(ReplayedCredential::RefreshToken, "spent").await;
    assert!(again.is_empty());
    assert_eq!(incidents.entries().len(), 2);
}

#[test]
fn test_memory_incident_logger() {
    let logger = MemoryIncidentLogger::new();
    logger.log("one");
    logger.log("two");
    assert_eq!(logger.entries(), vec!["one".to_string(), "two".to_string()]);
}
