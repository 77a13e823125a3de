use std::time::Duration;

use repohub::{Backend, BackendError, Pagination, Session};
use repohub_http::{CanisterClient, CanisterClientConfig, RetryPolicy};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> CanisterClientConfig {
    CanisterClientConfig {
        base_url: server.uri(),
        label: "test-canister".into(),
        timeout: Some(Duration::from_secs(5)),
        retry: RetryPolicy::none(),
    }
}

async fn mount_page_fixture(server: &MockServer) {
    let fixture = include_str!("fixtures/repository_page.json");

    Mock::given(method("POST"))
        .and(path("/query/listRepositories"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_normalizes_repositories() {
    let server = MockServer::start().await;
    mount_page_fixture(&server).await;

    let client = CanisterClient::new(config_for(&server));
    let page = client
        .list_repositories(&Session::anonymous(), Pagination::default())
        .await
        .unwrap();

    let ledger = &page.repositories[0];
    assert_eq!(ledger.id.as_str(), "repo-ledger");
    assert_eq!(ledger.owner.as_deref(), Some("rrkah-fqaaa-aaaaa-aaaaq-cai"));
    assert_eq!(
        ledger.description.as_deref(),
        Some("Token ledger with proposal voting")
    );
    assert_eq!(ledger.stars, 128);
    assert_eq!(ledger.forks, 19);
    assert_eq!(ledger.language.as_deref(), Some("Motoko"));
    assert_eq!(ledger.updated_at, 1_700_000_000_000);

    assert_eq!(page.total_count, 3);
    assert!(!page.has_more);
}

#[tokio::test]
async fn list_drops_record_missing_name() {
    let server = MockServer::start().await;
    mount_page_fixture(&server).await;

    let client = CanisterClient::new(config_for(&server));
    let page = client
        .list_repositories(&Session::anonymous(), Pagination::default())
        .await
        .unwrap();

    let ids: Vec<&str> = page.repositories.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["repo-ledger", "repo-wallet"]);

    let wallet = &page.repositories[1];
    assert!(wallet.is_private);
    assert_eq!(wallet.description, None);
    assert_eq!(wallet.language, None);
}

#[tokio::test]
async fn list_sends_pagination_arguments() {
    let server = MockServer::start().await;
    let fixture = include_str!("fixtures/repository_page.json");

    Mock::given(method("POST"))
        .and(path("/query/listRepositories"))
        .and(body_json(serde_json::json!({ "page": 2, "limit": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = CanisterClient::new(config_for(&server));
    let result = client
        .list_repositories(&Session::anonymous(), Pagination { page: 2, limit: 5 })
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn list_surfaces_tagged_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query/listRepositories"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"err": {"Unauthorized": null}}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = CanisterClient::new(config_for(&server));
    let result = client
        .list_repositories(&Session::anonymous(), Pagination::default())
        .await;

    assert!(matches!(
        result,
        Err(BackendError::Api {
            kind: repohub::ErrorKind::Unauthorized,
            detail: None,
        })
    ));
}

#[tokio::test]
async fn list_handles_unreadable_reply_as_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query/listRepositories"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = CanisterClient::new(config_for(&server));
    let result = client
        .list_repositories(&Session::anonymous(), Pagination::default())
        .await;

    assert!(result.unwrap_err().is_transport());
}

#[tokio::test]
async fn list_handles_network_error() {
    let config = CanisterClientConfig {
        base_url: "http://127.0.0.1:1".into(),
        label: "unreachable".into(),
        timeout: Some(Duration::from_secs(2)),
        retry: RetryPolicy::none(),
    };

    let client = CanisterClient::new(config);
    let result = client
        .list_repositories(&Session::anonymous(), Pagination::default())
        .await;
    assert!(result.unwrap_err().is_transport());
}

#[tokio::test]
async fn list_retries_server_errors() {
    let server = MockServer::start().await;
    let fixture = include_str!("fixtures/repository_page.json");

    Mock::given(method("POST"))
        .and(path("/query/listRepositories"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/query/listRepositories"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
    };

    let client = CanisterClient::new(config);
    let page = client
        .list_repositories(&Session::anonymous(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.repositories.len(), 2);
}

#[tokio::test]
async fn list_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query/listRepositories"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad args"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
    };

    let client = CanisterClient::new(config);
    let err = client
        .list_repositories(&Session::anonymous(), Pagination::default())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("400"));
}
