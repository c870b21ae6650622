//! Client behavior over stateless endpoint mocks.

use httpmock::prelude::*;
use serde_json::json;

use dockerhub_client::{
    Client, Credential, Descriptor, Error, ErrorCode, Paginated, Repository, TagSummary,
};
use futures::TryStreamExt;

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .registry_url(format!("{}/", server.base_url()))
        .credential(Credential::new("user", "pw"))
        .build()
        .expect("build client")
}

fn challenge_value(server: &MockServer) -> String {
    format!(
        r#"Bearer realm="{}",service="registry.example""#,
        server.url("/token")
    )
}

#[tokio::test]
async fn test_ping_registry_without_auth() {
    let server = MockServer::start_async().await;
    let v2 = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/");
            then.status(200).json_body(json!({}));
        })
        .await;

    let client = client_for(&server);
    assert!(client.ping().await.expect("ping"));

    // One hit for the challenge probe, one for the ping itself.
    v2.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_tags_attach_bearer_and_decode_records() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/");
            then.status(401)
                .header("WWW-Authenticate", challenge_value(&server).as_str());
        })
        .await;
    let token = server
        .mock_async(|when, then| {
            when.method(GET).path("/token");
            then.status(200)
                .json_body(json!({"token": "T1", "expires_in": 300}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/repositories/library/alpine/tags/")
                .header("authorization", "Bearer T1");
            then.status(200).json_body(json!({
                "count": 2,
                "next": null,
                "previous": null,
                "results": [
                    {
                        "name": "latest",
                        "digest": "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
                        "full_size": 3254789
                    },
                    {"name": "3.20"}
                ]
            }));
        })
        .await;

    let client = client_for(&server);
    let repository = Repository::parse("library/alpine").expect("valid name");

    let tags: Vec<TagSummary> = client.tags(&repository).try_collect().await.expect("tags");
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].name, "latest");
    assert_eq!(
        tags[0].digest.as_ref().expect("digest").hex(),
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
    assert_eq!(tags[1].name, "3.20");

    token.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_repositories_listing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/");
            then.status(200).json_body(json!({}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/repositories/demo/");
            then.status(200).json_body(json!({
                "count": 2,
                "next": null,
                "previous": null,
                "results": [
                    {"name": "app", "namespace": "demo", "pull_count": 17},
                    {"name": "worker", "namespace": "demo"}
                ]
            }));
        })
        .await;

    let client = client_for(&server);
    let repositories: Vec<_> = client
        .repositories("demo")
        .try_collect()
        .await
        .expect("repositories");

    assert_eq!(repositories.len(), 2);
    assert_eq!(repositories[0].name, "app");
    assert_eq!(repositories[0].pull_count, Some(17));
}

#[tokio::test]
async fn test_not_found_carries_error_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/");
            then.status(200).json_body(json!({}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/repositories/no/such/tags/");
            then.status(404).json_body(json!({
                "errors": [{
                    "code": "NAME_UNKNOWN",
                    "message": "repository name not known to registry",
                    "detail": {"name": "no/such"}
                }]
            }));
        })
        .await;

    let client = client_for(&server);
    let err = client
        .request::<Paginated<TagSummary>>(&Descriptor::get("v2/repositories/no/such/tags/"))
        .await
        .unwrap_err();

    assert_eq!(err.api_error_code(), Some(ErrorCode::NameUnknown));
    match err {
        Error::Request {
            status,
            errors,
            retry_after,
        } => {
            assert_eq!(status, 404);
            assert_eq!(errors[0].message, "repository name not known to registry");
            assert_eq!(retry_after, None);
        }
        other => panic!("expected Request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_surfaces_retry_after() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/");
            then.status(200).json_body(json!({}));
        })
        .await;
    let limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/repositories/demo/app/tags/");
            then.status(429)
                .header("Retry-After", "120")
                .json_body(json!({
                    "errors": [{"code": "DENIED", "message": "too many requests"}]
                }));
        })
        .await;

    let client = client_for(&server);
    let err = client
        .request::<Paginated<TagSummary>>(&Descriptor::get("v2/repositories/demo/app/tags/"))
        .await
        .unwrap_err();

    match err {
        Error::Request {
            status,
            retry_after,
            ..
        } => {
            assert_eq!(status, 429);
            // The pipeline reports the hint; it never sleeps on it.
            assert_eq!(retry_after, Some(120));
        }
        other => panic!("expected Request error, got {:?}", other),
    }

    // No automatic retry for 4xx.
    limited.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_missing_field_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/");
            then.status(200).json_body(json!({}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/repositories/demo/app/tags/");
            // Tag records require a name.
            then.status(200)
                .json_body(json!({"count": 1, "results": [{"full_size": 3}]}));
        })
        .await;

    let client = client_for(&server);
    let err = client
        .request::<Paginated<TagSummary>>(&Descriptor::get("v2/repositories/demo/app/tags/"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode(_)));
}
