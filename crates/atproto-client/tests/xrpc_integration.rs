//! Integration tests for the XRPC client and agent
//!
//! These tests use wiremock to stand up a mock XRPC server and test
//! the full request/response cycle, error handling, and login.

use atproto_client::xrpc::{XrpcClient, XrpcClientConfig, XrpcError, XrpcRequest, XrpcResponse};
use atproto_client::BskyAgent;
use serde::{Deserialize, Serialize};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
struct TestPage {
    items: Vec<String>,
    cursor: Option<String>,
}

// =============================================================================
// Request/Response Cycle
// =============================================================================

#[tokio::test]
async fn test_query_request_success() {
    let mock_server = MockServer::start().await;

    let page = TestPage {
        items: vec!["a".to_string(), "b".to_string()],
        cursor: Some("next".to_string()),
    };

    Mock::given(method("GET"))
        .and(path("/xrpc/com.example.getPage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page))
        .mount(&mock_server)
        .await;

    let client = XrpcClient::new(XrpcClientConfig::new(mock_server.uri()));

    let request = XrpcRequest::query("com.example.getPage");
    let response: XrpcResponse<TestPage> = client.query(request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data, page);
}

#[tokio::test]
async fn test_query_request_forwards_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.example.getPage"))
        .and(query_param("cursor", "abc"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&TestPage {
            items: vec![],
            cursor: None,
        }))
        .mount(&mock_server)
        .await;

    let client = XrpcClient::new(XrpcClientConfig::new(mock_server.uri()));

    let request = XrpcRequest::query("com.example.getPage")
        .param("cursor", "abc")
        .param("limit", "100");

    let response: XrpcResponse<TestPage> = client.query(request).await.unwrap();
    assert!(response.data.items.is_empty());
}

#[tokio::test]
async fn test_procedure_sends_json_body_and_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/xrpc/com.example.createRecord"))
        .and(header("Authorization", "Bearer token123"))
        .and(body_partial_json(serde_json::json!({ "collection": "app.bsky.graph.listblock" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "uri": "at://did:plc:123/app.bsky.graph.listblock/abc",
            "cid": "bafyreigq4zsipbk5w3uqkbmh2w2633c4tcwudryvoqkfrq3mqfs3d5e3wq"
        })))
        .mount(&mock_server)
        .await;

    let mut client = XrpcClient::new(XrpcClientConfig::new(mock_server.uri()));
    client.set_auth_header(Some("Bearer token123".to_string()));

    let request = XrpcRequest::procedure("com.example.createRecord")
        .json_body(&serde_json::json!({
            "repo": "did:plc:123",
            "collection": "app.bsky.graph.listblock",
        }))
        .unwrap();

    let response: XrpcResponse<serde_json::Value> = client.procedure(request).await.unwrap();
    assert_eq!(response.status, 200);
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_error_response_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.example.notFound"))
        .respond_with(ResponseTemplate::new(404).set_body_json(&serde_json::json!({
            "error": "NotFound",
            "message": "Record not found"
        })))
        .mount(&mock_server)
        .await;

    let client = XrpcClient::new(XrpcClientConfig::new(mock_server.uri()));

    let request = XrpcRequest::query("com.example.notFound");
    let result: Result<XrpcResponse<TestPage>, XrpcError> = client.query(request).await;

    let error = result.unwrap_err();
    assert_eq!(error.status(), 404);
    assert_eq!(error.error(), "NotFound");
    assert_eq!(error.message(), "Record not found");
}

#[tokio::test]
async fn test_auth_error_detected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.example.protected"))
        .respond_with(ResponseTemplate::new(401).set_body_json(&serde_json::json!({
            "error": "AuthenticationRequired",
            "message": "Invalid token"
        })))
        .mount(&mock_server)
        .await;

    let client = XrpcClient::new(XrpcClientConfig::new(mock_server.uri()));

    let request = XrpcRequest::query("com.example.protected");
    let result: Result<XrpcResponse<TestPage>, XrpcError> = client.query(request).await;

    assert!(result.unwrap_err().is_auth_error());
}

#[tokio::test]
async fn test_request_made_exactly_once_on_failure() {
    let mock_server = MockServer::start().await;

    // No retry policy anywhere: a 503 must surface after one attempt.
    Mock::given(method("GET"))
        .and(path("/xrpc/com.example.unavailable"))
        .respond_with(ResponseTemplate::new(503).set_body_json(&serde_json::json!({
            "error": "ServiceUnavailable",
            "message": "Service temporarily unavailable"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = XrpcClient::new(XrpcClientConfig::new(mock_server.uri()));

    let request = XrpcRequest::query("com.example.unavailable");
    let result: Result<XrpcResponse<TestPage>, XrpcError> = client.query(request).await;

    assert_eq!(result.unwrap_err().status(), 503);
}

#[tokio::test]
async fn test_malformed_json_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.example.malformed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
        .mount(&mock_server)
        .await;

    let client = XrpcClient::new(XrpcClientConfig::new(mock_server.uri()));

    let request = XrpcRequest::query("com.example.malformed");
    let result: Result<XrpcResponse<TestPage>, XrpcError> = client.query(request).await;

    let error = result.unwrap_err();
    assert_eq!(error.error(), "ParseError");
    assert!(error.message().contains("Failed to parse JSON"));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_agent_login_stores_session_and_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .and(body_partial_json(serde_json::json!({
            "identifier": "alice.bsky.social"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "accessJwt": "access_token_123",
            "refreshJwt": "refresh_token_123",
            "did": "did:plc:alice123",
            "handle": "alice.bsky.social"
        })))
        .mount(&mock_server)
        .await;

    let mut agent = BskyAgent::new(mock_server.uri());
    let session = agent.login("alice.bsky.social", "app-password").await.unwrap();

    assert_eq!(session.did, "did:plc:alice123");
    assert!(agent.has_session());
    assert_eq!(agent.did(), Some("did:plc:alice123".to_string()));
    assert_eq!(agent.handle(), Some("alice.bsky.social".to_string()));
    assert!(agent.client().is_authenticated());
}

#[tokio::test]
async fn test_agent_login_failure_leaves_no_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .respond_with(ResponseTemplate::new(401).set_body_json(&serde_json::json!({
            "error": "AuthenticationRequired",
            "message": "Invalid identifier or password"
        })))
        .mount(&mock_server)
        .await;

    let mut agent = BskyAgent::new(mock_server.uri());
    let result = agent.login("alice.bsky.social", "wrong-password").await;

    assert!(result.is_err());
    assert!(!agent.has_session());
    assert!(!agent.client().is_authenticated());
}
