use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gitlab_api::{
    ApiError,
    ApiRequest,
    ApiResult,
    ClientFactory,
    GitlabClient,
    SessionContext,
    Transport,
    Url,
};
use gitlab_mcp::helpers::{CANCELLED, UNAUTHORIZED};
use gitlab_mcp::{GitlabMcp, ToolRegistry, tools};
use rmcp::model::{CallToolResult, ErrorCode, JsonObject};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

enum Reply {
    Json(Value),
    Status(u16),
    Hang,
}

struct StubTransport {
    reply: Reply,
    requests: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        self.requests.lock().expect("requests lock").push(request);
        match &self.reply {
            Reply::Json(value) => Ok(value.clone()),
            Reply::Status(status) => Err(ApiError::from_status(
                *status,
                None,
                r#"{"message":"stubbed failure"}"#,
            )),
            Reply::Hang => std::future::pending().await,
        }
    }
}

struct StubFactory {
    transport: Arc<StubTransport>,
}

impl ClientFactory for StubFactory {
    fn client(&self, _endpoint: &Url, _access_token: &str) -> ApiResult<GitlabClient> {
        Ok(GitlabClient::new(self.transport.clone()))
    }
}

/// Replies to every request with the credentials its client was built with.
struct EchoTransport {
    endpoint: String,
    access_token: String,
}

#[async_trait]
impl Transport for EchoTransport {
    async fn send(&self, _request: ApiRequest) -> ApiResult<Value> {
        tokio::task::yield_now().await;
        Ok(json!({ "endpoint": self.endpoint, "token": self.access_token }))
    }
}

struct EchoFactory;

impl ClientFactory for EchoFactory {
    fn client(&self, endpoint: &Url, access_token: &str) -> ApiResult<GitlabClient> {
        Ok(GitlabClient::new(Arc::new(EchoTransport {
            endpoint: endpoint.to_string(),
            access_token: access_token.to_string(),
        })))
    }
}

fn session(url: &str, token: &str) -> SessionContext {
    SessionContext::new().attach(Url::parse(url).expect("valid url"), token)
}

fn server(readonly: bool, transport: &Arc<StubTransport>) -> GitlabMcp {
    let registry = ToolRegistry::build(tools::catalog(), readonly).expect("catalog registers");
    GitlabMcp::new(
        Arc::new(registry),
        Arc::new(StubFactory {
            transport: transport.clone(),
        }),
        session("https://gitlab.example.com", "abc"),
    )
}

fn arguments(value: Value) -> Option<JsonObject> {
    match value {
        Value::Object(map) => Some(map),
        _ => panic!("arguments must be a JSON object"),
    }
}

fn payload(result: &CallToolResult) -> Value {
    assert_ne!(result.is_error, Some(true));
    let text = result
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .expect("text content");
    serde_json::from_str(&text).expect("json payload")
}

fn error_kind(err: &rmcp::ErrorData) -> Option<&str> {
    err.data.as_ref()?.get("kind")?.as_str()
}

/// Fills every required parameter with a value that passes validation.
fn minimal_arguments(schema: &JsonObject) -> Option<JsonObject> {
    let mut arguments = JsonObject::new();
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            arguments.insert(name.to_string(), Value::from("1"));
        }
    }
    Some(arguments)
}

#[test]
fn readonly_registers_only_non_mutating_tools() {
    let catalog = tools::catalog();
    let readonly = ToolRegistry::build(tools::catalog(), true).expect("readonly registry");
    let writable = ToolRegistry::build(tools::catalog(), false).expect("writable registry");

    for descriptor in &catalog {
        assert!(writable.contains(descriptor.name()), "{}", descriptor.name());
        assert_eq!(
            readonly.contains(descriptor.name()),
            !descriptor.is_mutating(),
            "{}",
            descriptor.name()
        );
    }
    assert!(readonly.len() < writable.len());
}

#[test]
fn advertised_tools_follow_registration_order() {
    let transport = StubTransport::new(Reply::Json(Value::Null));
    let server = server(true, &transport);
    let advertised: Vec<String> = server
        .tools()
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    let registered: Vec<String> = server.registry().names().map(str::to_string).collect();
    assert_eq!(advertised, registered);
    assert!(!advertised.iter().any(|name| name == "create_issue"));
}

#[tokio::test]
async fn mutating_flag_matches_http_verb() {
    let transport = StubTransport::new(Reply::Json(json!({})));
    let server = server(false, &transport);
    let never = CancellationToken::new();

    for descriptor in server.registry().descriptors() {
        let before = transport.requests().len();
        server
            .invoke(descriptor.name(), minimal_arguments(descriptor.schema()), &never)
            .await
            .unwrap_or_else(|err| panic!("{} failed: {}", descriptor.name(), err.message));

        let requests = transport.requests();
        assert_eq!(requests.len(), before + 1, "{}", descriptor.name());
        let method = requests[before].method;
        assert_eq!(
            method.is_mutating(),
            descriptor.is_mutating(),
            "{} uses {method}",
            descriptor.name()
        );
    }
}

#[tokio::test]
async fn missing_required_parameter_never_reaches_gitlab() {
    let transport = StubTransport::new(Reply::Json(json!({ "title": "Bug" })));
    let server = server(true, &transport);

    let err = server
        .invoke("get_issue", arguments(json!({ "project_id": "42" })), &CancellationToken::new())
        .await
        .expect_err("missing iid");

    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert_eq!(error_kind(&err), Some("invalid_params"));
    assert_eq!(
        err.data.as_ref().and_then(|data| data.get("parameter")),
        Some(&json!("issue_iid"))
    );
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn wrong_type_and_bad_iid_are_rejected_before_the_call() {
    let transport = StubTransport::new(Reply::Json(json!({})));
    let server = server(true, &transport);
    let never = CancellationToken::new();

    let wrong_type = server
        .invoke("get_issue", arguments(json!({ "project_id": 42, "issue_iid": "7" })), &never)
        .await
        .expect_err("number project id");
    let bad_iid = server
        .invoke("get_issue", arguments(json!({ "project_id": "42", "issue_iid": "x" })), &never)
        .await
        .expect_err("non-numeric iid");
    let bad_enum = server
        .invoke("list_issues", arguments(json!({ "project_id": "42", "state": "merged" })), &never)
        .await
        .expect_err("unknown state");

    for err in [&wrong_type, &bad_iid, &bad_enum] {
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn oversized_page_size_names_the_parameter() {
    let transport = StubTransport::new(Reply::Json(json!([])));
    let server = server(true, &transport);

    let err = server
        .invoke(
            "list_issues",
            arguments(json!({ "project_id": "42", "per_page": 10_000_000_000_u64 })),
            &CancellationToken::new(),
        )
        .await
        .expect_err("per_page wider than u32");

    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert_eq!(error_kind(&err), Some("invalid_params"));
    assert_eq!(
        err.data.as_ref().and_then(|data| data.get("parameter")),
        Some(&json!("per_page"))
    );
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn canned_success_is_returned_unchanged() {
    let canned = json!([{ "iid": 7, "title": "Bug", "labels": ["bug"] }]);
    let transport = StubTransport::new(Reply::Json(canned.clone()));
    let server = server(true, &transport);

    let result = server
        .invoke(
            "list_issues",
            arguments(json!({ "project_id": "group/project", "labels": ["bug"], "per_page": 5 })),
            &CancellationToken::new(),
        )
        .await
        .expect("success");

    assert_eq!(payload(&result), canned);
    let request = &transport.requests()[0];
    assert_eq!(request.segments[1], "group/project");
    assert_eq!(request.query_value("per_page"), Some("5"));
}

#[tokio::test]
async fn not_found_is_distinct_from_unauthorized() {
    let never = CancellationToken::new();
    let args = || arguments(json!({ "project_id": "42", "issue_iid": "7" }));

    let not_found = server(true, &StubTransport::new(Reply::Status(404)))
        .invoke("get_issue", args(), &never)
        .await
        .expect_err("404");
    let unauthorized = server(true, &StubTransport::new(Reply::Status(401)))
        .invoke("get_issue", args(), &never)
        .await
        .expect_err("401");
    let forbidden = server(true, &StubTransport::new(Reply::Status(403)))
        .invoke("get_issue", args(), &never)
        .await
        .expect_err("403");

    assert_eq!(not_found.code, ErrorCode::RESOURCE_NOT_FOUND);
    assert_eq!(error_kind(&not_found), Some("not_found"));
    assert_eq!(unauthorized.code, UNAUTHORIZED);
    assert_eq!(error_kind(&unauthorized), Some("unauthorized"));
    assert_eq!(forbidden.code, UNAUTHORIZED);
    assert_ne!(not_found.code, unauthorized.code);
    assert!(not_found.message.contains("stubbed failure"));
}

#[tokio::test]
async fn session_continues_after_a_failed_call() {
    let transport = StubTransport::new(Reply::Status(500));
    let server = server(true, &transport);
    let never = CancellationToken::new();

    for _ in 0..2 {
        let err = server
            .invoke("get_project", arguments(json!({ "project_id": "42" })), &never)
            .await
            .expect_err("upstream failure");
        assert_eq!(error_kind(&err), Some("upstream"));
    }
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn sessions_never_observe_each_others_credentials() {
    let registry =
        Arc::new(ToolRegistry::build(tools::catalog(), true).expect("catalog registers"));
    let clients: Arc<dyn ClientFactory> = Arc::new(EchoFactory);
    let first = GitlabMcp::new(
        registry.clone(),
        clients.clone(),
        session("https://gitlab.example.com", "abc"),
    );
    let second = GitlabMcp::new(registry, clients, session("https://git.internal.test", "xyz"));

    let run = |server: GitlabMcp| async move {
        let never = CancellationToken::new();
        let mut seen = Vec::new();
        for _ in 0..16 {
            let result = server
                .invoke("get_current_user", None, &never)
                .await
                .expect("echo");
            seen.push(payload(&result));
        }
        seen
    };
    let (first_seen, second_seen) = tokio::join!(run(first), run(second));

    assert!(first_seen.iter().all(|echo| echo
        == &json!({ "endpoint": "https://gitlab.example.com/", "token": "abc" })));
    assert!(second_seen.iter().all(|echo| echo
        == &json!({ "endpoint": "https://git.internal.test/", "token": "xyz" })));
}

#[tokio::test]
async fn readonly_end_to_end_scenario() {
    let transport = StubTransport::new(Reply::Json(json!({ "title": "Bug" })));
    let server = server(true, &transport);
    let never = CancellationToken::new();

    assert!(server.registry().contains("get_issue"));
    assert!(!server.registry().contains("create_issue"));

    let result = server
        .invoke("get_issue", arguments(json!({ "project_id": "42", "issue_iid": "7" })), &never)
        .await
        .expect("get_issue");
    assert_eq!(payload(&result), json!({ "title": "Bug" }));
    assert_eq!(transport.requests()[0].path(), "/projects/42/issues/7");

    let err = server
        .invoke("create_issue", arguments(json!({ "project_id": "42", "title": "New" })), &never)
        .await
        .expect_err("not registered");
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(err.message.contains("tool not found"));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn cancelled_call_reports_cancellation() {
    let transport = StubTransport::new(Reply::Hang);
    let server = server(true, &transport);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = server
        .invoke("get_project", arguments(json!({ "project_id": "42" })), &cancel)
        .await
        .expect_err("cancelled");
    assert_eq!(err.code, CANCELLED);
    assert_eq!(error_kind(&err), Some("cancelled"));
}

#[tokio::test]
async fn shutdown_aborts_in_flight_calls() {
    let transport = StubTransport::new(Reply::Hang);
    let shutdown = CancellationToken::new();
    let server = server(true, &transport).with_shutdown(shutdown.clone());

    let call = tokio::spawn(async move {
        server
            .invoke("get_project", arguments(json!({ "project_id": "42" })), &CancellationToken::new())
            .await
    });
    while transport.requests().is_empty() {
        tokio::task::yield_now().await;
    }
    shutdown.cancel();

    let err = call.await.expect("task joins").expect_err("aborted");
    assert_eq!(err.code, CANCELLED);
}

#[tokio::test]
async fn unattached_session_is_an_internal_error() {
    let transport = StubTransport::new(Reply::Json(json!({})));
    let registry = ToolRegistry::build(tools::catalog(), true).expect("catalog registers");
    let server = GitlabMcp::new(
        Arc::new(registry),
        Arc::new(StubFactory {
            transport: transport.clone(),
        }),
        SessionContext::new(),
    );

    let err = server
        .invoke("get_current_user", None, &CancellationToken::new())
        .await
        .expect_err("no credentials");
    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    assert!(transport.requests().is_empty());
}
