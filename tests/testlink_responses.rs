mod common;

use common::*;
use requirement_butler::{run, testlink::TestLinkError, ForwardError};

async fn submit_with_response(status: usize, body: &str) -> ForwardError {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", XMLRPC_PATH)
        .with_status(status)
        .with_header("content-type", "text/xml")
        .with_body(body)
        .create_async()
        .await;

    let payload = payload_file(payload_template::GITHUB_ISSUES_OPENED);
    let state = state(&server.url(), Some(payload.path().to_path_buf()));

    let err = run(&state).await.unwrap_err();
    mock.assert_async().await;

    assert_eq!(err.exit_code(), 1);
    err
}

#[tokio::test]
async fn test_xmlrpc_fault() {
    let err = submit_with_response(200, response_template::UNKNOWN_METHOD_FAULT).await;

    assert!(matches!(
        err,
        ForwardError::Submission {
            source: TestLinkError::Fault { code: -32601, .. }
        }
    ));
}

#[tokio::test]
async fn test_testlink_error_list() {
    let err = submit_with_response(200, response_template::INVALID_PROJECT).await;

    let ForwardError::Submission {
        source: TestLinkError::Rejected { code, message },
    } = &err
    else {
        panic!("expected a rejection, got {:?}", err);
    };
    assert_eq!(*code, 7000);
    assert!(message.contains("Test Project ID (11)"));
    assert!(err.to_string().starts_with("ERROR calling TestLink XML-RPC"));
}

#[tokio::test]
async fn test_http_error_status() {
    let err = submit_with_response(500, "Internal Server Error").await;

    assert!(matches!(
        err,
        ForwardError::Submission {
            source: TestLinkError::Http { status: 500, .. }
        }
    ));
}

#[tokio::test]
async fn test_unreadable_response() {
    let err = submit_with_response(200, "<html><body>Maintenance</body></html>").await;

    assert!(matches!(
        err,
        ForwardError::Submission {
            source: TestLinkError::MalformedResponse { .. }
        }
    ));
}

#[tokio::test]
async fn test_unreachable_server() {
    let payload = payload_file(payload_template::GITHUB_ISSUES_OPENED);
    // Port 1 is reserved and nothing listens on it
    let state = state("http://127.0.0.1:1", Some(payload.path().to_path_buf()));

    let err = run(&state).await.unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(matches!(
        err,
        ForwardError::Submission {
            source: TestLinkError::Transport { .. }
        }
    ));
}
