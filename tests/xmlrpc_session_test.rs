//! XML-RPC session tests
//!
//! Exercise the login / call / multiCall / endSession lifecycle against a mock
//! XML-RPC endpoint and through a custom transport.

use async_trait::async_trait;
use magento_api::protocols::transport::{Transport, TransportResponse};
use magento_api::{Api, CallSpec, MagentoError, SessionConfig, SessionHandle};
use mockito::Matcher;
use serde_json::json;
use std::sync::{Arc, Mutex};

const XMLRPC_PATH: &str = "/index.php/api/xmlrpc";

fn response(value_xml: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<methodResponse><params><param><value>{}</value></param></params></methodResponse>",
        value_xml
    )
}

fn fault(code: i32, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<methodResponse><fault><value><struct>\
         <member><name>faultCode</name><value><int>{}</int></value></member>\
         <member><name>faultString</name><value><string>{}</string></value></member>\
         </struct></value></fault></methodResponse>",
        code, message
    )
}

async fn mock_login(server: &mut mockito::ServerGuard, session_id: &str) -> mockito::Mock {
    server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::Regex(
            r"<methodName>login</methodName>.*<string>ws-user</string>.*<string>api-key</string>"
                .to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(response(&format!("<string>{}</string>", session_id)))
        .create_async()
        .await
}

fn api_for(server: &mockito::ServerGuard) -> Api {
    Api::new(SessionConfig::new(server.url(), "ws-user", "api-key")).unwrap()
}

#[tokio::test]
async fn login_call_and_end_session() {
    let mut server = mockito::Server::new_async().await;
    let login = mock_login(&mut server, "sess-123").await;
    let call = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r"<methodName>call</methodName>".to_string()),
            Matcher::Regex(r"<string>sess-123</string>".to_string()),
            Matcher::Regex(r"<string>customer\.info</string>".to_string()),
            Matcher::Regex(r"<array><data><value><int>7</int></value></data></array>".to_string()),
        ]))
        .with_status(200)
        .with_body(response(
            "<struct><member><name>customer_id</name><value><string>7</string></value></member>\
             <member><name>email</name><value><string>jo@example.com</string></value></member></struct>",
        ))
        .create_async()
        .await;
    let end = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::Regex(
            r"<methodName>endSession</methodName>.*<string>sess-123</string>".to_string(),
        ))
        .with_status(200)
        .with_body(response("<boolean>1</boolean>"))
        .create_async()
        .await;

    let api = api_for(&server);
    api.enter().await.unwrap();
    assert_eq!(api.session(), Some(SessionHandle::Token("sess-123".to_string())));

    let customer = api.call("customer.info", json!([7])).await.unwrap();
    assert_eq!(customer, json!({"customer_id": "7", "email": "jo@example.com"}));

    api.exit().await.unwrap();
    assert_eq!(api.session(), None);

    login.assert_async().await;
    call.assert_async().await;
    end.assert_async().await;
}

#[tokio::test]
async fn multi_call_sends_batch_of_pairs() {
    let mut server = mockito::Server::new_async().await;
    let _login = mock_login(&mut server, "s1").await;
    let multi = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r"<methodName>multiCall</methodName>".to_string()),
            Matcher::Regex(
                r"<value><array><data><value><string>customer\.list</string></value><value><array><data></data></array></value></data></array></value>"
                    .to_string(),
            ),
            Matcher::Regex(r"<string>directory_country\.list</string>".to_string()),
        ]))
        .with_status(200)
        .with_body(response(
            "<array><data><value><array><data></data></array></value><value><array><data></data></array></value></data></array>",
        ))
        .create_async()
        .await;

    let api = api_for(&server);
    api.enter().await.unwrap();
    let results = api
        .multi_call(&[
            CallSpec::new("customer.list", json!([])),
            CallSpec::new("directory_country.list", json!([])),
        ])
        .await
        .unwrap();

    assert_eq!(results, json!([[], []]));
    multi.assert_async().await;
}

#[tokio::test]
async fn fault_response_surfaces_code_and_message() {
    let mut server = mockito::Server::new_async().await;
    let _login = mock_login(&mut server, "s1").await;
    let _call = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::Regex(r"<methodName>call</methodName>".to_string()))
        .with_status(200)
        .with_body(fault(102, "Customer not exists."))
        .create_async()
        .await;

    let api = api_for(&server);
    api.enter().await.unwrap();
    let err = api.call("customer.info", json!([999])).await.unwrap_err();

    match err {
        MagentoError::Fault { code, message } => {
            assert_eq!(code, "102");
            assert_eq!(message, "Customer not exists.");
        }
        other => panic!("expected fault, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_login_leaves_no_session() {
    let mut server = mockito::Server::new_async().await;
    let _login = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::Regex(r"<methodName>login</methodName>".to_string()))
        .with_status(200)
        .with_body(fault(2, "Access denied."))
        .create_async()
        .await;

    let api = api_for(&server);
    let err = api.enter().await.unwrap_err();
    assert!(matches!(err, MagentoError::Fault { .. }));
    assert!(!api.is_logged_in());
    assert!(api.is_connected());
}

#[tokio::test]
async fn exit_clears_session_even_when_logout_fails() {
    let mut server = mockito::Server::new_async().await;
    let _login = mock_login(&mut server, "s1").await;
    let _end = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::Regex(r"<methodName>endSession</methodName>".to_string()))
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let api = api_for(&server);
    api.enter().await.unwrap();

    let err = api.exit().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(api.session(), None);

    let err = api.call("customer.list", json!([])).await.unwrap_err();
    assert!(matches!(err, MagentoError::NotLoggedIn));
}

#[tokio::test]
async fn scoped_session_logs_out_after_body() {
    let mut server = mockito::Server::new_async().await;
    let _login = mock_login(&mut server, "s9").await;
    let _call = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::Regex(r"<methodName>call</methodName>".to_string()))
        .with_status(200)
        .with_body(response("<int>3</int>"))
        .create_async()
        .await;
    let end = server
        .mock("POST", XMLRPC_PATH)
        .match_body(Matcher::Regex(r"<methodName>endSession</methodName>".to_string()))
        .with_status(200)
        .with_body(response("<boolean>1</boolean>"))
        .expect(1)
        .create_async()
        .await;

    let api = Arc::new(api_for(&server));
    let count = Arc::clone(&api)
        .scoped(|api| async move { api.call("customer.count", json!([])).await })
        .await
        .unwrap();

    assert_eq!(count, json!(3));
    assert!(!api.is_logged_in());
    end.assert_async().await;
}

/// Transport that records every request and replies from a script
struct ScriptedTransport {
    requests: Mutex<Vec<String>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> magento_api::Result<TransportResponse> {
        Err(MagentoError::NotSupported(format!("unexpected GET {}", url)))
    }

    async fn post(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        body: String,
    ) -> magento_api::Result<TransportResponse> {
        let reply = if body.contains("<methodName>login</methodName>") {
            response("<string>custom-session</string>")
        } else {
            response("<boolean>1</boolean>")
        };
        self.requests.lock().unwrap().push(body);
        Ok(TransportResponse {
            status: 200,
            body: reply,
        })
    }
}

#[tokio::test]
async fn custom_transport_replaces_http() {
    let transport = Arc::new(ScriptedTransport {
        requests: Mutex::new(Vec::new()),
    });

    let api = Api::new(
        SessionConfig::new("https://unreachable.invalid", "ws-user", "api-key")
            .with_transport(transport.clone()),
    )
    .unwrap();

    api.enter().await.unwrap();
    assert_eq!(
        api.session(),
        Some(SessionHandle::Token("custom-session".to_string()))
    );
    assert_eq!(api.call("customer.delete", json!([4])).await.unwrap(), json!(true));
    api.exit().await.unwrap();

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].contains("<methodName>login</methodName>"));
    assert!(requests[1].contains("<string>customer.delete</string>"));
    assert!(requests[2].contains("<methodName>endSession</methodName>"));
}
