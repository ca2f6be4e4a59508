//! SOAP session tests
//!
//! WSDL discovery, envelope encoding and fault handling against a mock server.

use magento_api::{Api, CallSpec, MagentoError, Protocol, SessionConfig, SessionHandle};
use mockito::Matcher;
use serde_json::json;

const SERVICE_PATH: &str = "/index.php/api/index/index/";

fn wsdl(location: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns:typens="urn:Magento" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns="http://schemas.xmlsoap.org/wsdl/" name="Magento" targetNamespace="urn:Magento">
  <portType name="Mage_Api_Model_Server_HandlerPortType"/>
  <service name="MagentoService">
    <port name="Mage_Api_Model_Server_HandlerPort" binding="typens:Mage_Api_Model_Server_HandlerBinding">
      <soap:address location="{}"/>
    </port>
  </service>
</definitions>"#,
        location
    )
}

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ns1="urn:Magento" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:ns2="http://xml.apache.org/xml-soap" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"><SOAP-ENV:Body>{}</SOAP-ENV:Body></SOAP-ENV:Envelope>"#,
        body
    )
}

async fn mock_wsdl(server: &mut mockito::ServerGuard) -> mockito::Mock {
    let location = format!("{}{}", server.url(), SERVICE_PATH);
    server
        .mock("GET", "/api/")
        .match_query(Matcher::Regex("wsdl".to_string()))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(wsdl(&location))
        .create_async()
        .await
}

async fn mock_login(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", SERVICE_PATH)
        .match_header("soapaction", "\"urn:Action\"")
        .match_body(Matcher::Regex(
            r#"<ns1:login><username xsi:type="xsd:string">ws-user</username><apiKey xsi:type="xsd:string">api-key</apiKey></ns1:login>"#
                .to_string(),
        ))
        .with_status(200)
        .with_body(envelope(
            r#"<ns1:loginResponse><loginReturn xsi:type="xsd:string">soap-sess</loginReturn></ns1:loginResponse>"#,
        ))
        .create_async()
        .await
}

fn soap_api(server: &mockito::ServerGuard) -> Api {
    Api::new(
        SessionConfig::new(server.url(), "ws-user", "api-key").with_protocol(Protocol::Soap),
    )
    .unwrap()
}

#[tokio::test]
async fn connect_discovers_service_location() {
    let mut server = mockito::Server::new_async().await;
    let wsdl = mock_wsdl(&mut server).await;

    let api = soap_api(&server);
    assert!(api.endpoint().ends_with("/api/?wsdl"));
    api.connect().await.unwrap();

    assert!(api.is_connected());
    assert!(!api.is_logged_in());
    wsdl.assert_async().await;
}

#[tokio::test]
async fn login_call_and_end_session() {
    let mut server = mockito::Server::new_async().await;
    let _wsdl = mock_wsdl(&mut server).await;
    let login = mock_login(&mut server).await;
    let call = server
        .mock("POST", SERVICE_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"<ns1:call><sessionId xsi:type="xsd:string">soap-sess</sessionId>"#.to_string()),
            Matcher::Regex(r#"<resourcePath xsi:type="xsd:string">customer\.list</resourcePath>"#.to_string()),
            Matcher::Regex(r#"<key xsi:type="xsd:string">group_id</key><value xsi:type="xsd:int">1</value>"#.to_string()),
        ]))
        .with_status(200)
        .with_body(envelope(
            r#"<ns1:callResponse><callReturn SOAP-ENC:arrayType="ns2:Map[1]" xsi:type="SOAP-ENC:Array"><item xsi:type="ns2:Map"><item><key xsi:type="xsd:string">customer_id</key><value xsi:type="xsd:string">5</value></item><item><key xsi:type="xsd:string">group_id</key><value xsi:type="xsd:int">1</value></item></item></callReturn></ns1:callResponse>"#,
        ))
        .create_async()
        .await;
    let end = server
        .mock("POST", SERVICE_PATH)
        .match_body(Matcher::Regex(
            r#"<ns1:endSession><sessionId xsi:type="xsd:string">soap-sess</sessionId></ns1:endSession>"#.to_string(),
        ))
        .with_status(200)
        .with_body(envelope(
            r#"<ns1:endSessionResponse><endSessionReturn xsi:type="xsd:boolean">true</endSessionReturn></ns1:endSessionResponse>"#,
        ))
        .create_async()
        .await;

    let api = soap_api(&server);
    api.enter().await.unwrap();
    assert_eq!(api.session(), Some(SessionHandle::Token("soap-sess".to_string())));

    let customers = api
        .call("customer.list", json!([{"group_id": 1}]))
        .await
        .unwrap();
    assert_eq!(customers, json!([{"customer_id": "5", "group_id": 1}]));

    api.exit().await.unwrap();
    assert!(!api.is_logged_in());

    login.assert_async().await;
    call.assert_async().await;
    end.assert_async().await;
}

#[tokio::test]
async fn soap_fault_maps_to_fault_error() {
    let mut server = mockito::Server::new_async().await;
    let _wsdl = mock_wsdl(&mut server).await;
    let _login = mock_login(&mut server).await;
    let _call = server
        .mock("POST", SERVICE_PATH)
        .match_body(Matcher::Regex("<ns1:call>".to_string()))
        .with_status(500)
        .with_body(envelope(
            "<SOAP-ENV:Fault><faultcode>3</faultcode><faultstring>Invalid api path.</faultstring></SOAP-ENV:Fault>",
        ))
        .create_async()
        .await;

    let api = soap_api(&server);
    api.enter().await.unwrap();
    let err = api.call("nothing.here", json!([])).await.unwrap_err();

    match err {
        MagentoError::Fault { code, message } => {
            assert_eq!(code, "3");
            assert_eq!(message, "Invalid api path.");
        }
        other => panic!("expected fault, got {:?}", other),
    }
}

#[tokio::test]
async fn multi_call_encodes_calls_array() {
    let mut server = mockito::Server::new_async().await;
    let _wsdl = mock_wsdl(&mut server).await;
    let _login = mock_login(&mut server).await;
    let multi = server
        .mock("POST", SERVICE_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<ns1:multiCall>".to_string()),
            Matcher::Regex(
                r#"<calls SOAP-ENC:arrayType="xsd:anyType\[2\]" xsi:type="SOAP-ENC:Array">"#.to_string(),
            ),
        ]))
        .with_status(200)
        .with_body(envelope(
            r#"<ns1:multiCallResponse><multiCallReturn SOAP-ENC:arrayType="xsd:anyType[2]" xsi:type="SOAP-ENC:Array"><item xsi:type="xsd:boolean">true</item><item xsi:type="xsd:int">4</item></multiCallReturn></ns1:multiCallResponse>"#,
        ))
        .create_async()
        .await;

    let api = soap_api(&server);
    api.enter().await.unwrap();
    let result = api
        .multi_call(&[
            CallSpec::new("customer.delete", json!([3])),
            CallSpec::new("customer.create", json!([{"email": "a@example.com"}])),
        ])
        .await
        .unwrap();

    assert_eq!(result, json!([true, 4]));
    multi.assert_async().await;
}

#[tokio::test]
async fn missing_wsdl_is_http_error() {
    let mut server = mockito::Server::new_async().await;
    let _wsdl = server
        .mock("GET", "/api/")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("not here")
        .create_async()
        .await;

    let api = soap_api(&server);
    let err = api.enter().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(!api.is_connected());
}
