// Account Server calls: asset scopes, product creation, unauthenticated ping

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use squonk2_integration_tests::{as_client, TOKEN};
use squonk2_sdk::{ErrorKind, NewProduct};

const UNIT_ID: &str = "unit-0a1b2c3d-0000-4000-8000-abcdefabcdef";
const PRODUCT_ID: &str = "product-0a1b2c3d-0000-4000-8000-abcdefabcdef";
const ORG_ID: &str = "org-0a1b2c3d-0000-4000-8000-abcdefabcdef";

async fn mount_assets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/asset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"assets": []})))
        .mount(server)
        .await;
}

fn last_query(requests: &[Request]) -> Option<String> {
    requests.last().and_then(|r| r.url.query().map(str::to_string))
}

#[tokio::test]
async fn test_asset_scope_query_parameters() {
    let server = MockServer::start().await;
    mount_assets(&server).await;
    let client = as_client(&server);

    let cases = [
        (UNIT_ID, format!("unit_id={}", UNIT_ID)),
        (PRODUCT_ID, format!("product_id={}", PRODUCT_ID)),
        (ORG_ID, format!("org_id={}", ORG_ID)),
        ("dlister", "user_id=dlister".to_string()),
    ];
    for (scope_id, expected) in cases {
        client.get_available_assets(TOKEN, Some(scope_id)).await.unwrap();
        let requests = server.received_requests().await.unwrap();
        assert_eq!(last_query(&requests), Some(expected));
    }

    client.get_available_assets(TOKEN, None).await.unwrap();
    let requests = server.received_requests().await.unwrap();
    assert_eq!(last_query(&requests), None);
}

#[tokio::test]
async fn test_unsupported_asset_scope_makes_no_request() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let err = as_client(&server)
        .get_available_assets(TOKEN, Some("asset-0a1b2c3d-0000-4000-8000-abcdefabcdef"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Domain);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_product_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/product/unit/{}", UNIT_ID)))
        .and(body_json(json!({
            "name": "Storage",
            "type": "DATA_MANAGER_STORAGE_SUBSCRIPTION",
            "allowance": 10,
            "limit": 10
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": PRODUCT_ID})))
        .expect(1)
        .mount(&server)
        .await;

    let product = NewProduct::new("Storage", "DATA_MANAGER_STORAGE_SUBSCRIPTION")
        .with_allowance(10)
        .with_limit(10);
    let created = as_client(&server)
        .create_product(TOKEN, UNIT_ID, &product)
        .await
        .unwrap();
    assert_eq!(created.id, PRODUCT_ID);
}

#[tokio::test]
async fn test_unit_life_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/organisation/{}/unit", ORG_ID)))
        .and(body_json(json!({"billing_day": 8, "name": "Example"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": UNIT_ID})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/unit/{}", UNIT_ID)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = as_client(&server);
    let unit = client.create_unit(TOKEN, ORG_ID, "Example", 8).await.unwrap();
    assert_eq!(unit.id, UNIT_ID);
    client.delete_unit(TOKEN, &unit.id).await.unwrap();

    let err = client.create_unit(TOKEN, ORG_ID, "Example", 29).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Contract);
}

#[tokio::test]
async fn test_product_charges_date_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/product/{}/charges", PRODUCT_ID)))
        .and(query_param("from", "2022-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"charges": []})))
        .expect(1)
        .mount(&server)
        .await;

    let from = chrono_date(2022, 1, 1);
    as_client(&server)
        .get_product_charges(TOKEN, PRODUCT_ID, Some(from), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ping_needs_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "2.0.0"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = as_client(&server);
    client.ping().await.unwrap();
    assert_eq!(client.get_version().await.unwrap().version, "2.0.0");

    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !r.headers.contains_key("authorization")));
}

fn chrono_date(year: i32, month: u32, day: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
