//! End-to-end tests of the `/core` surface over the in-memory store

use std::sync::Arc;
use std::time::Duration;

use coredc_apid::{handle_request, CoreContext, UpstreamConfig};
use coredc_dbi::MemorySubscriberStore;
use coredc_model::testutil::{sample_json, TEST_K, TEST_OPC};
use coredc_sbi::{SbiRequest, SbiResponse};
use serde_json::Value;

const IMSI: &str = "001010000000001";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Context whose upstreams point at a port nobody listens on
fn context() -> CoreContext {
    init();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let upstreams = UpstreamConfig {
        mme_url: format!("http://127.0.0.1:{port}"),
        smf_url: format!("http://127.0.0.1:{port}"),
        timeout: Duration::from_secs(2),
    };
    CoreContext::new(Arc::new(MemorySubscriberStore::new()), &upstreams).unwrap()
}

fn body(response: &SbiResponse) -> Value {
    response.json_body().unwrap()
}

async fn create(ctx: &CoreContext, json: &Value) -> SbiResponse {
    let request = SbiRequest::post("/core/subscribers").with_json_body(json).unwrap();
    handle_request(ctx, request).await
}

async fn list(ctx: &CoreContext, uri: &str, params: &[(&str, &str)]) -> Vec<Value> {
    let mut request = SbiRequest::get(uri);
    for (key, value) in params {
        request = request.with_param(*key, *value);
    }
    let response = handle_request(ctx, request).await;
    assert_eq!(response.status, 200);
    body(&response).as_array().unwrap().clone()
}

#[tokio::test]
async fn test_core_root_lists_endpoints() {
    let ctx = context();
    let response = handle_request(&ctx, SbiRequest::get("/core")).await;
    assert_eq!(response.status, 200);
    assert!(body(&response)["endpoints"]["/pdu-info"].is_string());
}

#[tokio::test]
async fn test_create_then_list() {
    let ctx = context();
    assert!(list(&ctx, "/core/subscribers", &[]).await.is_empty());

    let response = create(&ctx, &sample_json(IMSI)).await;
    assert_eq!(response.status, 201);

    let created = body(&response);
    assert_eq!(created["imsi"], IMSI);
    assert!(created["_id"].is_string());
    assert_eq!(created["security"]["k"], TEST_K);
    assert_eq!(created["security"]["opc"], TEST_OPC);
    assert!(created["slice"][0]["session"][0]["_id"].is_string());

    let listed = list(&ctx, "/core/subscribers", &[]).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], created);
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let ctx = context();
    assert_eq!(create(&ctx, &sample_json(IMSI)).await.status, 201);

    let response = create(&ctx, &sample_json(IMSI)).await;
    assert_eq!(response.status, 409);
    assert_eq!(
        body(&response)["detail"],
        format!("Subscriber with IMSI {IMSI} already exists")
    );
    assert_eq!(list(&ctx, "/core/subscribers", &[]).await.len(), 1);
}

#[tokio::test]
async fn test_invalid_subscribers_are_rejected() {
    let ctx = context();

    let mut bad_imsi = sample_json("0010100000001");
    bad_imsi["name"] = Value::from("short imsi");

    let mut both = sample_json(IMSI);
    both["security"]["op"] = Value::from(TEST_OPC);

    let mut neither = sample_json(IMSI);
    neither["security"].as_object_mut().unwrap().remove("opc");

    let mut empty_op = sample_json(IMSI);
    empty_op["security"]["op"] = Value::from("");

    let mut bad_key = sample_json(IMSI);
    bad_key["security"]["k"] = Value::from("1234");

    let mut no_slices = sample_json(IMSI);
    no_slices["slice"] = Value::Array(Vec::new());

    for (json, param) in [
        (bad_imsi, "imsi"),
        (both, "security"),
        (neither, "security"),
        (empty_op, "security.op"),
        (bad_key, "security.k"),
        (no_slices, "slice"),
    ] {
        let response = create(&ctx, &json).await;
        assert_eq!(response.status, 422);
        assert_eq!(body(&response)["invalidParams"][0]["param"], param);
    }

    let response = handle_request(
        &ctx,
        SbiRequest::post("/core/subscribers").with_body("{not json", "application/json"),
    )
    .await;
    assert_eq!(response.status, 422);

    assert!(list(&ctx, "/core/subscribers", &[]).await.is_empty());
}

#[tokio::test]
async fn test_spaced_lowercase_key_is_canonicalised() {
    let ctx = context();
    let mut json = sample_json(IMSI);
    json["security"]["k"] = Value::from("465b5ce8 b199b49f aa5f0a2e e238a6bc");

    let response = create(&ctx, &json).await;
    assert_eq!(response.status, 201);
    assert_eq!(body(&response)["security"]["k"], TEST_K);
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let ctx = context();

    let mut alice = sample_json("001010000000001");
    alice["name"] = Value::from("Alice Example");
    let mut bob = sample_json("001010000000002");
    bob["name"] = Value::from("bob");
    bob["slice"][0]["sst"] = Value::from(2);
    bob["slice"][0]["sd"] = Value::from("abcdef");
    let carol = sample_json("001010000000003");

    for json in [&alice, &bob, &carol] {
        assert_eq!(create(&ctx, json).await.status, 201);
    }

    let by_name = list(&ctx, "/core/subscribers", &[("name", "ALICE")]).await;
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0]["imsi"], "001010000000001");

    let by_sst = list(&ctx, "/core/subscribers", &[("sst", "1")]).await;
    assert_eq!(by_sst.len(), 2);
    assert!(by_sst.iter().all(|s| s["slice"][0]["sst"] == 1));

    let by_slice = list(&ctx, "/core/subscribers", &[("sst", "2"), ("sd", "ABCDEF")]).await;
    assert_eq!(by_slice.len(), 1);
    assert_eq!(by_slice[0]["imsi"], "001010000000002");

    assert!(list(&ctx, "/core/subscribers", &[("sst", "2"), ("sd", "000001")]).await.is_empty());

    // sd alone does not filter
    assert_eq!(list(&ctx, "/core/subscribers", &[("sd", "ABCDEF")]).await.len(), 3);

    let page = list(&ctx, "/core/subscribers", &[("limit", "1"), ("offset", "1")]).await;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["imsi"], "001010000000002");

    for (param, value) in [
        ("limit", "0"),
        ("offset", "-1"),
        ("offset", "9223372036854775808"),
        ("sst", "one"),
    ] {
        let request = SbiRequest::get("/core/subscribers").with_param(param, value);
        let response = handle_request(&ctx, request).await;
        assert_eq!(response.status, 422, "{param}={value}");
        let problem: Value = response.json_body().unwrap();
        assert_eq!(problem["invalidParams"][0]["param"], param);
    }
}

#[tokio::test]
async fn test_replace_keeps_path_imsi() {
    let ctx = context();
    assert_eq!(create(&ctx, &sample_json(IMSI)).await.status, 201);

    let mut replacement = sample_json("001010000000999");
    replacement["name"] = Value::from("renamed");

    let request = SbiRequest::put(format!("/core/subscribers/{IMSI}"))
        .with_json_body(&replacement)
        .unwrap();
    let response = handle_request(&ctx, request).await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["status"], "success");
    assert_eq!(body(&response)["message"], format!("Subscriber {IMSI} updated"));

    let listed = list(&ctx, "/core/subscribers", &[]).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["imsi"], IMSI);
    assert_eq!(listed[0]["name"], "renamed");
}

#[tokio::test]
async fn test_replace_missing_subscriber() {
    let ctx = context();
    let request = SbiRequest::put("/core/subscribers/999999999999999")
        .with_json_body(&sample_json("999999999999999"))
        .unwrap();
    assert_eq!(handle_request(&ctx, request).await.status, 404);
}

#[tokio::test]
async fn test_delete() {
    let ctx = context();
    assert_eq!(create(&ctx, &sample_json(IMSI)).await.status, 201);

    let response = handle_request(&ctx, SbiRequest::delete(format!("/core/subscribers/{IMSI}"))).await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["message"], format!("Subscriber {IMSI} deleted"));
    assert!(list(&ctx, "/core/subscribers", &[]).await.is_empty());

    let response = handle_request(&ctx, SbiRequest::delete("/core/subscribers/999999999999999")).await;
    assert_eq!(response.status, 404);
    assert_eq!(
        body(&response)["detail"],
        "Subscriber with IMSI 999999999999999 not found"
    );
}

#[tokio::test]
async fn test_unknown_paths_and_methods() {
    let ctx = context();

    assert_eq!(handle_request(&ctx, SbiRequest::get("/")).await.status, 404);
    assert_eq!(handle_request(&ctx, SbiRequest::get("/core/unknown")).await.status, 404);
    assert_eq!(handle_request(&ctx, SbiRequest::get("/core/subscribers/a/b")).await.status, 404);

    assert_eq!(handle_request(&ctx, SbiRequest::delete("/core/subscribers")).await.status, 405);
    assert_eq!(
        handle_request(&ctx, SbiRequest::get(format!("/core/subscribers/{IMSI}"))).await.status,
        405
    );
    assert_eq!(handle_request(&ctx, SbiRequest::post("/core/enb-info")).await.status, 405);
    assert_eq!(handle_request(&ctx, SbiRequest::put("/core")).await.status, 405);
}

#[tokio::test]
async fn test_forwarding_to_unreachable_upstream() {
    let ctx = context();

    for resource in ["enb-info", "ue-info", "pdu-info"] {
        let response = handle_request(&ctx, SbiRequest::get(format!("/core/{resource}"))).await;
        assert_eq!(response.status, 502, "{resource}");

        let body = body(&response);
        assert_eq!(body["error"], "Bad gateway");
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Could not connect to http://127.0.0.1:"));
        assert!(detail.ends_with(&format!("/{resource}")));
    }
}
