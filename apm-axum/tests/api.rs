use apm_axum::{config::AxumConfig, router};
use apm_sqlite::{Db, config::SqliteConfig};
use axum_test::TestServer;
use rstest::rstest;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

mod app;
use app::TestApp;

async fn server() -> TestServer {
    let db = Db::open(&SqliteConfig::default()).await.unwrap();
    TestServer::new(router(TestApp::new(db), AxumConfig::default())).unwrap()
}

/// A bearer token carrying plain-text identity claims for a fresh user.
fn credentials(name: &str) -> String {
    format!("{}|{name}@example.com|{name}", Uuid::new_v4())
}

fn part(title: &str, price: f64, hours_left: i64) -> Value {
    let end_date = OffsetDateTime::now_utc() + Duration::hours(hours_left);
    json!({
        "title": title,
        "description": "A part in good working order",
        "category": "engine",
        "make": "Volvo",
        "model": "240",
        "year": 1992,
        "condition": "used",
        "location": "Gothenburg",
        "end_date": end_date.format(&Rfc3339).unwrap(),
        "price": price,
    })
}

async fn create_listing(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/listings")
        .authorization_bearer(token)
        .json(&body)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

#[test_log::test(tokio::test)]
async fn health_and_docs() {
    let server = server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));

    let response = server.get("/docs/api.json").await;
    response.assert_status_ok();
    let api = response.json::<Value>();
    assert_eq!(api["info"]["title"], "Auto Parts Marketplace API");
}

#[test_log::test(tokio::test)]
async fn bidding_over_http() {
    let server = server().await;
    let alice = credentials("alice");
    let bob = credentials("bob");

    let listing = create_listing(&server, &alice, part("turbocharger", 100.0, 1)).await;
    let id = listing["id"].as_str().unwrap().to_string();
    assert_eq!(listing["price"], 100.0);
    assert_eq!(listing["status"], "active");

    // anonymous bids get 401 before anything else
    let response = server
        .post(&format!("/listings/{id}/bids"))
        .json(&json!({ "amount": 150.0 }))
        .await;
    response.assert_status_unauthorized();

    // bob's 150 is accepted and becomes the new price
    let response = server
        .post(&format!("/listings/{id}/bids"))
        .authorization_bearer(&bob)
        .json(&json!({ "amount": 150.0 }))
        .await;
    response.assert_status_ok();
    let updated = response.json::<Value>();
    assert_eq!(updated["price"], 150.0);
    assert_eq!(updated["bids"].as_array().unwrap().len(), 1);

    // bob's follow-up 120 no longer clears the bar
    let response = server
        .post(&format!("/listings/{id}/bids"))
        .authorization_bearer(&bob)
        .json(&json!({ "amount": 120.0 }))
        .await;
    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("higher than the current price")
    );

    // alice cannot bid on her own listing, at any amount
    let response = server
        .post(&format!("/listings/{id}/bids"))
        .authorization_bearer(&alice)
        .json(&json!({ "amount": 200.0 }))
        .await;
    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert!(body["error"].as_str().unwrap().contains("own listing"));

    // rejected bids were never recorded
    let response = server.get(&format!("/listings/{id}/bids")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);
}

#[rstest]
#[case(0.0)]
#[case(-5.0)]
#[test_log::test(tokio::test)]
async fn malformed_amounts_are_rejected_before_lookup(#[case] amount: f64) {
    let server = server().await;
    let bob = credentials("bob");

    // a malformed amount is 400 even when the listing does not exist
    let response = server
        .post(&format!("/listings/{}/bids", Uuid::new_v4()))
        .authorization_bearer(&bob)
        .json(&json!({ "amount": amount }))
        .await;
    response.assert_status_bad_request();
}

#[test_log::test(tokio::test)]
async fn well_formed_bid_on_missing_listing_is_404() {
    let server = server().await;
    let bob = credentials("bob");

    let response = server
        .post(&format!("/listings/{}/bids", Uuid::new_v4()))
        .authorization_bearer(&bob)
        .json(&json!({ "amount": 100.0 }))
        .await;
    response.assert_status_not_found();
}

#[test_log::test(tokio::test)]
async fn ended_auctions_reject_bids() {
    let server = server().await;
    let alice = credentials("alice");
    let bob = credentials("bob");

    let listing = create_listing(&server, &alice, part("camshaft", 100.0, -1)).await;
    let id = listing["id"].as_str().unwrap();
    assert_eq!(listing["status"], "ended");

    let response = server
        .post(&format!("/listings/{id}/bids"))
        .authorization_bearer(&bob)
        .json(&json!({ "amount": 1_000_000.0 }))
        .await;
    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert!(body["error"].as_str().unwrap().contains("ended"));
}

#[test_log::test(tokio::test)]
async fn browse_filters_combine() {
    let server = server().await;
    let alice = credentials("alice");

    create_listing(&server, &alice, part("turbocharger", 100.0, 1)).await;
    let mut brakes = part("brake disc", 40.0, 1);
    brakes["category"] = json!("brakes");
    create_listing(&server, &alice, brakes).await;

    let response = server.get("/listings").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2);

    let response = server
        .get("/listings")
        .add_query_param("category", "brakes")
        .add_query_param("max_price", 40.0)
        .await;
    response.assert_status_ok();
    let results = response.json::<Value>();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "brake disc");
}

#[test_log::test(tokio::test)]
async fn only_the_seller_manages_a_listing() {
    let server = server().await;
    let alice = credentials("alice");
    let mallory = credentials("mallory");

    let listing = create_listing(&server, &alice, part("driveshaft", 50.0, 1)).await;
    let id = listing["id"].as_str().unwrap().to_string();

    let mut edited = part("refurbished driveshaft", 50.0, 1);
    edited.as_object_mut().unwrap().remove("price");

    let response = server
        .put(&format!("/listings/{id}"))
        .authorization_bearer(&mallory)
        .json(&edited)
        .await;
    response.assert_status_forbidden();

    let response = server
        .put(&format!("/listings/{id}"))
        .authorization_bearer(&alice)
        .json(&edited)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["title"], "refurbished driveshaft");

    let response = server
        .delete(&format!("/listings/{id}"))
        .authorization_bearer(&mallory)
        .await;
    response.assert_status_forbidden();

    let response = server
        .delete(&format!("/listings/{id}"))
        .authorization_bearer(&alice)
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = server.get(&format!("/listings/{id}")).await;
    response.assert_status_not_found();
}

#[test_log::test(tokio::test)]
async fn image_attachment_and_urls() {
    let server = server().await;
    let alice = credentials("alice");
    let mallory = credentials("mallory");

    let listing = create_listing(&server, &alice, part("fender", 30.0, 1)).await;
    let id = listing["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/listings/{id}/images"))
        .authorization_bearer(&alice)
        .json(&json!({ "key": "uploads/fender.jpg", "is_default": true }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let image = response.json::<Value>();
    assert_eq!(image["url"], "https://media.test/uploads/fender.jpg");
    let image_id = image["id"].as_str().unwrap().to_string();

    // the image travels with the listing, url resolved
    let response = server.get(&format!("/listings/{id}")).await;
    let listing = response.json::<Value>();
    assert_eq!(
        listing["images"][0]["url"],
        "https://media.test/uploads/fender.jpg"
    );

    let response = server
        .delete(&format!("/images/{image_id}"))
        .authorization_bearer(&mallory)
        .await;
    response.assert_status_forbidden();

    let response = server
        .delete(&format!("/images/{image_id}"))
        .authorization_bearer(&alice)
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);
}

#[test_log::test(tokio::test)]
async fn account_dashboards_and_deletion() {
    let server = server().await;
    let alice = credentials("alice");
    let bob = credentials("bob");

    let listing = create_listing(&server, &alice, part("gearbox", 10.0, 1)).await;
    let id = listing["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/listings/{id}/bids"))
        .authorization_bearer(&bob)
        .json(&json!({ "amount": 20.0 }))
        .await
        .assert_status_ok();

    let response = server
        .get("/me/listings")
        .authorization_bearer(&alice)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

    let response = server.get("/me/bids").authorization_bearer(&bob).await;
    response.assert_status_ok();
    let bids = response.json::<Value>();
    let bids = bids.as_array().unwrap();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0]["amount"], 20.0);
    assert_eq!(bids[0]["listing"]["id"].as_str().unwrap(), id);

    let response = server
        .put("/me/settings")
        .authorization_bearer(&bob)
        .json(&json!({ "name": "Robert" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "Robert");

    // deleting alice takes her listing and bob's bid on it with her
    let response = server.delete("/me").authorization_bearer(&alice).await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = server.get(&format!("/listings/{id}")).await;
    response.assert_status_not_found();

    let response = server.get("/me/bids").authorization_bearer(&bob).await;
    response.assert_status_ok();
    assert!(response.json::<Value>().as_array().unwrap().is_empty());
}
