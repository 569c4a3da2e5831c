mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{client, TestServer, SERVICE_KEY};

async fn send(
    server: &TestServer,
    method: reqwest::Method,
    body: Value,
) -> Result<(StatusCode, Value)> {
    let res = client()
        .request(method, server.url("/manage-properties"))
        .bearer_auth(SERVICE_KEY)
        .json(&body)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json::<Value>().await?))
}

async fn create(server: &TestServer, body: Value) -> Result<Value> {
    let (status, body) = send(server, reqwest::Method::POST, body).await?;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    Ok(body["property"].clone())
}

#[tokio::test]
async fn sunny_villa_end_to_end() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = send(
        &server,
        reqwest::Method::POST,
        json!({"title": "Sunny Villa", "location": "Lakeview", "description": "Nice house"}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Property added successfully");

    let property = &body["property"];
    assert_eq!(property["beds"], 1);
    assert_eq!(property["price"], 0);
    assert_eq!(property["type"], "House");
    assert_eq!(property["status"], "For Sale");
    assert_eq!(property["full_address"], "Lakeview");
    assert_eq!(property["is_rental"], false);

    let image_url = property["image_url"].as_str().expect("image_url");
    assert!(image_url.starts_with("https://readdy.ai/api/search-image?query="));
    assert!(image_url.contains("beautiful%20modern%20family%20house%20exterior"));
    assert!(image_url.contains("%2C%20sunny%20villa&width=600"));
    assert!(image_url.contains("&width=600&height=400&seq=prop"));
    assert_eq!(property["image"], property["image_url"]);
    Ok(())
}

#[tokio::test]
async fn malformed_numbers_are_clamped_to_floors() -> Result<()> {
    let server = TestServer::start().await?;

    let property = create(
        &server,
        json!({
            "title": "Cabin",
            "location": "Woods",
            "description": "Small",
            "price": "-5",
            "beds": "abc",
            "baths": 0,
            "sqft": "120",
            "garage": "-2",
        }),
    )
    .await?;

    assert_eq!(property["price"], 0);
    assert_eq!(property["beds"], 1);
    assert_eq!(property["baths"], 1);
    assert_eq!(property["sqft"], 1000);
    assert_eq!(property["garage"], 1);

    let property = create(
        &server,
        json!({
            "title": "Loft",
            "location": "Docks",
            "description": "Open plan",
            "price": "1250000.75",
            "type": "loft",
            "garage": 0,
            "sqft": 2400,
            "isRental": "false",
        }),
    )
    .await?;
    assert_eq!(property["price"], 1250000);
    assert_eq!(property["type"], "Loft");
    assert_eq!(property["garage"], 0);
    assert_eq!(property["sqft"], 2400);
    assert_eq!(property["is_rental"], false);
    Ok(())
}

#[tokio::test]
async fn missing_required_fields_is_400_without_insert() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = send(
        &server,
        reqwest::Method::POST,
        json!({"title": "No place", "description": "  "}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required fields: location, description");
    assert!(body["field_errors"]["location"].is_string());
    assert!(body["field_errors"].get("title").is_none());
    assert_eq!(server.store().property_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn update_preserves_unsupplied_fields_and_image() -> Result<()> {
    let server = TestServer::start().await?;
    let created = create(
        &server,
        json!({
            "title": "Harbor House",
            "location": "Bay",
            "fullAddress": "1 Pier Rd",
            "description": "Views",
            "price": 500000,
            "beds": 4,
            "isRental": true,
        }),
    )
    .await?;

    let (status, body) = send(
        &server,
        reqwest::Method::PUT,
        json!({"id": created["id"], "price": 525000, "description": "Better views"}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Property updated successfully");

    let updated = &body["property"];
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["price"], 525000);
    assert_eq!(updated["description"], "Better views");
    assert_eq!(updated["title"], "Harbor House");
    assert_eq!(updated["full_address"], "1 Pier Rd");
    assert_eq!(updated["beds"], 4);
    assert_eq!(updated["is_rental"], true);
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_eq!(updated["image_url"], created["image_url"]);
    assert_eq!(updated["image"], created["image"]);
    Ok(())
}

#[tokio::test]
async fn update_accepts_echoed_row_with_camel_case_edits() -> Result<()> {
    let server = TestServer::start().await?;
    let created = create(
        &server,
        json!({"title": "Dock House", "location": "Harbor", "fullAddress": "1 Dock Ln", "description": "Quay"}),
    )
    .await?;

    // The stored row echoed back with column names, edits in camelCase
    let mut body = created.clone();
    body["fullAddress"] = json!("2 Dock Ln");
    body["isRental"] = json!(true);

    let (status, response) = send(&server, reqwest::Method::PUT, body).await?;
    assert_eq!(status, StatusCode::OK, "echoed row rejected: {}", response);

    let updated = &response["property"];
    assert_eq!(updated["full_address"], "2 Dock Ln");
    assert_eq!(updated["is_rental"], true);
    assert_eq!(updated["title"], "Dock House");
    assert_eq!(updated["image_url"], created["image_url"]);
    Ok(())
}

#[tokio::test]
async fn title_or_type_change_regenerates_image() -> Result<()> {
    let server = TestServer::start().await?;
    let created = create(
        &server,
        json!({"title": "Plain Home", "location": "Town", "description": "Ok"}),
    )
    .await?;

    let (_, body) = send(
        &server,
        reqwest::Method::PUT,
        json!({"id": created["id"], "type": "Penthouse"}),
    )
    .await?;
    let by_type = body["property"].clone();
    assert_eq!(by_type["type"], "Penthouse");
    assert_ne!(by_type["image_url"], created["image_url"]);
    assert!(by_type["image_url"].as_str().unwrap_or("").contains("luxury%20penthouse"));
    assert_eq!(by_type["image"], by_type["image_url"]);

    let (_, body) = send(
        &server,
        reqwest::Method::PUT,
        json!({"id": created["id"], "title": "Sky Home"}),
    )
    .await?;
    let by_title = &body["property"];
    assert_eq!(by_title["type"], "Penthouse");
    assert!(by_title["image_url"].as_str().unwrap_or("").contains("sky%20home"));
    Ok(())
}

#[tokio::test]
async fn update_requires_known_id() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = send(&server, reqwest::Method::PUT, json!({"price": 1})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Property ID is required for update");

    let (status, body) = send(&server, reqwest::Method::PUT, json!({"id": "missing", "price": 1})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Property not found");
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn delete_returns_removed_row_and_404_for_unknown() -> Result<()> {
    let server = TestServer::start().await?;
    let created = create(
        &server,
        json!({"title": "Old Barn", "location": "Farm", "description": "Rustic"}),
    )
    .await?;

    let (status, body) = send(&server, reqwest::Method::DELETE, json!({"id": "nope"})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Property not found");
    assert_eq!(server.store().property_count().await, 1);

    let (status, body) = send(&server, reqwest::Method::DELETE, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Property ID is required for deletion");

    let (status, body) = send(&server, reqwest::Method::DELETE, json!({"id": created["id"]})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Property deleted successfully");
    assert_eq!(body["deletedProperty"]["title"], "Old Barn");
    assert_eq!(server.store().property_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn list_is_newest_first() -> Result<()> {
    let server = TestServer::start().await?;
    for title in ["First", "Second", "Third"] {
        create(&server, json!({"title": title, "location": "X", "description": "Y"})).await?;
    }

    let res = client()
        .get(server.url("/manage-properties"))
        .bearer_auth(SERVICE_KEY)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let titles: Vec<&str> = body["properties"]
        .as_array()
        .expect("properties array")
        .iter()
        .filter_map(|p| p["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);
    Ok(())
}

#[tokio::test]
async fn malformed_body_and_unsupported_method() -> Result<()> {
    let server = TestServer::start().await?;

    let res = client()
        .post(server.url("/manage-properties"))
        .bearer_auth(SERVICE_KEY)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "INVALID_JSON");

    let res = client()
        .patch(server.url("/manage-properties"))
        .bearer_auth(SERVICE_KEY)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    Ok(())
}

#[tokio::test]
async fn concurrent_update_and_delete_never_mix_records() -> Result<()> {
    let server = TestServer::start().await?;

    for _ in 0..10 {
        let created = create(
            &server,
            json!({"title": "Contested", "location": "Here", "description": "Race", "price": 10}),
        )
        .await?;
        let id = created["id"].clone();

        let (put, delete) = tokio::join!(
            send(&server, reqwest::Method::PUT, json!({"id": id, "price": 20})),
            send(&server, reqwest::Method::DELETE, json!({"id": id})),
        );
        let (put_status, put_body) = put?;
        let (delete_status, delete_body) = delete?;

        assert_eq!(delete_status, StatusCode::OK);
        match put_status {
            StatusCode::OK => {
                let property = &put_body["property"];
                assert_eq!(property["title"], "Contested");
                assert_eq!(property["price"], 20);
                assert_eq!(property["sqft"], 1000);
            }
            StatusCode::NOT_FOUND => assert_eq!(put_body["error"], "Property not found"),
            other => panic!("unexpected PUT status {}: {}", other, put_body),
        }
        assert_eq!(delete_body["deletedProperty"]["id"], id);
        assert_eq!(server.store().property_count().await, 0);
    }
    Ok(())
}
