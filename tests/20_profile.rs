mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use brightstart_api::types::Role;
use common::TestApp;

#[tokio::test]
async fn profile_before_bootstrap_is_not_found() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for("u-new", "new@x.com");

    let (status, body) = app.get("/api/profile", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "User profile not found");

    Ok(())
}

#[tokio::test]
async fn self_service_update_changes_name_and_phone() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-amy", "amy@x.com", "Amy", Role::Parent);
    let token = app.token_for("u-amy", "amy@x.com");

    let (status, body) = app
        .put(
            "/api/profile",
            Some(&token),
            Some(json!({"displayName": "Amy P.", "phone": "555-0101"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["displayName"], "Amy P.");
    assert_eq!(body["user"]["phone"], "555-0101");

    let (_, fetched) = app.get("/api/profile", Some(&token)).await?;
    assert_eq!(fetched["user"]["displayName"], "Amy P.");

    Ok(())
}

#[tokio::test]
async fn self_service_update_never_touches_role() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-bob", "bob@x.com", "Bob", Role::Parent);
    let token = app.token_for("u-bob", "bob@x.com");

    // Role smuggled into the payload is dropped during deserialization
    let (status, body) = app
        .put(
            "/api/profile",
            Some(&token),
            Some(json!({"displayName": "Bob!", "role": "Admin"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "Parent");

    let rows = app.store.rows("Users");
    assert_eq!(rows[0].str_field("role"), "Parent");
    assert_eq!(rows[0].str_field("displayName"), "Bob!");

    Ok(())
}

#[tokio::test]
async fn profile_update_appends_a_change_log_entry() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-cal", "cal@x.com", "Cal", Role::Educator);
    let token = app.token_for("u-cal", "cal@x.com");

    assert!(app.store.rows("ChangeLog").is_empty());

    app.put(
        "/api/profile",
        Some(&token),
        Some(json!({"phone": "555-0199"})),
    )
    .await?;

    let log = app.store.rows("ChangeLog");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].str_field("uid"), "u-cal");
    assert_eq!(log[0].str_field("phone"), "555-0199");
    assert_eq!(log[0].str_field("role"), "Educator");
    assert!(!log[0].str_field("loggedAt").is_empty());

    Ok(())
}
