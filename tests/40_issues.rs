mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use brightstart_api::types::Role;
use common::TestApp;

#[tokio::test]
async fn any_authenticated_user_can_submit_an_issue() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-pat", "pat@x.com", "Pat Doe", Role::Parent);
    let token = app.token_for("u-pat", "pat@x.com");

    let (status, body) = app
        .post(
            "/api/issues",
            Some(&token),
            Some(json!({"issue": "Gate code broken", "description": "Keypad unresponsive"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["issue"]["issue"], "Gate code broken");
    assert_eq!(body["issue"]["resolved"], false);

    // Reporter identity is appended server-side
    let description = body["issue"]["description"].as_str().unwrap();
    assert!(description.contains("Keypad unresponsive"));
    assert!(description.contains("Reported by: Pat Doe (pat@x.com)"));

    Ok(())
}

#[tokio::test]
async fn issue_submission_requires_title_and_description() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-pat", "pat@x.com", "Pat", Role::Parent);
    let token = app.token_for("u-pat", "pat@x.com");

    for payload in [
        json!({"issue": "", "description": "d"}),
        json!({"issue": "t", "description": "  "}),
        json!({}),
    ] {
        let (status, body) = app.post("/api/issues", Some(&token), Some(payload)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad Request");
    }
    assert!(app.store.rows("Issues").is_empty());

    Ok(())
}

#[tokio::test]
async fn issue_list_is_gated_to_it_or_admin() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-pat", "pat@x.com", "Pat", Role::Parent);
    app.seed_user("u-ed", "ed@x.com", "Ed", Role::Educator);
    app.seed_user("u-it", "it@x.com", "Ira", Role::It);
    app.seed_user("u-admin", "admin@x.com", "Ada", Role::Admin);

    for uid in ["u-pat", "u-ed"] {
        let token = app.token_for(uid, &format!("{}@x.com", uid));
        let (status, _) = app.get("/api/issues", Some(&token)).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "uid {}", uid);
    }
    for uid in ["u-it", "u-admin"] {
        let token = app.token_for(uid, &format!("{}@x.com", uid));
        let (status, _) = app.get("/api/issues", Some(&token)).await?;
        assert_eq!(status, StatusCode::OK, "uid {}", uid);
    }

    Ok(())
}

#[tokio::test]
async fn issue_list_filters_resolved_and_blank_rows() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-it", "it@x.com", "Ira", Role::It);
    app.seed_issue("Wifi down", "No network in the art room", false);
    app.seed_issue("Projector", "Fixed last week", true);
    app.seed_issue("", "row with no title", false);
    let token = app.token_for("u-it", "it@x.com");

    let (status, body) = app
        .get("/api/issues?includeResolved=false", Some(&token))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["issues"][0]["issue"], "Wifi down");

    let (_, body) = app.get("/api/issues?includeResolved=true", Some(&token)).await?;
    assert_eq!(body["count"], 2);

    // Omitted query parameter behaves like false
    let (_, body) = app.get("/api/issues", Some(&token)).await?;
    assert_eq!(body["count"], 1);

    Ok(())
}

#[tokio::test]
async fn resolving_an_issue_is_monotonic() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-it", "it@x.com", "Ira", Role::It);
    let id = app.seed_issue("Wifi down", "No network", false);
    let token = app.token_for("u-it", "it@x.com");

    let (status, body) = app
        .put(&format!("/api/issues/{}/resolve", id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issue"]["resolved"], true);

    // Resolving again keeps it resolved
    let (status, body) = app
        .put(&format!("/api/issues/{}/resolve", id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issue"]["resolved"], true);

    let (status, body) = app
        .put("/api/issues/rec_nope/resolve", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");

    // Parents cannot resolve
    app.seed_user("u-pat", "pat@x.com", "Pat", Role::Parent);
    let parent = app.token_for("u-pat", "pat@x.com");
    let (status, _) = app
        .put(&format!("/api/issues/{}/resolve", id), Some(&parent), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}
