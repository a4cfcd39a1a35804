mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use brightstart_api::types::Role;
use common::TestApp;

#[tokio::test]
async fn admin_routes_reject_non_admin_roles() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-parent", "parent@x.com", "Pat", Role::Parent);
    app.seed_user("u-it", "it@x.com", "Ira", Role::It);

    for uid in ["u-parent", "u-it"] {
        let token = app.token_for(uid, &format!("{}@x.com", uid));
        let (status, body) = app.get("/api/admin/users/search?q=x", Some(&token)).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "uid {}", uid);
        assert_eq!(body["error"], "Forbidden");
    }

    // An identity with no profile at all is also forbidden
    let token = app.token_for("u-ghost", "ghost@x.com");
    let (status, _) = app.get("/api/admin/users/search?q=x", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn search_matches_substrings_and_deduplicates() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-admin", "admin@x.com", "Ada", Role::Admin);
    app.seed_user("u-ann", "ann@x.com", "Ann Smith", Role::Parent);
    // Duplicate row for the same identity, as the table can contain
    app.seed_user("u-ann", "ann@x.com", "Ann Smith", Role::Parent);
    app.seed_user("u-bob", "bob@x.com", "Bob", Role::Educator);
    let token = app.token_for("u-admin", "admin@x.com");

    let (status, body) = app.get("/api/admin/users/search?q=ann", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["users"][0]["uid"], "u-ann");

    // Name matches count too
    let (_, body) = app.get("/api/admin/users/search?q=smith", Some(&token)).await?;
    assert_eq!(body["count"], 1);

    let (status, body) = app.get("/api/admin/users/search?q=", Some(&token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    Ok(())
}

#[tokio::test]
async fn admin_can_change_another_users_role() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-admin", "admin@x.com", "Ada", Role::Admin);
    app.seed_user("u-ann", "ann@x.com", "Ann", Role::Parent);
    let token = app.token_for("u-admin", "admin@x.com");

    let (status, body) = app
        .put(
            "/api/admin/users/u-ann",
            Some(&token),
            Some(json!({"role": "IT"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "IT");

    // The role change lands in the store and in the change log
    let users = app.store.rows("Users");
    let ann = users.iter().find(|r| r.str_field("uid") == "u-ann").unwrap();
    assert_eq!(ann.str_field("role"), "IT");

    let log = app.store.rows("ChangeLog");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].str_field("uid"), "u-ann");
    assert_eq!(log[0].str_field("role"), "IT");

    Ok(())
}

#[tokio::test]
async fn admin_cannot_edit_their_own_record() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-admin", "admin@x.com", "Ada", Role::Admin);
    let token = app.token_for("u-admin", "admin@x.com");

    let (status, body) = app
        .put(
            "/api/admin/users/u-admin",
            Some(&token),
            Some(json!({"role": "Parent"})),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    // No write happened: role unchanged, nothing logged
    let users = app.store.rows("Users");
    assert_eq!(users[0].str_field("role"), "Admin");
    assert!(app.store.rows("ChangeLog").is_empty());

    Ok(())
}

#[tokio::test]
async fn admin_update_validates_role_and_target() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("u-admin", "admin@x.com", "Ada", Role::Admin);
    app.seed_user("u-ann", "ann@x.com", "Ann", Role::Parent);
    let token = app.token_for("u-admin", "admin@x.com");

    let (status, body) = app
        .put(
            "/api/admin/users/u-ann",
            Some(&token),
            Some(json!({"role": "Superuser"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let (status, body) = app
        .put(
            "/api/admin/users/u-missing",
            Some(&token),
            Some(json!({"displayName": "Who"})),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");

    Ok(())
}
