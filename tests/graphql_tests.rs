// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GraphQL queries and mutations over in-memory chain and database.

mod common;

use axum::http::StatusCode;
use common::{
    add_user, argument, body_json, claim, community, create_test_app, json_request,
    session_cookie, TestApp, ALICE, BOB,
};
use octopus::models::NewInvite;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn graphql(app: &TestApp, cookie: Option<&str>, query: &str) -> Value {
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/graphql",
            cookie,
            json!({"query": query}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn seeded() -> TestApp {
    let app = create_test_app();
    add_user(&app.state, ALICE, "alice").await;
    add_user(&app.state, BOB, "bob").await;
    app.chain.add_community(community("crypto"));
    app.chain.add_community(community("sports"));
    app.chain.add_claim(claim(1, "crypto", ALICE, "Bitcoin is digital gold"));
    app.chain.add_claim(claim(2, "crypto", BOB, "Ethereum will flip Bitcoin"));
    app.chain.add_claim(claim(3, "sports", BOB, "The Warriors win it all"));
    app.chain.add_argument(argument(10, 1, BOB, &format!("Agree with @{ALICE}")));
    app
}

#[tokio::test]
async fn test_claim_with_nested_fields() {
    let app = seeded().await;
    let body = graphql(
        &app,
        None,
        "{ claim(id: 1) { id body totalBacked { humanReadable } creator { username balance { amount } } argumentCount arguments { id body } } }",
    )
    .await;

    assert!(body.get("errors").is_none(), "{body}");
    let claim = &body["data"]["claim"];
    assert_eq!(claim["id"], 1);
    assert_eq!(claim["totalBacked"]["humanReadable"], "1.5");
    assert_eq!(claim["creator"]["username"], "alice");
    assert_eq!(claim["creator"]["balance"]["amount"], "0");
    assert_eq!(claim["argumentCount"], 1);
    assert_eq!(claim["arguments"][0]["body"], "Agree with @alice");
}

#[tokio::test]
async fn test_claims_filtered_and_paginated() {
    let app = seeded().await;

    let body = graphql(&app, None, r#"{ claims(communityId: "crypto") { id } }"#).await;
    assert_eq!(body["data"]["claims"], json!([{"id": 2}, {"id": 1}]));

    let body = graphql(&app, None, r#"{ claims(communityId: "all", first: 2) { id } }"#).await;
    assert_eq!(body["data"]["claims"], json!([{"id": 3}, {"id": 2}]));

    let body = graphql(&app, None, "{ claims(first: 2, after: 2) { id } }").await;
    assert_eq!(body["data"]["claims"], json!([{"id": 1}]));
}

#[tokio::test]
async fn test_missing_claim_is_error() {
    let app = seeded().await;
    let body = graphql(&app, None, "{ claim(id: 99) { id } }").await;
    assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_users_by_address_skips_unregistered() {
    let app = seeded().await;
    let query = format!(r#"{{ users(addresses: ["{ALICE}", "cosmos1nobody"]) {{ username }} }}"#);
    let body = graphql(&app, None, &query).await;
    assert_eq!(body["data"]["users"], json!([{"username": "alice"}]));
}

#[tokio::test]
async fn test_notifications_require_login() {
    let app = seeded().await;
    let body = graphql(&app, None, "{ unseenNotificationsCount }").await;
    assert_eq!(body["errors"][0]["message"], "Authentication required");
}

#[tokio::test]
async fn test_invites_are_private_to_their_sender() {
    let app = seeded().await;
    for (creator, email) in [(ALICE, "carol@example.com"), (BOB, "dave@example.com")] {
        app.state
            .db
            .add_invite(NewInvite {
                creator: creator.to_string(),
                friend_email: email.to_string(),
            })
            .await
            .unwrap();
    }

    let body = graphql(&app, None, "{ invites { friendEmail } }").await;
    assert_eq!(body["errors"][0]["message"], "Authentication required");
    assert!(body["data"].is_null(), "{body}");

    let alice = app.state.db.user_by_address(ALICE).await.unwrap().unwrap();
    let cookie = session_cookie(&app.state, &alice);
    let body = graphql(&app, Some(&cookie), "{ invites { friendEmail } }").await;
    assert_eq!(
        body["data"]["invites"],
        json!([{"friendEmail": "carol@example.com"}])
    );
}

#[tokio::test]
async fn test_me_returns_session_user() {
    let app = seeded().await;
    let alice = app.state.db.user_by_address(ALICE).await.unwrap().unwrap();
    let cookie = session_cookie(&app.state, &alice);

    let body = graphql(&app, Some(&cookie), "{ me { address username claimsCount } unseenNotificationsCount }").await;
    assert!(body.get("errors").is_none(), "{body}");
    assert_eq!(body["data"]["me"]["username"], "alice");
    assert_eq!(body["data"]["me"]["claimsCount"], 1);
    assert_eq!(body["data"]["unseenNotificationsCount"], 0);
}

#[tokio::test]
async fn test_add_comment_mutation() {
    let mut app = seeded().await;
    let bob = app.state.db.user_by_address(BOB).await.unwrap().unwrap();
    let cookie = session_cookie(&app.state, &bob);

    let body = graphql(
        &app,
        Some(&cookie),
        r#"mutation { addComment(claimId: 1, body: "Nice one @alice") { id body creator { username } } }"#,
    )
    .await;
    assert!(body.get("errors").is_none(), "{body}");
    let comment = &body["data"]["addComment"];
    assert_eq!(comment["body"], "Nice one @alice");
    assert_eq!(comment["creator"]["username"], "bob");

    let queued = app.comments.try_recv().unwrap();
    assert_eq!(queued.body, format!("Nice one @{ALICE}"));

    let body = graphql(&app, None, "{ comments(claimId: 1) { body } }").await;
    assert_eq!(body["data"]["comments"], json!([{"body": "Nice one @alice"}]));
}

#[tokio::test]
async fn test_add_comment_requires_login() {
    let app = seeded().await;
    let body = graphql(
        &app,
        None,
        r#"mutation { addComment(claimId: 1, body: "hi") { id } }"#,
    )
    .await;
    assert_eq!(body["errors"][0]["message"], "Authentication required");
}

#[tokio::test]
async fn test_claim_of_the_day() {
    let app = seeded().await;
    let body = graphql(&app, None, r#"{ claimOfTheDay(communityId: "crypto") { id } }"#).await;
    assert_eq!(body["data"]["claimOfTheDay"], Value::Null);

    app.state.db.set_claim_of_the_day("crypto", 2).await.unwrap();
    let body = graphql(&app, None, r#"{ claimOfTheDay(communityId: "crypto") { id } }"#).await;
    assert_eq!(body["data"]["claimOfTheDay"]["id"], 2);
}
