//! E2E tests for post, like, and comment operations

mod common;

use common::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn test_create_and_get_post() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;

    let post_id = server.create_post(&alice, "hello world").await;

    // Anonymous read works and decorates without a viewer
    let response = server
        .client
        .get(server.url(&format!("/api/v1/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"], "hello world");
    assert_eq!(body["author"]["username"], "alice");
    assert_eq!(body["likeCount"], 0);
    assert_eq!(body["commentCount"], 0);
    assert_eq!(body["viewerHasLiked"], false);
    assert_eq!(body["mediaUrl"], Value::Null);
}

#[tokio::test]
async fn test_create_post_requires_auth_and_content() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/v1/posts"))
        .json(&json!({"content": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let alice = server.register_user("alice").await;
    let response = server
        .client
        .post(server.url("/api/v1/posts"))
        .bearer_auth(&alice.token)
        .json(&json!({"content": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url("/api/v1/posts"))
        .bearer_auth(&alice.token)
        .json(&json!({"content": "look", "mediaUrl": "not a url"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_post_with_media_url() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;

    let response = server
        .client
        .post(server.url("/api/v1/posts"))
        .bearer_auth(&alice.token)
        .json(&json!({
            "content": "look at this",
            "mediaUrl": "https://cdn.example.com/cat.webp",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["mediaUrl"], "https://cdn.example.com/cat.webp");
}

#[tokio::test]
async fn test_update_and_delete_are_author_only() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;
    let bob = server.register_user("bob").await;

    let post_id = server.create_post(&alice, "original").await;

    let response = server
        .client
        .put(server.url(&format!("/api/v1/posts/{}", post_id)))
        .bearer_auth(&bob.token)
        .json(&json!({"content": "hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/posts/{}", post_id)))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .put(server.url(&format!("/api/v1/posts/{}", post_id)))
        .bearer_auth(&alice.token)
        .json(&json!({"content": "edited"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"], "edited");

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/posts/{}", post_id)))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = server
        .client
        .get(server.url(&format!("/api/v1/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_like_unlike_roundtrip() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;
    let bob = server.register_user("bob").await;
    let post_id = server.create_post(&alice, "like me").await;

    let response = server
        .client
        .post(server.url(&format!("/api/v1/posts/{}/like", post_id)))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likeCount"], 1);
    assert_eq!(body["viewerHasLiked"], true);

    // Idempotent
    let response = server
        .client
        .post(server.url(&format!("/api/v1/posts/{}/like", post_id)))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likeCount"], 1);

    let response = server
        .client
        .post(server.url(&format!("/api/v1/posts/{}/unlike", post_id)))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likeCount"], 0);
    assert_eq!(body["viewerHasLiked"], false);
}

#[tokio::test]
async fn test_like_missing_post_is_404() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;

    let response = server
        .client
        .post(server.url("/api/v1/posts/01ZZZZZZZZZZZZZZZZZZZZZZZZ/like"))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_comments_roundtrip_in_thread_order() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;
    let bob = server.register_user("bob").await;
    let post_id = server.create_post(&alice, "discuss").await;

    for i in 0..4 {
        let response = server
            .client
            .post(server.url(&format!("/api/v1/posts/{}/comments", post_id)))
            .bearer_auth(&bob.token)
            .json(&json!({"content": format!("comment {}", i)}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    // First page, oldest first
    let response = server
        .client
        .get(server.url(&format!("/api/v1/posts/{}/comments?limit=3", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0]["content"], "comment 0");
    assert_eq!(comments[0]["author"]["username"], "bob");
    assert_eq!(body["pagination"]["hasMore"], true);

    let cursor = body["pagination"]["nextCursor"].as_str().unwrap();
    let response = server
        .client
        .get(server.url(&format!(
            "/api/v1/posts/{}/comments?limit=3&cursor={}",
            post_id, cursor
        )))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "comment 3");
    assert_eq!(body["pagination"]["hasMore"], false);

    // Comment count appears on the decorated post
    let response = server
        .client
        .get(server.url(&format!("/api/v1/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["commentCount"], 4);
}

#[tokio::test]
async fn test_comment_deletion_permissions() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;
    let bob = server.register_user("bob").await;
    let carol = server.register_user("carol").await;
    let post_id = server.create_post(&alice, "discuss").await;

    let response = server
        .client
        .post(server.url(&format!("/api/v1/posts/{}/comments", post_id)))
        .bearer_auth(&bob.token)
        .json(&json!({"content": "bob's comment"}))
        .send()
        .await
        .unwrap();
    let comment: Value = response.json().await.unwrap();
    let comment_id = comment["id"].as_str().unwrap();

    // A third party cannot delete
    let response = server
        .client
        .delete(server.url(&format!("/api/v1/comments/{}", comment_id)))
        .bearer_auth(&carol.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The post author can moderate comments under their post
    let response = server
        .client
        .delete(server.url(&format!("/api/v1/comments/{}", comment_id)))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_account_posts_pagination() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;
    let mut expected = Vec::new();
    for i in 0..5 {
        expected.push(server.create_post(&alice, &format!("post {}", i)).await);
    }
    expected.reverse();

    let response = server
        .client
        .get(server.url(&format!("/api/v1/accounts/{}/posts?limit=3", alice.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(TestServer::feed_post_ids(&body), expected[..3].to_vec());
    assert_eq!(body["pagination"]["hasMore"], true);

    let cursor = body["pagination"]["nextCursor"].as_str().unwrap();
    let response = server
        .client
        .get(server.url(&format!(
            "/api/v1/accounts/{}/posts?limit=3&cursor={}",
            alice.id, cursor
        )))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(TestServer::feed_post_ids(&body), expected[3..].to_vec());
    assert_eq!(body["pagination"]["hasMore"], false);
}
