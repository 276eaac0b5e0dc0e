//! Database tests

use super::*;
use chrono::Utc;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn test_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "argon2-hash".to_string(),
        display_name: Some(username.to_string()),
        bio: None,
        avatar_url: None,
        created_at: now,
        updated_at: now,
    }
}

fn test_post(author_id: &str, content: &str) -> Post {
    let now = Utc::now();
    Post {
        id: EntityId::new().0,
        author_id: author_id.to_string(),
        content: content.to_string(),
        media_url: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_user_insert_and_lookup() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("alice");
    db.insert_user(&user).await.unwrap();

    let by_id = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "alice");

    // Username lookup is case-insensitive
    let by_name = db.get_user_by_username("ALICE").await.unwrap();
    assert!(by_name.is_some());

    let by_login = db.get_user_by_login("alice@example.com").await.unwrap();
    assert!(by_login.is_some());
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&test_user("alice")).await.unwrap();

    let mut duplicate = test_user("alice");
    duplicate.email = "other@example.com".to_string();
    let error = db.insert_user(&duplicate).await.unwrap_err();
    assert!(matches!(error, crate::error::AppError::Conflict(_)));
}

#[tokio::test]
async fn test_follow_edge_roundtrip() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = test_user("alice");
    let bob = test_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    let follow = Follow {
        id: EntityId::new().0,
        follower_id: alice.id.clone(),
        followee_id: bob.id.clone(),
        created_at: Utc::now(),
    };

    assert!(db.insert_follow(&follow).await.unwrap());
    assert!(db.is_following(&alice.id, &bob.id).await.unwrap());

    // Second insert of the same pair is a no-op
    let again = Follow {
        id: EntityId::new().0,
        ..follow.clone()
    };
    assert!(!db.insert_follow(&again).await.unwrap());

    let followees = db.get_followee_ids(&alice.id).await.unwrap();
    assert_eq!(followees, vec![bob.id.clone()]);

    assert!(db.delete_follow(&alice.id, &bob.id).await.unwrap());
    assert!(!db.is_following(&alice.id, &bob.id).await.unwrap());
    assert!(!db.delete_follow(&alice.id, &bob.id).await.unwrap());
}

#[tokio::test]
async fn test_feed_page_windowing() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = test_user("alice");
    db.insert_user(&alice).await.unwrap();

    let mut ids = Vec::new();
    for i in 0..5 {
        let post = test_post(&alice.id, &format!("post {}", i));
        db.insert_post(&post).await.unwrap();
        ids.push(post.id);
    }

    // Newest first, no cursor
    let page = db
        .get_feed_page(std::slice::from_ref(&alice.id), None, 3)
        .await
        .unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].id, ids[4]);
    assert_eq!(page[2].id, ids[2]);

    // Cursor windows strictly older rows
    let next = db
        .get_feed_page(std::slice::from_ref(&alice.id), Some(&page[2].id), 3)
        .await
        .unwrap();
    assert_eq!(next.len(), 2);
    assert_eq!(next[0].id, ids[1]);
    assert_eq!(next[1].id, ids[0]);

    // Empty author set yields an empty page without querying
    let empty = db.get_feed_page(&[], None, 3).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_post_delete_cascades() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = test_user("alice");
    let bob = test_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    let post = test_post(&alice.id, "hello");
    db.insert_post(&post).await.unwrap();

    assert!(db.insert_like(&bob.id, &post.id).await.unwrap());
    let comment = Comment {
        id: EntityId::new().0,
        post_id: post.id.clone(),
        author_id: bob.id.clone(),
        content: "nice".to_string(),
        created_at: Utc::now(),
    };
    db.insert_comment(&comment).await.unwrap();
    let notification = Notification {
        id: EntityId::new().0,
        user_id: alice.id.clone(),
        actor_id: bob.id.clone(),
        kind: NotificationKind::Like.as_str().to_string(),
        post_id: Some(post.id.clone()),
        read: false,
        created_at: Utc::now(),
    };
    db.insert_notification(&notification).await.unwrap();

    assert!(db.delete_post(&post.id).await.unwrap());

    let engagement = db
        .engagement_for_posts(std::slice::from_ref(&post.id), Some(&bob.id))
        .await
        .unwrap();
    assert!(engagement.is_empty());
    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
    assert_eq!(db.count_unread_notifications(&alice.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_engagement_rows() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = test_user("alice");
    let bob = test_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    let post = test_post(&alice.id, "hello");
    db.insert_post(&post).await.unwrap();

    db.insert_like(&bob.id, &post.id).await.unwrap();
    // Duplicate like does not double count
    assert!(!db.insert_like(&bob.id, &post.id).await.unwrap());

    let comment = Comment {
        id: EntityId::new().0,
        post_id: post.id.clone(),
        author_id: bob.id.clone(),
        content: "nice".to_string(),
        created_at: Utc::now(),
    };
    db.insert_comment(&comment).await.unwrap();

    let rows = db
        .engagement_for_posts(std::slice::from_ref(&post.id), Some(&bob.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].like_count, 1);
    assert_eq!(rows[0].comment_count, 1);
    assert!(rows[0].viewer_has_liked);

    // Alice has not liked her own post
    let rows = db
        .engagement_for_posts(std::slice::from_ref(&post.id), Some(&alice.id))
        .await
        .unwrap();
    assert!(!rows[0].viewer_has_liked);

    // Anonymous viewer
    let rows = db
        .engagement_for_posts(std::slice::from_ref(&post.id), None)
        .await
        .unwrap();
    assert!(!rows[0].viewer_has_liked);
}

#[tokio::test]
async fn test_comments_page_in_thread_order() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = test_user("alice");
    db.insert_user(&alice).await.unwrap();
    let post = test_post(&alice.id, "hello");
    db.insert_post(&post).await.unwrap();

    let mut ids = Vec::new();
    for i in 0..4 {
        let comment = Comment {
            id: EntityId::new().0,
            post_id: post.id.clone(),
            author_id: alice.id.clone(),
            content: format!("comment {}", i),
            created_at: Utc::now(),
        };
        db.insert_comment(&comment).await.unwrap();
        ids.push(comment.id);
    }

    let first = db.get_comments_page(&post.id, None, 3).await.unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0].id, ids[0]);

    let rest = db
        .get_comments_page(&post.id, Some(&first[2].id), 3)
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].id, ids[3]);
}

#[tokio::test]
async fn test_notification_read_state() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = test_user("alice");
    let bob = test_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    for _ in 0..3 {
        let notification = Notification {
            id: EntityId::new().0,
            user_id: alice.id.clone(),
            actor_id: bob.id.clone(),
            kind: NotificationKind::Follow.as_str().to_string(),
            post_id: None,
            read: false,
            created_at: Utc::now(),
        };
        db.insert_notification(&notification).await.unwrap();
    }

    assert_eq!(db.count_unread_notifications(&alice.id).await.unwrap(), 3);

    let page = db.get_notifications_page(&alice.id, None, 10).await.unwrap();
    assert_eq!(page.len(), 3);

    // Recipient scoping: bob cannot mark alice's notification
    assert!(
        !db.mark_notification_read(&bob.id, &page[0].id)
            .await
            .unwrap()
    );
    assert!(
        db.mark_notification_read(&alice.id, &page[0].id)
            .await
            .unwrap()
    );
    assert_eq!(db.count_unread_notifications(&alice.id).await.unwrap(), 2);

    db.mark_all_notifications_read(&alice.id).await.unwrap();
    assert_eq!(db.count_unread_notifications(&alice.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_follower_pages() {
    let (db, _temp_dir) = create_test_db().await;

    let celebrity = test_user("celebrity");
    db.insert_user(&celebrity).await.unwrap();

    let mut fans = Vec::new();
    for i in 0..4 {
        let fan = test_user(&format!("fan{}", i));
        db.insert_user(&fan).await.unwrap();
        let follow = Follow {
            id: EntityId::new().0,
            follower_id: fan.id.clone(),
            followee_id: celebrity.id.clone(),
            created_at: Utc::now(),
        };
        db.insert_follow(&follow).await.unwrap();
        fans.push(fan);
    }

    // Newest edge first
    let page = db
        .get_followers_page(&celebrity.id, None, 3)
        .await
        .unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].1.username, "fan3");

    let (last_edge_id, _) = &page[2];
    let rest = db
        .get_followers_page(&celebrity.id, Some(last_edge_id), 3)
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].1.username, "fan0");

    // The other direction
    let following = db
        .get_following_page(&fans[0].id, None, 10)
        .await
        .unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].1.username, "celebrity");
}
