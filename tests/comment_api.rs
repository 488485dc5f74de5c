/// Comment service API tests (in-process validation and dispatch)
mod common;

use axum::http::{Method, StatusCode};
use common::{eventually, get, post, send, LocalMesh};
use serde_json::json;

#[tokio::test]
async fn test_comment_on_missing_blog_is_rejected() {
    let mesh = LocalMesh::new();

    let (status, body) = post(
        &mesh.comments,
        "/comments",
        json!({"blogId": 999, "author": "Finn", "content": "Hello?"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "DependencyNotFound");
    assert_eq!(body["message"], "Blog not found");

    assert_eq!(mesh.stores.comments.len().await, 5);
    assert_eq!(mesh.stores.notifications.len().await, 3);
}

#[tokio::test]
async fn test_comment_on_existing_blog() {
    let mesh = LocalMesh::new();

    let (status, comment) = post(
        &mesh.comments,
        "/comments",
        json!({"blogId": "2", "author": "Finn", "content": "Great read"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["id"], 6);
    assert_eq!(comment["blogId"], 2);
    assert_eq!(comment["likes"], 0);

    let notifications = mesh.stores.notifications.clone();
    assert!(
        eventually(|| {
            let notifications = notifications.clone();
            async move {
                notifications.list_all().await.iter().any(|n| {
                    n.kind == "comment_created"
                        && n.comment_id == Some(6)
                        && n.message == "New comment by Finn on blog 2"
                })
            }
        })
        .await
    );

    let (_, for_blog) = get(&mesh.comments, "/comments/blog/2").await;
    let ids: Vec<u64> = for_blog
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 4, 6]);
}

#[tokio::test]
async fn test_comment_validation_happens_first() {
    let mesh = LocalMesh::new();

    let (status, body) = post(
        &mesh.comments,
        "/comments",
        json!({"blogId": 1, "author": "", "content": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "author is required");

    let (status, body) = post(&mesh.comments, "/comments", json!({"author": "a", "content": "b"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "blogId is required");
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let mesh = LocalMesh::new();

    let (status, comment) = get(&mesh.comments, "/comments/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["author"], "Carol Davis");

    let (status, body) = post(&mesh.comments, "/comments/3/like", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 9);

    let (status, updated) = send(
        &mesh.comments,
        Method::PUT,
        "/comments/3",
        Some(json!({"content": "Edited"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "Edited");
    assert_eq!(updated["likes"], 9);

    let (status, _) = send(&mesh.comments, Method::DELETE, "/comments/3", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&mesh.comments, "/comments/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Comment not found");
}

#[tokio::test]
async fn test_comment_stats() {
    let mesh = LocalMesh::new();

    let (status, stats) = get(&mesh.comments, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalComments"], 5);
    assert_eq!(stats["totalLikes"], 22);
    assert_eq!(stats["averageLikes"], 4.4);
    assert_eq!(stats["commentsByBlog"], json!({"1": 2, "2": 2, "3": 1}));
}
