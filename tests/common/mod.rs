//! Shared helpers for the integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use blogmesh::{
    api::{
        blogs::{self, BlogState},
        comments::{self, CommentState},
        notifications::{self, NotificationState},
        users::{self, UserState},
        ServiceInfo,
    },
    config::NotificationsConfig,
    server::{self, LocalStores},
    validation::{LocalPeerLookup, UnreachablePolicy, ValidationClient},
};
use serde_json::Value;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceExt;

/// Send one request through a router and decode the JSON reply
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub fn info(name: &'static str) -> ServiceInfo {
    ServiceInfo::new(name, "1.0.0")
}

/// Every service wired in-process over one set of seeded stores
pub struct LocalMesh {
    pub stores: LocalStores,
    pub blogs: Router,
    pub comments: Router,
    pub users: Router,
    pub notifications: Router,
}

impl LocalMesh {
    pub fn new() -> Self {
        let stores = LocalStores::seeded();
        let lookup = LocalPeerLookup::new().with_blogs(Arc::clone(&stores.blogs));
        let validation = ValidationClient::new(Arc::new(lookup), UnreachablePolicy::FailClosed);

        let blogs = server::blog_app(BlogState {
            store: Arc::clone(&stores.blogs),
            dispatcher: stores.dispatcher(blogs::SERVICE_NAME),
            info: info(blogs::SERVICE_NAME),
        });
        let comments = server::comment_app(CommentState {
            store: Arc::clone(&stores.comments),
            validation,
            dispatcher: stores.dispatcher(comments::SERVICE_NAME),
            info: info(comments::SERVICE_NAME),
        });
        let users = server::user_app(UserState {
            store: Arc::clone(&stores.users),
            dispatcher: stores.dispatcher(users::SERVICE_NAME),
            info: info(users::SERVICE_NAME),
        });
        let notifications = server::notification_app(NotificationState {
            store: Arc::clone(&stores.notifications),
            settings: NotificationsConfig::default(),
            info: info(notifications::SERVICE_NAME),
        });

        Self {
            stores,
            blogs,
            comments,
            users,
            notifications,
        }
    }
}

/// Serve `app` on an ephemeral localhost port
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Poll `check` until it holds or about a second has passed
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..50 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
