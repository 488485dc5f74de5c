/// Notification service endpoints
use crate::{
    api::{health, parse_id, CountResponse, JsonBody, MessageResponse, ServiceInfo},
    config::NotificationsConfig,
    error::{MeshError, MeshResult},
    stats::NotificationStats,
    store::{
        lenient_id, provided, NewBroadcast, NewNotification, Notification, NotificationFilter,
        NotificationStore, Priority,
    },
};
use axum::{
    body::Bytes,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const SERVICE_NAME: &str = "notification-service";

/// State shared by notification handlers
#[derive(Clone)]
pub struct NotificationState {
    pub store: Arc<NotificationStore>,
    pub settings: NotificationsConfig,
    pub info: ServiceInfo,
}

impl FromRef<NotificationState> for ServiceInfo {
    fn from_ref(state: &NotificationState) -> Self {
        state.info.clone()
    }
}

/// Build the notification service router
pub fn router(state: NotificationState) -> Router {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", patch(mark_all_read))
        .route("/notifications/cleanup", delete(cleanup))
        .route(
            "/notifications/:id",
            get(get_notification).delete(delete_notification),
        )
        .route("/notifications/:id/read", patch(mark_read))
        .route("/notify", post(notify))
        .route("/broadcast", post(broadcast))
        .route("/unread-count", get(unread_count))
        .route("/stats", get(stats))
        .merge(health::routes::<NotificationState>())
        .with_state(state)
}

/// `GET /notifications` query
#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub read: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<String>,
}

/// `PATCH /notifications/read-all` body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadAllRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<u64>,
}

/// `DELETE /notifications/cleanup` query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupQuery {
    pub older_than_days: Option<String>,
}

/// `GET /unread-count` query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountQuery {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: usize,
}

fn parse_param<T: std::str::FromStr>(name: &str, raw: Option<String>) -> MeshResult<Option<T>> {
    provided(raw)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| MeshError::Validation(format!("Invalid {}: {}", name, v)))
        })
        .transpose()
}

async fn list_notifications(
    State(state): State<NotificationState>,
    Query(query): Query<ListNotificationsQuery>,
) -> MeshResult<Json<Vec<Notification>>> {
    let filter = NotificationFilter {
        kind: provided(query.kind),
        read: parse_param::<bool>("read", query.read)?,
        priority: provided(query.priority)
            .map(|p| p.parse::<Priority>())
            .transpose()?,
        user_id: None,
    };
    let limit = parse_param::<usize>("limit", query.limit)?
        .unwrap_or(state.settings.default_list_limit);

    let notifications = state.store.list(&filter, limit).await;
    debug!("list_notifications: {} notifications", notifications.len());
    Ok(Json(notifications))
}

async fn get_notification(
    State(state): State<NotificationState>,
    Path(id): Path<String>,
) -> MeshResult<Json<Notification>> {
    let id = parse_id::<Notification>(&id)?;
    Ok(Json(state.store.get(id).await?))
}

/// Record a notification sent by another service
async fn notify(
    State(state): State<NotificationState>,
    JsonBody(req): JsonBody<NewNotification>,
) -> MeshResult<(StatusCode, Json<Notification>)> {
    let notification = state.store.create(req).await?;
    info!(
        "notify: {} notification {} ({:?})",
        notification.kind, notification.id, notification.priority
    );
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn broadcast(
    State(state): State<NotificationState>,
    JsonBody(req): JsonBody<NewBroadcast>,
) -> MeshResult<(StatusCode, Json<Notification>)> {
    let notification = state.store.broadcast(req).await?;
    info!("broadcast: notification {}", notification.id);
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn mark_read(
    State(state): State<NotificationState>,
    Path(id): Path<String>,
) -> MeshResult<Json<Notification>> {
    let id = parse_id::<Notification>(&id)?;
    Ok(Json(state.store.mark_read(id).await?))
}

/// Mark unread notifications read. The body is optional.
async fn mark_all_read(
    State(state): State<NotificationState>,
    body: Bytes,
) -> MeshResult<Json<CountResponse>> {
    let req: ReadAllRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ReadAllRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| MeshError::Validation(format!("Invalid request body: {}", e)))?
    };

    let filter = NotificationFilter {
        kind: provided(req.kind),
        read: None,
        priority: None,
        user_id: req.user_id,
    };
    let count = state.store.mark_all_read(&filter).await;
    info!("mark_all_read: {} notifications", count);

    Ok(Json(CountResponse {
        message: format!("{} notifications marked as read", count),
        count,
    }))
}

async fn delete_notification(
    State(state): State<NotificationState>,
    Path(id): Path<String>,
) -> MeshResult<Json<MessageResponse>> {
    let id = parse_id::<Notification>(&id)?;
    state.store.delete(id).await?;
    info!("delete_notification: deleted notification {}", id);
    Ok(MessageResponse::new("Notification deleted successfully"))
}

async fn cleanup(
    State(state): State<NotificationState>,
    Query(query): Query<CleanupQuery>,
) -> MeshResult<Json<CountResponse>> {
    let days = parse_param::<u32>("olderThanDays", query.older_than_days)?
        .unwrap_or(state.settings.retention_days);

    let count = state.store.cleanup(days, Utc::now()).await;
    info!("cleanup: removed {} notifications older than {} days", count, days);

    Ok(Json(CountResponse {
        message: format!("{} old notifications deleted", count),
        count,
    }))
}

async fn unread_count(
    State(state): State<NotificationState>,
    Query(query): Query<UnreadCountQuery>,
) -> MeshResult<Json<UnreadCountResponse>> {
    let user_id = parse_param::<u64>("userId", query.user_id)?;
    let count = state
        .store
        .unread_count(user_id, provided(query.kind))
        .await;
    Ok(Json(UnreadCountResponse { count }))
}

async fn stats(State(state): State<NotificationState>) -> Json<NotificationStats> {
    Json(state.store.stats(Utc::now()).await)
}
