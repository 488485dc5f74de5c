/// User service endpoints
use crate::{
    api::{health, parse_id, JsonBody, MessageResponse, ServiceInfo},
    dispatch::{NotificationDispatcher, NotificationEvent},
    error::MeshResult,
    stats::UserStats,
    store::{provided, NewUser, Role, User, UserPatch, UserStore},
};
use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const SERVICE_NAME: &str = "user-service";

/// State shared by user handlers
#[derive(Clone)]
pub struct UserState {
    pub store: Arc<UserStore>,
    pub dispatcher: NotificationDispatcher,
    pub info: ServiceInfo,
}

impl FromRef<UserState> for ServiceInfo {
    fn from_ref(state: &UserState) -> Self {
        state.info.clone()
    }
}

/// Build the user service router
pub fn router(state: UserState) -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/activity", post(touch_activity))
        .route("/users/role/:role", get(list_by_role))
        .route("/stats", get(stats))
        .merge(health::routes::<UserState>())
        .with_state(state)
}

/// `GET /users` query
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    /// `true` keeps users active within the last hour
    pub active: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub last_active: DateTime<Utc>,
}

async fn list_users(
    State(state): State<UserState>,
    Query(query): Query<ListUsersQuery>,
) -> MeshResult<Json<Vec<User>>> {
    let role = provided(query.role)
        .map(|r| r.parse::<Role>())
        .transpose()?;
    let active_since = match query.active.as_deref() {
        Some("true") => Some(Utc::now() - Duration::hours(1)),
        _ => None,
    };

    let users = state.store.list(role, active_since).await;
    debug!("list_users: {} users", users.len());
    Ok(Json(users))
}

async fn list_by_role(
    State(state): State<UserState>,
    Path(role): Path<String>,
) -> MeshResult<Json<Vec<User>>> {
    let role = role.parse::<Role>()?;
    Ok(Json(state.store.list(Some(role), None).await))
}

async fn get_user(
    State(state): State<UserState>,
    Path(id): Path<String>,
) -> MeshResult<Json<User>> {
    let id = parse_id::<User>(&id)?;
    Ok(Json(state.store.get(id).await?))
}

/// Register a user and announce it
async fn create_user(
    State(state): State<UserState>,
    JsonBody(req): JsonBody<NewUser>,
) -> MeshResult<(StatusCode, Json<User>)> {
    let user = state.store.create(req).await?;
    info!("create_user: registered user {} ({})", user.id, user.email);

    state
        .dispatcher
        .dispatch(NotificationEvent::user_registered(&user));

    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<UserState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> MeshResult<Json<User>> {
    let id = parse_id::<User>(&id)?;
    let user = state.store.update(id, patch).await?;
    info!("update_user: updated user {}", id);
    Ok(Json(user))
}

async fn touch_activity(
    State(state): State<UserState>,
    Path(id): Path<String>,
) -> MeshResult<Json<ActivityResponse>> {
    let id = parse_id::<User>(&id)?;
    let last_active = state.store.touch_activity(id).await?;
    Ok(Json(ActivityResponse { last_active }))
}

async fn delete_user(
    State(state): State<UserState>,
    Path(id): Path<String>,
) -> MeshResult<Json<MessageResponse>> {
    let id = parse_id::<User>(&id)?;
    state.store.delete(id).await?;
    info!("delete_user: deleted user {}", id);
    Ok(MessageResponse::new("User deleted successfully"))
}

async fn stats(State(state): State<UserState>) -> Json<UserStats> {
    Json(state.store.stats(Utc::now()).await)
}
