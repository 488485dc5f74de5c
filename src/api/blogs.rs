/// Blog service endpoints
use crate::{
    api::{health, parse_id, JsonBody, MessageResponse, ServiceInfo},
    dispatch::{NotificationDispatcher, NotificationEvent},
    error::MeshResult,
    stats::BlogStats,
    store::{Blog, BlogPatch, BlogStore, NewBlog},
};
use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const SERVICE_NAME: &str = "blog-service";

/// State shared by blog handlers
#[derive(Clone)]
pub struct BlogState {
    pub store: Arc<BlogStore>,
    pub dispatcher: NotificationDispatcher,
    pub info: ServiceInfo,
}

impl FromRef<BlogState> for ServiceInfo {
    fn from_ref(state: &BlogState) -> Self {
        state.info.clone()
    }
}

/// Build the blog service router
pub fn router(state: BlogState) -> Router {
    Router::new()
        .route("/blogs", get(list_blogs).post(create_blog))
        .route(
            "/blogs/:id",
            get(get_blog).put(update_blog).delete(delete_blog),
        )
        .route("/blogs/:id/like", post(like_blog))
        .route("/stats", get(stats))
        .merge(health::routes::<BlogState>())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct LikesResponse {
    pub likes: u64,
}

async fn list_blogs(State(state): State<BlogState>) -> Json<Vec<Blog>> {
    Json(state.store.list().await)
}

async fn get_blog(
    State(state): State<BlogState>,
    Path(id): Path<String>,
) -> MeshResult<Json<Blog>> {
    let id = parse_id::<Blog>(&id)?;
    debug!("get_blog: {}", id);
    Ok(Json(state.store.get(id).await?))
}

/// Create a blog post and announce it
async fn create_blog(
    State(state): State<BlogState>,
    JsonBody(req): JsonBody<NewBlog>,
) -> MeshResult<(StatusCode, Json<Blog>)> {
    let blog = state.store.create(req).await?;
    info!("create_blog: created blog {} by {}", blog.id, blog.author);

    state
        .dispatcher
        .dispatch(NotificationEvent::blog_created(&blog));

    Ok((StatusCode::CREATED, Json(blog)))
}

async fn update_blog(
    State(state): State<BlogState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<BlogPatch>,
) -> MeshResult<Json<Blog>> {
    let id = parse_id::<Blog>(&id)?;
    let blog = state.store.update(id, patch).await?;
    info!("update_blog: updated blog {}", id);
    Ok(Json(blog))
}

async fn like_blog(
    State(state): State<BlogState>,
    Path(id): Path<String>,
) -> MeshResult<Json<LikesResponse>> {
    let id = parse_id::<Blog>(&id)?;
    let likes = state.store.like(id).await?;
    Ok(Json(LikesResponse { likes }))
}

async fn delete_blog(
    State(state): State<BlogState>,
    Path(id): Path<String>,
) -> MeshResult<Json<MessageResponse>> {
    let id = parse_id::<Blog>(&id)?;
    state.store.delete(id).await?;
    info!("delete_blog: deleted blog {}", id);
    Ok(MessageResponse::new("Blog deleted successfully"))
}

async fn stats(State(state): State<BlogState>) -> Json<BlogStats> {
    Json(state.store.stats().await)
}
