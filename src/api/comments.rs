/// Comment service endpoints
///
/// Creating a comment is the dependent write: the parent blog is checked
/// with the blog service first, the comment is stored, then a
/// `comment_created` notification is dispatched without waiting for it.
use crate::{
    api::{blogs::LikesResponse, health, parse_id, JsonBody, MessageResponse, ServiceInfo},
    dispatch::{NotificationDispatcher, NotificationEvent},
    error::MeshResult,
    stats::CommentStats,
    store::{Blog, Comment, CommentPatch, CommentStore, NewComment},
    validation::{PeerStore, ValidationClient},
};
use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

pub const SERVICE_NAME: &str = "comment-service";

/// State shared by comment handlers
#[derive(Clone)]
pub struct CommentState {
    pub store: Arc<CommentStore>,
    pub validation: ValidationClient,
    pub dispatcher: NotificationDispatcher,
    pub info: ServiceInfo,
}

impl FromRef<CommentState> for ServiceInfo {
    fn from_ref(state: &CommentState) -> Self {
        state.info.clone()
    }
}

/// Build the comment service router
pub fn router(state: CommentState) -> Router {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route("/comments/blog/:blog_id", get(list_blog_comments))
        .route(
            "/comments/:id",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/comments/:id/like", post(like_comment))
        .route("/stats", get(stats))
        .merge(health::routes::<CommentState>())
        .with_state(state)
}

async fn list_comments(State(state): State<CommentState>) -> Json<Vec<Comment>> {
    Json(state.store.list().await)
}

/// Comments for one blog. An unknown blog simply has no comments.
async fn list_blog_comments(
    State(state): State<CommentState>,
    Path(blog_id): Path<String>,
) -> MeshResult<Json<Vec<Comment>>> {
    let blog_id = parse_id::<Blog>(&blog_id)?;
    debug!("list_blog_comments: {}", blog_id);
    Ok(Json(state.store.list_for_blog(blog_id).await))
}

async fn get_comment(
    State(state): State<CommentState>,
    Path(id): Path<String>,
) -> MeshResult<Json<Comment>> {
    let id = parse_id::<Comment>(&id)?;
    Ok(Json(state.store.get(id).await?))
}

/// Create a comment on an existing blog
async fn create_comment(
    State(state): State<CommentState>,
    JsonBody(req): JsonBody<NewComment>,
) -> MeshResult<(StatusCode, Json<Comment>)> {
    // Reject malformed input before asking the blog service anything
    req.validate()?;
    let blog_id = req.blog_id.unwrap_or_default();

    debug!("create_comment: validating blog {}", blog_id);
    state.validation.require(PeerStore::Blog, blog_id).await?;

    let comment = state.store.create(req).await?;
    info!(
        "create_comment: created comment {} on blog {}",
        comment.id, comment.blog_id
    );

    state
        .dispatcher
        .dispatch(NotificationEvent::comment_created(&comment));

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn update_comment(
    State(state): State<CommentState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<CommentPatch>,
) -> MeshResult<Json<Comment>> {
    let id = parse_id::<Comment>(&id)?;
    let comment = state.store.update(id, patch).await?;
    info!("update_comment: updated comment {}", id);
    Ok(Json(comment))
}

async fn like_comment(
    State(state): State<CommentState>,
    Path(id): Path<String>,
) -> MeshResult<Json<LikesResponse>> {
    let id = parse_id::<Comment>(&id)?;
    let likes = state.store.like(id).await?;
    Ok(Json(LikesResponse { likes }))
}

async fn delete_comment(
    State(state): State<CommentState>,
    Path(id): Path<String>,
) -> MeshResult<Json<MessageResponse>> {
    let id = parse_id::<Comment>(&id)?;
    state.store.delete(id).await?;
    info!("delete_comment: deleted comment {}", id);
    Ok(MessageResponse::new("Comment deleted successfully"))
}

async fn stats(State(state): State<CommentState>) -> Json<CommentStats> {
    Json(state.store.stats().await)
}
