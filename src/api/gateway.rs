/// API gateway
///
/// Pure pass-through: each route forwards to one upstream service and
/// relays its status code and body unchanged. Only a transport failure is
/// answered by the gateway itself (502).
use crate::{
    api::{health, parse_id, ServiceInfo},
    config::PeersConfig,
    error::{MeshError, MeshResult},
    store::Blog,
};
use axum::{
    body::Bytes,
    extract::{FromRef, Path, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use reqwest::Client;
use tracing::{debug, error};

pub const SERVICE_NAME: &str = "gateway";

/// State shared by gateway handlers
#[derive(Clone)]
pub struct GatewayState {
    pub http_client: Client,
    pub peers: PeersConfig,
    pub info: ServiceInfo,
}

impl FromRef<GatewayState> for ServiceInfo {
    fn from_ref(state: &GatewayState) -> Self {
        state.info.clone()
    }
}

/// Build the gateway router
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/blogs", get(list_blogs).post(create_blog))
        .route("/api/blogs/:id", put(update_blog).delete(delete_blog))
        .route("/api/blogs/:id/comments", get(blog_comments))
        .route("/api/comments", post(create_comment))
        .merge(health::routes::<GatewayState>())
        .with_state(state)
}

fn upstream_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Forward one request and relay the upstream response
async fn forward(
    state: &GatewayState,
    method: Method,
    url: String,
    body: Option<Bytes>,
) -> MeshResult<Response> {
    debug!("gateway: {} {}", method, url);

    let mut request = state.http_client.request(method.clone(), &url);
    if let Some(body) = body {
        request = request
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
    }

    let upstream = request.send().await.map_err(|e| {
        error!("gateway: {} {} failed: {}", method, url, e);
        MeshError::Upstream(format!("{} {}: {}", method, url, e))
    })?;

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = upstream.bytes().await.map_err(|e| {
        error!("gateway: reading response from {} failed: {}", url, e);
        MeshError::Upstream(format!("{}: {}", url, e))
    })?;

    let mut response = (status, bytes).into_response();
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}

async fn list_users(State(state): State<GatewayState>) -> MeshResult<Response> {
    let url = upstream_url(&state.peers.user_url, "/users");
    forward(&state, Method::GET, url, None).await
}

async fn create_user(State(state): State<GatewayState>, body: Bytes) -> MeshResult<Response> {
    let url = upstream_url(&state.peers.user_url, "/users");
    forward(&state, Method::POST, url, Some(body)).await
}

async fn list_blogs(State(state): State<GatewayState>) -> MeshResult<Response> {
    let url = upstream_url(&state.peers.blog_url, "/blogs");
    forward(&state, Method::GET, url, None).await
}

async fn create_blog(State(state): State<GatewayState>, body: Bytes) -> MeshResult<Response> {
    let url = upstream_url(&state.peers.blog_url, "/blogs");
    forward(&state, Method::POST, url, Some(body)).await
}

async fn update_blog(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: Bytes,
) -> MeshResult<Response> {
    let id = parse_id::<Blog>(&id)?;
    let url = upstream_url(&state.peers.blog_url, &format!("/blogs/{}", id));
    forward(&state, Method::PUT, url, Some(body)).await
}

async fn delete_blog(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> MeshResult<Response> {
    let id = parse_id::<Blog>(&id)?;
    let url = upstream_url(&state.peers.blog_url, &format!("/blogs/{}", id));
    forward(&state, Method::DELETE, url, None).await
}

async fn blog_comments(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> MeshResult<Response> {
    let id = parse_id::<Blog>(&id)?;
    let url = upstream_url(&state.peers.comment_url, &format!("/comments/blog/{}", id));
    forward(&state, Method::GET, url, None).await
}

async fn create_comment(State(state): State<GatewayState>, body: Bytes) -> MeshResult<Response> {
    let url = upstream_url(&state.peers.comment_url, "/comments");
    forward(&state, Method::POST, url, Some(body)).await
}
