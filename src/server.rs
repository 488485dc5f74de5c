/// HTTP server setup and routing
///
/// One process hosts a single service or, in `all` mode, every service on
/// its own port. In `all` mode validation and dispatch go straight to the
/// in-process stores; single-service modes reach peers over HTTP.
use crate::{
    api::{
        blogs::{self, BlogState},
        comments::{self, CommentState},
        gateway::{self, GatewayState},
        middleware::track_requests,
        notifications::{self, NotificationState},
        users::{self, UserState},
    },
    config::ServiceKind,
    context::AppContext,
    dispatch::{LocalSink, NotificationDispatcher},
    error::{ErrorResponse, MeshError, MeshResult},
    jobs::JobScheduler,
    store::{BlogStore, CommentStore, NotificationStore, UserStore},
    validation::{LocalPeerLookup, ValidationClient},
};
use axum::{
    http::{header, Method, StatusCode},
    middleware,
    response::Json,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Wrap a service router with the shared middleware stack
pub fn finish(router: Router, service: &'static str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    router
        .route_layer(middleware::from_fn_with_state(service, track_requests))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

pub fn blog_app(state: BlogState) -> Router {
    finish(blogs::router(state), blogs::SERVICE_NAME)
}

pub fn comment_app(state: CommentState) -> Router {
    finish(comments::router(state), comments::SERVICE_NAME)
}

pub fn user_app(state: UserState) -> Router {
    finish(users::router(state), users::SERVICE_NAME)
}

pub fn notification_app(state: NotificationState) -> Router {
    finish(notifications::router(state), notifications::SERVICE_NAME)
}

pub fn gateway_app(state: GatewayState) -> Router {
    finish(gateway::router(state), gateway::SERVICE_NAME)
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "NotFound".to_string(),
            message: "Endpoint not found".to_string(),
        }),
    )
}

/// Seeded stores for every service, shared in-process in `all` mode
#[derive(Clone)]
pub struct LocalStores {
    pub blogs: Arc<BlogStore>,
    pub comments: Arc<CommentStore>,
    pub users: Arc<UserStore>,
    pub notifications: Arc<NotificationStore>,
}

impl LocalStores {
    pub fn seeded() -> Self {
        Self {
            blogs: Arc::new(BlogStore::seeded()),
            comments: Arc::new(CommentStore::seeded()),
            users: Arc::new(UserStore::seeded()),
            notifications: Arc::new(NotificationStore::seeded()),
        }
    }

    /// Existence checks answered by these stores
    pub fn validation(&self, ctx: &AppContext) -> ValidationClient {
        let lookup = LocalPeerLookup::new()
            .with_blogs(Arc::clone(&self.blogs))
            .with_comments(Arc::clone(&self.comments))
            .with_users(Arc::clone(&self.users))
            .with_notifications(Arc::clone(&self.notifications));
        ValidationClient::new(Arc::new(lookup), ctx.config.validation.unreachable_policy)
    }

    /// Dispatcher writing straight into the notification store
    pub fn dispatcher(&self, origin: &'static str) -> NotificationDispatcher {
        let sink = LocalSink::new(Arc::clone(&self.notifications));
        NotificationDispatcher::new(Arc::new(sink), origin)
    }
}

fn gateway_state(ctx: &AppContext) -> GatewayState {
    GatewayState {
        http_client: ctx.http_client.clone(),
        peers: ctx.config.peers.clone(),
        info: ctx.service_info(gateway::SERVICE_NAME),
    }
}

fn notification_state(ctx: &AppContext, store: Arc<NotificationStore>) -> NotificationState {
    NotificationState {
        store,
        settings: ctx.config.notifications.clone(),
        info: ctx.service_info(notifications::SERVICE_NAME),
    }
}

fn start_jobs(ctx: &AppContext, store: Arc<NotificationStore>) {
    let scheduler = Arc::new(JobScheduler::new(store, ctx.config.notifications.clone()));
    scheduler.start();
}

/// Bind one listener and serve `app` on it
async fn listen(ctx: &AppContext, kind: ServiceKind, name: &str, app: Router) -> MeshResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.port_for(kind));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MeshError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("🚀 {} listening on {}", name, addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| MeshError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Start the configured services
pub async fn serve(ctx: AppContext) -> MeshResult<()> {
    info!(
        "Hosting {} (version {}, unreachable policy {})",
        ctx.config.service.kind.as_str(),
        ctx.config.service.version,
        ctx.config.validation.unreachable_policy.as_str()
    );

    match ctx.config.service.kind {
        ServiceKind::Blog => {
            let app = blog_app(BlogState {
                store: Arc::new(BlogStore::seeded()),
                dispatcher: ctx.remote_dispatcher(blogs::SERVICE_NAME),
                info: ctx.service_info(blogs::SERVICE_NAME),
            });
            listen(&ctx, ServiceKind::Blog, blogs::SERVICE_NAME, app).await
        }
        ServiceKind::Comment => {
            let app = comment_app(CommentState {
                store: Arc::new(CommentStore::seeded()),
                validation: ctx.remote_validation(),
                dispatcher: ctx.remote_dispatcher(comments::SERVICE_NAME),
                info: ctx.service_info(comments::SERVICE_NAME),
            });
            listen(&ctx, ServiceKind::Comment, comments::SERVICE_NAME, app).await
        }
        ServiceKind::User => {
            let app = user_app(UserState {
                store: Arc::new(UserStore::seeded()),
                dispatcher: ctx.remote_dispatcher(users::SERVICE_NAME),
                info: ctx.service_info(users::SERVICE_NAME),
            });
            listen(&ctx, ServiceKind::User, users::SERVICE_NAME, app).await
        }
        ServiceKind::Notification => {
            let store = Arc::new(NotificationStore::seeded());
            start_jobs(&ctx, Arc::clone(&store));
            let app = notification_app(notification_state(&ctx, store));
            listen(
                &ctx,
                ServiceKind::Notification,
                notifications::SERVICE_NAME,
                app,
            )
            .await
        }
        ServiceKind::Gateway => {
            let app = gateway_app(gateway_state(&ctx));
            listen(&ctx, ServiceKind::Gateway, gateway::SERVICE_NAME, app).await
        }
        ServiceKind::All => serve_all(ctx).await,
    }
}

/// Host every service in this process
async fn serve_all(ctx: AppContext) -> MeshResult<()> {
    let stores = LocalStores::seeded();
    start_jobs(&ctx, Arc::clone(&stores.notifications));

    let blog = blog_app(BlogState {
        store: Arc::clone(&stores.blogs),
        dispatcher: stores.dispatcher(blogs::SERVICE_NAME),
        info: ctx.service_info(blogs::SERVICE_NAME),
    });
    let comment = comment_app(CommentState {
        store: Arc::clone(&stores.comments),
        validation: stores.validation(&ctx),
        dispatcher: stores.dispatcher(comments::SERVICE_NAME),
        info: ctx.service_info(comments::SERVICE_NAME),
    });
    let user = user_app(UserState {
        store: Arc::clone(&stores.users),
        dispatcher: stores.dispatcher(users::SERVICE_NAME),
        info: ctx.service_info(users::SERVICE_NAME),
    });
    let notification = notification_app(notification_state(
        &ctx,
        Arc::clone(&stores.notifications),
    ));
    let gateway = gateway_app(gateway_state(&ctx));

    tokio::try_join!(
        listen(&ctx, ServiceKind::Blog, blogs::SERVICE_NAME, blog),
        listen(&ctx, ServiceKind::Comment, comments::SERVICE_NAME, comment),
        listen(&ctx, ServiceKind::User, users::SERVICE_NAME, user),
        listen(
            &ctx,
            ServiceKind::Notification,
            notifications::SERVICE_NAME,
            notification
        ),
        listen(&ctx, ServiceKind::Gateway, gateway::SERVICE_NAME, gateway),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_has_error_body() {
        let stores = LocalStores::seeded();
        let app = blog_app(BlogState {
            store: Arc::clone(&stores.blogs),
            dispatcher: stores.dispatcher(blogs::SERVICE_NAME),
            info: crate::api::ServiceInfo::new(blogs::SERVICE_NAME, "1.0.0"),
        });

        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "NotFound");
    }
}
