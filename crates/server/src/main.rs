use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Form, Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use maud::{html, Markup};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shared::{
    domain::ItemId,
    error::ApiException,
    protocol::{ItemForm, ItemOrder},
};
use storage::Storage;

mod config;
mod error;
mod fragments;
mod rate_limit;

use error::{AppError, AppResult};
use rate_limit::{CoarseRateLimiter, SlidingRateLimiter};

const COARSE_LIMIT_PER_MINUTE: usize = 20;
const SLIDING_LIMIT_PER_MINUTE: usize = 60;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

#[derive(Clone)]
struct AppState {
    storage: Storage,
    coarse_limiter: CoarseRateLimiter,
    sliding_limiter: SlidingRateLimiter,
    debug_delay: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = config::Opts::parse();
    let settings = config::load_settings(&opts);

    let storage = Storage::new(&settings.database_url)
        .await
        .map_err(|error| {
            error!(
                database_url = %settings.database_url,
                %error,
                "failed to open SQLite database; verify parent directory exists and permissions are correct"
            );
            error
        })?;

    let state = Arc::new(AppState {
        storage,
        coarse_limiter: CoarseRateLimiter::new(COARSE_LIMIT_PER_MINUTE, RATE_LIMIT_WINDOW_SECS),
        sliding_limiter: SlidingRateLimiter::new(SLIDING_LIMIT_PER_MINUTE, RATE_LIMIT_WINDOW_SECS),
        debug_delay: settings.debug_delay,
    });
    let app = build_router(state);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/item", post(item_create))
        .route("/item/order", post(item_order))
        .route("/item/:id/edit", get(item_edit))
        .route("/item/:id", post(item_update))
        .route("/script.js", get(script_js))
        .route("/twind.js", get(twind_js))
        .route("/style.css", get(style_css))
        .route("/favicon.ico", get(favicon_ico))
        .route("/healthz", get(healthz))
        .fallback(not_found_404)
        .layer(middleware::from_fn_with_state(state.clone(), throttle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Both limiters have to agree before a peer is turned away; the coarse one
/// is checked first so most floods never touch the lock in the sliding one.
async fn throttle(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if state.debug_delay {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let peer_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if state.coarse_limiter.is_limited(peer_ip) && state.sliding_limiter.is_limited(peer_ip) {
        (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
            "Too Many Requests",
        )
            .into_response()
    } else {
        next.run(req).await
    }
}

async fn home(State(state): State<Arc<AppState>>) -> AppResult<Markup> {
    let items = state.storage.list_items().await?;
    Ok(fragments::page(
        "home",
        html! {
            div ."container flex" {
                div ."shrink p-1" {
                    (fragments::items_panel("items", &items))
                }
                (fragments::edit_slot())
            }
        },
    ))
}

async fn item_create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ItemForm>,
) -> AppResult<Markup> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ApiException::validation("title cannot be empty").into());
    }

    state.storage.create_item(title, form.body.trim()).await?;
    let items = state.storage.list_items().await?;
    Ok(fragments::items_panel("items", &items))
}

async fn item_order(
    State(state): State<Arc<AppState>>,
    Form(order): Form<ItemOrder>,
) -> AppResult<StatusCode> {
    state
        .storage
        .reorder_item(order.prev, order.curr, order.next)
        .await
        .map_err(|e| AppError::from(ApiException::validation(format!("{e:#}"))))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn item_edit(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<ItemId>,
) -> AppResult<Markup> {
    let item = state
        .storage
        .load_item(item_id)
        .await?
        .ok_or_else(|| ApiException::not_found(format!("item {item_id} not found")))?;
    Ok(fragments::edit_form(&item))
}

async fn item_update(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<ItemId>,
    Form(form): Form<ItemForm>,
) -> AppResult<Markup> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ApiException::validation("title cannot be empty").into());
    }

    let existed = state
        .storage
        .update_item(item_id, title, form.body.trim())
        .await?;
    if !existed {
        return Err(ApiException::not_found(format!("item {item_id} not found")).into());
    }

    let items = state.storage.list_items().await?;
    Ok(fragments::items_panel("items", &items))
}

async fn script_js() -> impl IntoResponse {
    asset(
        "application/javascript",
        concat!(
            include_str!("../static/sortable.js"),
            include_str!("../static/send-error.js"),
        ),
    )
}

async fn twind_js() -> impl IntoResponse {
    asset("text/javascript", include_str!("../static/twind.js"))
}

async fn style_css() -> impl IntoResponse {
    asset("text/css", include_str!("../static/style.css"))
}

async fn favicon_ico() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/gif")),
            (header::CACHE_CONTROL, cache_static()),
        ],
        include_bytes!("../static/favicon.gif").as_slice(),
    )
}

async fn healthz(State(state): State<Arc<AppState>>) -> AppResult<&'static str> {
    state.storage.health_check().await?;
    Ok("ok")
}

async fn not_found_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, fragments::not_found_page())
}

// scripts and styles are tiny and change with the binary; only the favicon
// gets long-lived cache headers
fn asset(content_type: &'static str, body: &'static str) -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        )],
        body,
    )
}

fn cache_static() -> HeaderValue {
    HeaderValue::from_static("max-age=86400, stale-while-revalidate=86400")
}
