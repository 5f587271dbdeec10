//! API 网关服务
//!
//! 作为客户端请求的入口点，提供以下功能：
//! - 通过远程认证服务校验 `Authorization: JWT <token>`
//! - 认证通过后转交受保护的处理函数
//! - 请求/响应日志记录

mod routes;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use auth_gate::AppConfig;
use axum::{routing::get, Json, Router};
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "gateway";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "认证网关 API",
        version = "0.1.0",
        description = "受远程认证服务保护的 API 网关"
    ),
    paths(
        routes::health_check,
        routes::ping,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::PingResponse,
    )),
    tags(
        (name = "gateway", description = "网关端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 文件可选，不存在时直接使用进程环境变量
    dotenvy::dotenv().ok();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load().context("加载配置失败")?;

    // 创建应用状态
    let state = AppState::new(&config.auth).context("创建认证客户端失败")?;

    #[cfg(unix)]
    tokio::spawn(reload_on_sighup(state.clone()));

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, auth_url = %config.auth.url, "启动 API 网关");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("服务启动失败")?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router(&state))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// 收到 SIGHUP 时重新读取 .env 与环境变量，更新认证服务地址。
/// 读取失败时保留原地址。
#[cfg(unix)]
async fn reload_on_sighup(state: AppState) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "无法监听 SIGHUP，配置热加载不可用");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        dotenvy::dotenv_override().ok();
        match auth_gate::AuthConfig::from_env() {
            Ok(auth) => state.verifier.set_endpoint(auth.url),
            Err(e) => tracing::warn!(error = %e, "重新加载认证配置失败，保留原配置"),
        }
    }
}
