//! 网关路由模块

use auth_gate::auth_middleware;
use axum::{extract::State, middleware, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// 创建网关路由
///
/// `/api/ping` 需要通过认证服务校验，健康检查不需要。
pub fn router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/ping", get(ping))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .merge(protected)
}

/// 网关健康检查
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "网关运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        auth_configured: !state.verifier.endpoint().is_empty(),
        timestamp: Utc::now(),
    })
}

/// 受保护的连通性检查
#[utoipa::path(
    get,
    path = "/api/ping",
    tag = "gateway",
    responses(
        (status = 200, description = "认证通过", body = PingResponse),
        (status = 401, description = "缺少令牌或认证失败")
    )
)]
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
        timestamp: Utc::now(),
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 是否已配置认证服务地址
    pub auth_configured: bool,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
}

/// 受保护接口响应
#[derive(Serialize, ToSchema)]
pub struct PingResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
