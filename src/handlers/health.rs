use actix_web::{web, HttpResponse, Result};

use crate::models::{HeartbeatResponse, ServiceInfo};

/// 心跳检测，不做校验也不访问数据源
pub async fn heartbeat() -> Result<HttpResponse> {
    log::info!("处理心跳检测请求");
    Ok(HttpResponse::Ok().json(HeartbeatResponse::pong()))
}

pub async fn index() -> Result<HttpResponse> {
    let info = ServiceInfo {
        code: 0,
        msg: "服务运行中".to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            "/api/dc_member",
            "/api/dc_index",
            "/api/stock_basic",
            "/api/rt_k",
            "/api/heartbeat",
        ],
    };
    Ok(HttpResponse::Ok().json(info))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/heartbeat", web::get().to(heartbeat));
}
