pub mod health;
pub mod market;

use actix_web::{error::InternalError, web, HttpResponse};

use crate::error::ApiError;
use crate::models::ApiResponse;

pub fn config(cfg: &mut web::ServiceConfig) {
    // 查询串无法解析时也返回统一响应格式
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let api_error = ApiError::invalid(format!("请求参数解析失败：{}", err));
        let response = HttpResponse::BadRequest()
            .json(ApiResponse::error(&api_error, serde_json::json!({})));
        InternalError::from_response(err, response).into()
    }))
    .route("/", web::get().to(health::index))
    .service(
        web::scope("/api")
            .configure(health::config)
            .configure(market::config),
    );
}
