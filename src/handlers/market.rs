//! 行情数据接口处理器
//!
//! ## API 列表
//! - GET /api/dc_member?ts_code=BK1184.DC&trade_date=20251213 - 板块成分股
//! - GET /api/dc_index?trade_date=20251213&fields=ts_code,name - 板块指数
//! - GET /api/stock_basic?exchange=&list_status=L&fields=ts_code,name - 股票基本信息
//! - GET /api/rt_k?ts_codes=600000.SH,000001.SZ - 实时K线

use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{ApiResponse, DcIndexQuery, DcMemberQuery, RtKQuery, StockBasicQuery};
use crate::services::market_service::{Fetched, MarketService};

/// 将查询结果映射为 HTTP 响应：成功回显规范化参数，失败回显原始参数
fn respond<P, Q>(result: std::result::Result<Fetched<P>, ApiError>, query: Q) -> HttpResponse
where
    P: Serialize,
    Q: Serialize,
{
    match result {
        Ok(fetched) => HttpResponse::Ok()
            .json(ApiResponse::success(fetched.data, fetched.params).with_meta(fetched.meta)),
        Err(e) => {
            match &e {
                ApiError::InvalidParameter(msg) => log::warn!("参数校验失败：{}", msg),
                _ => log::error!("请求处理失败（{}）：{}", e.kind(), e),
            }
            HttpResponse::build(e.status_code()).json(ApiResponse::error(&e, query))
        }
    }
}

/// 板块成分股
///
/// GET /api/dc_member
pub async fn get_dc_member(
    service: web::Data<MarketService>,
    query: web::Query<DcMemberQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let result = service.dc_member(&query).await;
    Ok(respond(result, query))
}

/// 板块指数
///
/// GET /api/dc_index
pub async fn get_dc_index(
    service: web::Data<MarketService>,
    query: web::Query<DcIndexQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let result = service.dc_index(&query).await;
    Ok(respond(result, query))
}

/// 股票基本信息
///
/// GET /api/stock_basic
pub async fn get_stock_basic(
    service: web::Data<MarketService>,
    query: web::Query<StockBasicQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let result = service.stock_basic(&query).await;
    Ok(respond(result, query))
}

/// 实时K线
///
/// GET /api/rt_k
pub async fn get_rt_k(
    service: web::Data<MarketService>,
    query: web::Query<RtKQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let result = service.rt_k(&query).await;
    Ok(respond(result, query))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dc_member", web::get().to(get_dc_member))
        .route("/dc_index", web::get().to(get_dc_index))
        .route("/stock_basic", web::get().to(get_stock_basic))
        .route("/rt_k", web::get().to(get_rt_k));
}
