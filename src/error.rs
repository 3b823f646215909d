//! 请求处理错误
//!
//! 一次请求只可能以三种方式失败：参数错误（不调用数据源）、数据源错误、其他错误。

use actix_web::http::StatusCode;

use crate::models::TableError;
use crate::services::provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 参数校验失败，映射为 400
    #[error("{0}")]
    InvalidParameter(String),
    /// 数据源拒绝或不可达，映射为 500，附带数据源原始信息
    #[error("Tushare接口调用失败：{0}")]
    Provider(#[from] ProviderError),
    #[error("服务端错误：{0}")]
    Unknown(String),
}

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidParameter(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(_) | ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidParameter(_) => "InvalidParameter",
            ApiError::Provider(_) => "ProviderError",
            ApiError::Unknown(_) => "UnknownError",
        }
    }
}

impl From<TableError> for ApiError {
    fn from(err: TableError) -> Self {
        ApiError::Unknown(err.to_string())
    }
}
