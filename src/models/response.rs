//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use serde::Serialize;

use super::table::Record;
use crate::error::ApiError;

/// 成功响应固定消息
pub const SUCCESS_MSG: &str = "success";

/// 获取北京时间字符串（YYYY-MM-DD HH:MM:SS，精确到秒）
pub fn beijing_timestamp() -> String {
    Utc::now()
        .with_timezone(&Shanghai)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// 统一 API 响应结构
///
/// 所有数据接口返回统一格式，包含：
/// - code: 0 表示成功，否则为对应的 HTTP 状态码
/// - msg: 成功时为 "success"，失败时为错误原因
/// - data: 清洗后的数据记录（失败时为空）
/// - request_params: 请求参数（成功时为规范化后的参数）
/// - timestamp: 响应时间（北京时间）
#[derive(Debug, Serialize)]
pub struct ApiResponse<P> {
    pub code: u16,
    pub msg: String,
    pub data: Vec<Record>,
    pub request_params: P,
    /// 代码校验信息，仅实时行情接口返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<CodeMeta>,
    pub timestamp: String,
}

impl<P> ApiResponse<P> {
    /// 创建成功响应
    pub fn success(data: Vec<Record>, request_params: P) -> Self {
        Self {
            code: 0,
            msg: SUCCESS_MSG.to_string(),
            data,
            request_params,
            meta: None,
            timestamp: beijing_timestamp(),
        }
    }

    /// 创建错误响应，code 与 HTTP 状态码一致
    pub fn error(err: &ApiError, request_params: P) -> Self {
        Self {
            code: err.status_code().as_u16(),
            msg: err.to_string(),
            data: Vec::new(),
            request_params,
            meta: None,
            timestamp: beijing_timestamp(),
        }
    }

    pub fn with_meta(mut self, meta: Option<CodeMeta>) -> Self {
        self.meta = meta;
        self
    }
}

/// 代码列表校验信息
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CodeMeta {
    /// 原始代码数量（去空后，未去重）
    pub total_input_codes: usize,
    /// 有效代码数量（去重后）
    pub valid_code_count: usize,
    /// 未通过格式校验的代码
    pub invalid_codes: Vec<String>,
    /// 返回数据条数
    pub return_data_count: usize,
}

/// 心跳响应
#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub code: u16,
    pub msg: String,
    pub timestamp: String,
    pub service_status: String,
    pub tushare_status: String,
}

impl HeartbeatResponse {
    pub fn pong() -> Self {
        Self {
            code: 0,
            msg: "pong".to_string(),
            timestamp: beijing_timestamp(),
            service_status: "running".to_string(),
            tushare_status: "connected".to_string(),
        }
    }
}

/// 服务元信息
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub code: u16,
    pub msg: String,
    pub name: String,
    pub version: String,
    pub endpoints: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Scalar, Table};
    use chrono::NaiveDateTime;

    #[test]
    fn test_timestamp_format() {
        let ts = beijing_timestamp();
        assert_eq!(ts.len(), 19);
        assert!(NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn test_envelope_invariant() {
        let table = Table::new(vec!["ts_code".into()], vec![vec![Scalar::from("BK1184.DC")]]).unwrap();
        let ok = ApiResponse::success(table.into_records(), ());
        assert_eq!(ok.code, 0);
        assert_eq!(ok.msg, SUCCESS_MSG);

        let errors = [
            ApiError::invalid("板块代码不能为空"),
            ApiError::Unknown("boom".into()),
        ];
        for err in &errors {
            let resp = ApiResponse::error(err, ());
            assert_ne!(resp.code, 0);
            assert_ne!(resp.msg, SUCCESS_MSG);
            assert!(resp.data.is_empty());
        }
    }

    #[test]
    fn test_meta_skipped_when_absent() {
        let value = serde_json::to_value(ApiResponse::success(Vec::new(), ())).unwrap();
        assert!(value.get("meta").is_none());
        assert_eq!(value["data"], serde_json::json!([]));
    }
}
