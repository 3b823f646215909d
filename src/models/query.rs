//! 请求参数模型
//!
//! `*Query` 为调用方原始参数（全部可选，缺省值在服务层补齐），
//! `*Params` 为校验、规范化之后回显给调用方的参数。

use serde::{Deserialize, Serialize};

/// 板块成分股查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcMemberQuery {
    /// 板块代码，如 BK1184.DC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts_code: Option<String>,
    /// 交易日（YYYYMMDD）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<String>,
}

/// 板块指数查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcIndexQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<String>,
    /// 查询字段，逗号分隔
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

/// 股票基本信息查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockBasicQuery {
    /// 交易所代码（空串表示全部）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// 上市状态：L 上市，D 退市，P 暂停上市
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

/// 实时K线查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RtKQuery {
    /// 股票代码列表，逗号分隔，如 600000.SH,000001.SZ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts_codes: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DcMemberParams {
    pub ts_code: String,
    pub trade_date: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DcIndexParams {
    pub trade_date: String,
    /// 去重后的字段
    pub fields: String,
    pub original_fields: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockBasicParams {
    pub exchange: String,
    pub list_status: String,
    pub fields: String,
    pub original_fields: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RtKParams {
    pub ts_codes: String,
}
