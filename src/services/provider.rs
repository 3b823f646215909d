//! 数据源抽象
//!
//! 处理器只依赖 `DataProvider`，启动时注入 Tushare 实现，测试时注入假数据源。

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::models::{Table, TableError};

/// 数据源错误，保留数据源自身的错误信息
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP 状态码 {code}: {body}")]
    Status { code: u16, body: String },
    #[error("{msg}")]
    Vendor { code: i64, msg: String },
    #[error("响应解析失败: {0}")]
    Decode(String),
    #[error("{0}")]
    Table(#[from] TableError),
}

/// 错误响应体最多保留的字符数
const MAX_ERROR_BODY_CHARS: usize = 200;

impl ProviderError {
    /// 由非 2xx 响应构造错误，保留数据源返回的错误文本
    pub async fn from_status(response: reqwest::Response) -> Self {
        let code = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let text = text.trim();
        let body = if text.chars().count() > MAX_ERROR_BODY_CHARS {
            let head: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            format!("{}...", head)
        } else {
            text.to_string()
        };
        ProviderError::Status { code, body }
    }
}

/// 一次数据源调用
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// 接口名，如 dc_member
    pub api_name: String,
    pub params: BTreeMap<String, String>,
    /// 返回字段，逗号分隔；为空时由数据源决定
    pub fields: Option<String>,
}

impl ProviderRequest {
    pub fn new(api_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            params: BTreeMap::new(),
            fields: None,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// 表格数据源
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// 调用一次数据源接口，返回原始表格（未清洗）
    async fn query(&self, request: &ProviderRequest) -> Result<Table, ProviderError>;
}

#[cfg(test)]
pub mod fake {
    //! 测试用假数据源，记录每一次调用

    use super::*;
    use std::sync::Mutex;

    pub struct FakeProvider {
        result: Result<Table, String>,
        calls: Mutex<Vec<ProviderRequest>>,
    }

    impl FakeProvider {
        pub fn returning(table: Table) -> Self {
            Self {
                result: Ok(table),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(msg: &str) -> Self {
            Self {
                result: Err(msg.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<ProviderRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DataProvider for FakeProvider {
        async fn query(&self, request: &ProviderRequest) -> Result<Table, ProviderError> {
            self.calls.lock().unwrap().push(request.clone());
            match &self.result {
                Ok(table) => Ok(table.clone()),
                Err(msg) => Err(ProviderError::Vendor {
                    code: 40203,
                    msg: msg.clone(),
                }),
            }
        }
    }
}
