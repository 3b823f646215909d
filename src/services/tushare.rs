//! Tushare Pro 接口实现
//!
//! 协议：POST <http_url>，请求体 `{api_name, token, params, fields}`，
//! 返回 `{code, msg, data: {fields, items, has_more}}`，code 非 0 表示失败。

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use super::provider::{DataProvider, ProviderError, ProviderRequest};
use crate::config::TushareConfig;
use crate::models::{Scalar, Table};

#[derive(Serialize)]
struct TushareRequest<'a> {
    api_name: &'a str,
    token: &'a str,
    params: &'a BTreeMap<String, String>,
    fields: &'a str,
}

#[derive(Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TushareData>,
}

#[derive(Deserialize)]
struct TushareData {
    fields: Vec<String>,
    items: Vec<Vec<Scalar>>,
    #[serde(default)]
    has_more: bool,
}

/// Tushare 会话：token、接口地址和 HTTP 客户端，启动时创建，之后只读
pub struct TushareClient {
    client: Client,
    token: String,
    http_url: Url,
}

impl TushareClient {
    pub fn new(config: &TushareConfig) -> anyhow::Result<Self> {
        if config.token.trim().is_empty() {
            anyhow::bail!("未配置 Tushare token（配置项 tushare.token 或环境变量 TUSHARE_TOKEN）");
        }
        let http_url = Url::parse(&config.http_url)
            .map_err(|e| anyhow::anyhow!("Tushare 接口地址无效 {}: {}", config.http_url, e))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            token: config.token.clone(),
            http_url,
        })
    }

    /// 启动探测：查询当天交易日历，验证 token 与接口地址可用
    pub async fn check_connection(&self) -> Result<(), ProviderError> {
        let today = Utc::now().with_timezone(&Shanghai).format("%Y%m%d").to_string();
        let request = ProviderRequest::new("trade_cal")
            .param("exchange", "")
            .param("start_date", today.clone())
            .param("end_date", today);
        self.query(&request).await.map(|_| ())
    }
}

#[async_trait]
impl DataProvider for TushareClient {
    async fn query(&self, request: &ProviderRequest) -> Result<Table, ProviderError> {
        let body = TushareRequest {
            api_name: &request.api_name,
            token: &self.token,
            params: &request.params,
            fields: request.fields.as_deref().unwrap_or(""),
        };

        log::debug!("请求 Tushare {} 参数: {:?}", request.api_name, request.params);

        let response = self
            .client
            .post(self.http_url.clone())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_status(response).await);
        }

        let text = response.text().await?;
        let parsed: TushareResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))?;

        if parsed.code != 0 {
            return Err(ProviderError::Vendor {
                code: parsed.code,
                msg: parsed.msg.unwrap_or_default(),
            });
        }

        match parsed.data {
            Some(data) => {
                if data.has_more {
                    log::debug!("Tushare {} 还有更多数据未返回", request.api_name);
                }
                Ok(Table::new(data.fields, data.items)?)
            }
            None => Ok(Table::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> TushareConfig {
        TushareConfig {
            token: "test-token".to_string(),
            http_url: server.uri(),
            ..TushareConfig::default()
        }
    }

    #[test]
    fn test_new_requires_token() {
        let config = TushareConfig::default();
        assert!(TushareClient::new(&config).is_err());

        let config = TushareConfig {
            token: "t".to_string(),
            http_url: "not a url".to_string(),
            ..TushareConfig::default()
        };
        assert!(TushareClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_query_sends_protocol_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "api_name": "dc_member",
                "token": "test-token",
                "params": {"ts_code": "BK1184.DC", "trade_date": "20251213"},
                "fields": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "request_id": "abc",
                "code": 0,
                "msg": "",
                "data": {
                    "fields": ["trade_date", "ts_code", "con_code", "name"],
                    "items": [
                        ["20251213", "BK1184.DC", "600000.SH", "浦发银行"],
                        ["20251213", "BK1184.DC", "000001.SZ", null]
                    ],
                    "has_more": false
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TushareClient::new(&config_for(&server)).unwrap();
        let request = ProviderRequest::new("dc_member")
            .param("trade_date", "20251213")
            .param("ts_code", "BK1184.DC");
        let table = client.query(&request).await.unwrap();

        assert_eq!(table.columns(), ["trade_date", "ts_code", "con_code", "name"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][3], Scalar::Null);
    }

    #[tokio::test]
    async fn test_vendor_error_keeps_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 40101,
                "msg": "抱歉，您的token不对，请确认。",
                "data": null
            })))
            .mount(&server)
            .await;

        let client = TushareClient::new(&config_for(&server)).unwrap();
        let err = client.query(&ProviderRequest::new("rt_k")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Vendor { code: 40101, .. }));
        assert_eq!(err.to_string(), "抱歉，您的token不对，请确认。");
    }

    #[tokio::test]
    async fn test_http_status_and_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"api_name": "broken"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"api_name": "down"})))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = TushareClient::new(&config_for(&server)).unwrap();
        let err = client.query(&ProviderRequest::new("broken")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
        let err = client.query(&ProviderRequest::new("down")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { code: 502, .. }));
    }

    #[tokio::test]
    async fn test_http_error_body_reaches_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"api_name": "dc_member"})))
            .respond_with(ResponseTemplate::new(500).set_body_string("您的token已过期"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"api_name": "rt_k"})))
            .respond_with(ResponseTemplate::new(503).set_body_string("错".repeat(500)))
            .mount(&server)
            .await;

        let client = TushareClient::new(&config_for(&server)).unwrap();
        let err = client.query(&ProviderRequest::new("dc_member")).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 状态码 500: 您的token已过期");
        let api_err = crate::error::ApiError::from(err);
        assert!(api_err.to_string().contains("您的token已过期"));

        // 过长的响应体被截断
        let err = client.query(&ProviderRequest::new("rt_k")).await.unwrap_err();
        match err {
            ProviderError::Status { code, body } => {
                assert_eq!(code, 503);
                assert_eq!(body.chars().count(), 203);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_connection_calls_trade_cal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"api_name": "trade_cal"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "msg": "",
                "data": {"fields": ["exchange", "cal_date", "is_open"], "items": [], "has_more": false}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TushareClient::new(&config_for(&server)).unwrap();
        assert!(client.check_connection().await.is_ok());
    }
}
