//! ZMQ 板块详情转发
//!
//! REP 套接字，一问一答：
//! - `ping` / `heartbeat`：返回 pong
//! - JSON 对象 `{"ts_code": "...", "trade_date": "..."}`
//! - 纯文本板块代码，如 `BK1184.DC`（交易日取默认值）
//!
//! 应答为紧凑 JSON，格式与 HTTP `/api/dc_member` 相同。

use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::error::ApiError;
use crate::models::{ApiResponse, DcMemberQuery, HeartbeatResponse};
use crate::services::market_service::MarketService;

pub struct Relay {
    service: Arc<MarketService>,
}

impl Relay {
    pub fn new(service: Arc<MarketService>) -> Self {
        Self { service }
    }

    /// 处理一条请求，返回应答文本
    pub async fn handle(&self, request: &str) -> String {
        let request = request.trim();

        if request.eq_ignore_ascii_case("ping") || request.eq_ignore_ascii_case("heartbeat") {
            return to_json(&HeartbeatResponse::pong());
        }

        let query = match parse_request(request) {
            Ok(query) => query,
            Err(e) => return to_json(&ApiResponse::error(&e, request)),
        };

        match self.service.dc_member(&query).await {
            Ok(fetched) => to_json(&ApiResponse::success(fetched.data, fetched.params)),
            Err(e) => {
                error!("获取板块{}详情失败：{}", query.ts_code.as_deref().unwrap_or(""), e);
                to_json(&ApiResponse::error(&e, query))
            }
        }
    }

    /// 绑定并循环应答，收到 Ctrl-C 退出
    pub async fn run(&self, endpoint: &str) -> anyhow::Result<()> {
        let mut socket = RepSocket::new();
        socket.bind(endpoint).await?;
        info!("ZMQ服务端已启动，监听地址：{}", endpoint);
        info!("默认交易日：{}", self.service.default_trade_date());

        loop {
            let message = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("服务端被手动终止");
                    break;
                }
                received = socket.recv() => received,
            };

            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    error!("ZMQ通信错误：{}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let request = message
                .get(0)
                .map(|frame| String::from_utf8_lossy(frame).into_owned())
                .unwrap_or_default();
            info!("收到客户端请求：{}", request.trim());

            let reply = self.handle(&request).await;
            let reply_len = reply.len();
            if let Err(e) = socket.send(ZmqMessage::from(reply)).await {
                error!("ZMQ应答发送失败：{}", e);
                continue;
            }
            info!("已发送应答，数据长度：{}字节", reply_len);
        }

        Ok(())
    }
}

fn parse_request(request: &str) -> Result<DcMemberQuery, ApiError> {
    if request.starts_with('{') {
        return serde_json::from_str(request)
            .map_err(|e| ApiError::invalid(format!("请求格式错误：{}", e)));
    }
    Ok(DcMemberQuery {
        ts_code: Some(request.to_string()),
        trade_date: None,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"code":500,"msg":"服务端错误：{}","data":[]}}"#,
            e.to_string().replace('"', "'")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Scalar, Table};
    use crate::services::provider::fake::FakeProvider;
    use serde_json::Value;

    fn relay_with(provider: &Arc<FakeProvider>) -> Relay {
        Relay::new(Arc::new(MarketService::new(provider.clone(), "20251213")))
    }

    async fn ask(relay: &Relay, request: &str) -> Value {
        serde_json::from_str(&relay.handle(request).await).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let provider = Arc::new(FakeProvider::failing("down"));
        let relay = relay_with(&provider);
        for request in ["ping", " PING\n", "heartbeat"] {
            let reply = ask(&relay, request).await;
            assert_eq!(reply["code"], 0);
            assert_eq!(reply["msg"], "pong");
        }
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_plain_board_code() {
        let table = Table::new(
            vec!["ts_code".into(), "con_code".into()],
            vec![vec!["BK1184.DC".into(), "600000.SH".into()], vec!["BK1184.DC".into(), Scalar::Null]],
        )
        .unwrap();
        let provider = Arc::new(FakeProvider::returning(table));
        let relay = relay_with(&provider);

        let reply = ask(&relay, "BK1184.DC\n").await;
        assert_eq!(reply["code"], 0);
        assert_eq!(reply["msg"], "success");
        assert_eq!(reply["data"].as_array().unwrap().len(), 1);
        assert_eq!(provider.calls()[0].params["trade_date"], "20251213");
    }

    #[tokio::test]
    async fn test_json_request() {
        let provider = Arc::new(FakeProvider::returning(Table::default()));
        let relay = relay_with(&provider);
        let reply = ask(&relay, r#"{"ts_code":"BK0475.DC","trade_date":"20251212"}"#).await;
        assert_eq!(reply["code"], 0);
        assert_eq!(reply["request_params"]["trade_date"], "20251212");
        assert_eq!(provider.calls()[0].params["ts_code"], "BK0475.DC");
    }

    #[tokio::test]
    async fn test_rejections() {
        let provider = Arc::new(FakeProvider::returning(Table::default()));
        let relay = relay_with(&provider);

        let reply = ask(&relay, "BADCODE").await;
        assert_eq!(reply["code"], 400);
        assert!(reply["msg"].as_str().unwrap().contains("BADCODE"));

        let reply = ask(&relay, "{not json").await;
        assert_eq!(reply["code"], 400);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let provider = Arc::new(FakeProvider::failing("token无效"));
        let relay = relay_with(&provider);
        let reply = ask(&relay, "BK1184.DC").await;
        assert_eq!(reply["code"], 500);
        assert_eq!(reply["msg"], "Tushare接口调用失败：token无效");
    }
}
