//! 东方财富板块行情
//!
//! 概念板块 / 行业板块列表，对接 push2.eastmoney.com 的 clist 接口，
//! 参考 akshare 的 stock_board_concept_name_em / stock_board_industry_name_em。

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use super::provider::ProviderError;
use crate::config::EastMoneyConfig;
use crate::models::{Scalar, Table};

/// 东方财富行情接口通用 ut 参数
const EASTMONEY_UT: &str = "bd1d9ddb04089700cf9c27f6f7426281";

/// 接口字段到中文列名的映射（排名列由本地生成）
const BOARD_COLUMNS: [(&str, &str); 11] = [
    ("f14", "板块名称"),
    ("f12", "板块代码"),
    ("f2", "最新价"),
    ("f4", "涨跌额"),
    ("f3", "涨跌幅"),
    ("f20", "总市值"),
    ("f8", "换手率"),
    ("f104", "上涨家数"),
    ("f105", "下跌家数"),
    ("f128", "领涨股票"),
    ("f136", "领涨股票-涨跌幅"),
];

/// 板块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    /// 概念板块
    Concept,
    /// 行业板块
    Industry,
}

impl BoardKind {
    fn filter(&self) -> &'static str {
        match self {
            BoardKind::Concept => "m:90 t:3 f:!50",
            BoardKind::Industry => "m:90 t:2 f:!50",
        }
    }

    /// 导出文件名前缀
    pub fn file_prefix(&self) -> &'static str {
        match self {
            BoardKind::Concept => "stock_concept",
            BoardKind::Industry => "stock_industry",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BoardKind::Concept => "概念",
            BoardKind::Industry => "行业",
        }
    }
}

#[derive(Deserialize)]
struct ClistResponse {
    data: Option<ClistData>,
}

#[derive(Deserialize)]
struct ClistData {
    total: usize,
    #[serde(default)]
    diff: Vec<Map<String, Value>>,
}

/// 东方财富客户端
pub struct EastMoneyClient {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl EastMoneyClient {
    pub fn new(config: &EastMoneyConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            page_size: config.page_size.max(1),
        })
    }

    /// 获取板块列表（全部分页），按涨跌幅降序，原始表未清洗
    pub async fn board_list(&self, kind: BoardKind) -> Result<Table, ProviderError> {
        let mut items: Vec<Map<String, Value>> = Vec::new();
        let mut page = 1;

        loop {
            let data = self.fetch_page(kind, page).await?;
            let received = data.diff.len();
            items.extend(data.diff);
            log::debug!(
                "东方财富{}板块第 {} 页：{} 条，累计 {}/{}",
                kind.label(),
                page,
                received,
                items.len(),
                data.total
            );
            if received == 0 || items.len() >= data.total {
                break;
            }
            page += 1;
        }

        let mut columns = vec!["排名".to_string()];
        columns.extend(BOARD_COLUMNS.iter().map(|(_, name)| name.to_string()));

        let rows = items
            .into_iter()
            .enumerate()
            .map(|(i, mut item)| {
                let mut row = vec![Scalar::from(i as i64 + 1)];
                row.extend(BOARD_COLUMNS.iter().map(|(key, _)| {
                    match item.remove(*key) {
                        // 停牌等情况接口返回 "-"
                        Some(Value::String(s)) if s == "-" => Scalar::Null,
                        Some(value) => Scalar::from(value),
                        None => Scalar::Null,
                    }
                }));
                row
            })
            .collect();

        Ok(Table::new(columns, rows)?)
    }

    async fn fetch_page(&self, kind: BoardKind, page: usize) -> Result<ClistData, ProviderError> {
        let fields = BOARD_COLUMNS
            .iter()
            .map(|(key, _)| *key)
            .collect::<Vec<_>>()
            .join(",");
        let page = page.to_string();
        let page_size = self.page_size.to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("pn", page.as_str()),
                ("pz", page_size.as_str()),
                ("po", "1"),
                ("np", "1"),
                ("ut", EASTMONEY_UT),
                ("fltt", "2"),
                ("invt", "2"),
                ("fid", "f3"),
                ("fs", kind.filter()),
                ("fields", fields.as_str()),
            ])
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_status(response).await);
        }

        let parsed: ClistResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(parsed.data.unwrap_or(ClistData {
            total: 0,
            diff: Vec::new(),
        }))
    }
}
