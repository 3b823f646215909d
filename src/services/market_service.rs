//! 行情数据服务
//!
//! 每个查询都是同一条流水线：参数校验 → 调用一次数据源 → 清洗 → 组装结果。
//! HTTP 处理器、ZMQ 转发和批量导出共用这里的逻辑。

use log::{error, info, warn};
use std::sync::Arc;

use super::provider::{DataProvider, ProviderRequest};
use super::validation::{
    normalize_fields, partition_ts_codes, validate_board_code, validate_exchange,
    validate_list_status, validate_trade_date,
};
use crate::error::ApiError;
use crate::models::{
    CodeMeta, DcIndexParams, DcIndexQuery, DcMemberParams, DcMemberQuery, Record, RtKParams,
    RtKQuery, StockBasicParams, StockBasicQuery, Table,
};

/// 板块指数默认字段
pub const DEFAULT_INDEX_FIELDS: &str = "ts_code,name,turnover_rate,up_num,down_num";
/// 股票基本信息默认字段
pub const DEFAULT_STOCK_FIELDS: &str = "ts_code,symbol,name,area,industry,list_date";
/// 默认上市状态
pub const DEFAULT_LIST_STATUS: &str = "L";

/// 一次成功查询的结果
#[derive(Debug)]
pub struct Fetched<P> {
    pub data: Vec<Record>,
    pub params: P,
    pub meta: Option<CodeMeta>,
}

impl<P> Fetched<P> {
    fn new(data: Vec<Record>, params: P) -> Self {
        Self {
            data,
            params,
            meta: None,
        }
    }
}

/// 行情数据服务
pub struct MarketService {
    provider: Arc<dyn DataProvider>,
    default_trade_date: String,
}

impl MarketService {
    pub fn new(provider: Arc<dyn DataProvider>, default_trade_date: impl Into<String>) -> Self {
        Self {
            provider,
            default_trade_date: default_trade_date.into(),
        }
    }

    pub fn default_trade_date(&self) -> &str {
        &self.default_trade_date
    }

    /// 板块成分股
    pub async fn dc_member(&self, query: &DcMemberQuery) -> Result<Fetched<DcMemberParams>, ApiError> {
        let ts_code = query.ts_code.clone().unwrap_or_default();
        if ts_code.is_empty() {
            return Err(ApiError::invalid("板块代码不能为空"));
        }
        let trade_date = self.trade_date_or_default(&query.trade_date);
        validate_trade_date(&trade_date)?;
        validate_board_code(&ts_code)?;

        info!("开始查询板块数据 | ts_code={} | trade_date={}", ts_code, trade_date);
        let request = ProviderRequest::new("dc_member")
            .param("trade_date", trade_date.as_str())
            .param("ts_code", ts_code.as_str());
        let table = self.fetch(&request).await?;
        info!("Tushare返回数据行数：{}", table.len());

        let data = table.clean().into_records();
        info!("板块数据查询成功 | 返回数据条数：{}", data.len());
        Ok(Fetched::new(data, DcMemberParams { ts_code, trade_date }))
    }

    /// 板块指数
    pub async fn dc_index(&self, query: &DcIndexQuery) -> Result<Fetched<DcIndexParams>, ApiError> {
        let (table, params) = self.dc_index_table(query).await?;
        let data = table.into_records();
        info!("板块指数数据查询成功 | 返回数据条数：{}", data.len());
        Ok(Fetched::new(data, params))
    }

    /// 板块指数清洗后的表格，导出时在此基础上按字段裁剪
    pub async fn dc_index_table(
        &self,
        query: &DcIndexQuery,
    ) -> Result<(Table, DcIndexParams), ApiError> {
        let trade_date = self.trade_date_or_default(&query.trade_date);
        validate_trade_date(&trade_date)?;
        let original_fields = query
            .fields
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX_FIELDS.to_string());
        let fields = normalize_fields(&original_fields)?.join(",");

        info!("开始查询板块指数数据 | trade_date={} | fields={}", trade_date, fields);
        let request = ProviderRequest::new("dc_index")
            .param("trade_date", trade_date.as_str())
            .fields(fields.as_str());
        let table = self.fetch(&request).await?;
        info!("Tushare返回指数数据行数：{}", table.len());

        let params = DcIndexParams {
            trade_date,
            fields,
            original_fields,
        };
        Ok((table.clean(), params))
    }

    /// 股票基本信息，交易所与上市状态会透传给数据源
    pub async fn stock_basic(
        &self,
        query: &StockBasicQuery,
    ) -> Result<Fetched<StockBasicParams>, ApiError> {
        let exchange = query.exchange.clone().unwrap_or_default();
        let list_status = query
            .list_status
            .clone()
            .unwrap_or_else(|| DEFAULT_LIST_STATUS.to_string());
        validate_exchange(&exchange)?;
        validate_list_status(&list_status)?;
        let original_fields = query
            .fields
            .clone()
            .unwrap_or_else(|| DEFAULT_STOCK_FIELDS.to_string());
        let fields = normalize_fields(&original_fields)?.join(",");

        info!(
            "开始查询基本信息 | exchange={} | list_status={} | fields={}",
            exchange, list_status, fields
        );
        let request = ProviderRequest::new("stock_basic")
            .param("exchange", exchange.as_str())
            .param("list_status", list_status.as_str())
            .fields(fields.as_str());
        let table = self.fetch(&request).await?;
        info!("Tushare返回基本数据行数：{}", table.len());

        let data = table.clean().into_records();
        info!("基本信息查询成功 | 返回数据条数：{}", data.len());
        Ok(Fetched::new(
            data,
            StockBasicParams {
                exchange,
                list_status,
                fields,
                original_fields,
            },
        ))
    }

    /// 实时K线，按 ts_code 去重
    pub async fn rt_k(&self, query: &RtKQuery) -> Result<Fetched<RtKParams>, ApiError> {
        let ts_codes = query.ts_codes.clone().unwrap_or_default();
        let codes = partition_ts_codes(&ts_codes)?;
        info!(
            "解析代码 | 原始数量：{} | 有效数量：{} | 无效数量：{}",
            codes.raw.len(),
            codes.valid.len(),
            codes.invalid.len()
        );

        info!("调用Tushare rt_k接口 | 有效代码数：{}", codes.valid.len());
        let request = ProviderRequest::new("rt_k").param("ts_code", codes.valid.join(","));
        let table = self.fetch(&request).await?;

        let data = if table.is_empty() {
            warn!("Tushare接口返回空数据");
            Vec::new()
        } else {
            let data = table.drop_nulls().drop_duplicates_by(&["ts_code"])?.into_records();
            info!("接口调用成功 | 返回数据行数：{}", data.len());
            data
        };

        let meta = CodeMeta {
            total_input_codes: codes.raw.len(),
            valid_code_count: codes.valid.len(),
            invalid_codes: codes.invalid,
            return_data_count: data.len(),
        };
        Ok(Fetched {
            data,
            params: RtKParams { ts_codes },
            meta: Some(meta),
        })
    }

    fn trade_date_or_default(&self, trade_date: &Option<String>) -> String {
        trade_date
            .clone()
            .unwrap_or_else(|| self.default_trade_date.clone())
    }

    async fn fetch(&self, request: &ProviderRequest) -> Result<Table, ApiError> {
        self.provider.query(request).await.map_err(|e| {
            error!("Tushare {}接口调用失败：{}", request.api_name, e);
            ApiError::from(e)
        })
    }
}
