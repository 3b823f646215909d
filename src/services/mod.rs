//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod eastmoney;      // 东方财富板块列表
pub mod export;         // 批量导出 JSON/CSV
pub mod market_service; // 校验 → 取数 → 清洗
pub mod provider;       // 数据源抽象
pub mod tushare;        // Tushare Pro 实现
pub mod validation;     // 参数校验
