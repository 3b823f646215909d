//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，Tushare token 与接口地址可由环境变量覆盖

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
    /// Keep-Alive 超时时间（秒）
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

/// Tushare 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TushareConfig {
    /// 接口 token（为空时无法启动需要数据源的命令）
    #[serde(default)]
    pub token: String,
    /// 接口地址
    #[serde(default = "default_tushare_url")]
    pub http_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 未指定交易日时使用的默认交易日
    #[serde(default = "default_trade_date")]
    pub default_trade_date: String,
    /// 启动时是否探测接口可用
    #[serde(default = "default_true")]
    pub check_on_startup: bool,
}

/// ZMQ 转发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// REP 套接字绑定地址
    #[serde(default = "default_relay_endpoint")]
    pub endpoint: String,
}

/// 东方财富板块数据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EastMoneyConfig {
    #[serde(default = "default_eastmoney_url")]
    pub base_url: String,
    /// 每页条数
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tushare: TushareConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub eastmoney: EastMoneyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_keep_alive() -> u64 { 60 }
fn default_tushare_url() -> String { "http://api.tushare.pro".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_trade_date() -> String { "20251213".to_string() }
fn default_true() -> bool { true }
fn default_relay_endpoint() -> String { "tcp://0.0.0.0:5555".to_string() }
fn default_eastmoney_url() -> String { "https://79.push2.eastmoney.com/api/qt/clist/get".to_string() }
fn default_page_size() -> usize { 100 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            keep_alive_secs: default_keep_alive(),
        }
    }
}

impl Default for TushareConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_url: default_tushare_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            default_trade_date: default_trade_date(),
            check_on_startup: true,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_relay_endpoint(),
        }
    }
}

impl Default for EastMoneyConfig {
    fn default() -> Self {
        Self {
            base_url: default_eastmoney_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置：指定路径优先，其次默认路径，都不存在时使用默认值。
    ///
    /// 此时日志尚未初始化，返回实际使用的文件路径由调用方记录。
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)
                .map_err(|e| anyhow::anyhow!("加载配置文件 {} 失败: {}", path.display(), e))?;
            return Ok((config, Some(path.to_path_buf())));
        }

        let config_paths = ["config.json", "config/config.json"];
        for path in config_paths {
            let path = Path::new(path);
            if path.exists() {
                let config = Self::from_file(path)
                    .map_err(|e| anyhow::anyhow!("加载配置文件 {} 失败: {}", path.display(), e))?;
                return Ok((config, Some(path.to_path_buf())));
            }
        }

        Ok((Self::default(), None))
    }

    /// 用环境变量覆盖数据源配置（TUSHARE_TOKEN / TUSHARE_HTTP_URL）
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TUSHARE_TOKEN").filter(|v| !v.is_empty()) {
            self.tushare.token = token;
        }
        if let Some(url) = lookup("TUSHARE_HTTP_URL").filter(|v| !v.is_empty()) {
            self.tushare.http_url = url;
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
