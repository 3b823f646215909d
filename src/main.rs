//! Tushare 板块数据代理服务
//!
//! 提供东方财富板块成分股、板块指数、股票基本信息、实时K线的 HTTP 接口，
//! 以及 ZMQ 板块详情转发和 JSON/CSV 批量导出。
//! 数据来源：Tushare Pro、东方财富

mod config;   // 配置加载
mod error;    // 请求错误类型
mod handlers; // HTTP 请求处理器
mod models;   // 数据模型定义
mod relay;    // ZMQ 转发
mod services; // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::{DcIndexQuery, DcMemberQuery};
use crate::relay::Relay;
use crate::services::eastmoney::{BoardKind, EastMoneyClient};
use crate::services::export;
use crate::services::market_service::MarketService;
use crate::services::provider::DataProvider;
use crate::services::tushare::TushareClient;

/// 请求日志格式：客户端地址、请求行（含查询参数）、状态码、耗时
const ACCESS_LOG_FORMAT: &str = "%a \"%r\" %s %b %Dms";

#[derive(Parser)]
#[command(name = "tushare-board-proxy")]
#[command(about = "Tushare 板块数据代理服务", long_about = None)]
struct Cli {
    /// 配置文件路径（默认查找 config.json、config/config.json）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动 HTTP 服务（默认）
    Serve,

    /// 启动 ZMQ 板块详情转发
    Relay {
        /// 绑定地址，如 tcp://0.0.0.0:5555
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// 导出数据文件
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },
}

#[derive(Subcommand)]
enum ExportTarget {
    /// 板块成分股 JSON
    DcMember {
        /// 板块代码，如 BK1184.DC
        #[arg(long)]
        ts_code: String,

        /// 交易日（YYYYMMDD），默认取配置
        #[arg(long)]
        trade_date: Option<String>,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// 板块指数 JSON（按字段裁剪，浮点数保留 4 位小数）
    DcIndex {
        /// 交易日（YYYYMMDD），默认取配置
        #[arg(long)]
        trade_date: Option<String>,

        /// 导出字段，逗号分隔，默认 ts_code,name,turnover_rate,up_num,down_num
        #[arg(long)]
        fields: Option<String>,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// 东方财富概念/行业板块列表（CSV + JSON）
    Boards {
        #[arg(short, long, value_enum, default_value = "all")]
        kind: BoardSelection,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BoardSelection {
    Concept,
    Industry,
    All,
}

impl BoardSelection {
    fn kinds(self) -> Vec<BoardKind> {
        match self {
            BoardSelection::Concept => vec![BoardKind::Concept],
            BoardSelection::Industry => vec![BoardKind::Industry],
            BoardSelection::All => vec![BoardKind::Concept, BoardKind::Industry],
        }
    }
}

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = AppConfig::load(cli.config.as_deref())?;
    config.apply_env_overrides();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    match &source {
        Some(path) => log::info!("从 {} 加载配置成功", path.display()),
        None => log::info!("使用默认配置"),
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await,
        Commands::Relay { endpoint } => {
            let endpoint = endpoint.unwrap_or_else(|| config.relay.endpoint.clone());
            let service = Arc::new(connect_market_service(&config).await?);
            Relay::new(service).run(&endpoint).await
        }
        Commands::Export { target } => run_export(&config, target).await,
    }
}

/// 创建 Tushare 会话，按配置探测一次接口
async fn connect_market_service(config: &AppConfig) -> anyhow::Result<MarketService> {
    let client = TushareClient::new(&config.tushare)?;
    if config.tushare.check_on_startup {
        client
            .check_connection()
            .await
            .map_err(|e| anyhow::anyhow!("Tushare初始化失败：{}", e))?;
        log::info!("✅ Tushare接口初始化成功");
    }
    let provider: Arc<dyn DataProvider> = Arc::new(client);
    Ok(MarketService::new(
        provider,
        config.tushare.default_trade_date.clone(),
    ))
}

/// 启动 HTTP 服务器
async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let service = web::Data::new(connect_market_service(config).await?);
    let bind_addr = config.bind_addr();

    log::info!("🚀 启动 HTTP 服务 | 地址：http://{}", bind_addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new(ACCESS_LOG_FORMAT)) // 请求日志
            .app_data(service.clone())
            .configure(handlers::config) // 配置路由
    })
    .keep_alive(Duration::from_secs(config.server.keep_alive_secs));

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_addr)
        .with_context(|| format!("端口绑定失败 {}，请更换端口或关闭占用进程", bind_addr))?
        .run()
        .await?;
    Ok(())
}

async fn run_export(config: &AppConfig, target: ExportTarget) -> anyhow::Result<()> {
    match target {
        ExportTarget::DcMember {
            ts_code,
            trade_date,
            out_dir,
        } => {
            let service = connect_market_service(config).await?;
            let query = DcMemberQuery {
                ts_code: Some(ts_code),
                trade_date,
            };
            export::export_dc_member(&service, &query, &out_dir).await?;
        }
        ExportTarget::DcIndex {
            trade_date,
            fields,
            out_dir,
        } => {
            let service = connect_market_service(config).await?;
            let query = DcIndexQuery { trade_date, fields };
            export::export_dc_index(&service, &query, &out_dir).await?;
        }
        ExportTarget::Boards { kind, out_dir } => {
            let client = EastMoneyClient::new(&config.eastmoney)?;
            let paths = export::export_boards(&client, &kind.kinds(), &out_dir).await?;
            log::info!("共导出 {} 个文件", paths.len());
        }
    }
    Ok(())
}
