//! 批量导出
//!
//! JSON 文件：UTF-8、4 空格缩进、中文不转义。
//! CSV 文件：UTF-8 带 BOM（Excel 打开不乱码）、首行表头、无行号列。

use anyhow::Context;
use futures::future::try_join_all;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::eastmoney::{BoardKind, EastMoneyClient};
use super::market_service::MarketService;
use crate::models::{DcIndexQuery, DcMemberQuery, Scalar, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 导出板块指数时浮点数保留的小数位
const INDEX_FLOAT_DIGITS: i32 = 4;

/// 写入格式化 JSON
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("创建文件 {} 失败", path.display()))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

/// 写入带 BOM 的 CSV
pub fn write_csv_with_bom(path: &Path, table: &Table) -> anyhow::Result<()> {
    let mut file = File::create(path).with_context(|| format!("创建文件 {} 失败", path.display()))?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Scalar::to_field))?;
    }
    writer.flush()?;
    Ok(())
}

/// 导出板块成分股：dc_member_<ts_code>_<trade_date>.json
pub async fn export_dc_member(
    service: &MarketService,
    query: &DcMemberQuery,
    out_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let fetched = service.dc_member(query).await?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("创建目录 {} 失败", out_dir.display()))?;
    let path = out_dir.join(format!(
        "dc_member_{}_{}.json",
        fetched.params.ts_code, fetched.params.trade_date
    ));
    write_json_pretty(&path, &fetched.data)?;

    info!("数据已保存为 JSON 文件：{}", path.display());
    info!("数据行数：{}", fetched.data.len());
    Ok(path)
}

/// 导出板块指数：只保留请求的字段，浮点数保留 4 位小数，写入 dc_index_<trade_date>.json
pub async fn export_dc_index(
    service: &MarketService,
    query: &DcIndexQuery,
    out_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let (table, params) = service.dc_index_table(query).await?;
    let fields: Vec<&str> = params.fields.split(',').collect();
    let table = table
        .select(&fields)
        .context("字段提取失败")?
        .round_floats(INDEX_FLOAT_DIGITS);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("创建目录 {} 失败", out_dir.display()))?;
    let path = out_dir.join(format!("dc_index_{}.json", params.trade_date));
    let rows = table.len();
    write_json_pretty(&path, &table.into_records())?;

    info!("板块指数 JSON 文件保存成功：{}", path.display());
    info!("提取的字段：{:?}", fields);
    info!("数据条数：{}", rows);
    Ok(path)
}

/// 导出一类板块列表：CSV、列表式 JSON、结构化 JSON 各一份
pub async fn export_board_list(
    client: &EastMoneyClient,
    kind: BoardKind,
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let table = client
        .board_list(kind)
        .await
        .with_context(|| format!("获取{}板块数据失败", kind.label()))?
        .clean();
    info!("{}板块字段：{:?}", kind.label(), table.columns());
    info!("{}板块有效数据行数：{}", kind.label(), table.len());

    let prefix = kind.file_prefix();
    let csv_path = out_dir.join(format!("{}.csv", prefix));
    let structured_path = out_dir.join(format!("{}_structured.json", prefix));
    let list_path = out_dir.join(format!("{}_list.json", prefix));

    write_csv_with_bom(&csv_path, &table)?;
    write_json_pretty(&structured_path, &table.structured())?;
    write_json_pretty(&list_path, &table.into_records())?;

    let paths = vec![csv_path, structured_path, list_path];
    for path in &paths {
        info!("{}板块文件已保存：{}", kind.label(), path.display());
    }
    Ok(paths)
}

/// 并发导出多类板块
pub async fn export_boards(
    client: &EastMoneyClient,
    kinds: &[BoardKind],
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("创建目录 {} 失败", out_dir.display()))?;
    let results =
        try_join_all(kinds.iter().map(|&kind| export_board_list(client, kind, out_dir))).await?;
    Ok(results.into_iter().flatten().collect())
}
