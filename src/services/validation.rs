//! 参数校验
//!
//! 所有校验都在调用数据源之前完成，失败一律返回 `ApiError::InvalidParameter`。

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::ApiError;

/// 东方财富板块代码前缀
pub const BOARD_CODE_PREFIX: &str = "BK";
/// 东方财富板块代码后缀
pub const BOARD_CODE_SUFFIX: &str = "DC";
/// 交易所代码可选值（空串表示全部）
pub const VALID_EXCHANGES: [&str; 6] = ["", "XSHE", "SZSE", "XSHG", "SHSE", "BJSE"];
/// 上市状态可选值
pub const VALID_LIST_STATUSES: [&str; 3] = ["L", "D", "P"];

fn ts_code_regex() -> &'static Regex {
    static TS_CODE_RE: OnceLock<Regex> = OnceLock::new();
    TS_CODE_RE.get_or_init(|| Regex::new(r"^\d{6}\.(SH|SZ|BJ)$").expect("股票代码正则"))
}

/// 交易日必须为 8 位数字（YYYYMMDD）
pub fn validate_trade_date(trade_date: &str) -> Result<(), ApiError> {
    if trade_date.len() != 8 || !trade_date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::invalid(format!(
            "交易日格式错误，需为8位数字（YYYYMMDD），当前：{}",
            trade_date
        )));
    }
    Ok(())
}

/// 板块代码格式：BKxxxx.DC
pub fn validate_board_code(ts_code: &str) -> Result<(), ApiError> {
    if ts_code.is_empty() {
        return Err(ApiError::invalid("板块代码不能为空"));
    }
    let well_formed = ts_code.starts_with(BOARD_CODE_PREFIX)
        && ts_code.contains('.')
        && ts_code.rsplit('.').next() == Some(BOARD_CODE_SUFFIX)
        // 板块代码会进入导出文件名，不允许路径分隔符
        && !ts_code.contains(['/', '\\'])
        && !ts_code.contains("..");
    if !well_formed {
        return Err(ApiError::invalid(format!(
            "板块代码格式错误！示例：BK1184.DC，当前：{}",
            ts_code
        )));
    }
    Ok(())
}

/// 拆分字段列表：去空白、去空项、去重（保留首次出现的顺序）
pub fn normalize_fields(fields: &str) -> Result<Vec<String>, ApiError> {
    if fields.is_empty() {
        return Err(ApiError::invalid("查询字段不能为空"));
    }
    let mut seen = HashSet::new();
    let list: Vec<String> = split_list(fields)
        .filter(|f| seen.insert(*f))
        .map(str::to_string)
        .collect();
    if list.is_empty() {
        return Err(ApiError::invalid(
            "查询字段格式错误，多个字段请用逗号分隔（示例：ts_code,name）",
        ));
    }
    Ok(list)
}

/// 股票代码列表的校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct CodePartition {
    /// 去空后的原始代码（含重复与无效项）
    pub raw: Vec<String>,
    /// 有效代码，已去重
    pub valid: Vec<String>,
    /// 无效代码，按输入顺序
    pub invalid: Vec<String>,
}

/// 将代码列表划分为有效/无效两组，没有任何有效代码时报错
pub fn partition_ts_codes(ts_codes: &str) -> Result<CodePartition, ApiError> {
    let raw: Vec<String> = split_list(ts_codes).map(str::to_string).collect();
    if raw.is_empty() {
        return Err(ApiError::invalid("代码列表不能为空"));
    }

    let re = ts_code_regex();
    let mut seen = HashSet::new();
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for code in &raw {
        if re.is_match(code) {
            if seen.insert(code.as_str()) {
                valid.push(code.clone());
            }
        } else {
            invalid.push(code.clone());
        }
    }

    if valid.is_empty() {
        return Err(ApiError::invalid(format!("无有效代码！无效代码：{:?}", invalid)));
    }
    Ok(CodePartition { raw, valid, invalid })
}

pub fn validate_exchange(exchange: &str) -> Result<(), ApiError> {
    if !VALID_EXCHANGES.contains(&exchange) {
        return Err(ApiError::invalid(format!(
            "交易所代码错误！可选值：{:?}，当前：{}",
            VALID_EXCHANGES, exchange
        )));
    }
    Ok(())
}

pub fn validate_list_status(list_status: &str) -> Result<(), ApiError> {
    if !VALID_LIST_STATUSES.contains(&list_status) {
        return Err(ApiError::invalid(format!(
            "上市状态错误！可选值：{:?}（L=上市，D=退市，P=暂停上市），当前：{}",
            VALID_LIST_STATUSES, list_status
        )));
    }
    Ok(())
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_date() {
        assert!(validate_trade_date("20251213").is_ok());
        for bad in ["", "2025121", "202512130", "2025-12-1", "2025121a", "２０２５１２１３"] {
            let err = validate_trade_date(bad).unwrap_err();
            assert!(matches!(err, ApiError::InvalidParameter(_)), "{} 应被拒绝", bad);
        }
    }

    #[test]
    fn test_board_code() {
        assert!(validate_board_code("BK1184.DC").is_ok());
        assert!(validate_board_code("BK.X.DC").is_ok());
        for bad in ["", "BADCODE", "BK1184", "BK1184.SH", "XX1184.DC", "BK1184.DC.SH"] {
            assert!(validate_board_code(bad).is_err(), "{} 应被拒绝", bad);
        }
        assert_eq!(
            validate_board_code("BADCODE").unwrap_err().to_string(),
            "板块代码格式错误！示例：BK1184.DC，当前：BADCODE"
        );
        for bad in ["BK/../../x.DC", "BK1184\\x.DC", "BK1184/x.DC", "BK..DC", "BK1184..DC"] {
            assert!(validate_board_code(bad).is_err(), "{} 应被拒绝", bad);
        }
    }

    #[test]
    fn test_normalize_fields() {
        let fields = normalize_fields(" ts_code, name,,ts_code ,turnover_rate ").unwrap();
        assert_eq!(fields, vec!["ts_code", "name", "turnover_rate"]);

        assert_eq!(normalize_fields("").unwrap_err().to_string(), "查询字段不能为空");
        assert!(normalize_fields(" , ,").is_err());
    }

    #[test]
    fn test_normalize_fields_idempotent() {
        let once = normalize_fields("a,b,a,c,b").unwrap();
        let twice = normalize_fields(&once.join(",")).unwrap();
        let once_set: HashSet<_> = once.iter().collect();
        let twice_set: HashSet<_> = twice.iter().collect();
        assert_eq!(once_set, twice_set);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_partition_ts_codes() {
        let p = partition_ts_codes("600000.SH,BADCODE,600000.SH, 000001.SZ ,830799.BJ,60000.SH").unwrap();
        assert_eq!(p.raw.len(), 6);
        assert_eq!(p.valid, vec!["600000.SH", "000001.SZ", "830799.BJ"]);
        assert_eq!(p.invalid, vec!["BADCODE", "60000.SH"]);
    }

    #[test]
    fn test_partition_without_valid_codes() {
        let err = partition_ts_codes("BADCODE,600000.sh").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"无有效代码！无效代码：["BADCODE", "600000.sh"]"#
        );
        assert_eq!(partition_ts_codes(" , ").unwrap_err().to_string(), "代码列表不能为空");
    }

    #[test]
    fn test_enumerations() {
        for ok in VALID_EXCHANGES {
            assert!(validate_exchange(ok).is_ok());
        }
        assert!(validate_exchange("SSE").unwrap_err().to_string().contains("XSHE"));
        assert!(validate_list_status("L").is_ok());
        assert!(validate_list_status("X").unwrap_err().to_string().contains("当前：X"));
    }
}
