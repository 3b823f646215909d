//! 表格数据模型
//!
//! 数据源返回的都是二维表：列名由数据源决定，单元格只可能是字符串、数值或空值。
//! 这里不做字段枚举，按列名 + 标量单元格原样保存，输出 JSON 时保持数据源的列顺序。

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};
use std::collections::HashSet;

/// 表格操作错误
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("第 {row} 行列数不一致：期望 {expected}，实际 {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("不存在字段 {0}")]
    MissingColumn(String),
}

/// f64 能精确表示的整数上界（2^53）
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// 单元格标量值
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    /// 保留数据源给出的原始数值（整数/浮点及其精度）
    Number(Number),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// CSV 单元格文本，空值写为空串
    pub fn to_field(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    /// 去重用的键，带类型前缀和长度，避免 "1" 与 1 或拼接歧义
    fn push_key(&self, key: &mut String) {
        match self {
            Scalar::Null => key.push_str("n;"),
            // 按数值判重：1 与 1.0 视为同一个值
            Scalar::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => key.push_str(&format!("i{};", i)),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => {
                    key.push_str(&format!("i{};", f as i64))
                }
                (None, Some(f)) => key.push_str(&format!("f{};", f.to_bits())),
                (None, None) => {
                    let text = n.to_string();
                    key.push_str(&format!("d{}:{};", text.len(), text));
                }
            },
            Scalar::Text(s) => key.push_str(&format!("s{}:{};", s.len(), s)),
        }
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Number(n) => Scalar::Number(n),
            Value::String(s) => Scalar::Text(s),
            Value::Bool(b) => Scalar::Text(b.to_string()),
            other => Scalar::Text(other.to_string()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(Number::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Scalar::Null, Scalar::Number)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Scalar::from)
    }
}

/// 单行记录，序列化为保持列顺序的 JSON 对象
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Vec<(String, Scalar)>);

impl Record {
    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// 数据源返回的二维表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl Table {
    /// 创建表格，校验每一行的列数与表头一致
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Result<Self, TableError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(TableError::RowWidth {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 删除含空值的行
    pub fn drop_nulls(mut self) -> Self {
        self.rows.retain(|cells| !cells.iter().any(Scalar::is_null));
        self
    }

    /// 删除完全重复的行，保留首次出现
    pub fn drop_duplicates(mut self) -> Self {
        let mut seen = HashSet::new();
        self.rows.retain(|cells| {
            let mut key = String::new();
            cells.iter().for_each(|c| c.push_key(&mut key));
            seen.insert(key)
        });
        self
    }

    /// 按指定列判重，保留首次出现
    pub fn drop_duplicates_by(mut self, subset: &[&str]) -> Result<Self, TableError> {
        let indices = subset
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| TableError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        self.rows.retain(|cells| {
            let mut key = String::new();
            indices.iter().for_each(|&i| cells[i].push_key(&mut key));
            seen.insert(key)
        });
        Ok(self)
    }

    /// 只保留指定列，按给定顺序排列
    pub fn select(self, names: &[&str]) -> Result<Self, TableError> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| TableError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let columns = names.iter().map(|name| name.to_string()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|cells| indices.iter().map(|&i| cells[i].clone()).collect())
            .collect();
        Ok(Self { columns, rows })
    }

    /// 浮点数按小数位四舍五入，整数与文本不变
    pub fn round_floats(mut self, digits: i32) -> Self {
        let scale = 10f64.powi(digits);
        for cell in self.rows.iter_mut().flatten() {
            let float = match cell {
                Scalar::Number(n) if n.is_f64() => n.as_f64(),
                _ => None,
            };
            if let Some(f) = float {
                *cell = Scalar::from((f * scale).round() / scale);
            }
        }
        self
    }

    /// 标准清洗：去空值行、去重复行（行号随之重排）
    pub fn clean(self) -> Self {
        self.drop_nulls().drop_duplicates()
    }

    /// 按行转为记录列表
    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|cells| Record(columns.iter().cloned().zip(cells).collect()))
            .collect()
    }

    /// 按列组织的视图：{列名: [值, ...]}
    pub fn structured(&self) -> Structured<'_> {
        Structured(self)
    }
}

/// 列式序列化视图
pub struct Structured<'a>(&'a Table);

struct Column<'a> {
    table: &'a Table,
    index: usize,
}

impl Serialize for Column<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.table.rows.len()))?;
        for cells in &self.table.rows {
            seq.serialize_element(&cells[self.index])?;
        }
        seq.end()
    }
}

impl Serialize for Structured<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.0;
        let mut map = serializer.serialize_map(Some(table.columns.len()))?;
        for (index, name) in table.columns.iter().enumerate() {
            map.serialize_entry(name, &Column { table, index })?;
        }
        map.end()
    }
}
