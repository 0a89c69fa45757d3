// ==========================================
// 库存管理系统 - 导入领域模型
// ==========================================
// 职责: 导入管道各阶段的数据载体
// 流程: RawRow → NormalizedRow → ValidatedEntry → ImportReport
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

// ==========================================
// CellValue - 单元格原始值
// ==========================================
// Excel 解析阶段不做类型强转: 数字/日期/布尔按原样保留,
// 类型化统一在行校验阶段完成。CSV 一律为 Text。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// 值在"去空白字符串化"之后是否为空
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 字符串视图（trim 后; 空值返回 None）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => {
                // 整数值不带小数点展示 (Excel 中 SKU 常被识别为数字)
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{}", n))
                }
            }
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(s) => write!(f, "{}", s),
            None => Ok(()),
        }
    }
}

// ==========================================
// RawRow - 物理数据行
// ==========================================
// 列头 → 原始值的有序映射; source_row_index 为数据区 0 起始位置。
// 面向用户的行号 = source_row_index + 2 (1 起始 + 表头行)。
#[derive(Debug, Clone)]
pub struct RawRow {
    pub source_row_index: usize,
    pub cells: Vec<(String, CellValue)>,
}

impl RawRow {
    /// 电子表格中用户可见的行号
    pub fn display_row_number(&self) -> usize {
        self.source_row_index + 2
    }
}

// ==========================================
// ParsedFile - 解析阶段产物
// ==========================================
// 行级解析失败（如损坏的 CSV 记录）不中断整个文件:
// 记为带近似行号的行级错误, 其余行继续处理。
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub rows: Vec<RawRow>,
    pub row_errors: Vec<RowError>,
}

// ==========================================
// NormalizedRow - 规范化行
// ==========================================
// 不变量: 键已 trim + 小写化且去重非空; 全空行在规范化阶段被丢弃
// (静默排除, 不计入错误也不计入成功)。
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub row_number: usize, // 用户可见行号（含表头偏移）
    pub fields: HashMap<String, CellValue>,
}

impl NormalizedRow {
    /// 取单元格原始值
    pub fn cell(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    /// 取非空文本值（trim 后）
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(|v| v.as_text())
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================
// 每个被处理的行最多产生一个校验错误（首错即止）;
// 写入阶段的唯一键冲突错误在写入后按行号回关联追加。
// row_number == 0 表示文件级错误（无行定位）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            row_number,
            message: message.into(),
        }
    }

    /// 文件级错误（不绑定具体行）
    pub fn file_level(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    /// 渲染为客户端展示的消息文本
    pub fn render(&self) -> String {
        if self.row_number == 0 {
            self.message.clone()
        } else {
            format!("Fila {}: {}", self.row_number, self.message)
        }
    }
}

// ==========================================
// ValidatedEntry - 校验通过的写入单元
// ==========================================
// 外键均已解析为 id, 数值均已定型; payload 为写入 sink 的列映射。
// key 供聚合与写入阶段唯一键冲突的行号回溯使用。
#[derive(Debug, Clone)]
pub struct ValidatedEntry {
    pub row_number: usize,
    pub key: String,
    pub quantity: Option<f64>,
    pub payload: serde_json::Value,
}

// ==========================================
// ImportReport - 导入终态报告
// ==========================================
// 不变量: success_count + errors.len() 不必等于输入总行数
// （空白行被静默排除, 这是刻意行为）。
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub run_id: String,
    pub mode: String,
    pub total_rows: usize, // 非空白数据行数
    pub success_count: usize,
    pub errors: Vec<RowError>,
    pub elapsed: Duration,
}

impl ImportReport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 客户端展示用错误文案列表
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.render()).collect()
    }
}

// ==========================================
// ImportRunRecord - 导入批次审计记录
// ==========================================
// 对齐 import_runs 表; 审计写入失败不阻断导入结果返回。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRunRecord {
    pub run_id: String,
    pub mode: String,
    pub file_name: Option<String>,
    pub total_rows: i64,
    pub success_rows: i64,
    pub error_rows: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub elapsed_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Text("x".to_string()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(!CellValue::Bool(false).is_blank());
    }

    #[test]
    fn test_cell_integer_text_without_decimals() {
        assert_eq!(CellValue::Number(45.0).as_text(), Some("45".to_string()));
        assert_eq!(CellValue::Number(4.5).as_text(), Some("4.5".to_string()));
    }

    #[test]
    fn test_display_row_number_accounts_for_header() {
        let row = RawRow {
            source_row_index: 0,
            cells: vec![],
        };
        // 数据区第一行是电子表格的第 2 行
        assert_eq!(row.display_row_number(), 2);
    }

    #[test]
    fn test_row_error_render() {
        assert_eq!(
            RowError::new(3, "SKU no encontrado: XXXX").render(),
            "Fila 3: SKU no encontrado: XXXX"
        );
        assert_eq!(
            RowError::file_level("Formato de archivo no soportado: pdf").render(),
            "Formato de archivo no soportado: pdf"
        );
    }
}
