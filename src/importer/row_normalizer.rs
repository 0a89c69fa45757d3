// ==========================================
// 库存管理系统 - 行规范化器实现
// ==========================================
// 阶段 1: 键规范化 / 空行排除 / 单元格值定型辅助
// 约束: 全空行返回 None (静默排除, 非错误)
// ==========================================

use crate::domain::import::{CellValue, NormalizedRow, RawRow};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// Excel 序列日期历元 (1899-12-30, 含闰年 bug 偏移)
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// 序列值的可信区间 (1 → 1899-12-31, 上界约为 9999 年)
const EXCEL_SERIAL_MAX: f64 = 2_958_465.0;

// ==========================================
// 定型结果 - 日期字段
// ==========================================
// "不可解析"与"缺失"必须区分: 非空但不可解析的日期
// 是行级错误, 不能静默当作缺失。
#[derive(Debug, Clone, PartialEq)]
pub enum DateField {
    Absent,
    Value(NaiveDate),
    Invalid(String),
}

// ==========================================
// 定型结果 - 数值字段
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum NumberField {
    Absent,
    Value(f64),
    Invalid(String),
}

// ==========================================
// RowNormalizer
// ==========================================
pub struct RowNormalizer;

impl RowNormalizer {
    /// 规范化单行
    ///
    /// # 返回
    /// - Some(NormalizedRow): 键已 trim + 小写化, 空键与重复键已去除
    /// - None: 全空行（所有值去空白字符串化后为空）
    pub fn normalize(&self, raw: &RawRow) -> Option<NormalizedRow> {
        let mut any_value = false;
        let mut fields: HashMap<String, CellValue> = HashMap::new();

        for (key, value) in &raw.cells {
            if !value.is_blank() {
                any_value = true;
            }

            let normalized_key = key.trim().to_lowercase();
            if normalized_key.is_empty() {
                continue;
            }
            // 重复列头: 首见列优先
            fields.entry(normalized_key).or_insert_with(|| value.clone());
        }

        if !any_value {
            return None;
        }

        Some(NormalizedRow {
            row_number: raw.display_row_number(),
            fields,
        })
    }

    /// 日期定型
    ///
    /// 支持: Excel 序列号（1899-12-30 历元）、ISO 字符串、
    /// D/M/YYYY 与 D-M-YYYY（日/月 1-2 位）、原生日期单元格。
    pub fn coerce_date(&self, cell: Option<&CellValue>) -> DateField {
        let cell = match cell {
            Some(c) if !c.is_blank() => c,
            _ => return DateField::Absent,
        };

        match cell {
            CellValue::DateTime(dt) => DateField::Value(dt.date()),
            CellValue::Number(serial) => match excel_serial_to_date(*serial) {
                Some(date) => DateField::Value(date),
                None => DateField::Invalid(cell.to_string()),
            },
            CellValue::Text(s) => {
                let text = s.trim();
                match parse_date_text(text) {
                    Some(date) => DateField::Value(date),
                    None => DateField::Invalid(text.to_string()),
                }
            }
            _ => DateField::Invalid(cell.to_string()),
        }
    }

    /// 数值定型
    ///
    /// 接受 `,` 作为小数分隔符（规范化为 `.`）; 拒绝非有限值。
    pub fn coerce_number(&self, cell: Option<&CellValue>) -> NumberField {
        let cell = match cell {
            Some(c) if !c.is_blank() => c,
            _ => return NumberField::Absent,
        };

        match cell {
            CellValue::Number(n) if n.is_finite() => NumberField::Value(*n),
            CellValue::Text(s) => {
                let normalized = s.trim().replace(',', ".");
                match normalized.parse::<f64>() {
                    Ok(n) if n.is_finite() => NumberField::Value(n),
                    _ => NumberField::Invalid(s.trim().to_string()),
                }
            }
            _ => NumberField::Invalid(cell.to_string()),
        }
    }
}

/// Excel 序列号 → 日期（历元 1899-12-30, 毫秒精度后截断取日期）
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > EXCEL_SERIAL_MAX {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let epoch: NaiveDateTime = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0) as i64;
    Some((epoch + Duration::milliseconds(millis)).date())
}

/// 文本日期解析: ISO 优先, 其次 D/M/YYYY 与 D-M-YYYY
fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d-%m-%Y") {
        return Some(date);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(cells: Vec<(&str, CellValue)>) -> RawRow {
        RawRow {
            source_row_index: 0,
            cells: cells
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_normalize_lowercases_and_trims_keys() {
        let raw = raw_row(vec![(" SKU ", CellValue::Text("ABC".to_string()))]);

        let row = RowNormalizer.normalize(&raw).unwrap();

        assert_eq!(row.text("sku"), Some("ABC".to_string()));
        assert_eq!(row.row_number, 2);
    }

    #[test]
    fn test_normalize_drops_blank_row() {
        let raw = raw_row(vec![
            ("sku", CellValue::Text("  ".to_string())),
            ("quantity", CellValue::Empty),
        ]);

        assert!(RowNormalizer.normalize(&raw).is_none());
    }

    #[test]
    fn test_normalize_zero_is_not_blank() {
        let raw = raw_row(vec![("quantity", CellValue::Number(0.0))]);

        assert!(RowNormalizer.normalize(&raw).is_some());
    }

    #[test]
    fn test_normalize_drops_empty_keys() {
        let raw = raw_row(vec![
            ("", CellValue::Text("fantasma".to_string())),
            ("sku", CellValue::Text("ABC".to_string())),
        ]);

        let row = RowNormalizer.normalize(&raw).unwrap();
        assert_eq!(row.fields.len(), 1);
    }

    #[test]
    fn test_coerce_date_excel_serial() {
        // 45520 = 2024-08-16 (历元 1899-12-30)
        let cell = CellValue::Number(45520.0);
        let date = RowNormalizer.coerce_date(Some(&cell));
        assert_eq!(
            date,
            DateField::Value(NaiveDate::from_ymd_opt(2024, 8, 16).unwrap())
        );

        // 与等值 ISO 字符串解码一致
        let iso = CellValue::Text("2024-08-16".to_string());
        assert_eq!(RowNormalizer.coerce_date(Some(&iso)), date);
    }

    #[test]
    fn test_coerce_date_day_month_year() {
        let cell = CellValue::Text("5/1/2025".to_string());
        assert_eq!(
            RowNormalizer.coerce_date(Some(&cell)),
            DateField::Value(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap())
        );

        let dashed = CellValue::Text("05-01-2025".to_string());
        assert_eq!(
            RowNormalizer.coerce_date(Some(&dashed)),
            DateField::Value(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap())
        );
    }

    #[test]
    fn test_coerce_date_unparseable_is_not_absent() {
        let cell = CellValue::Text("mañana".to_string());
        assert_eq!(
            RowNormalizer.coerce_date(Some(&cell)),
            DateField::Invalid("mañana".to_string())
        );
        assert_eq!(RowNormalizer.coerce_date(None), DateField::Absent);
    }

    #[test]
    fn test_coerce_number_comma_decimal() {
        let cell = CellValue::Text("12,50".to_string());
        assert_eq!(
            RowNormalizer.coerce_number(Some(&cell)),
            NumberField::Value(12.5)
        );
    }

    #[test]
    fn test_coerce_number_invalid() {
        let cell = CellValue::Text("doce".to_string());
        assert_eq!(
            RowNormalizer.coerce_number(Some(&cell)),
            NumberField::Invalid("doce".to_string())
        );
    }

    #[test]
    fn test_coerce_number_absent_for_blank() {
        assert_eq!(
            RowNormalizer.coerce_number(Some(&CellValue::Text("  ".to_string()))),
            NumberField::Absent
        );
    }
}
