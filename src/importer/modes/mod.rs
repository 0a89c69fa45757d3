// ==========================================
// 库存管理系统 - 导入模式集合
// ==========================================
// 职责: 五种导入模式的策略对象
// 管道外壳与模式无关; 每个模式声明列集/校验规则/聚合策略
// ==========================================

pub mod inventory;
pub mod location;
pub mod product;
pub mod purchase_order;

pub use inventory::{InventoryImportMode, InventoryVariant};
pub use location::LocationImportMode;
pub use product::ProductImportMode;
pub use purchase_order::PurchaseOrderLineImportMode;

use crate::domain::import::{NormalizedRow, RowError};
use crate::importer::row_normalizer::{NumberField, RowNormalizer};

/// 必填文本字段; 缺失时返回给定的西语错误文案
pub(crate) fn required_text(
    row: &NormalizedRow,
    key: &str,
    missing_message: &str,
) -> Result<String, RowError> {
    row.text(key)
        .ok_or_else(|| RowError::new(row.row_number, missing_message))
}

/// 可选非负数值字段
///
/// 不可解析与负值均为行级错误; 缺失返回 Ok(None)。
pub(crate) fn optional_non_negative(
    row: &NormalizedRow,
    key: &str,
) -> Result<Option<f64>, RowError> {
    match RowNormalizer.coerce_number(row.cell(key)) {
        NumberField::Absent => Ok(None),
        NumberField::Invalid(raw) => Err(RowError::new(
            row.row_number,
            format!("Valor numérico inválido en {}: {}", key, raw),
        )),
        NumberField::Value(v) if v < 0.0 => Err(RowError::new(
            row.row_number,
            format!("El valor de {} no puede ser negativo", key),
        )),
        NumberField::Value(v) => Ok(Some(v)),
    }
}

/// 必填正数值字段 (quantity 类)
pub(crate) fn required_positive(
    row: &NormalizedRow,
    key: &str,
    missing_message: &str,
) -> Result<f64, RowError> {
    match RowNormalizer.coerce_number(row.cell(key)) {
        NumberField::Absent => Err(RowError::new(row.row_number, missing_message)),
        NumberField::Invalid(raw) => Err(RowError::new(
            row.row_number,
            format!("Valor numérico inválido en {}: {}", key, raw),
        )),
        NumberField::Value(v) if v <= 0.0 => Err(RowError::new(
            row.row_number,
            "La cantidad debe ser mayor que 0",
        )),
        NumberField::Value(v) => Ok(v),
    }
}
