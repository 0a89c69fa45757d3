// ==========================================
// 库存管理系统 - 商品目录导入模式
// ==========================================
// 列集: name 必填; sku/分类/库位/库存上下限/价格/税率/状态 可选
// 策略: 未知列阻断 (源系统商品导入即如此); 不聚合
// ==========================================

use crate::domain::catalog::ReferenceSnapshot;
use crate::domain::import::{NormalizedRow, RowError, ValidatedEntry};
use crate::domain::types::{EntityKind, UnknownColumnPolicy};
use crate::importer::import_pipeline_trait::{ImportMode, RunContext};
use crate::importer::modes::{optional_non_negative, required_text};
use crate::importer::row_normalizer::{NumberField, RowNormalizer};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug)]
pub struct ProductImportMode;

impl ProductImportMode {
    /// 状态标志归一化 (认可的"是"类值 → active, 其余 → inactive)
    fn normalize_status(raw: &str) -> &'static str {
        match raw.trim().to_lowercase().as_str() {
            "active" | "activo" | "1" | "si" | "sí" | "true" | "y" => "active",
            _ => "inactive",
        }
    }
}

impl ImportMode for ProductImportMode {
    fn name(&self) -> &'static str {
        "product_catalog"
    }

    fn table(&self) -> &'static str {
        "products"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn optional_columns(&self) -> &'static [&'static str] {
        &[
            "sku",
            "category",
            "category_id",
            "location",
            "location_id",
            "min_stock",
            "max_stock",
            "purchase_price",
            "sale_price",
            "tax_rate",
            "status",
        ]
    }

    fn unknown_column_policy(&self) -> UnknownColumnPolicy {
        UnknownColumnPolicy::Reject
    }

    fn existing_keys(&self, snapshot: &ReferenceSnapshot) -> HashSet<String> {
        snapshot.existing_skus()
    }

    fn validate_row(
        &self,
        row: &NormalizedRow,
        ctx: &mut RunContext<'_>,
    ) -> Result<ValidatedEntry, RowError> {
        let row_number = row.row_number;

        // 规则 1: 名称必填
        let name = required_text(row, "name", "Nombre requerido")?;

        // 规则 2/3: SKU 查重（同文件 / 系统既有）; 无 SKU 的行跳过查重
        let sku = row.text("sku");
        if let Some(sku) = &sku {
            if ctx.seen_keys.contains(sku) {
                return Err(RowError::new(
                    row_number,
                    format!("SKU duplicado en el archivo: {}", sku),
                ));
            }
            if ctx.existing_keys.contains(sku) {
                return Err(RowError::new(
                    row_number,
                    format!("El SKU ya existe en el sistema: {}", sku),
                ));
            }
        }

        // 规则 4: 外键解析 (id 列优先于名称列)
        let category_id = ctx
            .index
            .resolve_pair(row, EntityKind::Category, "category_id", "category")
            .map_err(|msg| RowError::new(row_number, msg))?;
        let location_id = ctx
            .index
            .resolve_pair(row, EntityKind::Location, "location_id", "location")
            .map_err(|msg| RowError::new(row_number, msg))?;

        // 规则 5: 数值字段
        let min_stock = optional_non_negative(row, "min_stock")?;
        let max_stock = optional_non_negative(row, "max_stock")?;
        let purchase_price = optional_non_negative(row, "purchase_price")?;
        let sale_price = optional_non_negative(row, "sale_price")?;

        let tax_rate = match RowNormalizer.coerce_number(row.cell("tax_rate")) {
            NumberField::Absent => None,
            NumberField::Invalid(raw) => {
                return Err(RowError::new(
                    row_number,
                    format!("Valor numérico inválido en tax_rate: {}", raw),
                ));
            }
            NumberField::Value(v) if !(0.0..=100.0).contains(&v) => {
                return Err(RowError::new(
                    row_number,
                    "tax_rate debe estar entre 0 y 100",
                ));
            }
            NumberField::Value(v) => Some(v),
        };

        // 规则 6: 交叉校验 (两个字段各自通过后才评估)
        if let (Some(min), Some(max)) = (min_stock, max_stock) {
            if max < min {
                return Err(RowError::new(
                    row_number,
                    "max_stock no puede ser menor que min_stock",
                ));
            }
        }

        let status = row
            .text("status")
            .map(|s| Self::normalize_status(&s))
            .unwrap_or("active");

        // 行被接受后才记入同文件查重集合
        if let Some(sku) = &sku {
            ctx.seen_keys.insert(sku.clone());
        }

        let key = sku.clone().unwrap_or_else(|| name.to_lowercase());
        Ok(ValidatedEntry {
            row_number,
            key,
            quantity: None,
            payload: json!({
                "id": Uuid::new_v4().to_string(),
                "name": name,
                "sku": sku,
                "category_id": category_id,
                "location_id": location_id,
                "min_stock": min_stock,
                "max_stock": max_stock,
                "purchase_price": purchase_price,
                "sale_price": sale_price,
                "tax_rate": tax_rate,
                "status": status,
            }),
        })
    }

    fn duplicate_write_message(&self, key: &str) -> String {
        format!("El SKU ya existe en el sistema: {}", key)
    }
}
