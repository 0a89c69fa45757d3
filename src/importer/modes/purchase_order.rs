// ==========================================
// 库存管理系统 - 采购单行导入模式
// ==========================================
// 列集: sku, quantity 必填; unit_price / expected_date 可选
// 策略: 按解析后的商品 id 聚合 (数量求和, 单价后行覆盖);
//       单价缺省回退目录采购价
// ==========================================

use crate::domain::catalog::ReferenceSnapshot;
use crate::domain::import::{NormalizedRow, RowError, ValidatedEntry};
use crate::domain::types::AggregationPolicy;
use crate::importer::import_pipeline_trait::{ImportMode, RunContext};
use crate::importer::modes::{optional_non_negative, required_positive, required_text};
use crate::importer::row_normalizer::{DateField, RowNormalizer};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug)]
pub struct PurchaseOrderLineImportMode {
    purchase_order_id: String,
}

impl PurchaseOrderLineImportMode {
    pub fn new(purchase_order_id: impl Into<String>) -> Self {
        Self {
            purchase_order_id: purchase_order_id.into(),
        }
    }
}

impl ImportMode for PurchaseOrderLineImportMode {
    fn name(&self) -> &'static str {
        "purchase_order_lines"
    }

    fn table(&self) -> &'static str {
        "purchase_order_items"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &["sku", "quantity"]
    }

    fn optional_columns(&self) -> &'static [&'static str] {
        &["unit_price", "expected_date"]
    }

    fn aggregation_policy(&self) -> AggregationPolicy {
        AggregationPolicy::SumByKey
    }

    fn existing_keys(&self, _snapshot: &ReferenceSnapshot) -> HashSet<String> {
        // 采购单行允许同一商品多行出现 (由聚合阶段合并), 不查重
        HashSet::new()
    }

    fn validate_row(
        &self,
        row: &NormalizedRow,
        ctx: &mut RunContext<'_>,
    ) -> Result<ValidatedEntry, RowError> {
        let row_number = row.row_number;

        // 规则 1: SKU 必填
        let sku = required_text(row, "sku", "SKU requerido")?;

        // 规则 4: 商品解析
        let product = ctx
            .index
            .product_by_sku(&sku)
            .ok_or_else(|| RowError::new(row_number, format!("SKU no encontrado: {}", sku)))?;

        // 规则 5: 数量 > 0; 单价 ≥ 0, 缺省回退目录采购价
        let quantity = required_positive(row, "quantity", "Cantidad requerida")?;
        let unit_price = optional_non_negative(row, "unit_price")?
            .or(product.purchase_price)
            .unwrap_or(0.0);

        // 规则 7: 预计到货日期
        let expected_date = match RowNormalizer.coerce_date(row.cell("expected_date")) {
            DateField::Absent => None,
            DateField::Invalid(raw) => {
                return Err(RowError::new(
                    row_number,
                    format!("Fecha inválida: {}", raw),
                ));
            }
            DateField::Value(date) => Some(date.format("%Y-%m-%d").to_string()),
        };

        Ok(ValidatedEntry {
            row_number,
            key: product.id.clone(),
            quantity: Some(quantity),
            payload: json!({
                "id": Uuid::new_v4().to_string(),
                "purchase_order_id": self.purchase_order_id,
                "product_id": product.id,
                "quantity": quantity,
                "unit_price": unit_price,
                "expected_date": expected_date,
            }),
        })
    }

    fn apply_write_defaults(&self, payload: &mut serde_json::Value, today: chrono::NaiveDate) {
        if payload["expected_date"].is_null() {
            payload["expected_date"] = json!(today.format("%Y-%m-%d").to_string());
        }
    }

    fn duplicate_write_message(&self, key: &str) -> String {
        format!("La orden ya contiene el producto: {}", key)
    }
}
