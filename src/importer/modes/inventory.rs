// ==========================================
// 库存管理系统 - 期初库存导入模式
// ==========================================
// 变体: Standard (按数量记期初移动) / Serialized (逐序列号登记)
// 列集: sku 必填; 仓库列 warehouse|warehouse_id 至少其一
// 日期缺省在写入阶段回填本地当天, 不在校验阶段定值
// ==========================================

use crate::domain::catalog::ReferenceSnapshot;
use crate::domain::import::{NormalizedRow, RowError, ValidatedEntry};
use crate::domain::types::EntityKind;
use crate::importer::import_pipeline_trait::{ImportMode, RunContext};
use crate::importer::modes::{required_positive, required_text};
use crate::importer::row_normalizer::{DateField, RowNormalizer};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

// ==========================================
// 模式变体
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryVariant {
    Standard,   // 数量式期初库存
    Serialized, // 序列号式期初库存
}

#[derive(Debug)]
pub struct InventoryImportMode {
    variant: InventoryVariant,
}

impl InventoryImportMode {
    pub fn standard() -> Self {
        Self {
            variant: InventoryVariant::Standard,
        }
    }

    pub fn serialized() -> Self {
        Self {
            variant: InventoryVariant::Serialized,
        }
    }
}

impl ImportMode for InventoryImportMode {
    fn name(&self) -> &'static str {
        match self.variant {
            InventoryVariant::Standard => "initial_stock",
            InventoryVariant::Serialized => "initial_stock_serialized",
        }
    }

    fn table(&self) -> &'static str {
        match self.variant {
            InventoryVariant::Standard => "inventory_movements",
            InventoryVariant::Serialized => "product_serials",
        }
    }

    fn required_columns(&self) -> &'static [&'static str] {
        match self.variant {
            InventoryVariant::Standard => &["sku", "quantity"],
            InventoryVariant::Serialized => &["sku", "serial_code"],
        }
    }

    fn any_of_groups(&self) -> &'static [&'static [&'static str]] {
        &[&["warehouse", "warehouse_id"]]
    }

    fn optional_columns(&self) -> &'static [&'static str] {
        &["reference", "movement_date"]
    }

    fn existing_keys(&self, snapshot: &ReferenceSnapshot) -> HashSet<String> {
        match self.variant {
            // 数量式: 移动记录无系统级唯一键, 只做同文件查重
            InventoryVariant::Standard => HashSet::new(),
            InventoryVariant::Serialized => snapshot.existing_serials.clone(),
        }
    }

    fn validate_row(
        &self,
        row: &NormalizedRow,
        ctx: &mut RunContext<'_>,
    ) -> Result<ValidatedEntry, RowError> {
        let row_number = row.row_number;

        // 规则 1: 标识字段必填
        let sku = required_text(row, "sku", "SKU requerido")?;
        let key = match self.variant {
            InventoryVariant::Standard => sku.clone(),
            InventoryVariant::Serialized => {
                required_text(row, "serial_code", "Código de serie requerido")?
            }
        };

        // 规则 2: 同文件重复键
        if ctx.seen_keys.contains(&key) {
            let message = match self.variant {
                InventoryVariant::Standard => format!("SKU duplicado en el archivo: {}", key),
                InventoryVariant::Serialized => {
                    format!("Código de serie duplicado en el archivo: {}", key)
                }
            };
            return Err(RowError::new(row_number, message));
        }

        // 规则 3: 系统既有键 (仅序列号变体)
        if ctx.existing_keys.contains(&key) {
            return Err(RowError::new(
                row_number,
                format!("El código de serie ya existe en el sistema: {}", key),
            ));
        }

        // 规则 4: 外键解析
        let product = ctx
            .index
            .product_by_sku(&sku)
            .ok_or_else(|| RowError::new(row_number, format!("SKU no encontrado: {}", sku)))?;

        let warehouse_id = ctx
            .index
            .resolve_pair(row, EntityKind::Warehouse, "warehouse_id", "warehouse")
            .map_err(|msg| RowError::new(row_number, msg))?
            .ok_or_else(|| RowError::new(row_number, "Almacén requerido"))?;

        // 规则 5: 数量 (数量式必填且 > 0; 序列号式每行固定 1)
        let quantity = match self.variant {
            InventoryVariant::Standard => {
                required_positive(row, "quantity", "Cantidad requerida")?
            }
            InventoryVariant::Serialized => 1.0,
        };

        // 规则 7: 日期 (非空不可解析为致命; 缺省由写入阶段回填)
        let movement_date = match RowNormalizer.coerce_date(row.cell("movement_date")) {
            DateField::Absent => None,
            DateField::Invalid(raw) => {
                return Err(RowError::new(
                    row_number,
                    format!("Fecha inválida: {}", raw),
                ));
            }
            DateField::Value(date) => Some(date.format("%Y-%m-%d").to_string()),
        };

        let reference = row
            .text("reference")
            .unwrap_or_else(|| ctx.config.default_reference_label.clone());

        ctx.seen_keys.insert(key.clone());

        let payload = match self.variant {
            InventoryVariant::Standard => json!({
                "id": Uuid::new_v4().to_string(),
                "product_id": product.id,
                "warehouse_id": warehouse_id,
                "movement_type": "initial",
                "quantity": quantity,
                "reference": reference,
                "movement_date": movement_date,
            }),
            InventoryVariant::Serialized => json!({
                "id": Uuid::new_v4().to_string(),
                "product_id": product.id,
                "warehouse_id": warehouse_id,
                "serial_code": key,
                "status": "in_stock",
                "reference": reference,
                "movement_date": movement_date,
            }),
        };

        Ok(ValidatedEntry {
            row_number,
            key,
            quantity: Some(quantity),
            payload,
        })
    }

    fn apply_write_defaults(&self, payload: &mut serde_json::Value, today: chrono::NaiveDate) {
        if payload["movement_date"].is_null() {
            payload["movement_date"] = json!(today.format("%Y-%m-%d").to_string());
        }
    }

    fn duplicate_write_message(&self, key: &str) -> String {
        match self.variant {
            InventoryVariant::Standard => format!("Movimiento duplicado: {}", key),
            InventoryVariant::Serialized => {
                format!("El código de serie ya existe en el sistema: {}", key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::domain::catalog::{Product, Warehouse};
    use crate::domain::import::CellValue;
    use crate::domain::types::ProductStatus;
    use crate::importer::reference_resolver::ReferenceIndex;

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot {
            products: vec![Product {
                id: "p1".to_string(),
                sku: Some("ABC123".to_string()),
                name: "Tornillo".to_string(),
                purchase_price: Some(1.0),
                sale_price: None,
                status: ProductStatus::Active,
            }],
            warehouses: vec![Warehouse {
                id: "w1".to_string(),
                name: "Central".to_string(),
            }],
            existing_serials: ["SN-EXISTE".to_string()].into_iter().collect(),
            ..Default::default()
        }
    }

    fn row(n: usize, fields: Vec<(&str, &str)>) -> NormalizedRow {
        NormalizedRow {
            row_number: n,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
                .collect(),
        }
    }

    #[test]
    fn test_sku_not_found() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap);
        let mode = InventoryImportMode::standard();
        let existing = mode.existing_keys(&snap);
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let err = mode
            .validate_row(
                &row(3, vec![("sku", "XXXX"), ("quantity", "3"), ("warehouse", "Central")]),
                &mut ctx,
            )
            .unwrap_err();
        assert_eq!(err.message, "SKU no encontrado: XXXX");
        assert_eq!(err.row_number, 3);
    }

    #[test]
    fn test_quantity_must_be_positive() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap);
        let mode = InventoryImportMode::standard();
        let existing = mode.existing_keys(&snap);
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let err = mode
            .validate_row(
                &row(2, vec![("sku", "ABC123"), ("quantity", "0"), ("warehouse", "Central")]),
                &mut ctx,
            )
            .unwrap_err();
        assert_eq!(err.message, "La cantidad debe ser mayor que 0");
    }

    #[test]
    fn test_reference_defaults_to_constant_label() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap);
        let mode = InventoryImportMode::standard();
        let existing = mode.existing_keys(&snap);
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let entry = mode
            .validate_row(
                &row(2, vec![("sku", "ABC123"), ("quantity", "5"), ("warehouse", "Central")]),
                &mut ctx,
            )
            .unwrap();
        assert_eq!(entry.payload["reference"], "Importación masiva");
    }

    #[test]
    fn test_serial_already_registered() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap);
        let mode = InventoryImportMode::serialized();
        let existing = mode.existing_keys(&snap);
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let err = mode
            .validate_row(
                &row(
                    4,
                    vec![
                        ("sku", "ABC123"),
                        ("serial_code", "SN-EXISTE"),
                        ("warehouse", "Central"),
                    ],
                ),
                &mut ctx,
            )
            .unwrap_err();
        assert_eq!(
            err.message,
            "El código de serie ya existe en el sistema: SN-EXISTE"
        );
    }

    #[test]
    fn test_serialized_quantity_is_one_per_row() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap);
        let mode = InventoryImportMode::serialized();
        let existing = mode.existing_keys(&snap);
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let entry = mode
            .validate_row(
                &row(
                    2,
                    vec![
                        ("sku", "ABC123"),
                        ("serial_code", "SN-001"),
                        ("warehouse", "Central"),
                    ],
                ),
                &mut ctx,
            )
            .unwrap();
        assert_eq!(entry.quantity, Some(1.0));
        assert_eq!(entry.payload["serial_code"], "SN-001");
    }

    #[test]
    fn test_unparseable_movement_date_is_fatal() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap);
        let mode = InventoryImportMode::standard();
        let existing = mode.existing_keys(&snap);
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let err = mode
            .validate_row(
                &row(
                    2,
                    vec![
                        ("sku", "ABC123"),
                        ("quantity", "5"),
                        ("warehouse", "Central"),
                        ("movement_date", "ayer"),
                    ],
                ),
                &mut ctx,
            )
            .unwrap_err();
        assert_eq!(err.message, "Fecha inválida: ayer");
    }

    #[test]
    fn test_write_defaults_fill_missing_date() {
        let mode = InventoryImportMode::standard();
        let mut payload = json!({"movement_date": null});
        let today = chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        mode.apply_write_defaults(&mut payload, today);

        assert_eq!(payload["movement_date"], "2026-02-01");
    }
}
