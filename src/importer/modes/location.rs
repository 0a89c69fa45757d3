// ==========================================
// 库存管理系统 - 库位导入模式
// ==========================================
// 列集: name 必填; warehouse / warehouse_id / description 可选
// 策略: 未知列忽略 (源系统库位导入不做列名约束); 不聚合
// ==========================================

use crate::domain::catalog::ReferenceSnapshot;
use crate::domain::import::{NormalizedRow, RowError, ValidatedEntry};
use crate::domain::types::EntityKind;
use crate::importer::import_pipeline_trait::{ImportMode, RunContext};
use crate::importer::modes::required_text;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug)]
pub struct LocationImportMode;

impl ImportMode for LocationImportMode {
    fn name(&self) -> &'static str {
        "locations"
    }

    fn table(&self) -> &'static str {
        "locations"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn optional_columns(&self) -> &'static [&'static str] {
        &["warehouse", "warehouse_id", "description"]
    }

    fn existing_keys(&self, snapshot: &ReferenceSnapshot) -> HashSet<String> {
        snapshot.existing_location_names()
    }

    fn validate_row(
        &self,
        row: &NormalizedRow,
        ctx: &mut RunContext<'_>,
    ) -> Result<ValidatedEntry, RowError> {
        let row_number = row.row_number;

        // 规则 1: 名称必填
        let name = required_text(row, "name", "Nombre requerido")?;
        let name_key = name.to_lowercase();

        // 规则 2: 同文件重名
        if ctx.seen_keys.contains(&name_key) {
            return Err(RowError::new(
                row_number,
                format!("Nombre duplicado en el archivo: {}", name),
            ));
        }

        // 规则 3: 系统既有重名
        if ctx.existing_keys.contains(&name_key) {
            return Err(RowError::new(
                row_number,
                format!("La ubicación ya existe en el sistema: {}", name),
            ));
        }

        // 规则 4: 所属仓库 (可选)
        let warehouse_id = ctx
            .index
            .resolve_pair(row, EntityKind::Warehouse, "warehouse_id", "warehouse")
            .map_err(|msg| RowError::new(row_number, msg))?;

        ctx.seen_keys.insert(name_key.clone());

        Ok(ValidatedEntry {
            row_number,
            key: name_key,
            quantity: None,
            payload: json!({
                "id": Uuid::new_v4().to_string(),
                "name": name,
                "warehouse_id": warehouse_id,
                "description": row.text("description"),
            }),
        })
    }

    fn duplicate_write_message(&self, key: &str) -> String {
        format!("La ubicación ya existe en el sistema: {}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::domain::catalog::Location;
    use crate::domain::import::CellValue;
    use crate::importer::reference_resolver::ReferenceIndex;

    fn row(fields: Vec<(&str, &str)>) -> NormalizedRow {
        NormalizedRow {
            row_number: 2,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
                .collect(),
        }
    }

    #[test]
    fn test_duplicate_name_against_system_case_insensitive() {
        let snapshot = ReferenceSnapshot {
            locations: vec![Location {
                id: "l1".to_string(),
                name: "Pasillo A".to_string(),
                warehouse_id: None,
            }],
            ..Default::default()
        };
        let index = ReferenceIndex::build(&snapshot);
        let existing = LocationImportMode.existing_keys(&snapshot);
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let err = LocationImportMode
            .validate_row(&row(vec![("name", "PASILLO A")]), &mut ctx)
            .unwrap_err();
        assert_eq!(err.message, "La ubicación ya existe en el sistema: PASILLO A");
    }

    #[test]
    fn test_unknown_warehouse_name_fails() {
        let index = ReferenceIndex::build(&ReferenceSnapshot::default());
        let existing = HashSet::new();
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let err = LocationImportMode
            .validate_row(
                &row(vec![("name", "Pasillo B"), ("warehouse", "Norte")]),
                &mut ctx,
            )
            .unwrap_err();
        assert_eq!(err.message, "Almacén no encontrado: Norte");
    }

    #[test]
    fn test_valid_row_without_warehouse() {
        let index = ReferenceIndex::build(&ReferenceSnapshot::default());
        let existing = HashSet::new();
        let config = ImportConfig::default();
        let mut ctx = RunContext::new(&index, &existing, &config);

        let entry = LocationImportMode
            .validate_row(&row(vec![("name", "Pasillo B")]), &mut ctx)
            .unwrap();
        assert_eq!(entry.payload["name"], "Pasillo B");
        assert_eq!(entry.payload["warehouse_id"], serde_json::Value::Null);
    }
}
