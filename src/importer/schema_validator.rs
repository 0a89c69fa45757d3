// ==========================================
// 库存管理系统 - 列集校验器实现
// ==========================================
// 阶段 2: 文件级列集门禁 (fail-fast)
// 约束: 对全文件观测列并集执行一次, 先于任何行级校验;
//       产生任何错误则整个运行立即终止, successCount = 0。
// ==========================================

use crate::domain::import::RowError;
use crate::domain::types::UnknownColumnPolicy;
use crate::importer::error::ImportError;
use crate::importer::import_pipeline_trait::ImportMode;
use std::collections::BTreeSet;

pub struct SchemaValidator;

impl SchemaValidator {
    /// 校验观测列并集是否满足模式声明
    ///
    /// # 参数
    /// - observed: 全部规范化行的列键并集（已小写化）
    /// - mode: 导入模式（声明必需列/任选组/可选列/未知列策略）
    ///
    /// # 返回
    /// - 空列表: 门禁通过
    /// - 非空: 文件级错误列表（调用方必须中止运行）
    pub fn validate(&self, observed: &BTreeSet<String>, mode: &dyn ImportMode) -> Vec<RowError> {
        let mut errors = Vec::new();

        // 必需列
        for column in mode.required_columns() {
            if !observed.contains(*column) {
                errors.push(RowError::file_level(
                    ImportError::MissingRequiredColumn(column.to_string()).to_string(),
                ));
            }
        }

        // 任选组: 每组至少其一
        for group in mode.any_of_groups() {
            if !group.iter().any(|c| observed.contains(*c)) {
                errors.push(RowError::file_level(
                    ImportError::MissingAnyOfColumn(group.join(", ")).to_string(),
                ));
            }
        }

        // 未知列（仅在模式声明 Reject 时阻断）
        if mode.unknown_column_policy() == UnknownColumnPolicy::Reject {
            let mut declared: BTreeSet<&str> = BTreeSet::new();
            declared.extend(mode.required_columns().iter().copied());
            declared.extend(mode.optional_columns().iter().copied());
            for group in mode.any_of_groups() {
                declared.extend(group.iter().copied());
            }

            for column in observed {
                if !declared.contains(column.as_str()) {
                    errors.push(RowError::file_level(
                        ImportError::UnknownColumn(column.clone()).to_string(),
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::modes::{InventoryImportMode, ProductImportMode};

    fn observed(cols: &[&str]) -> BTreeSet<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_missing_required_column() {
        let mode = InventoryImportMode::standard();
        let errors = SchemaValidator.validate(&observed(&["sku", "warehouse"]), &mode);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("quantity"));
        assert_eq!(errors[0].row_number, 0);
    }

    #[test]
    fn test_any_of_group_satisfied_by_either_column() {
        let mode = InventoryImportMode::standard();

        let by_name = SchemaValidator.validate(&observed(&["sku", "quantity", "warehouse"]), &mode);
        assert!(by_name.is_empty());

        let by_id =
            SchemaValidator.validate(&observed(&["sku", "quantity", "warehouse_id"]), &mode);
        assert!(by_id.is_empty());

        let neither = SchemaValidator.validate(&observed(&["sku", "quantity"]), &mode);
        assert_eq!(neither.len(), 1);
        assert!(neither[0].message.contains("warehouse"));
    }

    #[test]
    fn test_unknown_column_rejected_in_product_mode() {
        let mode = ProductImportMode;
        let errors = SchemaValidator.validate(&observed(&["name", "color"]), &mode);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("color"));
    }

    #[test]
    fn test_unknown_column_ignored_in_inventory_mode() {
        let mode = InventoryImportMode::standard();
        let errors = SchemaValidator.validate(
            &observed(&["sku", "quantity", "warehouse", "nota_interna"]),
            &mode,
        );

        assert!(errors.is_empty());
    }
}
