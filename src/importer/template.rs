// ==========================================
// 库存管理系统 - 导入模板生成器
// ==========================================
// 职责: 按模式列集生成可下载模板
// 说明: 生成走 CSV 路径; 列集与对应导入模式一致,
//       id 列不进模板 (用户按名称填写, id 列仅供系统间对接)。
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_pipeline_trait::ImportMode;

pub struct TemplateGenerator;

impl TemplateGenerator {
    /// 模板列集: 必填列 + 每个任选组的首列 + 非 id 可选列
    pub fn columns(mode: &dyn ImportMode) -> Vec<&'static str> {
        let mut columns: Vec<&'static str> = Vec::new();
        columns.extend(mode.required_columns());
        for group in mode.any_of_groups() {
            if let Some(first) = group.first() {
                columns.push(first);
            }
        }
        columns.extend(
            mode.optional_columns()
                .iter()
                .filter(|c| !c.ends_with("_id"))
                .copied(),
        );
        columns
    }

    /// 生成 CSV 模板字节流 (UTF-8, 仅表头行)
    pub fn csv_template(&self, mode: &dyn ImportMode) -> ImportResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(Self::columns(mode))?;
        writer
            .into_inner()
            .map_err(|e| ImportError::InternalError(e.to_string()))
    }

    /// 模板下载文件名
    pub fn file_name(mode: &dyn ImportMode) -> String {
        format!("plantilla_{}.csv", mode.name())
    }
}
