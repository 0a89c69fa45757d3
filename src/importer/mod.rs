// ==========================================
// 库存管理系统 - 导入层
// ==========================================
// 职责: 批量表格导入管道 (CSV / Excel)
// 流程: 解析 → 规范化 → 列集门禁 → 参照解析 + 逐行校验
//       → 可选聚合 → 分块写入 → 结果报告
// ==========================================

// 模块声明
pub mod aggregator;
pub mod batch_writer;
pub mod error;
pub mod file_parser;
pub mod import_pipeline_trait;
pub mod modes;
pub mod pipeline;
pub mod reference_resolver;
pub mod row_normalizer;
pub mod schema_validator;
pub mod template;

// 重导出核心类型
pub use aggregator::EntryAggregator;
pub use batch_writer::{BatchWriteExecutor, CancelToken, WriteOutcome};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use modes::{
    InventoryImportMode, InventoryVariant, LocationImportMode, ProductImportMode,
    PurchaseOrderLineImportMode,
};
pub use pipeline::ImportPipeline;
pub use reference_resolver::ReferenceIndex;
pub use row_normalizer::{DateField, NumberField, RowNormalizer};
pub use schema_validator::SchemaValidator;
pub use template::TemplateGenerator;

// 重导出 Trait 接口
pub use import_pipeline_trait::{FileParser, ImportMode, NoProgress, ProgressReporter, RunContext};
