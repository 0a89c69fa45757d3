// ==========================================
// 库存管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与导入管道数据载体
// 红线: 不含数据访问逻辑, 不含校验规则实现
// ==========================================

pub mod catalog;
pub mod import;
pub mod types;

// 重导出核心类型
pub use catalog::{Category, Location, Product, ReferenceSnapshot, Warehouse};
pub use import::{
    CellValue, ImportReport, ImportRunRecord, NormalizedRow, ParsedFile, RawRow, RowError,
    ValidatedEntry,
};
pub use types::{AggregationPolicy, EntityKind, ProductStatus, UnknownColumnPolicy};
