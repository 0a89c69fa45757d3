// ==========================================
// 库存管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 参照数据读取 + 导入写入端 + 本地 schema
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod schema;
pub mod sink;

// 重导出核心类型
pub use catalog_repo::{ReferenceRepository, SqliteCatalogRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use schema::{init_schema, SCHEMA_VERSION};
pub use sink::{ImportSink, SinkError, SqliteSink};
