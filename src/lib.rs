// ==========================================
// 库存管理系统 - 批量导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 桌面库存客户端的批量表格导入引擎
// (桌面外壳 / 认证 / 后端数据库约束均为外部协作方)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 参照读取与写入端
pub mod repository;

// 导入层 - 管道与模式
pub mod importer;

// 配置层 - 运行配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AggregationPolicy, Category, CellValue, EntityKind, ImportReport, Location, NormalizedRow,
    Product, ProductStatus, RawRow, ReferenceSnapshot, RowError, UnknownColumnPolicy,
    ValidatedEntry, Warehouse,
};

// 导入管道
pub use importer::{
    BatchWriteExecutor, CancelToken, EntryAggregator, ImportMode, ImportPipeline,
    InventoryImportMode, LocationImportMode, ProductImportMode, ProgressReporter,
    PurchaseOrderLineImportMode, ReferenceIndex, TemplateGenerator,
};

// 仓储边界
pub use repository::{ImportSink, ReferenceRepository, SqliteCatalogRepository, SqliteSink};

// API
pub use api::{ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Inventario Desktop";
