// ==========================================
// 批量导入API
// ==========================================
// 职责: 封装导入管道, 供桌面外壳 (IPC 桥) 调用
// 结果面: { success, errors, errorMessages } — 无其他线格式
// ==========================================

use crate::api::error::ApiError;
use crate::config::ImportConfig;
use crate::domain::import::ImportReport;
use crate::i18n::t_with_args;
use crate::importer::{
    CancelToken, ImportMode, ImportPipeline, InventoryImportMode, LocationImportMode,
    NoProgress, ProductImportMode, ProgressReporter, PurchaseOrderLineImportMode,
    TemplateGenerator,
};
use crate::repository::{SqliteCatalogRepository, SqliteSink};
use serde::{Deserialize, Serialize};
use tracing::info;

// ==========================================
// ImportApiResponse - 导入结果响应
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiResponse {
    /// 成功写入的行数
    pub success: usize,
    /// 错误条数
    pub errors: usize,
    /// 客户端直接展示的错误文案列表
    pub error_messages: Vec<String>,
}

impl From<&ImportReport> for ImportApiResponse {
    fn from(report: &ImportReport) -> Self {
        Self {
            success: report.success_count,
            errors: report.error_count(),
            error_messages: report.error_messages(),
        }
    }
}

// ==========================================
// TemplateFileResponse - 模板下载响应
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFileResponse {
    pub file_name: String,
    /// CSV 文本内容 (UTF-8)
    pub content: String,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    db_path: String,
    config: ImportConfig,
}

impl ImportApi {
    /// 创建新的 ImportApi 实例
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            config: ImportConfig::default(),
        }
    }

    pub fn with_config(db_path: String, config: ImportConfig) -> Self {
        Self {
            db_path,
            config: config.sanitized(),
        }
    }

    /// 按模式名构造策略对象
    ///
    /// # 参数
    /// - mode: products / locations / initial_stock /
    ///         initial_stock_serialized / purchase_order_lines
    /// - purchase_order_id: 仅采购单行模式必填
    fn resolve_mode(
        &self,
        mode: &str,
        purchase_order_id: Option<&str>,
    ) -> Result<Box<dyn ImportMode>, ApiError> {
        match mode {
            "products" | "product_catalog" => Ok(Box::new(ProductImportMode)),
            "locations" => Ok(Box::new(LocationImportMode)),
            "initial_stock" => Ok(Box::new(InventoryImportMode::standard())),
            "initial_stock_serialized" => Ok(Box::new(InventoryImportMode::serialized())),
            "purchase_order_lines" => {
                let po_id = purchase_order_id.ok_or_else(|| {
                    ApiError::InvalidInput(
                        "purchase_order_id es requerido para importar líneas de orden".to_string(),
                    )
                })?;
                Ok(Box::new(PurchaseOrderLineImportMode::new(po_id)))
            }
            other => Err(ApiError::InvalidInput(format!(
                "Modo de importación desconocido: {}",
                other
            ))),
        }
    }

    /// 导入单个文件（无进度订阅）
    pub async fn import_file(
        &self,
        mode: &str,
        file_path: &str,
        purchase_order_id: Option<&str>,
    ) -> Result<ImportApiResponse, ApiError> {
        self.import_file_with_progress(
            mode,
            file_path,
            purchase_order_id,
            &NoProgress,
            &CancelToken::new(),
        )
        .await
    }

    /// 导入单个文件（带进度回调与取消令牌）
    pub async fn import_file_with_progress(
        &self,
        mode: &str,
        file_path: &str,
        purchase_order_id: Option<&str>,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<ImportApiResponse, ApiError> {
        let mode = self.resolve_mode(mode, purchase_order_id)?;
        let pipeline = self.create_pipeline()?;

        let report = pipeline.run(mode.as_ref(), file_path, progress, cancel).await;

        info!(
            "{}",
            t_with_args(
                "import.summary",
                &[
                    ("success", &report.success_count.to_string()),
                    ("errors", &report.error_count().to_string()),
                ],
            )
        );

        Ok(ImportApiResponse::from(&report))
    }

    /// 批量导入多个文件（并发执行, 单个文件失败不影响其他文件）
    pub async fn batch_import(
        &self,
        mode: &str,
        file_paths: Vec<String>,
        purchase_order_id: Option<&str>,
    ) -> Vec<Result<ImportApiResponse, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let tasks = file_paths.into_iter().map(|path| async move {
            self.import_file(mode, &path, purchase_order_id)
                .await
                .map_err(|e| format!("{}: {}", path, e))
        });

        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            "批量导入完成"
        );
        results
    }

    /// 生成模式对应的导入模板
    pub fn download_template(&self, mode: &str) -> Result<TemplateFileResponse, ApiError> {
        // 采购单行模板不依赖具体订单, 用占位 id 构造策略对象
        let mode = self.resolve_mode(mode, Some(""))?;
        let bytes = TemplateGenerator
            .csv_template(mode.as_ref())
            .map_err(|e| ApiError::ImportError(e.to_string()))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(TemplateFileResponse {
            file_name: TemplateGenerator::file_name(mode.as_ref()),
            content,
        })
    }

    /// 构建导入管道 (每次调用独立实例, 参照缓存限定单次运行)
    fn create_pipeline(
        &self,
    ) -> Result<ImportPipeline<SqliteCatalogRepository, SqliteSink>, ApiError> {
        let reference_repo = SqliteCatalogRepository::new(&self.db_path)?;
        let sink = SqliteSink::new(&self.db_path)?;
        Ok(ImportPipeline::new(
            reference_repo,
            sink,
            self.config.clone(),
        ))
    }
}
