// ==========================================
// 库存管理系统 - 导入管道实现
// ==========================================
// 职责: 整合导入流程, 从文件到写入端
// 流程: 解析 → 规范化 → 列集门禁 → 参照索引 → 逐行校验
//       → 可选聚合 → 分块写入 → 审计记录
// 约束: run() 在正常运作下不向调用方抛错 —— 一切失败收敛进
//       ImportReport, 调用方只做结果检查, 不需要异常处理。
// ==========================================

use crate::config::ImportConfig;
use crate::domain::import::{ImportReport, ImportRunRecord, NormalizedRow, RowError};
use crate::domain::types::AggregationPolicy;
use crate::importer::aggregator::EntryAggregator;
use crate::importer::batch_writer::{BatchWriteExecutor, CancelToken};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::import_pipeline_trait::{ImportMode, ProgressReporter, RunContext};
use crate::importer::reference_resolver::ReferenceIndex;
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::schema_validator::SchemaValidator;
use crate::repository::catalog_repo::ReferenceRepository;
use crate::repository::sink::ImportSink;
use chrono::Utc;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportPipeline - 导入管道
// ==========================================
// 依赖显式注入 (无模块级单例); 参照缓存的生命周期
// 限定在单次运行内, 并发运行互不共享可变状态。
pub struct ImportPipeline<R, S>
where
    R: ReferenceRepository,
    S: ImportSink,
{
    reference_repo: R,
    sink: S,
    config: ImportConfig,
}

impl<R, S> ImportPipeline<R, S>
where
    R: ReferenceRepository,
    S: ImportSink,
{
    pub fn new(reference_repo: R, sink: S, config: ImportConfig) -> Self {
        Self {
            reference_repo,
            sink,
            config: config.sanitized(),
        }
    }

    /// 执行一次导入运行
    ///
    /// # 返回
    /// 总是返回完整的 ImportReport; 任何失败模式 (文件级/行级/
    /// 写入级/未分类异常) 都体现在报告里, 不向上抛出。
    #[instrument(skip_all, fields(mode = mode.name(), run_id = tracing::field::Empty))]
    pub async fn run<P: AsRef<Path>>(
        &self,
        mode: &dyn ImportMode,
        file_path: P,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> ImportReport {
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let start = Instant::now();
        let started_at = Utc::now();
        let path = file_path.as_ref();

        info!(file = %path.display(), "开始导入");

        let mut report = match self.execute(mode, path, progress, cancel, &run_id).await {
            Ok(report) => report,
            Err(e) => {
                // 运行边界: 未分类失败收敛为单条文件级错误
                warn!(error = %e, "导入在行处理前终止");
                ImportReport {
                    run_id: run_id.clone(),
                    mode: mode.name().to_string(),
                    total_rows: 0,
                    success_count: 0,
                    errors: vec![RowError::file_level(e.to_string())],
                    elapsed: start.elapsed(),
                }
            }
        };
        report.elapsed = start.elapsed();

        // 审计记录: 失败只告警, 不影响导入结果
        let record = ImportRunRecord {
            run_id: report.run_id.clone(),
            mode: report.mode.clone(),
            file_name: path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string()),
            total_rows: report.total_rows as i64,
            success_rows: report.success_count as i64,
            error_rows: report.error_count() as i64,
            started_at,
            elapsed_ms: report.elapsed.as_millis() as i64,
        };
        if let Err(e) = self.sink.record_run(&record).await {
            warn!(error = %e, "导入批次审计记录写入失败");
        }

        info!(
            total = report.total_rows,
            success = report.success_count,
            errors = report.error_count(),
            elapsed_ms = report.elapsed.as_millis(),
            "导入完成"
        );
        report
    }

    async fn execute(
        &self,
        mode: &dyn ImportMode,
        path: &Path,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
        run_id: &str,
    ) -> ImportResult<ImportReport> {
        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let parsed = UniversalFileParser.parse(path)?;
        info!(rows = parsed.rows.len(), parse_errors = parsed.row_errors.len(), "文件解析完成");

        // === 步骤 2: 行规范化 (全空行静默排除) ===
        debug!("步骤 2: 行规范化");
        let normalizer = RowNormalizer;
        let normalized: Vec<NormalizedRow> = parsed
            .rows
            .iter()
            .filter_map(|raw| normalizer.normalize(raw))
            .collect();

        if normalized.is_empty() && parsed.row_errors.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        let total_rows = normalized.len();

        // === 步骤 3: 列集门禁 (文件级 fail-fast) ===
        debug!("步骤 3: 列集门禁");
        let observed: BTreeSet<String> = normalized
            .iter()
            .flat_map(|row| row.fields.keys().cloned())
            .collect();
        let schema_errors = SchemaValidator.validate(&observed, mode);
        if !schema_errors.is_empty() {
            // 门禁失败: 不处理任何行, 只返回列集错误
            info!(errors = schema_errors.len(), "列集门禁未通过");
            return Ok(ImportReport {
                run_id: run_id.to_string(),
                mode: mode.name().to_string(),
                total_rows,
                success_count: 0,
                errors: schema_errors,
                elapsed: Default::default(),
            });
        }

        // === 步骤 4: 加载参照快照并构建索引 ===
        debug!("步骤 4: 构建参照索引");
        let snapshot = self
            .reference_repo
            .load_snapshot()
            .await
            .map_err(|e| ImportError::InternalError(e.to_string()))?;
        let index = ReferenceIndex::build(&snapshot);
        let existing_keys = mode.existing_keys(&snapshot);
        info!(
            products = snapshot.products.len(),
            warehouses = snapshot.warehouses.len(),
            "参照索引构建完成"
        );

        // === 步骤 5: 逐行校验 ===
        debug!("步骤 5: 逐行校验");
        let mut errors = parsed.row_errors;
        let mut entries = Vec::new();
        let mut ctx = RunContext::new(&index, &existing_keys, &self.config);
        for row in &normalized {
            // 每行恰好产生 条目/错误 之一; 首错即止
            match mode.validate_row(row, &mut ctx) {
                Ok(entry) => entries.push(entry),
                Err(error) => errors.push(error),
            }
        }
        info!(valid = entries.len(), failed = errors.len(), "逐行校验完成");

        // === 步骤 6: 可选聚合 ===
        if mode.aggregation_policy() == AggregationPolicy::SumByKey {
            debug!("步骤 6: 按键聚合");
            let before = entries.len();
            entries = EntryAggregator.accumulate(entries);
            info!(before = before, after = entries.len(), "聚合完成");
        }

        // === 步骤 7: 分块写入 ===
        debug!("步骤 7: 分块写入");
        let executor = BatchWriteExecutor::new(self.config.chunk_size);
        let outcome = executor
            .write(&self.sink, mode, entries, progress, cancel)
            .await;
        errors.extend(outcome.errors);

        Ok(ImportReport {
            run_id: run_id.to_string(),
            mode: mode.name().to_string(),
            total_rows,
            success_count: outcome.success_count,
            errors,
            elapsed: Default::default(),
        })
    }
}
