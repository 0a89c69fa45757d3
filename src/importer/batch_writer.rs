// ==========================================
// 库存管理系统 - 分块写入执行器实现
// ==========================================
// 阶段 6: 固定块提交 + 唯一冲突逐行降级 + 进度上报
// 约束: 无事务回滚 —— 部分成功是预期行为, 后续失败不撤销已写入的行。
//       进度 (processed, total) 单调不减, 完成时恰为 (total, total)。
//       取消检查点在块边界: 不会留下写了一半的块。
// ==========================================

use crate::domain::import::{RowError, ValidatedEntry};
use crate::importer::error::ImportError;
use crate::importer::import_pipeline_trait::{ImportMode, ProgressReporter};
use crate::repository::sink::ImportSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

// ==========================================
// CancelToken - 协作式取消令牌
// ==========================================
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ==========================================
// WriteOutcome - 写入阶段结果
// ==========================================
#[derive(Debug, Default)]
pub struct WriteOutcome {
    pub success_count: usize,
    pub errors: Vec<RowError>,
    pub cancelled: bool,
}

// ==========================================
// BatchWriteExecutor
// ==========================================
pub struct BatchWriteExecutor {
    chunk_size: usize,
}

impl BatchWriteExecutor {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// 分块写入校验通过的条目
    ///
    /// # 行为
    /// - 每块先整批提交; 块级失败且为唯一约束冲突时, 对该块逐行
    ///   重试, 把冲突行与瞬时错误隔离开 (一个重复键不连累整块好行)
    /// - 其他块级错误对该块不可恢复, 记一条聚合错误 (起因未知,
    ///   不逐行归因), 继续后续块
    /// - 每块 (降级时每行) 之后上报 (processed, total)
    pub async fn write(
        &self,
        sink: &dyn ImportSink,
        mode: &dyn ImportMode,
        mut entries: Vec<ValidatedEntry>,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> WriteOutcome {
        let total = entries.len();
        let table = mode.table();
        let mut outcome = WriteOutcome::default();
        let mut processed = 0usize;

        // 日期等缺省值在写入时点回填 (本地日期, 避免 UTC 跨日偏差)
        let today = chrono::Local::now().date_naive();
        for entry in &mut entries {
            mode.apply_write_defaults(&mut entry.payload, today);
        }

        for chunk in entries.chunks(self.chunk_size) {
            if cancel.is_cancelled() {
                warn!(table = table, processed = processed, "写入阶段被取消");
                outcome.cancelled = true;
                outcome
                    .errors
                    .push(RowError::file_level(ImportError::Cancelled.to_string()));
                break;
            }

            let rows: Vec<serde_json::Value> =
                chunk.iter().map(|e| e.payload.clone()).collect();

            match sink.insert_rows(table, &rows).await {
                Ok(written) => {
                    outcome.success_count += written;
                    processed += chunk.len();
                    progress.report(processed, total);
                }
                Err(e) if e.is_unique_violation() => {
                    // 唯一冲突: 逐行降级, 隔离重复键
                    debug!(table = table, chunk = chunk.len(), "块级唯一冲突, 降级逐行写入");
                    for entry in chunk {
                        match sink.insert_rows(table, &[entry.payload.clone()]).await {
                            Ok(written) => outcome.success_count += written,
                            Err(row_err) if row_err.is_unique_violation() => {
                                outcome.errors.push(RowError::new(
                                    entry.row_number,
                                    mode.duplicate_write_message(&entry.key),
                                ));
                            }
                            Err(row_err) => {
                                outcome.errors.push(RowError::new(
                                    entry.row_number,
                                    ImportError::SinkError {
                                        table: table.to_string(),
                                        message: row_err.to_string(),
                                    }
                                    .to_string(),
                                ));
                            }
                        }
                        processed += 1;
                        progress.report(processed, total);
                    }
                }
                Err(e) => {
                    // 起因未知: 整块记一条聚合错误, 不逐行归因
                    warn!(table = table, error = %e, "块级写入失败");
                    outcome.errors.push(RowError::file_level(
                        ImportError::SinkError {
                            table: table.to_string(),
                            message: format!("{} ({} filas afectadas)", e, chunk.len()),
                        }
                        .to_string(),
                    ));
                    processed += chunk.len();
                    progress.report(processed, total);
                }
            }
        }

        if !outcome.cancelled {
            // 空输入也要给出完成信号
            progress.report(processed, total);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ReferenceSnapshot;
    use crate::domain::import::NormalizedRow;
    use crate::importer::import_pipeline_trait::RunContext;
    use crate::repository::sink::SinkError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    // 可编排失败行为的内存写入端
    struct ScriptedSink {
        duplicate_keys: HashSet<String>,
        backend_failures: usize,
        written: Mutex<Vec<serde_json::Value>>,
        fail_count: Mutex<usize>,
    }

    impl ScriptedSink {
        fn new() -> Self {
            Self {
                duplicate_keys: HashSet::new(),
                backend_failures: 0,
                written: Mutex::new(Vec::new()),
                fail_count: Mutex::new(0),
            }
        }

        fn with_duplicates(keys: &[&str]) -> Self {
            let mut sink = Self::new();
            sink.duplicate_keys = keys.iter().map(|k| k.to_string()).collect();
            sink
        }
    }

    #[async_trait]
    impl ImportSink for ScriptedSink {
        async fn insert_rows(
            &self,
            _table: &str,
            rows: &[serde_json::Value],
        ) -> Result<usize, SinkError> {
            if self.backend_failures > 0 {
                let mut failed = self.fail_count.lock().unwrap();
                if *failed < self.backend_failures {
                    *failed += 1;
                    return Err(SinkError::Backend("timeout".to_string()));
                }
            }
            for row in rows {
                let key = row["sku"].as_str().unwrap_or_default();
                if self.duplicate_keys.contains(key) {
                    return Err(SinkError::UniqueViolation(format!(
                        "UNIQUE constraint failed: products.sku ({})",
                        key
                    )));
                }
            }
            let mut written = self.written.lock().unwrap();
            written.extend(rows.iter().cloned());
            Ok(rows.len())
        }

        async fn record_run(
            &self,
            _record: &crate::domain::import::ImportRunRecord,
        ) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct TestMode;

    impl ImportMode for TestMode {
        fn name(&self) -> &'static str {
            "test"
        }
        fn table(&self) -> &'static str {
            "products"
        }
        fn required_columns(&self) -> &'static [&'static str] {
            &["sku"]
        }
        fn existing_keys(&self, _snapshot: &ReferenceSnapshot) -> HashSet<String> {
            HashSet::new()
        }
        fn validate_row(
            &self,
            _row: &NormalizedRow,
            _ctx: &mut RunContext<'_>,
        ) -> Result<ValidatedEntry, RowError> {
            unreachable!("写入测试不经过行校验")
        }
        fn duplicate_write_message(&self, key: &str) -> String {
            format!("El SKU ya existe en el sistema: {}", key)
        }
    }

    fn entry(row: usize, sku: &str) -> ValidatedEntry {
        ValidatedEntry {
            row_number: row,
            key: sku.to_string(),
            quantity: None,
            payload: json!({"sku": sku}),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, processed: usize, total: usize) {
            self.calls.lock().unwrap().push((processed, total));
        }
    }

    #[tokio::test]
    async fn test_duplicate_mid_chunk_spares_rest_of_chunk() {
        let sink = ScriptedSink::with_duplicates(&["DUP"]);
        let entries = vec![entry(2, "A"), entry(3, "DUP"), entry(4, "B")];

        let outcome = BatchWriteExecutor::new(50)
            .write(&sink, &TestMode, entries, &crate::importer::NoProgress, &CancelToken::new())
            .await;

        // 冲突行之后的好行仍被尝试并成功
        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].row_number, 3);
        assert_eq!(
            outcome.errors[0].message,
            "El SKU ya existe en el sistema: DUP"
        );
    }

    #[tokio::test]
    async fn test_backend_error_aggregated_per_chunk() {
        let mut sink = ScriptedSink::new();
        sink.backend_failures = 1;
        let entries = vec![entry(2, "A"), entry(3, "B"), entry(4, "C")];

        let outcome = BatchWriteExecutor::new(2)
            .write(&sink, &TestMode, entries, &crate::importer::NoProgress, &CancelToken::new())
            .await;

        // 第一块 (2 行) 整体失败计一条聚合错误, 第二块成功
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].row_number, 0);
        assert!(outcome.errors[0].message.contains("2 filas"));
    }

    #[tokio::test]
    async fn test_progress_monotonic_and_complete() {
        let sink = ScriptedSink::with_duplicates(&["DUP"]);
        let progress = RecordingProgress::default();
        let entries = vec![entry(2, "A"), entry(3, "DUP"), entry(4, "B"), entry(5, "C")];

        BatchWriteExecutor::new(2)
            .write(&sink, &TestMode, entries, &progress, &CancelToken::new())
            .await;

        let calls = progress.calls.lock().unwrap();
        assert!(!calls.is_empty());
        for pair in calls.windows(2) {
            assert!(pair[1].0 >= pair[0].0, "进度必须单调不减");
        }
        assert_eq!(*calls.last().unwrap(), (4, 4));
    }

    #[tokio::test]
    async fn test_cancel_between_chunks() {
        let sink = ScriptedSink::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let entries = vec![entry(2, "A"), entry(3, "B")];

        let outcome = BatchWriteExecutor::new(1)
            .write(&sink, &TestMode, entries, &crate::importer::NoProgress, &cancel)
            .await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.errors[0].message, "Importación cancelada");
    }

    #[tokio::test]
    async fn test_empty_input_still_reports_completion() {
        let sink = ScriptedSink::new();
        let progress = RecordingProgress::default();

        let outcome = BatchWriteExecutor::new(10)
            .write(&sink, &TestMode, vec![], &progress, &CancelToken::new())
            .await;

        assert_eq!(outcome.success_count, 0);
        assert_eq!(*progress.calls.lock().unwrap().last().unwrap(), (0, 0));
    }
}
