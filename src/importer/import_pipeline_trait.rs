// ==========================================
// 库存管理系统 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道的组件接口与模式契约
// 红线: 管道外壳与模式无关; 模式对象提供列集/校验/聚合策略
// ==========================================

use crate::config::ImportConfig;
use crate::domain::catalog::ReferenceSnapshot;
use crate::domain::import::{NormalizedRow, ParsedFile, RowError, ValidatedEntry};
use crate::domain::types::{AggregationPolicy, UnknownColumnPolicy};
use crate::importer::error::ImportResult;
use crate::importer::reference_resolver::ReferenceIndex;
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行序列（列头 → 原始值, 不做类型强转）
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(ParsedFile): 数据区行序列（不含表头）+ 行级解析错误
    /// - Err(ImportError): 文件级错误（文件不存在/格式不支持/不可读）
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedFile>;
}

// ==========================================
// RunContext - 单次运行的校验状态
// ==========================================
// 生命周期: 一次导入运行; 不跨运行共享（避免模块级缓存泄漏）。
// seen_keys 仅收录已被接受的行的键: 重复行不入集, 保证
// 同键第三次出现仍报重复。
pub struct RunContext<'a> {
    /// 参照索引（运行期只读快照）
    pub index: &'a ReferenceIndex,
    /// 系统中已存在的标识键集合（按模式选定: SKU / 库位名 / 序列号）
    pub existing_keys: &'a HashSet<String>,
    /// 文件内已接受的标识键（查同文件重复）
    pub seen_keys: HashSet<String>,
    /// 运行配置
    pub config: &'a ImportConfig,
}

impl<'a> RunContext<'a> {
    pub fn new(
        index: &'a ReferenceIndex,
        existing_keys: &'a HashSet<String>,
        config: &'a ImportConfig,
    ) -> Self {
        Self {
            index,
            existing_keys,
            seen_keys: HashSet::new(),
            config,
        }
    }
}

// ==========================================
// ImportMode Trait
// ==========================================
// 用途: 导入模式策略对象（商品目录/库位/期初库存/采购单行）
// 管道按此契约执行: 列集门禁 → 逐行校验 → 可选聚合 → 分块写入
pub trait ImportMode: Send + Sync + std::fmt::Debug {
    /// 模式标识（日志与审计记录使用）
    fn name(&self) -> &'static str;

    /// 写入目标表
    fn table(&self) -> &'static str;

    /// 必须出现的列
    fn required_columns(&self) -> &'static [&'static str];

    /// 每组至少出现其一的列组（如 warehouse 或 warehouse_id）
    fn any_of_groups(&self) -> &'static [&'static [&'static str]] {
        &[]
    }

    /// 允许出现的可选列
    fn optional_columns(&self) -> &'static [&'static str] {
        &[]
    }

    /// 未声明列的处理策略（源系统各导入器不一致, 故逐模式声明）
    fn unknown_column_policy(&self) -> UnknownColumnPolicy {
        UnknownColumnPolicy::Ignore
    }

    /// 聚合策略（采购单行按商品聚合, 其余直写）
    fn aggregation_policy(&self) -> AggregationPolicy {
        AggregationPolicy::PassThrough
    }

    /// 本模式用于查重的系统既有键集合
    fn existing_keys(&self, snapshot: &ReferenceSnapshot) -> HashSet<String>;

    /// 逐行校验
    ///
    /// # 返回
    /// - Ok(ValidatedEntry): 行通过全部规则, 可写入
    /// - Err(RowError): 首个失败规则的行级错误（该行被排除）
    ///
    /// 每个被处理的行恰好产生二者之一; 控制流不依赖 panic/catch。
    fn validate_row(
        &self,
        row: &NormalizedRow,
        ctx: &mut RunContext<'_>,
    ) -> Result<ValidatedEntry, RowError>;

    /// 写入前回填默认值（在写入阶段调用, 而非校验阶段）
    ///
    /// 日期缺省取"写入时的本地当天"而不是校验时点, 避免跨日/
    /// 时区造成的偏差。默认实现不做任何事。
    fn apply_write_defaults(&self, _payload: &mut serde_json::Value, _today: chrono::NaiveDate) {}

    /// 写入阶段唯一键冲突的行级错误文案
    fn duplicate_write_message(&self, key: &str) -> String {
        format!("Registro duplicado: {}", key)
    }
}

// ==========================================
// ProgressReporter Trait
// ==========================================
// 用途: 写入阶段进度回调 (processed, total)
// 约束: 调用序列单调不减, 完成时恰为 (total, total)
pub trait ProgressReporter: Send + Sync {
    fn report(&self, processed: usize, total: usize);
}

/// 空实现（无进度订阅方时使用）
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _processed: usize, _total: usize) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}
