// ==========================================
// 库存管理系统 - 导入配置
// ==========================================
// 职责: 导入运行参数; 构造时注入管道, 不使用模块级静态量
// ==========================================

use serde::{Deserialize, Serialize};

/// 分块写入的默认块大小
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// 引用说明字段缺失时的固定回退文案
pub const DEFAULT_REFERENCE_LABEL: &str = "Importación masiva";

// ==========================================
// ImportConfig - 导入运行配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 每块提交给写入端的条目数
    pub chunk_size: usize,
    /// reference 字段缺失时写入的固定标签
    pub default_reference_label: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            default_reference_label: DEFAULT_REFERENCE_LABEL.to_string(),
        }
    }
}

impl ImportConfig {
    /// 返回参数约束到合法范围后的配置 (chunk_size ≥ 1)
    pub fn sanitized(mut self) -> Self {
        if self.chunk_size == 0 {
            self.chunk_size = DEFAULT_CHUNK_SIZE;
        }
        self
    }
}
