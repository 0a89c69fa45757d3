// ==========================================
// 库存管理系统 - 领域类型定义
// ==========================================
// 职责: 导入管道共享的基础枚举类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 商品状态 (Product Status)
// ==========================================
// 序列化格式: lowercase (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,   // 在售
    Inactive, // 停用
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::Inactive => write!(f, "inactive"),
        }
    }
}

// ==========================================
// 引用实体类型 (Reference Entity Kind)
// ==========================================
// 用途: 外键解析的目标实体分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Warehouse, // 仓库
    Location,  // 库位
    Category,  // 商品分类
}

impl EntityKind {
    /// 面向用户的"未找到"错误消息（西语，与客户端展示一致）
    pub fn not_found_message(&self, value: &str) -> String {
        match self {
            EntityKind::Warehouse => format!("Almacén no encontrado: {}", value),
            EntityKind::Location => format!("Ubicación no encontrada: {}", value),
            EntityKind::Category => format!("Categoría no encontrada: {}", value),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Warehouse => write!(f, "warehouse"),
            EntityKind::Location => write!(f, "location"),
            EntityKind::Category => write!(f, "category"),
        }
    }
}

// ==========================================
// 未知列策略 (Unknown Column Policy)
// ==========================================
// 源系统各导入器行为不一: 商品导入阻断未知列, 其余忽略。
// 此处显式建模为逐模式配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnknownColumnPolicy {
    Reject, // 出现未声明列即文件级错误
    Ignore, // 忽略未声明列
}

// ==========================================
// 聚合策略 (Aggregation Policy)
// ==========================================
// SumByKey: 同一解析键的多行合并（数量求和, 其余字段后行覆盖）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationPolicy {
    PassThrough, // 按原行序直接写入
    SumByKey,    // 按键聚合后写入
}
