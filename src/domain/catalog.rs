// ==========================================
// 库存管理系统 - 目录领域模型
// ==========================================
// 职责: 商品/仓库/库位/分类 实体与运行期参照快照
// 红线: 导入层只读参照数据, 不在此层做数据访问
// ==========================================

use crate::domain::types::ProductStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// Product - 商品主数据
// ==========================================
// 用途: 参照解析 (SKU→商品) 与采购单行的目录单价回退
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,                  // 商品唯一标识 (UUID)
    pub sku: Option<String>,         // SKU (目录内唯一, 可空)
    pub name: String,                // 商品名称
    pub purchase_price: Option<f64>, // 采购价
    pub sale_price: Option<f64>,     // 销售价
    pub status: ProductStatus,       // 商品状态
}

// ==========================================
// Warehouse - 仓库
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,   // 仓库唯一标识 (UUID)
    pub name: String, // 仓库名称
}

// ==========================================
// Location - 库位
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,                    // 库位唯一标识 (UUID)
    pub name: String,                  // 库位名称
    pub warehouse_id: Option<String>,  // 所属仓库
}

// ==========================================
// Category - 商品分类
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,   // 分类唯一标识 (UUID)
    pub name: String, // 分类名称
}

// ==========================================
// ReferenceSnapshot - 参照数据快照
// ==========================================
// 生命周期: 单次导入运行开始时加载一次, 运行期间只读。
// 运行中新建实体的 id 归属运行态的独立可变集合, 不回写本快照。
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    pub products: Vec<Product>,
    pub warehouses: Vec<Warehouse>,
    pub locations: Vec<Location>,
    pub categories: Vec<Category>,
    pub existing_serials: HashSet<String>, // 系统中已登记的序列号
}

impl ReferenceSnapshot {
    /// 系统中已存在的 SKU 集合（原样大小写）
    pub fn existing_skus(&self) -> HashSet<String> {
        self.products
            .iter()
            .filter_map(|p| p.sku.clone())
            .collect()
    }

    /// 系统中已存在的库位名集合（小写化, 供名称查重）
    pub fn existing_location_names(&self) -> HashSet<String> {
        self.locations
            .iter()
            .map(|l| l.name.trim().to_lowercase())
            .collect()
    }
}
