// ==========================================
// 库存管理系统 - 参照解析器实现
// ==========================================
// 阶段 3: 外键字段解析 (SKU→商品, 名称或id→仓库/库位/分类)
// 约束: 索引每次运行构建一次, 运行期间只读;
//       同名实体为后插入者胜出 (不做碰撞检测, 保持源行为)。
// ==========================================

use crate::domain::catalog::{Product, ReferenceSnapshot};
use crate::domain::import::NormalizedRow;
use crate::domain::types::EntityKind;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

// ==========================================
// ReferenceIndex - 运行期参照索引
// ==========================================
pub struct ReferenceIndex {
    products_by_sku: HashMap<String, Product>,
    warehouses_by_name: HashMap<String, String>,
    warehouse_ids: HashSet<String>,
    locations_by_name: HashMap<String, String>,
    location_ids: HashSet<String>,
    categories_by_name: HashMap<String, String>,
    category_ids: HashSet<String>,
}

impl ReferenceIndex {
    /// 从参照快照构建索引
    ///
    /// 名称键小写化 + trim; 重名实体后者覆盖前者。
    pub fn build(snapshot: &ReferenceSnapshot) -> Self {
        let mut products_by_sku = HashMap::new();
        for product in &snapshot.products {
            if let Some(sku) = &product.sku {
                let key = sku.trim().to_string();
                if !key.is_empty() {
                    products_by_sku.insert(key, product.clone());
                }
            }
        }

        let mut warehouses_by_name = HashMap::new();
        let mut warehouse_ids = HashSet::new();
        for w in &snapshot.warehouses {
            warehouses_by_name.insert(w.name.trim().to_lowercase(), w.id.clone());
            warehouse_ids.insert(w.id.clone());
        }

        let mut locations_by_name = HashMap::new();
        let mut location_ids = HashSet::new();
        for l in &snapshot.locations {
            locations_by_name.insert(l.name.trim().to_lowercase(), l.id.clone());
            location_ids.insert(l.id.clone());
        }

        let mut categories_by_name = HashMap::new();
        let mut category_ids = HashSet::new();
        for c in &snapshot.categories {
            categories_by_name.insert(c.name.trim().to_lowercase(), c.id.clone());
            category_ids.insert(c.id.clone());
        }

        Self {
            products_by_sku,
            warehouses_by_name,
            warehouse_ids,
            locations_by_name,
            location_ids,
            categories_by_name,
            category_ids,
        }
    }

    /// SKU → 商品
    pub fn product_by_sku(&self, sku: &str) -> Option<&Product> {
        self.products_by_sku.get(sku.trim())
    }

    /// 解析单值参照字段 (id 或名称)
    ///
    /// UUID 形值只查 id 集合: 语法合法但系统中不存在的 id
    /// 是 NotFound, 不被静默放行。非 UUID 形值按小写化名称查找。
    ///
    /// # 返回
    /// - Ok(id): 解析成功
    /// - Err(message): 未找到（调用方附加行号）
    pub fn resolve(&self, kind: EntityKind, value: &str) -> Result<String, String> {
        let trimmed = value.trim();
        let (ids, by_name) = match kind {
            EntityKind::Warehouse => (&self.warehouse_ids, &self.warehouses_by_name),
            EntityKind::Location => (&self.location_ids, &self.locations_by_name),
            EntityKind::Category => (&self.category_ids, &self.categories_by_name),
        };

        if Uuid::parse_str(trimmed).is_ok() {
            if ids.contains(trimmed) {
                return Ok(trimmed.to_string());
            }
            return Err(kind.not_found_message(trimmed));
        }

        by_name
            .get(&trimmed.to_lowercase())
            .cloned()
            .ok_or_else(|| kind.not_found_message(trimmed))
    }

    /// 解析 id 列 / 名称列 成对出现的参照
    ///
    /// 优先级: id 列非空时只看 id 列; 名称列仅在 id 列缺失或
    /// 空白时参与。两列均空返回 Ok(None)。
    pub fn resolve_pair(
        &self,
        row: &NormalizedRow,
        kind: EntityKind,
        id_column: &str,
        name_column: &str,
    ) -> Result<Option<String>, String> {
        if let Some(id_value) = row.text(id_column) {
            return self.resolve(kind, &id_value).map(Some);
        }
        if let Some(name_value) = row.text(name_column) {
            return self.resolve(kind, &name_value).map(Some);
        }
        Ok(None)
    }
}
