// ==========================================
// 库存管理系统 - 条目聚合器实现
// ==========================================
// 阶段 5 (可选): 同键条目合并
// 策略: 数量求和; 非数量字段后行覆盖 ("last one wins")。
//       这是刻意策略, 容易被误读, 勿改。
// 仅声明 SumByKey 的模式调用; 其余模式保持原行序直写。
// ==========================================

use crate::domain::import::ValidatedEntry;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub struct EntryAggregator;

impl EntryAggregator {
    /// 按条目键合并, 保持键的首见顺序
    pub fn accumulate(&self, entries: Vec<ValidatedEntry>) -> Vec<ValidatedEntry> {
        let mut order: Vec<String> = Vec::new();
        let mut merged: HashMap<String, ValidatedEntry> = HashMap::new();

        for entry in entries {
            match merged.entry(entry.key.clone()) {
                Entry::Vacant(slot) => {
                    order.push(entry.key.clone());
                    slot.insert(entry);
                }
                Entry::Occupied(mut slot) => {
                    let sum = slot.get().quantity.unwrap_or(0.0) + entry.quantity.unwrap_or(0.0);

                    // 后行覆盖非数量字段 (含行号), 数量写回求和值
                    let mut combined = entry;
                    combined.quantity = Some(sum);
                    if let Some(q) = combined.payload.get_mut("quantity") {
                        *q = serde_json::json!(sum);
                    }
                    slot.insert(combined);
                }
            }
        }

        order
            .into_iter()
            .filter_map(|key| merged.remove(&key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(row: usize, key: &str, quantity: f64, unit_price: f64) -> ValidatedEntry {
        ValidatedEntry {
            row_number: row,
            key: key.to_string(),
            quantity: Some(quantity),
            payload: json!({
                "product_id": key,
                "quantity": quantity,
                "unit_price": unit_price,
            }),
        }
    }

    #[test]
    fn test_same_key_sums_quantity() {
        let merged = EntryAggregator.accumulate(vec![
            entry(2, "p1", 3.0, 10.0),
            entry(3, "p1", 2.0, 12.0),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, Some(5.0));
        assert_eq!(merged[0].payload["quantity"], 5.0);
    }

    #[test]
    fn test_non_numeric_fields_last_row_wins() {
        let merged = EntryAggregator.accumulate(vec![
            entry(2, "p1", 3.0, 10.0),
            entry(3, "p1", 2.0, 12.0),
        ]);

        assert_eq!(merged[0].payload["unit_price"], 12.0);
        assert_eq!(merged[0].row_number, 3);
    }

    #[test]
    fn test_distinct_keys_preserve_first_seen_order() {
        let merged = EntryAggregator.accumulate(vec![
            entry(2, "p2", 1.0, 5.0),
            entry(3, "p1", 1.0, 5.0),
            entry(4, "p2", 4.0, 6.0),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].key, "p2");
        assert_eq!(merged[0].quantity, Some(5.0));
        assert_eq!(merged[1].key, "p1");
    }
}
