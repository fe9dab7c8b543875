// ==========================================
// 仓库货位台账 - 货位分配领域模型
// ==========================================
// 对齐: Items_BinLocations / Items_tbl / BinLocations_tbl 表
// 红线: TotalQuantity 只在读取时计算，不落库
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 计算总件数: 箱数 × 每箱件数（每箱件数未设置或非正数时为 0）
///
/// 乘积超出 i64 范围时取边界值
pub fn total_quantity(qty_cases: Option<i64>, units_per_case: i64) -> i64 {
    if units_per_case > 0 {
        qty_cases.unwrap_or(0).saturating_mul(units_per_case)
    } else {
        0
    }
}

// ==========================================
// BinLocationRecord - 货位分配记录
// ==========================================
// 对齐: Items_BinLocations 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinLocationRecord {
    pub id: i64,                             // 记录ID
    pub product_upc: String,                 // 商品UPC
    pub product_description: Option<String>, // 商品描述
    pub qty_cases: Option<i64>,              // 箱数 (null 视为 0)
    pub bin_location_id: i64,                // 货位ID (BinLocations_tbl 外键)
    pub created_at: NaiveDateTime,           // 创建时间
    pub last_update: NaiveDateTime,          // 最后更新时间
}

// ==========================================
// BinLocationView - 列表展示行
// ==========================================
// 记录 + 货位名称 + 每箱件数 + 计算出的总件数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinLocationView {
    #[serde(flatten)]
    pub record: BinLocationRecord,
    pub bin_location: Option<String>, // 货位被删除时为空（LEFT JOIN）
    pub units_per_case: i64,
    pub total_quantity: i64,
}

// ==========================================
// RecordSnapshot - 台账快照
// ==========================================
// 某一时刻记录的全部可变字段 + 商品目录中的每箱件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub product_upc: String,
    pub product_description: Option<String>,
    pub qty_cases: Option<i64>,
    pub bin_location_id: i64,
    pub units_per_case: i64,
}

// ==========================================
// RecordState - 记录完整状态（变更前/变更后）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordState {
    pub record: BinLocationRecord,
    pub units_per_case: i64,
}

impl RecordState {
    /// 提取台账快照
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            product_upc: self.record.product_upc.clone(),
            product_description: self.record.product_description.clone(),
            qty_cases: self.record.qty_cases,
            bin_location_id: self.record.bin_location_id,
            units_per_case: self.units_per_case,
        }
    }

    pub fn total_quantity(&self) -> i64 {
        total_quantity(self.record.qty_cases, self.units_per_case)
    }
}

// ==========================================
// RecordTransition - 一次写操作的前后状态
// ==========================================
// previous 为空: CREATE; current 为空: DELETE
#[derive(Debug, Clone)]
pub struct RecordTransition {
    pub record_id: i64,
    pub previous: Option<RecordState>,
    pub current: Option<RecordState>,
}

// ==========================================
// BinLocationInput - 新建/修改入参
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinLocationInput {
    pub product_upc: String,
    pub product_description: Option<String>,
    pub qty_cases: Option<i64>,
    pub bin_location_id: Option<i64>,
    pub units_per_case: Option<i64>, // 提供时同步更新 Items_tbl.UnitQty2
}

impl BinLocationInput {
    /// 必填字段校验，返回货位ID
    ///
    /// HTTP 层已做同样的校验，这里再防御一次
    pub fn validate(&self) -> RepositoryResult<i64> {
        if self.product_upc.trim().is_empty() {
            return Err(RepositoryError::missing_field("product_upc"));
        }
        let bin_location_id = self
            .bin_location_id
            .ok_or_else(|| RepositoryError::missing_field("bin_location_id"))?;
        if let Some(units) = self.units_per_case {
            if units < 0 {
                return Err(RepositoryError::FieldValueError {
                    field: "units_per_case".to_string(),
                    message: format!("每箱件数不能为负数: {}", units),
                });
            }
        }
        Ok(bin_location_id)
    }
}

// ==========================================
// 参考数据: 商品目录 / 货位目录
// ==========================================

/// 商品搜索字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductSearchField {
    Description,
    Upc,
    Sku,
}

impl ProductSearchField {
    /// 对应的 Items_tbl 列名
    pub fn column(&self) -> &'static str {
        match self {
            ProductSearchField::Description => "ProductDescription",
            ProductSearchField::Upc => "ProductUPC",
            ProductSearchField::Sku => "ProductSKU",
        }
    }

    /// 从字符串解析（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "description" => Some(ProductSearchField::Description),
            "upc" => Some(ProductSearchField::Upc),
            "sku" => Some(ProductSearchField::Sku),
            _ => None,
        }
    }
}

/// 商品目录条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_id: i64,
    pub product_upc: Option<String>,
    pub product_sku: Option<String>,
    pub product_description: Option<String>,
    pub units_per_case: i64,
}

/// 货位目录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinInfo {
    pub bin_location_id: i64,
    pub bin_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_quantity() {
        assert_eq!(total_quantity(Some(4), 12), 48);
        assert_eq!(total_quantity(None, 12), 0);
        assert_eq!(total_quantity(Some(4), 0), 0);
        assert_eq!(total_quantity(Some(4), -3), 0);
        assert_eq!(total_quantity(Some(-2), 6), -12);
    }

    #[test]
    fn test_total_quantity_saturates_on_overflow() {
        assert_eq!(total_quantity(Some(i64::MAX / 2), 6), i64::MAX);
        assert_eq!(total_quantity(Some(i64::MIN / 2), 6), i64::MIN);
    }

    #[test]
    fn test_input_validation() {
        let mut input = BinLocationInput {
            product_upc: "000111".to_string(),
            bin_location_id: Some(3),
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap(), 3);

        input.bin_location_id = None;
        assert!(matches!(
            input.validate(),
            Err(RepositoryError::FieldValueError { ref field, .. }) if field == "bin_location_id"
        ));

        input.bin_location_id = Some(3);
        input.product_upc = "  ".to_string();
        assert!(matches!(
            input.validate(),
            Err(RepositoryError::FieldValueError { ref field, .. }) if field == "product_upc"
        ));
    }

    #[test]
    fn test_search_field_parse() {
        assert_eq!(ProductSearchField::parse("UPC"), Some(ProductSearchField::Upc));
        assert_eq!(ProductSearchField::parse(" sku "), Some(ProductSearchField::Sku));
        assert_eq!(
            ProductSearchField::parse("description"),
            Some(ProductSearchField::Description)
        );
        assert_eq!(ProductSearchField::parse("name"), None);
    }
}
