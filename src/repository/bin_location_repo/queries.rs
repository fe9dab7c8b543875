use super::core::{map_state, BinLocationRepository, STATE_SELECT};
use super::{MIN_SEARCH_LEN, SEARCH_RESULT_LIMIT};
use crate::domain::bin_location::{BinInfo, BinLocationView, ProductInfo, ProductSearchField};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Result as SqliteResult, Row};
use tracing::debug;

impl BinLocationRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 全部记录（关联货位名称与每箱件数），按货位名称、商品描述排序
    ///
    /// 不分页；单仓库规模下可接受
    pub fn list(&self) -> RepositoryResult<Vec<BinLocationView>> {
        let conn = self.open()?;

        let sql = format!(
            r#"
            SELECT * FROM (
                {}
            ) s
            LEFT JOIN BinLocations_tbl bl ON s.BinLocationID = bl.BinLocationID
            ORDER BY bl.BinLocation, s.ProductDescription, s.id
            "#,
            STATE_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let views = stmt
            .query_map([], map_view)?
            .collect::<SqliteResult<Vec<_>>>()?;

        debug!(count = views.len(), "查询货位记录列表");
        Ok(views)
    }

    /// 搜索商品目录
    ///
    /// - 大小写不敏感的子串匹配（SQLite LIKE 只折叠 ASCII 字母，`É`/`é` 视为不同字符）
    /// - 单独的 `%` 表示匹配全部
    /// - 其他少于 2 个字符的关键字直接返回空
    pub fn search_products(
        &self,
        query: &str,
        field: ProductSearchField,
    ) -> RepositoryResult<Vec<ProductInfo>> {
        let pattern = match like_pattern(query) {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };

        let conn = self.open()?;
        let column = field.column();
        let sql = format!(
            r#"
            SELECT ProductID, ProductUPC, ProductSKU, ProductDescription,
                   COALESCE(UnitQty2, 0) AS UnitQty2
            FROM Items_tbl
            WHERE {column} IS NOT NULL
              AND {column} LIKE ?1 ESCAPE '\'
            ORDER BY ProductDescription
            LIMIT ?2
            "#,
            column = column
        );
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![pattern, SEARCH_RESULT_LIMIT], |row| {
                Ok(ProductInfo {
                    product_id: row.get(0)?,
                    product_upc: row.get(1)?,
                    product_sku: row.get(2)?,
                    product_description: row.get(3)?,
                    units_per_case: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        debug!(query, ?field, count = products.len(), "搜索商品目录");
        Ok(products)
    }

    /// 按名称搜索货位（规则同商品搜索，大小写折叠同样仅限 ASCII）
    pub fn search_bins(&self, query: &str) -> RepositoryResult<Vec<BinInfo>> {
        let pattern = match like_pattern(query) {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };

        let conn = self.open()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT BinLocationID, BinLocation
            FROM BinLocations_tbl
            WHERE BinLocation IS NOT NULL
              AND BinLocation LIKE ?1 ESCAPE '\'
            ORDER BY BinLocation
            LIMIT ?2
            "#,
        )?;
        let bins = stmt
            .query_map(params![pattern, SEARCH_RESULT_LIMIT], map_bin)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(bins)
    }

    /// 全部货位
    pub fn list_bins(&self) -> RepositoryResult<Vec<BinInfo>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT BinLocationID, BinLocation
            FROM BinLocations_tbl
            WHERE BinLocation IS NOT NULL
            ORDER BY BinLocation
            "#,
        )?;
        let bins = stmt
            .query_map([], map_bin)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(bins)
    }

    /// 未被任何记录占用的货位
    pub fn list_unused_bins(&self) -> RepositoryResult<Vec<BinInfo>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT bl.BinLocationID, bl.BinLocation
            FROM BinLocations_tbl bl
            WHERE bl.BinLocation IS NOT NULL
              AND NOT EXISTS (
                  SELECT 1 FROM Items_BinLocations ibl
                  WHERE ibl.BinLocationID = bl.BinLocationID
              )
            ORDER BY bl.BinLocation
            "#,
        )?;
        let bins = stmt
            .query_map([], map_bin)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(bins)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 构造 LIKE 模式；关键字太短时返回 None
pub(super) fn like_pattern(query: &str) -> Option<String> {
    let q = query.trim();
    if q == "%" {
        return Some("%".to_string());
    }
    if q.chars().count() < MIN_SEARCH_LEN {
        return None;
    }

    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

/// STATE_SELECT 列 0..=7 + BinLocations_tbl(BinLocationID, BinLocation) 列 8..=9
fn map_view(row: &Row) -> SqliteResult<BinLocationView> {
    let state = map_state(row)?;
    let total_quantity = state.total_quantity();
    Ok(BinLocationView {
        record: state.record,
        bin_location: row.get(9)?,
        units_per_case: state.units_per_case,
        total_quantity,
    })
}

fn map_bin(row: &Row) -> SqliteResult<BinInfo> {
    Ok(BinInfo {
        bin_location_id: row.get(0)?,
        bin_location: row.get(1)?,
    })
}
