// ==========================================
// 仓库货位台账 - SQL 构建工具
// ==========================================
// 职责: 动态拼接可选过滤条件
// 红线: 条件值一律以参数绑定，不拼接进 SQL 文本
// ==========================================

use rusqlite::types::Value;

/// SQL 查询构建器（流式 API）
///
/// 条件文本与绑定值成对保存，按添加顺序输出，条件之间以 AND 连接。
///
/// # 示例
/// ```
/// use bin_location_ledger::repository::sql_builder::SqlQueryBuilder;
///
/// let query = SqlQueryBuilder::new("SELECT * FROM Items_BinLocations_History h")
///     .and_if(Some(42_i64), "h.RecordID = ?")
///     .and_if(None::<String>, "h.Username = ?")
///     .order_by("h.Timestamp DESC")
///     .limit(Some(10));
///
/// assert_eq!(
///     query.sql(),
///     "SELECT * FROM Items_BinLocations_History h WHERE h.RecordID = ? \
///      ORDER BY h.Timestamp DESC LIMIT ?"
/// );
/// assert_eq!(query.params().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    select_clause: String,
    where_clauses: Vec<String>,
    params: Vec<Value>,
    order_by_clause: Option<String>,
    limit_clause: Option<i64>,
}

impl SqlQueryBuilder {
    /// 创建新的 SQL 查询构建器
    pub fn new(select: &str) -> Self {
        Self {
            select_clause: select.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_clause: None,
            limit_clause: None,
        }
    }

    /// 添加带一个绑定值的条件
    pub fn and(mut self, condition: &str, value: impl Into<Value>) -> Self {
        self.where_clauses.push(condition.to_string());
        self.params.push(value.into());
        self
    }

    /// 值存在时才添加条件
    pub fn and_if<V: Into<Value>>(self, value: Option<V>, condition: &str) -> Self {
        match value {
            Some(v) => self.and(condition, v),
            None => self,
        }
    }

    /// 添加 ORDER BY 子句
    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by_clause = Some(order.to_string());
        self
    }

    /// 添加 LIMIT 子句；None 表示不限
    pub fn limit(mut self, n: Option<u32>) -> Self {
        self.limit_clause = n.map(i64::from);
        self
    }

    /// 构建最终的 SQL 语句
    pub fn sql(&self) -> String {
        let mut sql = self.select_clause.clone();

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(order) = &self.order_by_clause {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if self.limit_clause.is_some() {
            sql.push_str(" LIMIT ?");
        }

        sql
    }

    /// 按占位符顺序排列的绑定值
    pub fn params(&self) -> Vec<Value> {
        let mut params = self.params.clone();
        if let Some(n) = self.limit_clause {
            params.push(Value::Integer(n));
        }
        params
    }
}
