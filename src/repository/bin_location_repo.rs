// ==========================================
// 仓库货位台账 - 货位分配记录仓储
// ==========================================
// 对齐: Items_BinLocations（读写）、Items_tbl（每箱件数写入）、
//       BinLocations_tbl（只读）
// 红线: 所有查询使用参数化
// ==========================================

mod core;
mod queries;


pub use self::core::BinLocationRepository;

/// 搜索结果上限
pub const SEARCH_RESULT_LIMIT: i64 = 50;

/// 搜索关键字最小长度（单独的 `%` 除外）
pub const MIN_SEARCH_LEN: usize = 2;
