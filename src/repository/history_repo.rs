// ==========================================
// 仓库货位台账 - 变更台账仓储
// ==========================================
// 对齐: Items_BinLocations_History 表
// 红线: 只追加，不提供修改/删除接口
// ==========================================

mod core;
mod queries;


pub use self::core::HistoryRepository;
