// ==========================================
// 仓库货位台账 - 领域模型层
// ==========================================
// 职责: 定义货位记录、台账条目、查询条件等实体
// 红线: 不含数据访问逻辑
// ==========================================

pub mod bin_location;
pub mod history;
pub mod trustee;

// 重导出核心类型
pub use bin_location::{
    total_quantity, BinInfo, BinLocationInput, BinLocationRecord, BinLocationView, ProductInfo,
    ProductSearchField, RecordSnapshot, RecordState, RecordTransition,
};
pub use history::{
    HistoryEntry, HistoryFilter, HistoryStats, NewHistoryEntry, OperationKind,
    DEFAULT_HISTORY_LIMIT,
};
pub use trustee::AuthenticatedUser;
