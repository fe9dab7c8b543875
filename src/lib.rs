// ==========================================
// 仓库货位台账 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 货位分配记录引擎 + 只追加的变更台账
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 主库连接参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    BinInfo, BinLocationInput, BinLocationRecord, BinLocationView, HistoryEntry, HistoryFilter,
    HistoryStats, OperationKind, ProductInfo, ProductSearchField, RecordSnapshot, RecordState,
};

pub use repository::{
    BinLocationRepository, ConnectionProvider, HistoryRepository, RepositoryError,
    RepositoryResult, TrusteeRepository,
};

pub use config::{ConnectionConfigReader, ConnectionConfigStore, ConnectionParams};

pub use api::{ApiError, ApiResult, AuditStatus, AuthApi, BinLocationApi, WriteOutcome};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "bin-location-ledger";
