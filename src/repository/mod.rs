// ==========================================
// 仓库货位台账 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务编排
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 每个操作独立打开/关闭主库连接
// ==========================================

pub mod bin_location_repo;
pub mod connection;
pub mod error;
pub mod history_repo;
pub mod sql_builder;
pub mod trustee_repo;

// 重导出核心仓储
pub use bin_location_repo::BinLocationRepository;
pub use connection::{ConnectionProvider, ConnectionTestResult};
pub use error::{RepositoryError, RepositoryResult};
pub use history_repo::HistoryRepository;
pub use trustee_repo::TrusteeRepository;
