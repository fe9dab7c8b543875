// ==========================================
// 仓库货位台账 - 配置层
// ==========================================
// 职责: 保存/读取主库连接参数
// 存储: 本地 SQLite 配置库 config 表（单行）
// ==========================================

pub mod connection_config;

// 重导出核心配置类型
pub use connection_config::{ConnectionConfigReader, ConnectionConfigStore, ConnectionParams};
