// ==========================================
// 仓库货位台账 - 命令行入口
// ==========================================
// 用法:
//   bin-location-ledger [--config PATH] <command> [args]
//
// 命令:
//   configure <db_path> [busy_timeout_ms]  保存主库连接参数
//   test-connection                        测试主库连接
//   init-schema                            在主库中建表（幂等）
//   list                                   全部货位记录
//   bins | unused-bins                     货位目录 / 空闲货位
//   history [record_id] [limit]            台账（最新在前）
//   stats                                  台账统计
//
// 查询结果以 JSON 输出到 stdout，日志输出到 stderr
// LOG_FORMAT=json 时日志为 JSON 格式
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;

use bin_location_ledger::config::{ConnectionConfigStore, ConnectionParams};
use bin_location_ledger::db::{configure_sqlite_connection, init_primary_schema};
use bin_location_ledger::domain::HistoryFilter;
use bin_location_ledger::{logging, BinLocationApi, ConnectionProvider, APP_NAME};

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| anyhow!("无法确定用户数据目录"))?;
    Ok(base.join(APP_NAME).join("config.db"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config_path = match args.iter().position(|a| a == "--config") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!("--config 需要一个路径参数");
            }
            let path = PathBuf::from(args.remove(idx + 1));
            args.remove(idx);
            path
        }
        None => default_config_path()?,
    };
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建配置目录: {}", parent.display()))?;
    }

    let store = Arc::new(ConnectionConfigStore::open(&config_path)?);
    let provider = ConnectionProvider::new(store.clone());
    let api = BinLocationApi::from_provider(provider.clone());

    let command = args.first().map(String::as_str).unwrap_or("list");
    match command {
        "configure" => {
            let db_path = args
                .get(1)
                .ok_or_else(|| anyhow!("用法: configure <db_path> [busy_timeout_ms]"))?;
            let mut params = ConnectionParams::new(db_path.as_str());
            if let Some(raw) = args.get(2) {
                params.busy_timeout_ms = raw.parse().context("busy_timeout_ms 必须是整数")?;
            }
            store.save(&params)?;
            print_json(&params)?;
        }
        "test-connection" => print_json(&provider.test_connection())?,
        "init-schema" => {
            let params = store
                .load()?
                .ok_or_else(|| anyhow!("尚未配置主库连接，请先执行 configure"))?;
            let conn = rusqlite::Connection::open(&params.database_path)?;
            configure_sqlite_connection(&conn, params.busy_timeout_ms)?;
            init_primary_schema(&conn)?;
            tracing::info!(database_path = %params.database_path, "主库表结构已就绪");
        }
        "list" => print_json(&api.list_bin_locations()?)?,
        "bins" => print_json(&api.list_bins()?)?,
        "unused-bins" => print_json(&api.list_unused_bins()?)?,
        "history" => {
            let mut filter = HistoryFilter::new();
            if let Some(raw) = args.get(1) {
                filter = filter.record(raw.parse().context("record_id 必须是整数")?);
            }
            if let Some(raw) = args.get(2) {
                filter = filter.limit(raw.parse().context("limit 必须是非负整数")?);
            }
            print_json(&api.history(&filter)?)?;
        }
        "stats" => print_json(&api.history_stats()?)?,
        other => bail!("未知命令: {}", other),
    }

    Ok(())
}
