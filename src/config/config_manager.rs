// ==========================================
// StaffAlloc - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 缺失或格式错误的配置项一律回落到默认值
// ==========================================

use crate::config::analytics_policy::AnalyticsPolicy;
use crate::db::open_sqlite_connection;
use crate::domain::period::YearMonth;
use crate::engine::calendar::{
    CapacityRule, DEFAULT_FIXED_MONTH_HOURS, DEFAULT_HOURS_PER_BUSINESS_DAY,
};
use crate::narration::{NarrationSettings, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::debug!(key, value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn get_parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 产能日历 =====

    /// 标准工时规则
    ///
    /// capacity_rule = "fixed" | "business_days"，未知值按 fixed 处理
    pub fn get_capacity_rule(&self) -> Result<CapacityRule, Box<dyn Error>> {
        let kind = self.get_config_or_default(config_keys::CAPACITY_RULE, "fixed")?;
        let rule = match kind.trim().to_ascii_lowercase().as_str() {
            "business_days" => CapacityRule::BusinessDays {
                hours_per_day: self.get_parsed_or(
                    config_keys::HOURS_PER_BUSINESS_DAY,
                    DEFAULT_HOURS_PER_BUSINESS_DAY,
                )?,
            },
            "fixed" => CapacityRule::Fixed {
                hours: self.get_parsed_or(config_keys::FIXED_MONTH_HOURS, DEFAULT_FIXED_MONTH_HOURS)?,
            },
            other => {
                tracing::warn!(rule = other, "未知的标准工时规则，使用 fixed");
                CapacityRule::Fixed {
                    hours: self
                        .get_parsed_or(config_keys::FIXED_MONTH_HOURS, DEFAULT_FIXED_MONTH_HOURS)?,
                }
            }
        };
        Ok(rule)
    }

    /// 单月工时覆写
    ///
    /// # 说明
    /// 配置格式为 JSON: {"2026-12": 140, "2027-03": 176}
    /// 无法解析的键被忽略；整体格式错误时返回空表
    pub fn get_month_hour_overrides(&self) -> Result<HashMap<YearMonth, i64>, Box<dyn Error>> {
        let raw = self.get_config_or_default(config_keys::MONTH_HOUR_OVERRIDES, "{}")?;
        let parsed: HashMap<String, i64> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "month_hour_overrides 格式错误，忽略");
                return Ok(HashMap::new());
            }
        };

        let mut overrides = HashMap::new();
        for (key, hours) in parsed {
            match parse_year_month(&key) {
                Some(period) => {
                    overrides.insert(period, hours);
                }
                None => tracing::warn!(key = %key, "无法解析的月份键，忽略"),
            }
        }
        Ok(overrides)
    }

    // ===== 分析阈值 =====

    pub fn get_idle_fte_threshold(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed_or(
            config_keys::IDLE_FTE_THRESHOLD,
            crate::engine::rebalance::DEFAULT_IDLE_FTE_THRESHOLD,
        )
    }

    pub fn get_max_shift_divisor(&self) -> Result<i64, Box<dyn Error>> {
        let divisor = self.get_parsed_or(
            config_keys::MAX_SHIFT_DIVISOR,
            crate::engine::rebalance::DEFAULT_MAX_SHIFT_DIVISOR,
        )?;
        Ok(divisor.max(1))
    }

    pub fn get_underutilized_ratio(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed_or(
            config_keys::UNDERUTILIZED_RATIO,
            crate::engine::forecast::DEFAULT_UNDERUTILIZED_RATIO,
        )
    }

    pub fn get_bench_fte_threshold(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed_or(
            config_keys::BENCH_FTE_THRESHOLD,
            crate::engine::reporting::DEFAULT_BENCH_FTE_THRESHOLD,
        )
    }

    /// 汇总分析策略
    pub fn load_analytics_policy(&self) -> Result<AnalyticsPolicy, Box<dyn Error>> {
        Ok(AnalyticsPolicy {
            capacity_rule: self.get_capacity_rule()?,
            month_overrides: self.get_month_hour_overrides()?,
            idle_fte_threshold: self.get_idle_fte_threshold()?,
            max_shift_divisor: self.get_max_shift_divisor()?,
            underutilized_ratio: self.get_underutilized_ratio()?,
            bench_fte_threshold: self.get_bench_fte_threshold()?,
        })
    }

    // ===== 叙述服务 =====

    /// 叙述服务配置（不含 API Key，API Key 只从环境变量读取）
    pub fn load_narration_settings(&self) -> Result<NarrationSettings, Box<dyn Error>> {
        let enabled = self.get_parsed_or(config_keys::NARRATION_ENABLED, true)?;
        let model = self.get_config_or_default(config_keys::NARRATION_MODEL, DEFAULT_MODEL)?;
        let model = if model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            model.trim().to_string()
        };
        let max_output_tokens = self
            .get_parsed_or(config_keys::NARRATION_MAX_OUTPUT_TOKENS, DEFAULT_MAX_OUTPUT_TOKENS)?
            .max(1);
        let timeout_secs = self
            .get_parsed_or(config_keys::NARRATION_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)?
            .max(1);

        Ok(NarrationSettings {
            enabled,
            model,
            max_output_tokens,
            timeout: Duration::from_secs(timeout_secs),
            api_key: None,
        })
    }
}

/// "YYYY-MM" -> YearMonth
fn parse_year_month(raw: &str) -> Option<YearMonth> {
    let (year, month) = raw.trim().split_once('-')?;
    YearMonth::new(year.parse().ok()?, month.parse().ok()?)
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 产能日历
    pub const CAPACITY_RULE: &str = "capacity_rule"; // fixed / business_days
    pub const FIXED_MONTH_HOURS: &str = "fixed_month_hours";
    pub const HOURS_PER_BUSINESS_DAY: &str = "hours_per_business_day";
    pub const MONTH_HOUR_OVERRIDES: &str = "month_hour_overrides"; // JSON

    // 分析阈值
    pub const IDLE_FTE_THRESHOLD: &str = "idle_fte_threshold";
    pub const MAX_SHIFT_DIVISOR: &str = "max_shift_divisor";
    pub const UNDERUTILIZED_RATIO: &str = "underutilized_ratio";
    pub const BENCH_FTE_THRESHOLD: &str = "bench_fte_threshold";

    // 叙述服务
    pub const NARRATION_ENABLED: &str = "narration_enabled";
    pub const NARRATION_MODEL: &str = "narration_model";
    pub const NARRATION_MAX_OUTPUT_TOKENS: &str = "narration_max_output_tokens";
    pub const NARRATION_TIMEOUT_SECS: &str = "narration_timeout_secs";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = manager();
        assert_eq!(config.load_analytics_policy().unwrap(), AnalyticsPolicy::default());

        let narration = config.load_narration_settings().unwrap();
        assert!(narration.enabled);
        assert_eq!(narration.model, DEFAULT_MODEL);
        assert_eq!(narration.api_key, None);
    }

    #[test]
    fn test_business_day_rule_and_overrides() {
        let config = manager();
        config
            .set_global_config_value(config_keys::CAPACITY_RULE, "business_days")
            .unwrap();
        config
            .set_global_config_value(config_keys::HOURS_PER_BUSINESS_DAY, "7")
            .unwrap();
        config
            .set_global_config_value(
                config_keys::MONTH_HOUR_OVERRIDES,
                r#"{"2026-12": 140, "bogus": 1}"#,
            )
            .unwrap();

        let policy = config.load_analytics_policy().unwrap();
        assert_eq!(policy.capacity_rule, CapacityRule::BusinessDays { hours_per_day: 7 });
        assert_eq!(policy.month_overrides.len(), 1);
        let calendar = policy.calendar();
        assert_eq!(calendar.standard_month_hours(2026, 12), 140);
        // 2026-02: 20 个工作日
        assert_eq!(calendar.standard_month_hours(2026, 2), 140);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = manager();
        config
            .set_global_config_value(config_keys::IDLE_FTE_THRESHOLD, "half")
            .unwrap();
        config
            .set_global_config_value(config_keys::MAX_SHIFT_DIVISOR, "0")
            .unwrap();
        config
            .set_global_config_value(config_keys::NARRATION_ENABLED, "false")
            .unwrap();

        assert_eq!(config.get_idle_fte_threshold().unwrap(), 0.5);
        assert_eq!(config.get_max_shift_divisor().unwrap(), 1);
        assert!(!config.load_narration_settings().unwrap().enabled);
    }

    #[test]
    fn test_snapshot_is_sorted_json() {
        let config = manager();
        config.set_global_config_value("b_key", "2").unwrap();
        config.set_global_config_value("a_key", "1").unwrap();
        config.set_global_config_value("a_key", "3").unwrap();
        assert_eq!(
            config.get_config_snapshot().unwrap(),
            r#"{"a_key":"3","b_key":"2"}"#
        );
    }
}
