// ==========================================
// StaffAlloc - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一个 SQLite 连接；叙述器随 AppState 存活到进程结束
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{InsightsApi, ReportApi};
use crate::config::config_manager::ConfigManager;
use crate::config::AnalyticsPolicy;
use crate::engine::{StaffingDataSource, StaffingRepositories};
use crate::narration::{build_narrator, Narrator};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "STAFF_ALLOC_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合（同时作为分析数据源）
    pub repositories: StaffingRepositories,

    /// 启动时加载的分析策略
    pub policy: AnalyticsPolicy,

    /// 叙述器
    pub narrator: Arc<dyn Narrator>,

    /// 产能分析API
    pub insights_api: Arc<InsightsApi>,

    /// 报表API
    pub report_api: Arc<ReportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并幂等建表
    /// 2. 初始化所有Repository
    /// 3. 从 config_kv 加载分析策略与叙述配置（API Key 取自环境变量）
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::build(db_path, None)
    }

    /// 使用外部提供的叙述器创建AppState（测试或离线场景）
    pub fn with_narrator(db_path: String, narrator: Arc<dyn Narrator>) -> Result<Self, String> {
        Self::build(db_path, Some(narrator))
    }

    fn build(db_path: String, narrator: Option<Arc<dyn Narrator>>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repositories = StaffingRepositories::from_connection(conn.clone());

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let policy = config_manager
            .load_analytics_policy()
            .map_err(|e| format!("无法加载分析策略: {}", e))?;
        tracing::info!(rule = ?policy.capacity_rule, overrides = policy.month_overrides.len(), "分析策略已加载");

        let narrator = match narrator {
            Some(narrator) => narrator,
            None => {
                let settings = config_manager
                    .load_narration_settings()
                    .map_err(|e| format!("无法加载叙述配置: {}", e))?
                    .with_api_key_from_env();
                if settings.enabled && settings.api_key.is_none() {
                    tracing::warn!("未配置 {}，分析结果将使用固定说明文本", crate::narration::API_KEY_ENV);
                }
                build_narrator(&settings)
            }
        };

        // ==========================================
        // 创建API实例
        // ==========================================
        let data: Arc<dyn StaffingDataSource> = Arc::new(repositories.clone());
        let insights_api = Arc::new(InsightsApi::new(data.clone(), narrator.clone(), policy.clone()));
        let report_api = Arc::new(ReportApi::new(data, policy.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            repositories,
            policy,
            narrator,
            insights_api,
            report_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先使用环境变量 STAFF_ALLOC_DB_PATH，其次为用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./staff_alloc.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("staff-alloc-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("staff-alloc");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("staff_alloc.db");
    }

    path.to_string_lossy().to_string()
}
