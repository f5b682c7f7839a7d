// ==========================================
// StaffAlloc - 分析结果领域模型
// ==========================================
// 职责: 冲突记录、预测点、调配建议、人员推荐、报表结果
// 说明: 均为每次查询重新计算的临时对象，不落库
// ==========================================

use crate::domain::types::{ForecastRisk, RebalanceAction};
use serde::{Deserialize, Serialize};

// ==========================================
// 通用分析结果
// ==========================================

/// 分析结果：结构化列表 + 说明文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome<T> {
    pub items: Vec<T>,
    pub message: String,
}

impl<T> AnalysisOutcome<T> {
    pub fn new(items: Vec<T>, message: String) -> Self {
        Self { items, message }
    }

    pub fn empty(message: &str) -> Self {
        Self {
            items: Vec::new(),
            message: message.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ==========================================
// 超额分配冲突
// ==========================================

/// 冲突明细中的单个项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBreakdown {
    pub project_id: i64,
    pub project_name: String,
    pub hours: i64,
}

/// 超额分配冲突记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub user_id: i64,
    #[serde(rename = "employee")]
    pub employee_name: String,
    #[serde(rename = "month")]
    pub month_label: String,
    pub total_hours: i64,
    /// total_hours / standard_hours，保留 3 位小数
    pub fte: f64,
    /// 按工时降序
    pub projects: Vec<ProjectBreakdown>,
}

// ==========================================
// 产能预测
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "month")]
    pub month_label: String,
    pub projected_capacity_hours: i64,
    pub projected_allocated_hours: i64,
    pub surplus_hours: i64,
    pub risk: ForecastRisk,
}

// ==========================================
// 工作量调配建议
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceSuggestion {
    pub action: RebalanceAction,
    pub from_user_id: i64,
    pub from_employee: String,
    pub to_user_id: i64,
    pub to_employee: String,
    pub recommended_hours: i64,
}

// ==========================================
// 人员推荐
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffingCandidate {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub manager_id: Option<i64>,
    pub current_fte: f64,
    pub allocated_hours: i64,
    pub available_hours: i64,
}

// ==========================================
// 报表
// ==========================================

/// 员工月度时间线条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub year: i32,
    pub month: u32,
    pub total_hours: i64,
}

/// 项目看板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDashboard {
    pub project_id: i64,
    pub project_name: String,
    pub total_funded_hours: i64,
    pub total_allocated_hours: i64,
    pub utilization_pct: f64,
}

/// 组合看板中的单个员工利用率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUtilization {
    pub user_id: i64,
    pub full_name: String,
    pub allocated_hours: i64,
    pub fte: f64,
}

/// 组合（全员）月度利用率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioUtilization {
    pub year: i32,
    pub month: u32,
    pub standard_hours: i64,
    pub total_projects: usize,
    pub total_employees: usize,
    pub overall_utilization_pct: f64,
    pub over_allocated_employees: Vec<EmployeeUtilization>,
    pub bench_employees: Vec<EmployeeUtilization>,
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
