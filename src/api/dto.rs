// ==========================================
// StaffAlloc - API DTO 定义
// ==========================================
// 职责: 定义分析 / 报表接口的请求和响应结构
// 说明: 字段名与前端 JSON 口径一致
// ==========================================

use crate::domain::analytics::{
    ConflictRecord, EmployeeUtilization, ForecastPoint, RebalanceSuggestion, StaffingCandidate,
    TimelineEntry,
};
use serde::{Deserialize, Serialize};

// ==========================================
// 分析接口
// ==========================================

/// 超额分配冲突扫描响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictScanResponse {
    pub conflicts: Vec<ConflictRecord>,
    pub message: String,
}

/// 产能预测响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    /// 预测月数
    pub forecast_period_months: u32,
    /// 从当月开始按时间顺序
    pub predictions: Vec<ForecastPoint>,
    pub message: String,
}

/// 工作量调配建议响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSuggestionsResponse {
    /// None 表示全组合范围
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    pub suggestions: Vec<RebalanceSuggestion>,
    pub message: String,
}

/// 人员推荐请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffingRecommendationRequest {
    pub project_id: i64,
    pub year: i32,
    pub month: u32,
    pub required_hours: i64,

    /// 目标角色（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i64>,

    /// 目标 LCAT（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcat_id: Option<i64>,
}

/// 人员推荐响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffingRecommendationResponse {
    pub candidates: Vec<StaffingCandidate>,
    pub reasoning: String,
}

// ==========================================
// 报表接口
// ==========================================

/// 员工时间线请求（起止月份均可选，闭区间）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeTimelineRequest {
    pub employee_id: i64,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub start_month: Option<u32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub end_month: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeTimelineResponse {
    pub employee_id: i64,
    pub employee_name: String,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDashboardResponse {
    pub project_id: i64,
    pub project_name: String,
    pub total_funded_hours: i64,
    pub total_allocated_hours: i64,
    pub utilization_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioDashboardResponse {
    pub year: i32,
    pub month: u32,
    pub month_label: String,
    pub standard_hours: i64,
    pub total_projects: usize,
    pub total_employees: usize,
    pub overall_utilization_pct: f64,
    pub over_allocated_employees: Vec<EmployeeUtilization>,
    /// FTE 低于闲置阈值的员工
    pub bench_employees: Vec<EmployeeUtilization>,
}
