// ==========================================
// StaffAlloc - 产能分析 API
// ==========================================
// 职责: 读取数据源快照 -> 调用分析引擎 -> 组装响应 DTO
// 接口: 冲突扫描 / 产能预测 / 工作量调配 / 人员推荐
// 说明: 冲突、预测、调配的叙述失败只降级为固定说明；人员推荐的叙述失败上抛
// ==========================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::dto::{
    BalanceSuggestionsResponse, ConflictScanResponse, ForecastResponse,
    StaffingRecommendationRequest, StaffingRecommendationResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::config::AnalyticsPolicy;
use crate::domain::period::YearMonth;
use crate::domain::staffing::{MonthlyUserTotal, ProjectAssignment};
use crate::engine::{
    CandidatePool, ConflictScanner, ForecastProjector, RebalanceScope, StaffingDataSource,
    StaffingRecommender, StaffingRequest, WorkloadRebalancer,
};
use crate::narration::Narrator;

/// 预测默认月数
pub const DEFAULT_FORECAST_MONTHS: u32 = 3;

/// 预测月数上限
pub const MAX_FORECAST_MONTHS: u32 = 24;

// ==========================================
// InsightsApi - 产能分析 API
// ==========================================
pub struct InsightsApi {
    data: Arc<dyn StaffingDataSource>,
    narrator: Arc<dyn Narrator>,
    policy: AnalyticsPolicy,
}

impl InsightsApi {
    pub fn new(
        data: Arc<dyn StaffingDataSource>,
        narrator: Arc<dyn Narrator>,
        policy: AnalyticsPolicy,
    ) -> Self {
        Self {
            data,
            narrator,
            policy,
        }
    }

    pub fn policy(&self) -> &AnalyticsPolicy {
        &self.policy
    }

    // ==========================================
    // 冲突扫描
    // ==========================================

    /// 扫描所有月份的超额分配
    pub fn scan_conflicts(&self) -> ApiResult<ConflictScanResponse> {
        tracing::info!("开始冲突扫描");
        let tallies = self.data.monthly_user_project_allocations()?;
        let employees = self.data.active_employees()?;

        let outcome = ConflictScanner::new(self.policy.calendar()).scan(
            &tallies,
            &employees,
            self.narrator.as_ref(),
        );

        Ok(ConflictScanResponse {
            conflicts: outcome.items,
            message: outcome.message,
        })
    }

    // ==========================================
    // 产能预测
    // ==========================================

    /// 从今天所在月份开始预测
    pub fn forecast(&self, months_ahead: u32) -> ApiResult<ForecastResponse> {
        self.forecast_from(today(), months_ahead)
    }

    /// 从指定日期所在月份开始预测
    ///
    /// # 参数
    /// - months_ahead: 1..=24
    pub fn forecast_from(&self, today: NaiveDate, months_ahead: u32) -> ApiResult<ForecastResponse> {
        if months_ahead == 0 || months_ahead > MAX_FORECAST_MONTHS {
            return Err(ApiError::InvalidInput(format!(
                "months_ahead 必须在 1..={} 之间: {}",
                MAX_FORECAST_MONTHS, months_ahead
            )));
        }

        tracing::info!(months_ahead, %today, "开始产能预测");
        let employees = self.data.active_employees()?;
        let tallies = self.data.monthly_user_project_allocations()?;

        let outcome = ForecastProjector::new(self.policy.calendar())
            .with_underutilized_ratio(self.policy.underutilized_ratio)
            .forecast(
                today,
                months_ahead,
                employees.len(),
                &tallies,
                self.narrator.as_ref(),
            );

        Ok(ForecastResponse {
            forecast_period_months: months_ahead,
            predictions: outcome.items,
            message: outcome.message,
        })
    }

    // ==========================================
    // 工作量调配
    // ==========================================

    /// 当月工作量调配建议
    ///
    /// project_id 为 None 时覆盖全部在职员工；否则只看该项目的分派成员
    pub fn balance_suggestions(&self, project_id: Option<i64>) -> ApiResult<BalanceSuggestionsResponse> {
        self.balance_suggestions_at(today(), project_id)
    }

    pub fn balance_suggestions_at(
        &self,
        today: NaiveDate,
        project_id: Option<i64>,
    ) -> ApiResult<BalanceSuggestionsResponse> {
        tracing::info!(?project_id, %today, "开始工作量调配分析");
        let period = YearMonth::from_date(today);
        let totals = self.data.monthly_user_allocation_totals()?;
        let monthly_hours = hours_for_period(&totals, period);

        let roster = self.data.active_employees()?;
        let (relevant, scope) = match project_id {
            Some(id) => {
                let members: HashSet<i64> = self
                    .data
                    .assignments_for_project(id)?
                    .iter()
                    .map(|a| a.user_id)
                    .collect();
                let relevant = roster
                    .into_iter()
                    .filter(|e| members.contains(&e.id))
                    .collect::<Vec<_>>();
                (relevant, RebalanceScope::Project(id))
            }
            None => (roster, RebalanceScope::Portfolio),
        };

        let outcome = WorkloadRebalancer::new(self.policy.calendar())
            .with_policy(self.policy.rebalance_policy())
            .rebalance(
                period,
                &monthly_hours,
                &relevant,
                scope,
                self.narrator.as_ref(),
            );

        Ok(BalanceSuggestionsResponse {
            project_id,
            suggestions: outcome.items,
            message: outcome.message,
        })
    }

    // ==========================================
    // 人员推荐
    // ==========================================

    pub fn recommend_staff(
        &self,
        request: &StaffingRecommendationRequest,
    ) -> ApiResult<StaffingRecommendationResponse> {
        let period = YearMonth::new(request.year, request.month).ok_or_else(|| {
            ApiError::InvalidInput(format!("月份越界: {}", request.month))
        })?;
        if request.required_hours < 0 {
            return Err(ApiError::InvalidInput(format!(
                "required_hours 不能为负数: {}",
                request.required_hours
            )));
        }

        let project = self
            .data
            .find_project(request.project_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Project(id={})不存在", request.project_id)))?;
        let role = match request.role_id {
            Some(id) => Some(
                self.data
                    .find_role(id)?
                    .ok_or_else(|| ApiError::NotFound(format!("Role(id={})不存在", id)))?,
            ),
            None => None,
        };
        let lcat = match request.lcat_id {
            Some(id) => Some(
                self.data
                    .find_lcat(id)?
                    .ok_or_else(|| ApiError::NotFound(format!("Lcat(id={})不存在", id)))?,
            ),
            None => None,
        };

        tracing::info!(
            project_id = project.id,
            %period,
            required_hours = request.required_hours,
            "开始人员推荐"
        );

        let totals = self.data.monthly_user_allocation_totals()?;
        let monthly_hours = hours_for_period(&totals, period);
        let already_assigned: HashSet<i64> = self
            .data
            .assignments_for_project(project.id)?
            .iter()
            .map(|a| a.user_id)
            .collect();
        let employees = self.data.active_employees()?;

        let mut assignments_by_user: HashMap<i64, Vec<ProjectAssignment>> = HashMap::new();
        if role.is_some() || lcat.is_some() {
            for employee in employees.iter().filter(|e| !already_assigned.contains(&e.id)) {
                assignments_by_user.insert(employee.id, self.data.assignments_for_user(employee.id)?);
            }
        }

        let staffing_request = StaffingRequest {
            project: &project,
            period,
            required_hours: request.required_hours,
            role: role.as_ref(),
            lcat: lcat.as_ref(),
        };
        let pool = CandidatePool {
            employees: &employees,
            monthly_hours: &monthly_hours,
            assignments_by_user: &assignments_by_user,
            already_assigned: &already_assigned,
        };

        let outcome = StaffingRecommender::new(self.policy.calendar()).recommend(
            &staffing_request,
            &pool,
            self.narrator.as_ref(),
        )?;

        Ok(StaffingRecommendationResponse {
            candidates: outcome.items,
            reasoning: outcome.message,
        })
    }
}

/// 指定月份的 user_id -> 合计工时
pub(crate) fn hours_for_period(totals: &[MonthlyUserTotal], period: YearMonth) -> HashMap<i64, i64> {
    let mut hours = HashMap::new();
    for row in totals.iter().filter(|row| row.year_month() == period) {
        *hours.entry(row.user_id).or_insert(0) += row.total_hours;
    }
    hours
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
