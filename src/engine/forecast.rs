// ==========================================
// StaffAlloc - 产能预测引擎
// ==========================================
// 职责: 预测未来 N 个月的产能 vs 已分配工时盈缺
// 输入: 当前日期 + 月数 + 在职人数 + 用户-月份-项目工时快照
// 输出: ForecastPoint 列表（从当月开始按时间顺序，长度恰为 N） + 说明文本
// ==========================================

use crate::domain::analytics::{AnalysisOutcome, ForecastPoint};
use crate::domain::period::YearMonth;
use crate::domain::staffing::AllocationTally;
use crate::domain::types::ForecastRisk;
use crate::engine::calendar::CapacityCalendar;
use crate::narration::{narrate_or_fallback, NarrationRequest, Narrator};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::instrument;

/// 盈余超过产能该比例时视为利用不足
pub const DEFAULT_UNDERUTILIZED_RATIO: f64 = 0.25;

pub const SHORTAGE_GUIDANCE: &str =
    "Consider hiring additional staff or adjusting project timelines to meet demand.";
pub const UNDERUTILIZED_GUIDANCE: &str =
    "Consider taking on new projects or reassigning staff to higher-priority work.";
pub const BALANCED_GUIDANCE: &str =
    "Continue monitoring allocations and adjust as new projects are added.";

const NARRATION_TEMPERATURE: f32 = 0.3;

// ==========================================
// ForecastProjector - 产能预测引擎
// ==========================================
pub struct ForecastProjector {
    calendar: CapacityCalendar,
    underutilized_ratio: f64,
}

impl ForecastProjector {
    pub fn new(calendar: CapacityCalendar) -> Self {
        Self {
            calendar,
            underutilized_ratio: DEFAULT_UNDERUTILIZED_RATIO,
        }
    }

    pub fn with_underutilized_ratio(mut self, ratio: f64) -> Self {
        self.underutilized_ratio = ratio;
        self
    }

    /// 生成预测并附带说明
    #[instrument(skip(self, tallies, narrator), fields(tallies = tallies.len()))]
    pub fn forecast(
        &self,
        today: NaiveDate,
        months_ahead: u32,
        employee_count: usize,
        tallies: &[AllocationTally],
        narrator: &dyn Narrator,
    ) -> AnalysisOutcome<ForecastPoint> {
        let employee_count = employee_count.max(1);
        let predictions = self.project(today, months_ahead, employee_count, tallies);

        let shortages = count_risk(&predictions, ForecastRisk::Shortage);
        let underutilized = count_risk(&predictions, ForecastRisk::Underutilized);
        tracing::info!(
            months = predictions.len(),
            shortages,
            underutilized,
            "产能预测完成"
        );

        let (mut message, fallback) = if shortages > 0 {
            (
                format!("Warning: {} month(s) show capacity shortage. ", shortages),
                SHORTAGE_GUIDANCE,
            )
        } else if underutilized > 0 {
            (
                format!("Notice: {} month(s) show underutilization. ", underutilized),
                UNDERUTILIZED_GUIDANCE,
            )
        } else {
            (
                "Forecast shows balanced capacity for the next months. ".to_string(),
                BALANCED_GUIDANCE,
            )
        };

        let request = NarrationRequest::new(
            build_prompt(employee_count, &predictions),
            NARRATION_TEMPERATURE,
        );
        message.push_str(&narrate_or_fallback(narrator, &request, fallback, "forecast"));

        AnalysisOutcome::new(predictions, message)
    }

    /// 纯计算：逐月预测点
    pub fn project(
        &self,
        today: NaiveDate,
        months_ahead: u32,
        employee_count: usize,
        tallies: &[AllocationTally],
    ) -> Vec<ForecastPoint> {
        let mut allocated_by_month: HashMap<YearMonth, i64> = HashMap::new();
        for row in tallies {
            *allocated_by_month.entry(row.year_month()).or_insert(0) += row.allocated_hours;
        }

        let start = YearMonth::from_date(today);
        (0..months_ahead)
            .map(|offset| {
                let target = start.offset(offset);
                let allocated = allocated_by_month.get(&target).copied().unwrap_or(0);
                let capacity = employee_count as i64
                    * self.calendar.standard_month_hours(target.year, target.month);
                let surplus = capacity - allocated;
                ForecastPoint {
                    month_label: target.label(),
                    projected_capacity_hours: capacity,
                    projected_allocated_hours: allocated,
                    surplus_hours: surplus,
                    risk: self.classify(capacity, surplus),
                }
            })
            .collect()
    }

    fn classify(&self, capacity: i64, surplus: i64) -> ForecastRisk {
        if surplus < 0 {
            ForecastRisk::Shortage
        } else if surplus as f64 > capacity as f64 * self.underutilized_ratio {
            ForecastRisk::Underutilized
        } else {
            ForecastRisk::Balanced
        }
    }
}

fn count_risk(predictions: &[ForecastPoint], risk: ForecastRisk) -> usize {
    predictions.iter().filter(|p| p.risk == risk).count()
}

fn build_prompt(employee_count: usize, predictions: &[ForecastPoint]) -> String {
    let mut context = vec![
        "Provide staffing forecast guidance based on capacity vs projected allocation.".to_string(),
        format!("Total employees considered: {}", employee_count),
    ];
    for p in predictions {
        context.push(format!(
            "- {}: capacity {}h, allocations {}h, surplus {}h ({})",
            p.month_label,
            p.projected_capacity_hours,
            p.projected_allocated_hours,
            p.surplus_hours,
            p.risk
        ));
    }
    format!(
        "You are advising a portfolio manager on staffing outlook. Summarise the key risks for the upcoming months, \
         highlight shortages or underutilisation, and recommend proactive steps (hiring, reassignments, etc.).\n\n{}\n\nOutlook:",
        context.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::DisabledNarrator;

    fn tally(year: i32, month: u32, hours: i64) -> AllocationTally {
        AllocationTally {
            user_id: 1,
            year,
            month,
            project_id: 1,
            project_name: "P".to_string(),
            allocated_hours: hours,
        }
    }

    fn projector() -> ForecastProjector {
        ForecastProjector::new(CapacityCalendar::fixed(160))
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 18).unwrap();
        let points = projector().project(today, 3, 2, &[]);
        let labels: Vec<&str> = points.iter().map(|p| p.month_label.as_str()).collect();
        assert_eq!(labels, vec!["December 2026", "January 2027", "February 2027"]);
    }

    #[test]
    fn test_risk_classification() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        // 2 人 x 160h = 320h
        let tallies = vec![
            tally(2026, 3, 400), // 盈余 -80 -> shortage
            tally(2026, 4, 240), // 盈余 80 = 25% -> balanced
            tally(2026, 5, 200), // 盈余 120 > 80 -> underutilized
        ];
        let points = projector().project(today, 4, 2, &tallies);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].risk, ForecastRisk::Shortage);
        assert_eq!(points[0].surplus_hours, -80);
        assert_eq!(points[1].risk, ForecastRisk::Balanced);
        assert_eq!(points[2].risk, ForecastRisk::Underutilized);
        assert_eq!(points[3].projected_allocated_hours, 0);
        assert_eq!(points[3].risk, ForecastRisk::Underutilized);
    }

    #[test]
    fn test_forecast_is_repeatable() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let tallies = vec![tally(2026, 3, 400), tally(2026, 4, 100), tally(2026, 3, 20)];
        let engine = projector();

        let first = engine.forecast(today, 3, 2, &tallies, &DisabledNarrator);
        let second = engine.forecast(today, 3, 2, &tallies, &DisabledNarrator);
        assert_eq!(first, second);
        assert_eq!(first.items[0].projected_allocated_hours, 420);
    }

    #[test]
    fn test_zero_employees_counts_as_one() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let outcome = projector().forecast(today, 1, 0, &[], &DisabledNarrator);
        assert_eq!(outcome.items[0].projected_capacity_hours, 160);
    }

    #[test]
    fn test_fallback_follows_dominant_risk() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let shortage = projector().forecast(today, 2, 1, &[tally(2026, 3, 200)], &DisabledNarrator);
        assert_eq!(
            shortage.message,
            format!("Warning: 1 month(s) show capacity shortage. {}", SHORTAGE_GUIDANCE)
        );

        let idle = projector().forecast(today, 2, 1, &[], &DisabledNarrator);
        assert_eq!(
            idle.message,
            format!("Notice: 2 month(s) show underutilization. {}", UNDERUTILIZED_GUIDANCE)
        );

        let balanced = projector().forecast(
            today,
            2,
            1,
            &[tally(2026, 3, 150), tally(2026, 4, 160)],
            &DisabledNarrator,
        );
        assert_eq!(
            balanced.message,
            format!("Forecast shows balanced capacity for the next months. {}", BALANCED_GUIDANCE)
        );
    }

    #[test]
    fn test_custom_underutilized_ratio() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let points = projector()
            .with_underutilized_ratio(0.5)
            .project(today, 1, 1, &[tally(2026, 3, 100)]);
        assert_eq!(points[0].risk, ForecastRisk::Balanced);
    }
}
