// ==========================================
// StaffAlloc - 分析策略参数
// ==========================================
// 职责: 汇总标准工时规则与各分析阈值，统一构造引擎
// ==========================================

use crate::domain::period::YearMonth;
use crate::engine::calendar::{CapacityCalendar, CapacityRule};
use crate::engine::forecast::DEFAULT_UNDERUTILIZED_RATIO;
use crate::engine::rebalance::{RebalancePolicy, DEFAULT_IDLE_FTE_THRESHOLD, DEFAULT_MAX_SHIFT_DIVISOR};
use crate::engine::reporting::DEFAULT_BENCH_FTE_THRESHOLD;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsPolicy {
    pub capacity_rule: CapacityRule,
    pub month_overrides: HashMap<YearMonth, i64>,
    pub idle_fte_threshold: f64,
    pub max_shift_divisor: i64,
    pub underutilized_ratio: f64,
    pub bench_fte_threshold: f64,
}

impl Default for AnalyticsPolicy {
    fn default() -> Self {
        Self {
            capacity_rule: CapacityRule::default(),
            month_overrides: HashMap::new(),
            idle_fte_threshold: DEFAULT_IDLE_FTE_THRESHOLD,
            max_shift_divisor: DEFAULT_MAX_SHIFT_DIVISOR,
            underutilized_ratio: DEFAULT_UNDERUTILIZED_RATIO,
            bench_fte_threshold: DEFAULT_BENCH_FTE_THRESHOLD,
        }
    }
}

impl AnalyticsPolicy {
    /// 所有分析组件共用的日历
    pub fn calendar(&self) -> CapacityCalendar {
        CapacityCalendar::new(self.capacity_rule).with_overrides(self.month_overrides.clone())
    }

    pub fn rebalance_policy(&self) -> RebalancePolicy {
        RebalancePolicy {
            idle_fte_threshold: self.idle_fte_threshold,
            max_shift_divisor: self.max_shift_divisor.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_carries_overrides() {
        let december = YearMonth::new(2026, 12).unwrap();
        let policy = AnalyticsPolicy {
            month_overrides: HashMap::from([(december, 140)]),
            ..AnalyticsPolicy::default()
        };
        let calendar = policy.calendar();
        assert_eq!(calendar.standard_month_hours(2026, 12), 140);
        assert_eq!(calendar.standard_month_hours(2026, 11), 160);
    }

    #[test]
    fn test_rebalance_divisor_never_zero() {
        let policy = AnalyticsPolicy {
            max_shift_divisor: 0,
            ..AnalyticsPolicy::default()
        };
        assert_eq!(policy.rebalance_policy().max_shift_divisor, 1);
    }
}
