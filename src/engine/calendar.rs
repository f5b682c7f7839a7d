// ==========================================
// StaffAlloc - 产能日历
// ==========================================
// 职责: 计算 (year, month) 的标准满负荷工时
// 红线: 冲突扫描 / 产能预测 / 工作量调配必须共用同一个日历实例
// ==========================================

use crate::domain::period::YearMonth;
use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 默认固定月工时
pub const DEFAULT_FIXED_MONTH_HOURS: i64 = 160;

/// 默认每个工作日工时
pub const DEFAULT_HOURS_PER_BUSINESS_DAY: i64 = 8;

// ==========================================
// CapacityRule - 标准工时规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityRule {
    /// 每月固定工时
    Fixed { hours: i64 },
    /// 周一至周五天数 x 每日工时
    BusinessDays { hours_per_day: i64 },
}

impl Default for CapacityRule {
    fn default() -> Self {
        CapacityRule::Fixed {
            hours: DEFAULT_FIXED_MONTH_HOURS,
        }
    }
}

// ==========================================
// CapacityCalendar - 产能日历
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityCalendar {
    rule: CapacityRule,
    overrides: HashMap<YearMonth, i64>,
}

impl CapacityCalendar {
    pub fn new(rule: CapacityRule) -> Self {
        Self {
            rule,
            overrides: HashMap::new(),
        }
    }

    /// 固定工时日历
    pub fn fixed(hours: i64) -> Self {
        Self::new(CapacityRule::Fixed { hours })
    }

    /// 追加单月覆写（节假日月份减少、加班月份增加）
    pub fn with_override(mut self, period: YearMonth, hours: i64) -> Self {
        self.overrides.insert(period, hours);
        self
    }

    pub fn with_overrides(mut self, overrides: HashMap<YearMonth, i64>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn rule(&self) -> CapacityRule {
        self.rule
    }

    /// 标准月工时（未钳制）
    pub fn standard_month_hours(&self, year: i32, month: u32) -> i64 {
        let Some(period) = YearMonth::new(year, month) else {
            return 0;
        };
        if let Some(hours) = self.overrides.get(&period) {
            return *hours;
        }
        match self.rule {
            CapacityRule::Fixed { hours } => hours,
            CapacityRule::BusinessDays { hours_per_day } => {
                business_days(period) as i64 * hours_per_day
            }
        }
    }

    /// 用作除数的标准工时，至少为 1
    pub fn capacity_divisor(&self, year: i32, month: u32) -> i64 {
        self.standard_month_hours(year, month).max(1)
    }

    pub fn divisor_for(&self, period: YearMonth) -> i64 {
        self.capacity_divisor(period.year, period.month)
    }
}

/// 当月周一至周五天数
fn business_days(period: YearMonth) -> u32 {
    let Some(first) = period.first_day() else {
        return 0;
    };
    first
        .iter_days()
        .take(period.days_in_month() as usize)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

/// 月份展示名，如 "December 2026"
pub fn month_label(year: i32, month: u32) -> String {
    match YearMonth::new(year, month) {
        Some(period) => period.label(),
        None => format!("{:04}-{:02}", year, month),
    }
}
