// ==========================================
// StaffAlloc - 月份值对象
// ==========================================
// 职责: (year, month) 组合、月份滚动、月份展示名
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 自然月 (year, month)，month 取值 1..=12
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// 构造月份，month 越界时返回 None
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// 取日期所在月份
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// 向后滚动 offset 个月（12 月 + 1 -> 次年 1 月）
    pub fn offset(&self, offset: u32) -> Self {
        let zero_based = self.month as i64 - 1 + offset as i64;
        Self {
            year: self.year + (zero_based / 12) as i32,
            month: (zero_based % 12) as u32 + 1,
        }
    }

    /// 月初日期
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// 当月天数
    pub fn days_in_month(&self) -> u32 {
        let next = self.offset(1);
        match (self.first_day(), next.first_day()) {
            (Some(start), Some(end)) => (end - start).num_days() as u32,
            _ => 0,
        }
    }

    /// 展示名，如 "March 2026"
    pub fn label(&self) -> String {
        match self.first_day() {
            Some(day) => day.format("%B %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_rolls_over_year() {
        let dec = YearMonth::new(2025, 12).unwrap();
        assert_eq!(dec.offset(0), dec);
        assert_eq!(dec.offset(1), YearMonth::new(2026, 1).unwrap());
        assert_eq!(dec.offset(2), YearMonth::new(2026, 2).unwrap());
        assert_eq!(dec.offset(13), YearMonth::new(2027, 1).unwrap());
    }

    #[test]
    fn test_label_and_days() {
        let march = YearMonth::new(2026, 3).unwrap();
        assert_eq!(march.label(), "March 2026");
        assert_eq!(march.days_in_month(), 31);
        assert_eq!(YearMonth::new(2024, 2).unwrap().days_in_month(), 29);
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(YearMonth::new(2026, 0).is_none());
        assert!(YearMonth::new(2026, 13).is_none());
    }
}
