// ==========================================
// StaffAlloc - 工作量调配引擎
// ==========================================
// 职责: 把超额员工的工时贪心地转移给空闲员工（仅建议，不落库）
// 输入: 当月用户工时合计 + 相关员工名单（可按项目收窄）
// 输出: RebalanceSuggestion 列表（按生成顺序） + 说明文本
// 红线: 贪心、顺序相关、不回溯；建议工时 > 0，
//       且不超过转出方超额量与接收方剩余量
// ==========================================

use crate::domain::analytics::{AnalysisOutcome, RebalanceSuggestion};
use crate::domain::period::YearMonth;
use crate::domain::staffing::Employee;
use crate::domain::types::RebalanceAction;
use crate::engine::calendar::CapacityCalendar;
use crate::narration::{narrate_or_fallback, NarrationRequest, Narrator};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::instrument;

/// FTE 低于该值视为空闲
pub const DEFAULT_IDLE_FTE_THRESHOLD: f64 = 0.5;

/// FTE 高于该值视为超额
pub const OVER_ALLOCATED_FTE_THRESHOLD: f64 = 1.0;

/// 单笔转移上限 = 标准工时 / 该除数（整数除法）
pub const DEFAULT_MAX_SHIFT_DIVISOR: i64 = 2;

pub const NO_IMBALANCE_MESSAGE: &str =
    "No obvious workload imbalances detected for the selected scope.";

pub const REBALANCE_FALLBACK_GUIDANCE: &str = "Consider redistributing work from overloaded employees to those with capacity. This will improve team morale and reduce burnout risk.";

const NARRATION_TEMPERATURE: f32 = 0.2;
const PROMPT_SAMPLE_LIMIT: usize = 5;

// ==========================================
// 调配策略参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalancePolicy {
    pub idle_fte_threshold: f64,
    pub max_shift_divisor: i64,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        Self {
            idle_fte_threshold: DEFAULT_IDLE_FTE_THRESHOLD,
            max_shift_divisor: DEFAULT_MAX_SHIFT_DIVISOR,
        }
    }
}

/// 调配范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceScope {
    Portfolio,
    Project(i64),
}

impl RebalanceScope {
    pub fn label(&self) -> &'static str {
        match self {
            RebalanceScope::Portfolio => "portfolio",
            RebalanceScope::Project(_) => "project",
        }
    }
}

/// 参与贪心匹配的员工工时快照
struct Workload<'a> {
    employee: &'a Employee,
    hours: i64,
    fte: f64,
}

// ==========================================
// WorkloadRebalancer - 工作量调配引擎
// ==========================================
pub struct WorkloadRebalancer {
    calendar: CapacityCalendar,
    policy: RebalancePolicy,
}

impl WorkloadRebalancer {
    pub fn new(calendar: CapacityCalendar) -> Self {
        Self {
            calendar,
            policy: RebalancePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RebalancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 生成调配建议并附带说明
    ///
    /// # 参数
    /// - `period`: 当前月份
    /// - `monthly_hours`: 当月 user_id -> 合计工时
    /// - `relevant`: 参与调配的员工（按名单顺序）
    /// - `scope`: 调配范围（只影响说明文本）
    #[instrument(skip(self, monthly_hours, relevant, narrator), fields(
        period = %period,
        relevant = relevant.len()
    ))]
    pub fn rebalance(
        &self,
        period: YearMonth,
        monthly_hours: &HashMap<i64, i64>,
        relevant: &[Employee],
        scope: RebalanceScope,
        narrator: &dyn Narrator,
    ) -> AnalysisOutcome<RebalanceSuggestion> {
        let suggestions = self.suggest(period, monthly_hours, relevant);
        if suggestions.is_empty() {
            tracing::info!("未发现工作量失衡");
            return AnalysisOutcome::empty(NO_IMBALANCE_MESSAGE);
        }

        let count = suggestions.len();
        tracing::info!(suggestions = count, scope = scope.label(), "生成调配建议");
        let mut message = format!(
            "Found {} workload balancing opportunit{} in the {}. ",
            count,
            if count != 1 { "ies" } else { "y" },
            scope.label()
        );
        let request = NarrationRequest::new(
            build_prompt(scope, &suggestions),
            NARRATION_TEMPERATURE,
        );
        message.push_str(&narrate_or_fallback(
            narrator,
            &request,
            REBALANCE_FALLBACK_GUIDANCE,
            "rebalance",
        ));

        AnalysisOutcome::new(suggestions, message)
    }

    /// 纯计算：贪心调配建议
    ///
    /// 接收方已接收的工时在整轮中累计：后续转出方看到的是扣减后的余量，
    /// 同一接收方收到的总量不会超过 `standard - 当前工时`。
    /// 因此多个转出方共享一个空闲接收方时，建议条数少于"每个转出方各自独立匹配"的结果
    /// （见 `test_recipient_capacity_tracked_across_donors`）。
    /// 累计只发生在内存中，不改写任何分配数据。
    pub fn suggest(
        &self,
        period: YearMonth,
        monthly_hours: &HashMap<i64, i64>,
        relevant: &[Employee],
    ) -> Vec<RebalanceSuggestion> {
        let standard = self.calendar.divisor_for(period);
        let max_shift = standard / self.policy.max_shift_divisor.max(1);

        let mut over: Vec<Workload> = Vec::new();
        let mut idle: Vec<Workload> = Vec::new();
        for employee in relevant {
            let hours = monthly_hours.get(&employee.id).copied().unwrap_or(0);
            let fte = hours as f64 / standard as f64;
            if fte > OVER_ALLOCATED_FTE_THRESHOLD {
                over.push(Workload { employee, hours, fte });
            } else if fte < self.policy.idle_fte_threshold {
                idle.push(Workload { employee, hours, fte });
            }
        }

        over.sort_by(|a, b| b.fte.partial_cmp(&a.fte).unwrap_or(Ordering::Equal));
        idle.sort_by(|a, b| a.fte.partial_cmp(&b.fte).unwrap_or(Ordering::Equal));
        tracing::debug!(over = over.len(), idle = idle.len(), standard, max_shift, "调配候选");

        let mut suggestions = Vec::new();
        for donor in &over {
            let mut overload = donor.hours - standard;
            for recipient in idle.iter_mut() {
                if overload <= 0 {
                    break;
                }
                let available = standard - recipient.hours;
                if available <= 0 {
                    continue;
                }
                let shift = overload.min(available).min(max_shift);
                if shift <= 0 {
                    continue;
                }

                suggestions.push(RebalanceSuggestion {
                    action: RebalanceAction::RebalanceAllocation,
                    from_user_id: donor.employee.id,
                    from_employee: donor.employee.full_name.clone(),
                    to_user_id: recipient.employee.id,
                    to_employee: recipient.employee.full_name.clone(),
                    recommended_hours: shift,
                });
                overload -= shift;
                // 仅在内存中累加，后续转出方看到的是更新后的剩余量
                recipient.hours += shift;
            }
        }

        suggestions
    }
}

fn build_prompt(scope: RebalanceScope, suggestions: &[RebalanceSuggestion]) -> String {
    let mut lines = vec![
        format!(
            "Workload balancing opportunities detected within the {}.",
            scope.label()
        ),
        "Recommendations:".to_string(),
    ];
    for s in suggestions.iter().take(PROMPT_SAMPLE_LIMIT) {
        lines.push(format!(
            "- Shift {}h from {} to {}",
            s.recommended_hours, s.from_employee, s.to_employee
        ));
    }
    lines.join("\n") + "\n\nRationale:"
}

// ==========================================
// 单元测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SystemRole;
    use crate::narration::DisabledNarrator;

    fn employee(id: i64, name: &str) -> Employee {
        Employee {
            id,
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            system_role: SystemRole::Employee,
            is_active: true,
            manager_id: None,
        }
    }

    fn march() -> YearMonth {
        YearMonth::new(2026, 3).unwrap()
    }

    fn rebalancer() -> WorkloadRebalancer {
        WorkloadRebalancer::new(CapacityCalendar::fixed(160))
    }

    #[test]
    fn test_shift_capped_at_half_standard() {
        let roster = vec![employee(1, "Over"), employee(2, "Idle")];
        let hours = HashMap::from([(1, 240), (2, 0)]);
        let suggestions = rebalancer().suggest(march(), &hours, &roster);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].recommended_hours, 80);
        assert_eq!(suggestions[0].from_employee, "Over");
        assert_eq!(suggestions[0].to_employee, "Idle");
    }

    #[test]
    fn test_shift_limited_by_overload() {
        let roster = vec![employee(1, "A"), employee(2, "B")];
        let hours = HashMap::from([(1, 200), (2, 40)]);
        let suggestions = rebalancer().suggest(march(), &hours, &roster);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].recommended_hours, 40);
    }

    #[test]
    fn test_overload_spreads_across_idle_in_fte_order() {
        let roster = vec![
            employee(1, "Heavy"),
            employee(2, "SemiIdle"),
            employee(3, "Idle"),
            employee(4, "Steady"),
        ];
        // Heavy 超额 150h；Idle(0h) 先接收，SemiIdle(60h) 后接收；Steady(100h, 0.625) 不参与
        let hours = HashMap::from([(1, 310), (2, 60), (3, 0), (4, 100)]);
        let suggestions = rebalancer().suggest(march(), &hours, &roster);
        let plan: Vec<(&str, i64)> = suggestions
            .iter()
            .map(|s| (s.to_employee.as_str(), s.recommended_hours))
            .collect();
        assert_eq!(plan, vec![("Idle", 80), ("SemiIdle", 70)]);
    }

    #[test]
    fn test_recipient_capacity_tracked_across_donors() {
        let roster = vec![
            employee(1, "D1"),
            employee(2, "D2"),
            employee(3, "D3"),
            employee(4, "R"),
        ];
        let hours = HashMap::from([(1, 300), (2, 280), (3, 260), (4, 0)]);
        let suggestions = rebalancer().suggest(march(), &hours, &roster);
        let plan: Vec<(&str, i64)> = suggestions
            .iter()
            .map(|s| (s.from_employee.as_str(), s.recommended_hours))
            .collect();
        // R 只有 160h 余量：D1 80h，D2 80h，D3 无可用接收方
        assert_eq!(plan, vec![("D1", 80), ("D2", 80)]);
        let received: i64 = suggestions.iter().map(|s| s.recommended_hours).sum();
        assert!(received <= 160);
    }

    #[test]
    fn test_mid_band_users_excluded() {
        let roster = vec![employee(1, "Over"), employee(2, "Half")];
        let hours = HashMap::from([(1, 200), (2, 80)]);
        let outcome = rebalancer().rebalance(
            march(),
            &hours,
            &roster,
            RebalanceScope::Portfolio,
            &DisabledNarrator,
        );
        assert!(outcome.is_empty());
        assert_eq!(outcome.message, NO_IMBALANCE_MESSAGE);
    }

    #[test]
    fn test_suggestions_always_positive() {
        let roster: Vec<Employee> = (1..=6).map(|i| employee(i, &format!("E{}", i))).collect();
        let hours = HashMap::from([(1, 161), (2, 400), (3, 159), (4, 0), (5, 79), (6, 1)]);
        for s in rebalancer().suggest(march(), &hours, &roster) {
            assert!(s.recommended_hours > 0);
            assert!(s.recommended_hours <= 80);
        }
    }

    #[test]
    fn test_message_uses_scope_label() {
        let roster = vec![employee(1, "A"), employee(2, "B"), employee(3, "C")];
        let hours = HashMap::from([(1, 320), (2, 0), (3, 0)]);
        let outcome = rebalancer().rebalance(
            march(),
            &hours,
            &roster,
            RebalanceScope::Project(7),
            &DisabledNarrator,
        );
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(
            outcome.message,
            format!(
                "Found 2 workload balancing opportunities in the project. {}",
                REBALANCE_FALLBACK_GUIDANCE
            )
        );
    }

    #[test]
    fn test_suggest_is_repeatable() {
        let roster = vec![
            employee(1, "D1"),
            employee(2, "D2"),
            employee(3, "R1"),
            employee(4, "R2"),
        ];
        let hours = HashMap::from([(1, 300), (2, 230), (3, 20), (4, 70)]);
        let engine = rebalancer();

        let first = engine.suggest(march(), &hours, &roster);
        let second = engine.suggest(march(), &hours, &roster);
        assert!(!first.is_empty());
        assert_eq!(first, second);
        // 输入快照不被修改
        assert_eq!(hours[&3], 20);
    }

    #[test]
    fn test_custom_policy() {
        let roster = vec![employee(1, "A"), employee(2, "B")];
        let hours = HashMap::from([(1, 240), (2, 100)]);
        let policy = RebalancePolicy {
            idle_fte_threshold: 0.75,
            max_shift_divisor: 4,
        };
        let suggestions = rebalancer()
            .with_policy(policy)
            .suggest(march(), &hours, &roster);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].recommended_hours, 40);
    }
}
