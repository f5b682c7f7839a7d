// ==========================================
// StaffAlloc - 超额分配冲突扫描引擎
// ==========================================
// 职责: 找出单月合计工时超过标准工时的员工
// 输入: 用户-月份-项目工时快照 + 在职员工名单
// 输出: ConflictRecord 列表（按 FTE 降序） + 说明文本
// 红线: 恰好 100% 不算冲突（严格大于）
// ==========================================

use crate::domain::analytics::{round_to, AnalysisOutcome, ConflictRecord, ProjectBreakdown};
use crate::domain::period::YearMonth;
use crate::domain::staffing::{AllocationTally, Employee};
use crate::engine::calendar::CapacityCalendar;
use crate::narration::{narrate_or_fallback, NarrationRequest, Narrator};
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use tracing::instrument;

pub const NO_CONFLICTS_MESSAGE: &str = "No over-allocations detected across active projects.";

pub const CONFLICT_FALLBACK_GUIDANCE: &str = "Review allocations and consider: (1) Reducing hours on lower-priority projects, (2) Redistributing work to available team members, or (3) Adjusting project timelines.";

const NARRATION_TEMPERATURE: f32 = 0.2;

/// 提示词中最多列出的冲突条数
const PROMPT_SAMPLE_LIMIT: usize = 5;

// ==========================================
// 分组中间结构（保持首次出现顺序）
// ==========================================

struct UserBucket<'a> {
    user_id: i64,
    total_hours: i64,
    rows: Vec<&'a AllocationTally>,
}

struct MonthBucket<'a> {
    period: YearMonth,
    users: Vec<UserBucket<'a>>,
    user_index: HashMap<i64, usize>,
}

fn group_by_month(tallies: &[AllocationTally]) -> Vec<MonthBucket<'_>> {
    let mut months: Vec<MonthBucket> = Vec::new();
    let mut month_index: HashMap<YearMonth, usize> = HashMap::new();

    for row in tallies {
        let period = row.year_month();
        let m = *month_index.entry(period).or_insert_with(|| {
            months.push(MonthBucket {
                period,
                users: Vec::new(),
                user_index: HashMap::new(),
            });
            months.len() - 1
        });

        let bucket = &mut months[m];
        let u = match bucket.user_index.get(&row.user_id) {
            Some(idx) => *idx,
            None => {
                bucket.users.push(UserBucket {
                    user_id: row.user_id,
                    total_hours: 0,
                    rows: Vec::new(),
                });
                bucket.user_index.insert(row.user_id, bucket.users.len() - 1);
                bucket.users.len() - 1
            }
        };

        let user = &mut bucket.users[u];
        user.total_hours += row.allocated_hours;
        user.rows.push(row);
    }

    months
}

// ==========================================
// ConflictScanner - 冲突扫描引擎
// ==========================================
pub struct ConflictScanner {
    calendar: CapacityCalendar,
}

impl ConflictScanner {
    pub fn new(calendar: CapacityCalendar) -> Self {
        Self { calendar }
    }

    /// 扫描冲突并生成说明
    #[instrument(skip_all, fields(tallies = tallies.len(), employees = employees.len()))]
    pub fn scan(
        &self,
        tallies: &[AllocationTally],
        employees: &[Employee],
        narrator: &dyn Narrator,
    ) -> AnalysisOutcome<ConflictRecord> {
        let conflicts = self.detect(tallies, employees);
        if conflicts.is_empty() {
            tracing::info!("未发现超额分配");
            return AnalysisOutcome::empty(NO_CONFLICTS_MESSAGE);
        }

        tracing::info!(conflicts = conflicts.len(), "发现超额分配");
        let mut message = summary_message(&conflicts);
        let request = NarrationRequest::new(build_prompt(&conflicts), NARRATION_TEMPERATURE);
        message.push_str(&narrate_or_fallback(
            narrator,
            &request,
            CONFLICT_FALLBACK_GUIDANCE,
            "conflict_scan",
        ));

        AnalysisOutcome::new(conflicts, message)
    }

    /// 纯计算：冲突列表（按 FTE 降序，稳定排序）
    pub fn detect(&self, tallies: &[AllocationTally], employees: &[Employee]) -> Vec<ConflictRecord> {
        let roster: HashMap<i64, &Employee> = employees.iter().map(|e| (e.id, e)).collect();
        let mut conflicts = Vec::new();

        for month in group_by_month(tallies) {
            let standard_hours = self.calendar.divisor_for(month.period);
            let label = month.period.label();

            for user in month.users {
                if user.total_hours <= standard_hours {
                    continue;
                }
                let Some(employee) = roster.get(&user.user_id) else {
                    tracing::debug!(user_id = user.user_id, "超额用户不在在职员工名单中，跳过");
                    continue;
                };

                let mut rows = user.rows;
                rows.sort_by_key(|row| Reverse(row.allocated_hours));
                let projects = rows
                    .into_iter()
                    .map(|row| ProjectBreakdown {
                        project_id: row.project_id,
                        project_name: if row.project_name.trim().is_empty() {
                            "Unknown".to_string()
                        } else {
                            row.project_name.clone()
                        },
                        hours: row.allocated_hours,
                    })
                    .collect();

                conflicts.push(ConflictRecord {
                    user_id: user.user_id,
                    employee_name: employee.full_name.clone(),
                    month_label: label.clone(),
                    total_hours: user.total_hours,
                    fte: round_to(user.total_hours as f64 / standard_hours as f64, 3),
                    projects,
                });
            }
        }

        conflicts.sort_by(|a, b| b.fte.partial_cmp(&a.fte).unwrap_or(Ordering::Equal));
        conflicts
    }
}

fn summary_message(conflicts: &[ConflictRecord]) -> String {
    let count = conflicts.len();
    let max_fte = conflicts
        .iter()
        .map(|c| c.fte)
        .fold(f64::MIN, f64::max)
        * 100.0;
    format!(
        "Found {} over-allocation{} (max {:.1}% FTE). ",
        count,
        if count != 1 { "s" } else { "" },
        max_fte
    )
}

fn build_prompt(conflicts: &[ConflictRecord]) -> String {
    let mut lines = vec![
        "The following employees exceed 100% FTE. Provide actionable remediation steps, \
         suggesting which project allocations to reduce or shift, and highlight any follow-up required."
            .to_string(),
        "Conflicts:".to_string(),
    ];
    for conflict in conflicts.iter().take(PROMPT_SAMPLE_LIMIT) {
        let projects = conflict
            .projects
            .iter()
            .map(|p| format!("{} ({}h)", p.project_name, p.hours))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "- {} · {} · {:.1}% FTE · {}",
            conflict.employee_name,
            conflict.month_label,
            conflict.fte * 100.0,
            projects
        ));
    }
    lines.join("\n") + "\n\nMitigation guidance:"
}

// ==========================================
// 单元测试
// ==========================================
