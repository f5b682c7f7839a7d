// ==========================================
// StaffAlloc - 人员推荐引擎
// ==========================================
// 职责: 为项目某月的用工需求挑选候选人
// 输入: 项目 + 目标角色/LCAT + 在职员工 + 当月工时合计 + 员工已有分配
// 输出: 最多 5 名候选人（可用工时降序、FTE 升序） + 推荐说明
// 红线: 已在该项目中的员工不推荐；叙述失败直接上抛
// ==========================================

use crate::domain::analytics::{round_to, AnalysisOutcome, StaffingCandidate};
use crate::domain::period::YearMonth;
use crate::domain::staffing::{Employee, Lcat, Project, ProjectAssignment, Role};
use crate::engine::calendar::CapacityCalendar;
use crate::narration::{NarrationRequest, NarrationResult, Narrator};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// 最多返回候选人数
pub const MAX_CANDIDATES: usize = 5;

const NARRATION_TEMPERATURE: f32 = 0.1;

// ==========================================
// StaffingRequest - 用工需求
// ==========================================
#[derive(Debug, Clone)]
pub struct StaffingRequest<'a> {
    pub project: &'a Project,
    pub period: YearMonth,
    pub required_hours: i64,
    pub role: Option<&'a Role>,
    pub lcat: Option<&'a Lcat>,
}

/// 推荐所需的员工侧快照
pub struct CandidatePool<'a> {
    pub employees: &'a [Employee],
    /// 当月 user_id -> 合计工时
    pub monthly_hours: &'a HashMap<i64, i64>,
    /// user_id -> 该员工全部项目分配
    pub assignments_by_user: &'a HashMap<i64, Vec<ProjectAssignment>>,
    /// 已在目标项目中的 user_id
    pub already_assigned: &'a HashSet<i64>,
}

// ==========================================
// StaffingRecommender - 人员推荐引擎
// ==========================================
pub struct StaffingRecommender {
    calendar: CapacityCalendar,
}

impl StaffingRecommender {
    pub fn new(calendar: CapacityCalendar) -> Self {
        Self { calendar }
    }

    #[instrument(skip(self, request, pool, narrator), fields(
        project_id = request.project.id,
        period = %request.period,
        required_hours = request.required_hours
    ))]
    pub fn recommend(
        &self,
        request: &StaffingRequest<'_>,
        pool: &CandidatePool<'_>,
        narrator: &dyn Narrator,
    ) -> NarrationResult<AnalysisOutcome<StaffingCandidate>> {
        let candidates = self.rank_candidates(request, pool);
        if candidates.is_empty() {
            tracing::info!("没有满足条件的候选人");
            let reasoning = format!(
                "No employees meet the requested role/LCAT criteria with sufficient capacity in {}. \
                 Consider broadening the requirements or adjusting allocations.",
                request.period.label()
            );
            return Ok(AnalysisOutcome::new(Vec::new(), reasoning));
        }

        tracing::info!(candidates = candidates.len(), "候选人筛选完成");
        let prompt = build_prompt(request, &candidates);
        let reasoning = narrator.narrate(&NarrationRequest::new(prompt, NARRATION_TEMPERATURE))?;
        Ok(AnalysisOutcome::new(candidates, reasoning))
    }

    /// 纯计算：筛选并排序候选人
    pub fn rank_candidates(
        &self,
        request: &StaffingRequest<'_>,
        pool: &CandidatePool<'_>,
    ) -> Vec<StaffingCandidate> {
        let standard = self.calendar.divisor_for(request.period);
        let no_assignments: Vec<ProjectAssignment> = Vec::new();

        let mut candidates: Vec<StaffingCandidate> = pool
            .employees
            .iter()
            .filter(|employee| !pool.already_assigned.contains(&employee.id))
            .filter(|employee| {
                let held = pool
                    .assignments_by_user
                    .get(&employee.id)
                    .unwrap_or(&no_assignments);
                let role_ok = request
                    .role
                    .map_or(true, |role| held.iter().any(|a| a.role_id == role.id));
                let lcat_ok = request
                    .lcat
                    .map_or(true, |lcat| held.iter().any(|a| a.lcat_id == lcat.id));
                role_ok && lcat_ok
            })
            .map(|employee| {
                let allocated = pool.monthly_hours.get(&employee.id).copied().unwrap_or(0);
                StaffingCandidate {
                    user_id: employee.id,
                    full_name: employee.full_name.clone(),
                    email: employee.email.clone(),
                    manager_id: employee.manager_id,
                    current_fte: round_to(allocated as f64 / standard as f64, 3),
                    allocated_hours: allocated,
                    available_hours: (standard - allocated).max(0),
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.available_hours.cmp(&a.available_hours).then_with(|| {
                a.current_fte
                    .partial_cmp(&b.current_fte)
                    .unwrap_or(Ordering::Equal)
            })
        });
        candidates.truncate(MAX_CANDIDATES);
        candidates
    }
}

fn build_prompt(request: &StaffingRequest<'_>, candidates: &[StaffingCandidate]) -> String {
    let mut context = vec![
        format!("Project: {} ({})", request.project.name, request.project.code),
        format!("Timeframe: {}", request.period.label()),
        format!("Required hours: {}", request.required_hours),
        format!(
            "Target role: {}, LCAT: {}",
            request.role.map_or("Any", |r| r.name.as_str()),
            request.lcat.map_or("Any", |l| l.name.as_str())
        ),
        "Candidate availability:".to_string(),
    ];
    for c in candidates {
        context.push(format!(
            "- {} · current FTE {:.1}% · available {}h",
            c.full_name,
            c.current_fte * 100.0,
            c.available_hours
        ));
    }
    format!(
        "You are assisting a project manager in selecting staff. Using the candidate data provided, \
         recommend who should be staffed to cover the required hours. Reference the best-matched candidates \
         and note any risks or follow-up actions.\n\n{}\n\nRecommendation:",
        context.join("\n")
    )
}
