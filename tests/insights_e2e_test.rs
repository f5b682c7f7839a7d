// ==========================================
// 产能分析 API 端到端测试
// ==========================================
// 测试目标: 数据库快照 -> InsightsApi -> 响应 DTO
// 场景: 2026 年 3 月，固定 160h/月
//   Alice: Apollo 120h + Gemini 80h = 200h（超额 125%）
//   Bob:   Apollo 40h（25%）
//   Carol: 分派到 Gemini，当月 0h
// ==========================================


use chrono::NaiveDate;
use staff_alloc::api::dto::StaffingRecommendationRequest;
use staff_alloc::api::ApiError;
use staff_alloc::app::AppState;
use staff_alloc::domain::{ForecastRisk, RebalanceAction, SystemRole};
use staff_alloc::engine::conflict::CONFLICT_FALLBACK_GUIDANCE;
use staff_alloc::engine::forecast::UNDERUTILIZED_GUIDANCE;
use staff_alloc::engine::rebalance::REBALANCE_FALLBACK_GUIDANCE;
use staff_alloc::logging;
use staff_alloc::narration::{DisabledNarrator, NarrationError, Narrator};
use std::sync::Arc;
use tempfile::NamedTempFile;
use test_helpers::{create_test_db, FailingNarrator, ScriptedNarrator, StaffingFixture};

struct Scenario {
    _temp_file: NamedTempFile,
    db_path: String,
    alice: i64,
    bob: i64,
    carol: i64,
    apollo: i64,
    gemini: i64,
    fx: StaffingFixture,
}

fn march_scenario() -> Scenario {
    logging::init_test();
    let (temp_file, db_path) = create_test_db().unwrap();
    let fx = StaffingFixture::open(&db_path);

    let alice = fx.employee("Alice");
    let bob = fx.employee("Bob");
    let carol = fx.employee("Carol");
    let apollo = fx.project("Apollo", "APL-01");
    let gemini = fx.project("Gemini", "GEM-02");

    let a_apollo = fx.assign(apollo, alice);
    let a_gemini = fx.assign(gemini, alice);
    let b_apollo = fx.assign(apollo, bob);
    fx.assign(gemini, carol);

    fx.allocate(a_apollo, 2026, 3, 120);
    fx.allocate(a_gemini, 2026, 3, 80);
    fx.allocate(b_apollo, 2026, 3, 40);

    Scenario {
        _temp_file: temp_file,
        db_path,
        alice,
        bob,
        carol,
        apollo,
        gemini,
        fx,
    }
}

fn state_with(scenario: &Scenario, narrator: Arc<dyn Narrator>) -> AppState {
    AppState::with_narrator(scenario.db_path.clone(), narrator).unwrap()
}

fn march_15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

// ==========================================
// 冲突扫描
// ==========================================

#[test]
fn test_conflict_scan_reports_alice_only() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let response = state.insights_api.scan_conflicts().unwrap();
    assert_eq!(response.conflicts.len(), 1);

    let conflict = &response.conflicts[0];
    assert_eq!(conflict.user_id, scenario.alice);
    assert_eq!(conflict.employee_name, "Alice");
    assert_eq!(conflict.month_label, "March 2026");
    assert_eq!(conflict.total_hours, 200);
    assert_eq!(conflict.fte, 1.25);
    let projects: Vec<(&str, i64)> = conflict
        .projects
        .iter()
        .map(|p| (p.project_name.as_str(), p.hours))
        .collect();
    assert_eq!(projects, vec![("Apollo", 120), ("Gemini", 80)]);

    assert_eq!(
        response.message,
        format!(
            "Found 1 over-allocation (max 125.0% FTE). {}",
            CONFLICT_FALLBACK_GUIDANCE
        )
    );
}

#[test]
fn test_conflict_scan_ignores_non_employee_roles() {
    let scenario = march_scenario();
    let fx = &scenario.fx;
    let pm = fx.user_with_role("Pat", SystemRole::Pm);
    let pm_assignment = fx.assign_as(scenario.apollo, pm, fx.role_id, fx.lcat_id, 0);
    fx.allocate(pm_assignment, 2026, 3, 300);

    let state = state_with(&scenario, Arc::new(DisabledNarrator));
    let response = state.insights_api.scan_conflicts().unwrap();
    let users: Vec<i64> = response.conflicts.iter().map(|c| c.user_id).collect();
    assert_eq!(users, vec![scenario.alice]);
}

#[test]
fn test_conflict_scan_is_idempotent() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let first = serde_json::to_value(state.insights_api.scan_conflicts().unwrap()).unwrap();
    let second = serde_json::to_value(state.insights_api.scan_conflicts().unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["conflicts"][0]["employee"], "Alice");
    assert_eq!(first["conflicts"][0]["month"], "March 2026");
}

#[test]
fn test_narration_text_is_appended_after_summary() {
    let scenario = march_scenario();
    let narrator = Arc::new(ScriptedNarrator::new("  Move 40h of Gemini work to Carol.  "));
    let state = state_with(&scenario, narrator.clone());

    let response = state.insights_api.scan_conflicts().unwrap();
    assert_eq!(
        response.message,
        "Found 1 over-allocation (max 125.0% FTE). Move 40h of Gemini work to Carol."
    );
    assert_eq!(narrator.call_count(), 1);

    let requests = narrator.requests.lock().unwrap();
    assert_eq!(requests[0].temperature, 0.2);
    assert!(requests[0]
        .prompt
        .contains("- Alice · March 2026 · 125.0% FTE · Apollo (120h), Gemini (80h)"));
    assert!(requests[0].prompt.ends_with("Mitigation guidance:"));
}

#[test]
fn test_narration_failure_never_changes_numbers() {
    let scenario = march_scenario();
    for err in [
        NarrationError::Configuration("missing key".to_string()),
        NarrationError::Invocation("timeout".to_string()),
    ] {
        let state = state_with(&scenario, Arc::new(FailingNarrator(err)));
        let response = state.insights_api.scan_conflicts().unwrap();
        assert_eq!(response.conflicts.len(), 1);
        assert!(response.message.ends_with(CONFLICT_FALLBACK_GUIDANCE));
    }
}

// ==========================================
// 产能预测
// ==========================================

#[test]
fn test_forecast_from_march() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let response = state.insights_api.forecast_from(march_15(), 3).unwrap();
    assert_eq!(response.forecast_period_months, 3);
    let labels: Vec<&str> = response
        .predictions
        .iter()
        .map(|p| p.month_label.as_str())
        .collect();
    assert_eq!(labels, vec!["March 2026", "April 2026", "May 2026"]);

    // 3 名员工 x 160h
    let march = &response.predictions[0];
    assert_eq!(march.projected_capacity_hours, 480);
    assert_eq!(march.projected_allocated_hours, 240);
    assert_eq!(march.surplus_hours, 240);
    assert_eq!(march.risk, ForecastRisk::Underutilized);
    assert!(response
        .predictions
        .iter()
        .all(|p| p.surplus_hours == p.projected_capacity_hours - p.projected_allocated_hours));

    assert_eq!(
        response.message,
        format!("Notice: 3 month(s) show underutilization. {}", UNDERUTILIZED_GUIDANCE)
    );
}

#[test]
fn test_forecast_is_idempotent() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let first = serde_json::to_value(state.insights_api.forecast_from(march_15(), 3).unwrap()).unwrap();
    let second = serde_json::to_value(state.insights_api.forecast_from(march_15(), 3).unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["predictions"][0]["projected_allocated_hours"], 240);
}

#[test]
fn test_forecast_rejects_zero_months() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let err = state.insights_api.forecast_from(march_15(), 0).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert_eq!(err.status_code(), 400);
}

// ==========================================
// 工作量调配
// ==========================================

#[test]
fn test_portfolio_balance_moves_overload_to_least_loaded() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let response = state
        .insights_api
        .balance_suggestions_at(march_15(), None)
        .unwrap();
    assert_eq!(response.project_id, None);
    assert_eq!(response.suggestions.len(), 1);

    let suggestion = &response.suggestions[0];
    assert_eq!(suggestion.action, RebalanceAction::RebalanceAllocation);
    assert_eq!(suggestion.from_user_id, scenario.alice);
    assert_eq!(suggestion.to_user_id, scenario.carol);
    assert_eq!(suggestion.recommended_hours, 40);

    assert_eq!(
        response.message,
        format!(
            "Found 1 workload balancing opportunity in the portfolio. {}",
            REBALANCE_FALLBACK_GUIDANCE
        )
    );
}

#[test]
fn test_project_balance_only_considers_members() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let response = state
        .insights_api
        .balance_suggestions_at(march_15(), Some(scenario.apollo))
        .unwrap();
    assert_eq!(response.project_id, Some(scenario.apollo));
    assert_eq!(response.suggestions.len(), 1);
    assert_eq!(response.suggestions[0].to_user_id, scenario.bob);
    assert_eq!(response.suggestions[0].recommended_hours, 40);
    assert!(response.message.contains("in the project. "));

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["suggestions"][0]["action"], "rebalance_allocation");
    assert_eq!(json["suggestions"][0]["from_employee"], "Alice");
    assert_eq!(json["suggestions"][0]["to_employee"], "Bob");
}

#[test]
fn test_rebalance_is_idempotent() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));
    let api = &state.insights_api;

    for scope in [None, Some(scenario.apollo)] {
        let first = serde_json::to_value(api.balance_suggestions_at(march_15(), scope).unwrap()).unwrap();
        let second = serde_json::to_value(api.balance_suggestions_at(march_15(), scope).unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["suggestions"][0]["recommended_hours"], 40);
    }
}

#[test]
fn test_balance_in_quiet_month() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let june = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let response = state.insights_api.balance_suggestions_at(june, None).unwrap();
    assert!(response.suggestions.is_empty());
    assert_eq!(
        response.message,
        "No obvious workload imbalances detected for the selected scope."
    );
}

// ==========================================
// 人员推荐
// ==========================================

fn gemini_request(scenario: &Scenario) -> StaffingRecommendationRequest {
    StaffingRecommendationRequest {
        project_id: scenario.gemini,
        year: 2026,
        month: 3,
        required_hours: 60,
        role_id: None,
        lcat_id: None,
    }
}

#[test]
fn test_recommend_excludes_project_members() {
    let scenario = march_scenario();
    let narrator = Arc::new(ScriptedNarrator::new("Staff Bob for the remaining hours."));
    let state = state_with(&scenario, narrator.clone());

    let response = state
        .insights_api
        .recommend_staff(&gemini_request(&scenario))
        .unwrap();
    let ids: Vec<i64> = response.candidates.iter().map(|c| c.user_id).collect();
    assert_eq!(ids, vec![scenario.bob]);
    assert_eq!(response.candidates[0].available_hours, 120);
    assert_eq!(response.candidates[0].current_fte, 0.25);
    assert_eq!(response.reasoning, "Staff Bob for the remaining hours.");

    let requests = narrator.requests.lock().unwrap();
    assert_eq!(requests[0].temperature, 0.1);
    assert!(requests[0].prompt.contains("Project: Gemini (GEM-02)"));
}

#[test]
fn test_recommend_with_role_filter() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(ScriptedNarrator::new("ok")));

    let mut request = gemini_request(&scenario);
    request.role_id = Some(scenario.fx.role_id);
    let response = state.insights_api.recommend_staff(&request).unwrap();
    // Bob 以默认角色分派在 Apollo，满足角色条件
    assert_eq!(response.candidates.len(), 1);

    let other_role = scenario.fx.catalog.insert_role("Cyber Analyst").unwrap();
    request.role_id = Some(other_role);
    let state = state_with(&scenario, Arc::new(DisabledNarrator));
    let response = state.insights_api.recommend_staff(&request).unwrap();
    assert!(response.candidates.is_empty());
    assert_eq!(
        response.reasoning,
        "No employees meet the requested role/LCAT criteria with sufficient capacity in March 2026. \
         Consider broadening the requirements or adjusting allocations."
    );
}

#[test]
fn test_recommend_not_found() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let mut request = gemini_request(&scenario);
    request.project_id = 9_999;
    let err = state.insights_api.recommend_staff(&request).unwrap_err();
    assert_eq!(err.status_code(), 404);

    let mut request = gemini_request(&scenario);
    request.lcat_id = Some(9_999);
    let err = state.insights_api.recommend_staff(&request).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_recommend_surfaces_narration_errors() {
    let scenario = march_scenario();

    let state = state_with(&scenario, Arc::new(DisabledNarrator));
    let err = state
        .insights_api
        .recommend_staff(&gemini_request(&scenario))
        .unwrap_err();
    assert!(matches!(err, ApiError::NarrationUnavailable(_)));
    assert_eq!(err.status_code(), 503);

    let state = state_with(
        &scenario,
        Arc::new(FailingNarrator(NarrationError::Invocation("HTTP 500".to_string()))),
    );
    let err = state
        .insights_api
        .recommend_staff(&gemini_request(&scenario))
        .unwrap_err();
    assert!(matches!(err, ApiError::NarrationFailed(_)));
    assert_eq!(err.status_code(), 502);
}

#[test]
fn test_recommend_rejects_invalid_month() {
    let scenario = march_scenario();
    let state = state_with(&scenario, Arc::new(DisabledNarrator));

    let mut request = gemini_request(&scenario);
    request.month = 13;
    let err = state.insights_api.recommend_staff(&request).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
