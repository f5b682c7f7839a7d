// ==========================================
// 仓储层集成测试
// ==========================================
// 覆盖: 分派 / 月度分配写入、聚合查询顺序、约束映射
// ==========================================


use staff_alloc::engine::{StaffingDataSource, StaffingRepositories};
use staff_alloc::repository::RepositoryError;
use std::sync::Arc;
use test_helpers::{create_test_db, StaffingFixture};

#[test]
fn test_allocation_upsert_overwrites_same_month() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let fx = StaffingFixture::open(&db_path);
    let alice = fx.employee("Alice");
    let apollo = fx.project("Apollo", "APL-01");
    let assignment = fx.assign(apollo, alice);

    let first = fx.allocations.upsert(assignment, 2026, 3, 80).unwrap();
    let second = fx.allocations.upsert(assignment, 2026, 3, 120).unwrap();
    assert_eq!(first, second);

    let rows = fx.allocations.find_by_assignment(assignment).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].allocated_hours, 120);
}

#[test]
fn test_allocation_upsert_rejects_bad_values() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let fx = StaffingFixture::open(&db_path);
    let alice = fx.employee("Alice");
    let apollo = fx.project("Apollo", "APL-01");
    let assignment = fx.assign(apollo, alice);

    let err = fx.allocations.upsert(assignment, 2026, 13, 10).unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));

    let err = fx.allocations.upsert(assignment, 2026, 3, -5).unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));

    let err = fx.allocations.upsert(9_999, 2026, 3, 10).unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
}

#[test]
fn test_duplicate_assignment_is_unique_violation() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let fx = StaffingFixture::open(&db_path);
    let alice = fx.employee("Alice");
    let apollo = fx.project("Apollo", "APL-01");
    fx.assign(apollo, alice);

    let err = fx
        .assignments
        .insert(apollo, alice, fx.role_id, fx.lcat_id, 0)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}

#[test]
fn test_monthly_aggregates_are_ordered() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let fx = StaffingFixture::open(&db_path);
    let alice = fx.employee("Alice");
    let bob = fx.employee("Bob");
    let apollo = fx.project("Apollo", "APL-01");
    let gemini = fx.project("Gemini", "GEM-02");

    let b_gemini = fx.assign(gemini, bob);
    let a_gemini = fx.assign(gemini, alice);
    let a_apollo = fx.assign(apollo, alice);

    // 写入顺序故意打乱
    fx.allocate(b_gemini, 2026, 4, 30);
    fx.allocate(a_gemini, 2026, 3, 50);
    fx.allocate(a_apollo, 2026, 3, 70);
    fx.allocate(b_gemini, 2025, 12, 10);

    let tallies = fx.allocations.monthly_user_project_allocations().unwrap();
    let keys: Vec<(i32, u32, i64, i64)> = tallies
        .iter()
        .map(|t| (t.year, t.month, t.user_id, t.project_id))
        .collect();
    assert_eq!(
        keys,
        vec![
            (2025, 12, bob, gemini),
            (2026, 3, alice, apollo),
            (2026, 3, alice, gemini),
            (2026, 4, bob, gemini),
        ]
    );
    assert_eq!(tallies[1].project_name, "Apollo");

    let totals = fx.allocations.monthly_user_totals().unwrap();
    let totals: Vec<(i32, u32, i64, i64)> = totals
        .iter()
        .map(|t| (t.year, t.month, t.user_id, t.total_hours))
        .collect();
    assert_eq!(
        totals,
        vec![(2025, 12, bob, 10), (2026, 3, alice, 120), (2026, 4, bob, 30)]
    );
}

#[test]
fn test_data_source_reads_through_repositories() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let fx = StaffingFixture::open(&db_path);
    let alice = fx.employee("Alice");
    let bob = fx.employee("Bob");
    let apollo = fx.project("Apollo", "APL-01");
    let a_apollo = fx.assign_as(apollo, alice, fx.role_id, fx.lcat_id, 200);
    fx.assign_as(apollo, bob, fx.role_id, fx.lcat_id, 50);
    fx.allocate(a_apollo, 2026, 3, 90);
    fx.users.set_active(bob, false).unwrap();

    let data: Arc<dyn StaffingDataSource> = Arc::new(StaffingRepositories::from_connection(
        fx.conn.clone(),
    ));

    let active: Vec<i64> = data.active_employees().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(active, vec![alice]);

    assert_eq!(data.assignments_for_project(apollo).unwrap().len(), 2);
    assert_eq!(data.assignments_for_user(alice).unwrap().len(), 1);
    assert_eq!(data.count_projects().unwrap(), 1);

    let hours = data.project_hours(apollo).unwrap();
    assert_eq!(hours.funded_hours, 250);
    assert_eq!(hours.allocated_hours, 90);

    assert!(data.find_project(9_999).unwrap().is_none());
    assert_eq!(data.find_role(fx.role_id).unwrap().unwrap().name, "Developer");
    assert_eq!(data.find_lcat(fx.lcat_id).unwrap().unwrap().name, "Mid-Level");
    assert_eq!(data.find_employee(bob).unwrap().unwrap().is_active, false);
}
