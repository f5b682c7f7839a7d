// Dev utility: rebuild a demo staffing database with a deterministic scenario.
//
// Usage:
//   cargo run --bin seed_demo_db -- [db_path]
//
// The scenario is anchored on the current month so that conflicts, forecast and
// rebalance suggestions all produce results right after seeding.

use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use staff_alloc::app::get_default_db_path;
use staff_alloc::config::{config_keys, ConfigManager};
use staff_alloc::db::{init_schema, open_sqlite_connection};
use staff_alloc::domain::{NewEmployee, SystemRole, YearMonth};
use staff_alloc::repository::{
    AllocationRepository, AssignmentRepository, CatalogRepository, ProjectRepository,
    UserRepository,
};

/// (姓名, 角色下标, LCAT 下标)
const EMPLOYEES: &[(&str, usize, usize)] = &[
    ("Alex Thompson", 0, 1),
    ("Priya Raman", 0, 2),
    ("Marcus Chen", 1, 1),
    ("Sofia Alvarez", 2, 0),
    ("Jordan Blake", 1, 0),
    ("Hana Okafor", 3, 2),
];

const ROLES: &[&str] = &["Developer", "Cyber Analyst", "Project Manager", "Data Engineer"];
const LCATS: &[&str] = &["Junior", "Mid-Level", "Senior"];

/// (名称, 代码, 状态)
const PROJECTS: &[(&str, &str, &str)] = &[
    ("Apollo Modernization", "APL-01", "Active"),
    ("Gemini Data Platform", "GEM-02", "Active"),
    ("Orion Security Review", "ORN-03", "Planning"),
];

/// (员工下标, 项目下标, 当月起各月工时)
const ALLOCATIONS: &[(usize, usize, [i64; 3])] = &[
    (0, 0, [120, 100, 80]),
    (0, 1, [100, 80, 40]),
    (1, 0, [80, 80, 80]),
    (1, 2, [60, 40, 0]),
    (2, 1, [160, 120, 120]),
    (2, 2, [40, 40, 40]),
    (3, 0, [40, 60, 80]),
    (4, 1, [0, 20, 40]),
    (5, 2, [20, 20, 20]),
];

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    seed_demo_scenario(conn.clone())?;

    eprintln!("Seeded demo database at {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo_scenario(conn: Arc<Mutex<rusqlite::Connection>>) -> Result<(), Box<dyn Error>> {
    let users = UserRepository::from_connection(conn.clone());
    let projects = ProjectRepository::from_connection(conn.clone());
    let catalog = CatalogRepository::from_connection(conn.clone());
    let assignments = AssignmentRepository::from_connection(conn.clone());
    let allocations = AllocationRepository::from_connection(conn.clone());
    let config = ConfigManager::from_connection(conn)?;

    let role_ids = ROLES
        .iter()
        .map(|name| catalog.insert_role(name))
        .collect::<Result<Vec<_>, _>>()?;
    let lcat_ids = LCATS
        .iter()
        .map(|name| catalog.insert_lcat(name))
        .collect::<Result<Vec<_>, _>>()?;

    let director = users.insert(&NewEmployee {
        full_name: "Dana Whitfield".to_string(),
        email: "dana.whitfield@example.com".to_string(),
        system_role: SystemRole::Director,
        manager_id: None,
    })?;

    let mut employee_ids = Vec::with_capacity(EMPLOYEES.len());
    for (name, _, _) in EMPLOYEES {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        employee_ids.push(users.insert(&NewEmployee {
            full_name: name.to_string(),
            email,
            system_role: SystemRole::Employee,
            manager_id: Some(director),
        })?);
    }

    let project_ids = PROJECTS
        .iter()
        .map(|(name, code, status)| projects.insert(name, code, status))
        .collect::<Result<Vec<_>, _>>()?;

    let start = YearMonth::from_date(Local::now().date_naive());
    let mut allocation_rows = 0;
    for (employee_idx, project_idx, hours) in ALLOCATIONS {
        let (_, role_idx, lcat_idx) = EMPLOYEES[*employee_idx];
        let assignment_id = assignments.insert(
            project_ids[*project_idx],
            employee_ids[*employee_idx],
            role_ids[role_idx],
            lcat_ids[lcat_idx],
            hours.iter().sum::<i64>() + 120,
        )?;
        for (offset, month_hours) in hours.iter().enumerate() {
            let period = start.offset(offset as u32);
            allocations.upsert(assignment_id, period.year, period.month, *month_hours)?;
            allocation_rows += 1;
        }
    }

    // 年末假期月份按 140h 计
    let december = format!("{}-12", start.year);
    config.set_global_config_value(
        config_keys::MONTH_HOUR_OVERRIDES,
        &format!(r#"{{"{}": 140}}"#, december),
    )?;

    eprintln!(
        "users={} projects={} assignments={} allocations={}",
        employee_ids.len() + 1,
        project_ids.len(),
        ALLOCATIONS.len(),
        allocation_rows
    );
    Ok(())
}
