// ==========================================
// StaffAlloc - 命令行入口
// ==========================================
// 用法:
//   staff-alloc conflicts
//   staff-alloc forecast [months]
//   staff-alloc balance [project_id]
//   staff-alloc recommend <project_id> <year> <month> <required_hours> [role_id] [lcat_id]
//   staff-alloc timeline <user_id> [start_year start_month [end_year end_month]]
//   staff-alloc dashboard <project_id>
//   staff-alloc portfolio [year month]
//
// 数据库路径: STAFF_ALLOC_DB_PATH 或用户数据目录
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;

use staff_alloc::api::dto::{EmployeeTimelineRequest, StaffingRecommendationRequest};
use staff_alloc::api::insights_api::DEFAULT_FORECAST_MONTHS;
use staff_alloc::app::{get_default_db_path, AppState};
use staff_alloc::YearMonth;

const USAGE: &str = "usage: staff-alloc <conflicts|forecast [months]|balance [project_id]|\
recommend <project_id> <year> <month> <required_hours> [role_id] [lcat_id]|\
timeline <user_id> [start_year start_month [end_year end_month]]|dashboard <project_id>|portfolio [year month]>";

fn main() -> Result<()> {
    staff_alloc::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };
    let rest = &args[1..];

    let db_path = get_default_db_path();
    tracing::info!("{} v{}，使用数据库: {}", staff_alloc::APP_NAME, staff_alloc::VERSION, db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "conflicts" => print_json(&state.insights_api.scan_conflicts()?),
        "forecast" => {
            let months = opt_arg::<u32>(rest, 0, "months")?.unwrap_or(DEFAULT_FORECAST_MONTHS);
            print_json(&state.insights_api.forecast(months)?)
        }
        "balance" => {
            let project_id = opt_arg::<i64>(rest, 0, "project_id")?;
            print_json(&state.insights_api.balance_suggestions(project_id)?)
        }
        "recommend" => {
            let request = StaffingRecommendationRequest {
                project_id: req_arg(rest, 0, "project_id")?,
                year: req_arg(rest, 1, "year")?,
                month: req_arg(rest, 2, "month")?,
                required_hours: req_arg(rest, 3, "required_hours")?,
                role_id: opt_arg(rest, 4, "role_id")?,
                lcat_id: opt_arg(rest, 5, "lcat_id")?,
            };
            print_json(&state.insights_api.recommend_staff(&request)?)
        }
        "timeline" => {
            let request = EmployeeTimelineRequest {
                employee_id: req_arg(rest, 0, "user_id")?,
                start_year: opt_arg(rest, 1, "start_year")?,
                start_month: opt_arg(rest, 2, "start_month")?,
                end_year: opt_arg(rest, 3, "end_year")?,
                end_month: opt_arg(rest, 4, "end_month")?,
            };
            print_json(&state.report_api.employee_timeline(&request)?)
        }
        "dashboard" => {
            let project_id = req_arg::<i64>(rest, 0, "project_id")?;
            print_json(&state.report_api.project_dashboard(project_id)?)
        }
        "portfolio" => {
            let year = opt_arg::<i32>(rest, 0, "year")?;
            let month = opt_arg::<u32>(rest, 1, "month")?;
            let response = match (year, month) {
                (Some(y), Some(m)) => {
                    let period = YearMonth::new(y, m).ok_or_else(|| anyhow!("invalid month: {}", m))?;
                    state.report_api.portfolio_dashboard_for(period)?
                }
                (None, None) => state.report_api.portfolio_dashboard()?,
                _ => bail!("portfolio expects both year and month"),
            };
            print_json(&response)
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn opt_arg<T>(args: &[String], index: usize, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match args.get(index) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid {}: '{}'", name, raw)),
        None => Ok(None),
    }
}

fn req_arg<T>(args: &[String], index: usize, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    opt_arg(args, index, name)?.ok_or_else(|| anyhow!("missing {}\n{}", name, USAGE))
}
