// ==========================================
// StaffAlloc - 领域类型定义
// ==========================================
// 职责: 枚举型领域值（系统角色、预测风险、调配动作）
// 序列化格式与数据库/前端口径保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 系统角色 (System Role)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    Admin,    // 系统管理员
    Director, // 部门总监
    Pm,       // 项目经理
    Employee, // 普通员工（参与产能分析）
}

impl SystemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::Admin => "ADMIN",
            SystemRole::Director => "DIRECTOR",
            SystemRole::Pm => "PM",
            SystemRole::Employee => "EMPLOYEE",
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(SystemRole::Admin),
            "DIRECTOR" => Ok(SystemRole::Director),
            "PM" => Ok(SystemRole::Pm),
            "EMPLOYEE" => Ok(SystemRole::Employee),
            other => Err(format!("未知系统角色: {}", other)),
        }
    }
}

// ==========================================
// 预测风险 (Forecast Risk)
// ==========================================
// 判定顺序: shortage -> underutilized -> balanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastRisk {
    Shortage,      // 产能不足（盈余 < 0）
    Underutilized, // 利用不足（盈余 > 产能 * 阈值）
    Balanced,      // 均衡
}

impl ForecastRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastRisk::Shortage => "shortage",
            ForecastRisk::Underutilized => "underutilized",
            ForecastRisk::Balanced => "balanced",
        }
    }
}

impl fmt::Display for ForecastRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 调配动作 (Rebalance Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceAction {
    RebalanceAllocation,
}

impl fmt::Display for RebalanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceAction::RebalanceAllocation => write!(f, "rebalance_allocation"),
        }
    }
}
