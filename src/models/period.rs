use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 季度 (财年四月开始)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn months(&self) -> [&'static str; 3] {
        match self {
            Quarter::Q1 => ["Apr", "May", "Jun"],
            Quarter::Q2 => ["Jul", "Aug", "Sep"],
            Quarter::Q3 => ["Oct", "Nov", "Dec"],
            Quarter::Q4 => ["Jan", "Feb", "Mar"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl FromStr for Quarter {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Q1" => Ok(Quarter::Q1),
            "Q2" => Ok(Quarter::Q2),
            "Q3" => Ok(Quarter::Q3),
            "Q4" => Ok(Quarter::Q4),
            other => Err(PeriodError::Quarter(other.to_string())),
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    FinancialYear(String),
    Quarter(String),
    Period { quarter: Quarter, period: String },
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::FinancialYear(fy) => {
                write!(f, "financial year '{}' must look like 2024-2025", fy)
            }
            PeriodError::Quarter(q) => write!(f, "quarter '{}' must be one of Q1..Q4", q),
            PeriodError::Period { quarter, period } => write!(
                f,
                "period '{}' is not a month of {} ({})",
                period,
                quarter,
                quarter.months().join(", ")
            ),
        }
    }
}

impl std::error::Error for PeriodError {}

/// 申报期: 财年 + 季度 + 月份
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilingPeriod {
    pub financial_year: String,
    pub quarter: Quarter,
    pub period: String,
}

impl FilingPeriod {
    pub fn new(financial_year: &str, quarter: &str, period: &str) -> Result<Self, PeriodError> {
        let financial_year = normalize_financial_year(financial_year)?;
        let quarter: Quarter = quarter.parse()?;
        let period = period.trim();
        if !quarter.months().contains(&period) {
            return Err(PeriodError::Period {
                quarter,
                period: period.to_string(),
            });
        }
        Ok(Self {
            financial_year,
            quarter,
            period: period.to_string(),
        })
    }

    /// 存储键片段 `fy:q:p`
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.financial_year, self.quarter, self.period)
    }
}

impl fmt::Display for FilingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.financial_year, self.quarter, self.period)
    }
}

/// Accepts `2024-2025` or `2024–2025` and normalizes to the hyphen form.
fn normalize_financial_year(raw: &str) -> Result<String, PeriodError> {
    let trimmed = raw.trim();
    let invalid = || PeriodError::FinancialYear(trimmed.to_string());

    let (start, end) = trimmed
        .split_once('-')
        .or_else(|| trimmed.split_once('–'))
        .ok_or_else(invalid)?;
    if start.len() != 4 || end.len() != 4 {
        return Err(invalid());
    }
    let start: u32 = start.parse().map_err(|_| invalid())?;
    let end: u32 = end.parse().map_err(|_| invalid())?;
    if end != start + 1 {
        return Err(invalid());
    }
    Ok(format!("{}-{}", start, end))
}
