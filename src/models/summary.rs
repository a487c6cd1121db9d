use super::line_item::SectionTotal;
use super::period::FilingPeriod;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// GSTR-3B 汇总分节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummarySection {
    #[serde(rename = "sec_3_1")]
    OutwardSupplies,
    #[serde(rename = "sec_3_1_1")]
    NotifiedSupplies,
    #[serde(rename = "sec_3_2")]
    InterStateSupplies,
    #[serde(rename = "sec_4")]
    EligibleItc,
    #[serde(rename = "sec_5")]
    ExemptInward,
    #[serde(rename = "sec_5_1")]
    InterestAndLateFee,
    #[serde(rename = "sec_6_1")]
    PaymentOfTax,
}

impl SummarySection {
    pub const ALL: [SummarySection; 7] = [
        SummarySection::OutwardSupplies,
        SummarySection::NotifiedSupplies,
        SummarySection::InterStateSupplies,
        SummarySection::EligibleItc,
        SummarySection::ExemptInward,
        SummarySection::InterestAndLateFee,
        SummarySection::PaymentOfTax,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SummarySection::OutwardSupplies => "sec_3_1",
            SummarySection::NotifiedSupplies => "sec_3_1_1",
            SummarySection::InterStateSupplies => "sec_3_2",
            SummarySection::EligibleItc => "sec_4",
            SummarySection::ExemptInward => "sec_5",
            SummarySection::InterestAndLateFee => "sec_5_1",
            SummarySection::PaymentOfTax => "sec_6_1",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SummarySection::OutwardSupplies => {
                "3.1 Tax on outward and reverse charge inward supplies"
            }
            SummarySection::NotifiedSupplies => {
                "3.1.1 Supplies notified under section 9(5) of CGST Act, 2017"
            }
            SummarySection::InterStateSupplies => "3.2 Inter-state supplies",
            SummarySection::EligibleItc => "4. Eligible ITC",
            SummarySection::ExemptInward => "5. Exempt, nil and Non GST inward supplies",
            SummarySection::InterestAndLateFee => "5.1 Interest and Late fee",
            SummarySection::PaymentOfTax => "6.1 Payment of tax",
        }
    }
}

impl fmt::Display for SummarySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 每个 (用户, 申报期) 一条的合并汇总, 各分节保存最近一次的合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedSummary {
    pub user_id: String,
    pub period: FilingPeriod,
    pub sections: IndexMap<SummarySection, SectionTotal>,
    pub updated_at: DateTime<Utc>,
}

impl ConsolidatedSummary {
    /// 所有分节为 0 的默认汇总
    pub fn empty(user_id: &str, period: &FilingPeriod) -> Self {
        Self {
            user_id: user_id.to_string(),
            period: period.clone(),
            sections: SummarySection::ALL
                .into_iter()
                .map(|s| (s, SectionTotal::default()))
                .collect(),
            updated_at: Utc::now(),
        }
    }

    /// Missing sections read as zero.
    pub fn section(&self, section: SummarySection) -> SectionTotal {
        self.sections.get(&section).cloned().unwrap_or_default()
    }
}

/// 概览页的一个磁贴
#[derive(Debug, Clone, Serialize)]
pub struct SummaryTile {
    pub section: SummarySection,
    pub title: &'static str,
    pub total: SectionTotal,
}
