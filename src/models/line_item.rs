use super::tax::{SupplyType, TaxAmounts};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// 统一明细行: 各分节记录投影到这里再汇总, 缺失数值按 0 处理
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub taxable_value: Option<BigDecimal>,
    #[serde(default)]
    pub rate: Option<BigDecimal>,
    #[serde(default)]
    pub supply_type: Option<SupplyType>,
    #[serde(default)]
    pub igst: Option<BigDecimal>,
    #[serde(default)]
    pub cgst: Option<BigDecimal>,
    #[serde(default)]
    pub sgst: Option<BigDecimal>,
    #[serde(default)]
    pub cess: Option<BigDecimal>,
}

/// 可投影为 LineItem 的分节记录
pub trait TaxLine {
    fn line_item(&self) -> LineItem;
}

impl TaxLine for LineItem {
    fn line_item(&self) -> LineItem {
        self.clone()
    }
}

/// 分节合计, 每次加载/增删改后重新计算, 不单独存储
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTotal {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub taxable_value: BigDecimal,
    #[serde(default)]
    pub igst: BigDecimal,
    #[serde(default)]
    pub cgst: BigDecimal,
    #[serde(default)]
    pub sgst: BigDecimal,
    #[serde(default)]
    pub cess: BigDecimal,
}

impl Default for SectionTotal {
    fn default() -> Self {
        Self {
            count: 0,
            taxable_value: BigDecimal::zero(),
            igst: BigDecimal::zero(),
            cgst: BigDecimal::zero(),
            sgst: BigDecimal::zero(),
            cess: BigDecimal::zero(),
        }
    }
}

impl SectionTotal {
    /// Tax-only total, used for sections that carry no taxable value (ITC, payment).
    pub fn from_taxes(taxes: &TaxAmounts) -> Self {
        Self {
            count: 0,
            taxable_value: BigDecimal::zero(),
            igst: taxes.igst.clone(),
            cgst: taxes.cgst.clone(),
            sgst: taxes.sgst.clone(),
            cess: taxes.cess.clone(),
        }
    }

    pub fn taxes(&self) -> TaxAmounts {
        TaxAmounts {
            igst: self.igst.clone(),
            cgst: self.cgst.clone(),
            sgst: self.sgst.clone(),
            cess: self.cess.clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0
            && self.taxable_value.is_zero()
            && self.igst.is_zero()
            && self.cgst.is_zero()
            && self.sgst.is_zero()
            && self.cess.is_zero()
    }
}
