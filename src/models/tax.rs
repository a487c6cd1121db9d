use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 四舍五入到两位小数 (half-up)
pub fn round2(value: &BigDecimal) -> BigDecimal {
    value.round(2)
}

/// 两位小数并截断负数为 0
pub fn clamp2(value: &BigDecimal) -> BigDecimal {
    let rounded = round2(value);
    if rounded < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        rounded
    }
}

/// 负数视为 0 (不做舍入)
pub fn floor_zero(value: &BigDecimal) -> BigDecimal {
    if *value < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        value.clone()
    }
}

/// 供给类型: 州内 / 跨州
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplyType {
    #[serde(rename = "Intra-State")]
    IntraState,
    #[serde(rename = "Inter-State")]
    InterState,
}

impl SupplyType {
    /// Intra-State when both jurisdiction codes match.
    pub fn from_state_codes(supplier_state: &str, place_of_supply: &str) -> Self {
        if supplier_state == place_of_supply {
            SupplyType::IntraState
        } else {
            SupplyType::InterState
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyType::IntraState => "Intra-State",
            SupplyType::InterState => "Inter-State",
        }
    }
}

impl fmt::Display for SupplyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 税目: IGST / CGST / SGST / CESS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxHead {
    Igst,
    Cgst,
    Sgst,
    Cess,
}

impl TaxHead {
    pub const ALL: [TaxHead; 4] = [TaxHead::Igst, TaxHead::Cgst, TaxHead::Sgst, TaxHead::Cess];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxHead::Igst => "igst",
            TaxHead::Cgst => "cgst",
            TaxHead::Sgst => "sgst",
            TaxHead::Cess => "cess",
        }
    }
}

impl fmt::Display for TaxHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// 按税目拆分的金额 (四列)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxAmounts {
    #[serde(default)]
    pub igst: BigDecimal,
    #[serde(default)]
    pub cgst: BigDecimal,
    #[serde(default)]
    pub sgst: BigDecimal,
    #[serde(default)]
    pub cess: BigDecimal,
}

impl TaxAmounts {
    pub fn get(&self, head: TaxHead) -> &BigDecimal {
        match head {
            TaxHead::Igst => &self.igst,
            TaxHead::Cgst => &self.cgst,
            TaxHead::Sgst => &self.sgst,
            TaxHead::Cess => &self.cess,
        }
    }

    pub fn get_mut(&mut self, head: TaxHead) -> &mut BigDecimal {
        match head {
            TaxHead::Igst => &mut self.igst,
            TaxHead::Cgst => &mut self.cgst,
            TaxHead::Sgst => &mut self.sgst,
            TaxHead::Cess => &mut self.cess,
        }
    }

    /// Builds a new value by applying `f` to every head.
    pub fn map<F>(&self, mut f: F) -> TaxAmounts
    where
        F: FnMut(TaxHead, &BigDecimal) -> BigDecimal,
    {
        TaxAmounts {
            igst: f(TaxHead::Igst, &self.igst),
            cgst: f(TaxHead::Cgst, &self.cgst),
            sgst: f(TaxHead::Sgst, &self.sgst),
            cess: f(TaxHead::Cess, &self.cess),
        }
    }

    pub fn add(&self, other: &TaxAmounts) -> TaxAmounts {
        self.map(|head, v| v + other.get(head))
    }

    pub fn sub(&self, other: &TaxAmounts) -> TaxAmounts {
        self.map(|head, v| v - other.get(head))
    }

    pub fn total(&self) -> BigDecimal {
        &self.igst + &self.cgst + &self.sgst + &self.cess
    }
}

/// 拆分结果: 跨州只有 IGST, 州内 CGST == SGST
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxSplit {
    pub igst: BigDecimal,
    pub cgst: BigDecimal,
    pub sgst: BigDecimal,
}

/// 允许的税率 (百分比)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BigDecimal", into = "BigDecimal")]
pub struct TaxRate(BigDecimal);

impl TaxRate {
    /// 整数税率
    pub const WHOLE_RATES: [u32; 8] = [0, 3, 5, 8, 12, 18, 28, 48];

    /// 全部允许税率, 含 0.1%
    pub fn allowed() -> Vec<BigDecimal> {
        let mut rates: Vec<BigDecimal> = Self::WHOLE_RATES
            .iter()
            .map(|r| BigDecimal::from(*r))
            .collect();
        rates.insert(1, BigDecimal::from(1) / BigDecimal::from(10));
        rates
    }

    pub fn new(rate: BigDecimal) -> Result<Self, InvalidRate> {
        if Self::allowed().iter().any(|allowed| *allowed == rate) {
            Ok(Self(rate))
        } else {
            Err(InvalidRate(rate))
        }
    }

    pub fn percent(whole: u32) -> Result<Self, InvalidRate> {
        Self::new(BigDecimal::from(whole))
    }

    pub fn value(&self) -> &BigDecimal {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<BigDecimal> for TaxRate {
    type Error = InvalidRate;

    fn try_from(value: BigDecimal) -> Result<Self, Self::Error> {
        TaxRate::new(value)
    }
}

impl From<TaxRate> for BigDecimal {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRate(pub BigDecimal);

impl fmt::Display for InvalidRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tax rate {}% is not an allowed GST rate", self.0)
    }
}

impl std::error::Error for InvalidRate {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn round2_is_half_up() {
        assert_eq!(round2(&dec("1.005")), dec("1.01"));
        assert_eq!(round2(&dec("1.004")), dec("1.00"));
        assert_eq!(round2(&dec("2.5")), dec("2.50"));
    }

    #[test]
    fn clamp2_floors_negative() {
        assert_eq!(clamp2(&dec("-3.456")), BigDecimal::zero());
        assert_eq!(clamp2(&dec("3.456")), dec("3.46"));
    }

    #[test]
    fn rate_allows_fractional_and_rejects_unknown() {
        assert!(TaxRate::new(dec("0.1")).is_ok());
        assert!(TaxRate::new(dec("18.00")).is_ok());
        assert!(TaxRate::new(dec("17")).is_err());
        assert!(TaxRate::percent(48).is_ok());
    }

    #[test]
    fn supply_type_from_state_codes() {
        assert_eq!(SupplyType::from_state_codes("33", "33"), SupplyType::IntraState);
        assert_eq!(SupplyType::from_state_codes("33", "29"), SupplyType::InterState);
    }

    #[test]
    fn supply_type_serializes_with_portal_labels() {
        let json = serde_json::to_string(&SupplyType::InterState).unwrap();
        assert_eq!(json, "\"Inter-State\"");
    }
}
