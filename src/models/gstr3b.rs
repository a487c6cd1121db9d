use super::tax::{TaxAmounts, TaxHead};
use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 3.1 表行码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowCode {
    /// (a) 应税对外供应
    A,
    /// (b) 零税率对外供应
    B,
    /// (c) 零税率/免税
    C,
    /// (d) 反向征收的对内供应
    D,
    /// (e) 非 GST 对外供应
    E,
}

impl RowCode {
    pub const ALL: [RowCode; 5] = [RowCode::A, RowCode::B, RowCode::C, RowCode::D, RowCode::E];

    pub fn as_str(&self) -> &'static str {
        match self {
            RowCode::A => "a",
            RowCode::B => "b",
            RowCode::C => "c",
            RowCode::D => "d",
            RowCode::E => "e",
        }
    }

    /// IGST 与 CGST/SGST 互斥, CGST 镜像 SGST
    pub fn is_tax_constrained(&self) -> bool {
        matches!(self, RowCode::A | RowCode::D)
    }

    /// 保存时检查负数和 CGST/SGST 差额的行
    pub fn is_validated(&self) -> bool {
        matches!(self, RowCode::A | RowCode::C | RowCode::D)
    }
}

impl fmt::Display for RowCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "3.1({})", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RowSource {
    Auto,
    Manual,
}

/// 3.1 表可编辑列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutwardColumn {
    Taxable,
    Igst,
    Cgst,
    Sgst,
    Cess,
}

impl OutwardColumn {
    pub const ALL: [OutwardColumn; 5] = [
        OutwardColumn::Taxable,
        OutwardColumn::Igst,
        OutwardColumn::Cgst,
        OutwardColumn::Sgst,
        OutwardColumn::Cess,
    ];

    pub fn is_tax(&self) -> bool {
        matches!(self, OutwardColumn::Igst | OutwardColumn::Cgst | OutwardColumn::Sgst)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutwardColumn::Taxable => "taxable",
            OutwardColumn::Igst => "igst",
            OutwardColumn::Cgst => "cgst",
            OutwardColumn::Sgst => "sgst",
            OutwardColumn::Cess => "cess",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutwardRow {
    #[serde(default)]
    pub taxable: BigDecimal,
    #[serde(default)]
    pub igst: BigDecimal,
    #[serde(default)]
    pub cgst: BigDecimal,
    #[serde(default)]
    pub sgst: BigDecimal,
    #[serde(default)]
    pub cess: BigDecimal,
    pub source: RowSource,
}

impl Default for OutwardRow {
    fn default() -> Self {
        Self {
            taxable: BigDecimal::zero(),
            igst: BigDecimal::zero(),
            cgst: BigDecimal::zero(),
            sgst: BigDecimal::zero(),
            cess: BigDecimal::zero(),
            source: RowSource::Auto,
        }
    }
}

impl OutwardRow {
    pub fn get(&self, column: OutwardColumn) -> &BigDecimal {
        match column {
            OutwardColumn::Taxable => &self.taxable,
            OutwardColumn::Igst => &self.igst,
            OutwardColumn::Cgst => &self.cgst,
            OutwardColumn::Sgst => &self.sgst,
            OutwardColumn::Cess => &self.cess,
        }
    }

    pub fn get_mut(&mut self, column: OutwardColumn) -> &mut BigDecimal {
        match column {
            OutwardColumn::Taxable => &mut self.taxable,
            OutwardColumn::Igst => &mut self.igst,
            OutwardColumn::Cgst => &mut self.cgst,
            OutwardColumn::Sgst => &mut self.sgst,
            OutwardColumn::Cess => &mut self.cess,
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
}

/// 持久化的 3.1 行 (按行码 upsert)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOutwardRow {
    pub row_code: RowCode,
    #[serde(flatten)]
    pub row: OutwardRow,
}

/// 3.1 工作表: 行码有序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutwardWorksheet {
    pub rows: IndexMap<RowCode, OutwardRow>,
}

impl Default for OutwardWorksheet {
    fn default() -> Self {
        Self {
            rows: RowCode::ALL
                .into_iter()
                .map(|code| (code, OutwardRow::default()))
                .collect(),
        }
    }
}

/// 4. 可抵扣进项税 工作表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItcWorksheet {
    /// A(3) 反向征收的对内供应
    #[serde(default)]
    pub reverse_charge: TaxAmounts,
    /// A(5) 其他进项税
    #[serde(default)]
    pub other_itc: TaxAmounts,
    /// B(1) 按规则 38/42/43 及 17(5) 转出
    #[serde(default)]
    pub rule_reversal: TaxAmounts,
    /// B(2) 其他转出
    #[serde(default)]
    pub other_reversal: TaxAmounts,
}

/// 带净额的进项税视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItcStatement {
    #[serde(flatten)]
    pub worksheet: ItcWorksheet,
    /// C = A - B, 不截断
    pub net_itc: TaxAmounts,
}

/// 6.1 缴税工作表中用户可编辑的列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentInputs {
    /// 列 8: 以 IGST 进项抵扣, 按负债税目
    #[serde(default)]
    pub itc_igst_used: TaxAmounts,
    /// 列 9
    #[serde(default)]
    pub itc_cgst_used: TaxAmounts,
    /// 列 10
    #[serde(default)]
    pub itc_sgst_used: TaxAmounts,
    /// 列 18: 可用现金余额
    #[serde(default)]
    pub utilizable_cash_balance: TaxAmounts,
}

/// 6.1 缴税工作表 (计算结果)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentWorksheet {
    /// 列 6: 反向征收应纳税额 (来自 3.1(d))
    pub tax_payable_reverse_charge: TaxAmounts,
    /// 列 7: 其他应纳税额 (来自 3.1(a))
    pub tax_payable_other: TaxAmounts,
    #[serde(flatten)]
    pub inputs: PaymentInputs,
    /// 列 11: CESS 进项, 始终为 0
    pub itc_cess_used: TaxAmounts,
    /// 列 12
    pub cash_paid_other: TaxAmounts,
    /// 列 13
    pub cash_paid_reverse_charge: TaxAmounts,
    /// 列 19
    pub additional_cash_required: TaxAmounts,
    /// 进项税净额 (负数按 0) 作为抵扣上限
    pub itc_available: TaxAmounts,
}

impl PaymentWorksheet {
    /// 某一进项税目 (列) 的合计使用额
    pub fn credit_consumed(&self, credit: TaxHead) -> BigDecimal {
        match credit {
            TaxHead::Igst => self.inputs.itc_igst_used.total(),
            TaxHead::Cgst => self.inputs.itc_cgst_used.total(),
            TaxHead::Sgst => self.inputs.itc_sgst_used.total(),
            TaxHead::Cess => self.itc_cess_used.total(),
        }
    }
}
