use super::line_item::{LineItem, TaxLine};
use super::tax::{SupplyType, TaxRate};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 税率行: 同一发票按税率拆分的应税额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLine {
    pub rate: TaxRate,
    pub taxable_value: BigDecimal,
}

/// B2B 发票录入 (表 4A)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct B2bInvoiceInput {
    pub recipient_gstin: String,
    #[serde(default)]
    pub recipient_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub total_invoice_value: BigDecimal,
    pub pos_code: String,
    pub rate_lines: Vec<RateLine>,
    #[serde(default)]
    pub cess: BigDecimal,
}

/// B2B 发票 (已计算税额)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2bInvoice {
    pub recipient_gstin: String,
    #[serde(default)]
    pub recipient_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    #[serde(default)]
    pub total_invoice_value: BigDecimal,
    pub pos_code: String,
    pub supply_type: SupplyType,
    #[serde(default)]
    pub rate_lines: Vec<RateLine>,
    #[serde(default)]
    pub taxable_value: Option<BigDecimal>,
    #[serde(default)]
    pub igst: Option<BigDecimal>,
    #[serde(default)]
    pub cgst: Option<BigDecimal>,
    #[serde(default)]
    pub sgst: Option<BigDecimal>,
    #[serde(default)]
    pub cess: Option<BigDecimal>,
}

impl TaxLine for B2bInvoice {
    fn line_item(&self) -> LineItem {
        LineItem {
            taxable_value: self.taxable_value.clone(),
            rate: None,
            supply_type: Some(self.supply_type),
            igst: self.igst.clone(),
            cgst: self.cgst.clone(),
            sgst: self.sgst.clone(),
            cess: self.cess.clone(),
        }
    }
}

/// B2C (其他) 录入 (表 7)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct B2csInput {
    pub pos_code: String,
    pub taxable_value: BigDecimal,
    pub rate: TaxRate,
    #[serde(default)]
    pub cess: BigDecimal,
}

/// B2C (其他) 汇总行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2csRow {
    pub pos_code: String,
    pub supply_type: SupplyType,
    #[serde(default)]
    pub taxable_value: Option<BigDecimal>,
    pub rate: TaxRate,
    #[serde(default)]
    pub igst: Option<BigDecimal>,
    #[serde(default)]
    pub cgst: Option<BigDecimal>,
    #[serde(default)]
    pub sgst: Option<BigDecimal>,
    #[serde(default)]
    pub cess: Option<BigDecimal>,
}

impl TaxLine for B2csRow {
    fn line_item(&self) -> LineItem {
        LineItem {
            taxable_value: self.taxable_value.clone(),
            rate: Some(self.rate.value().clone()),
            supply_type: Some(self.supply_type),
            igst: self.igst.clone(),
            cgst: self.cgst.clone(),
            sgst: self.sgst.clone(),
            cess: self.cess.clone(),
        }
    }
}

/// 计量单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Uqc {
    #[serde(rename = "NOS")]
    Numbers,
    #[serde(rename = "KGS")]
    Kilograms,
    #[serde(rename = "PCS")]
    Pieces,
    #[serde(rename = "NA")]
    NotApplicable,
}

/// HSN 汇总页签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HsnTab {
    B2B,
    B2C,
}

/// HSN 行录入 (表 12)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsnInput {
    pub hsn_code: String,
    #[serde(default)]
    pub description: String,
    pub uqc: Uqc,
    #[serde(default)]
    pub total_quantity: BigDecimal,
    pub taxable_value: BigDecimal,
    pub rate: TaxRate,
    pub supply_type: SupplyType,
    #[serde(default)]
    pub cess: BigDecimal,
    pub tab: HsnTab,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HsnRow {
    pub hsn_code: String,
    #[serde(default)]
    pub description: String,
    pub uqc: Uqc,
    #[serde(default)]
    pub total_quantity: BigDecimal,
    #[serde(default)]
    pub taxable_value: Option<BigDecimal>,
    pub rate: TaxRate,
    pub supply_type: SupplyType,
    #[serde(default)]
    pub igst: Option<BigDecimal>,
    #[serde(default)]
    pub cgst: Option<BigDecimal>,
    #[serde(default)]
    pub sgst: Option<BigDecimal>,
    #[serde(default)]
    pub cess: Option<BigDecimal>,
    pub tab: HsnTab,
}

impl TaxLine for HsnRow {
    fn line_item(&self) -> LineItem {
        LineItem {
            taxable_value: self.taxable_value.clone(),
            rate: Some(self.rate.value().clone()),
            supply_type: Some(self.supply_type),
            igst: self.igst.clone(),
            cgst: self.cgst.clone(),
            sgst: self.sgst.clone(),
            cess: self.cess.clone(),
        }
    }
}

/// 已开具单据类别 (表 13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    OutwardSupplyInvoice,
    InwardUnregisteredInvoice,
    RevisedInvoice,
    DebitNote,
    CreditNote,
    ReceiptVoucher,
    PaymentVoucher,
    RefundVoucher,
    JobWorkChallan,
    ApprovalChallan,
    LiquidGasChallan,
    OtherChallan,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::OutwardSupplyInvoice => "Invoices for outward supply",
            DocumentType::InwardUnregisteredInvoice => {
                "Invoices for inward supply from unregistered person"
            }
            DocumentType::RevisedInvoice => "Revised Invoice",
            DocumentType::DebitNote => "Debit Note",
            DocumentType::CreditNote => "Credit Note",
            DocumentType::ReceiptVoucher => "Receipt Voucher",
            DocumentType::PaymentVoucher => "Payment Voucher",
            DocumentType::RefundVoucher => "Refund Voucher",
            DocumentType::JobWorkChallan => "Delivery Challan for job work",
            DocumentType::ApprovalChallan => "Delivery Challan for supply on approval",
            DocumentType::LiquidGasChallan => "Delivery Challan in case of liquid gas",
            DocumentType::OtherChallan => "Delivery Challan in cases other than by way of supply",
        }
    }
}

/// 单据号段录入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRangeInput {
    pub sr_from: i64,
    pub sr_to: i64,
    pub total: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRange {
    pub document_type: DocumentType,
    #[serde(default)]
    pub sr_from: i64,
    #[serde(default)]
    pub sr_to: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub cancelled: i64,
}

impl DocumentRange {
    pub fn net_issued(&self) -> i64 {
        (self.total - self.cancelled).max(0)
    }
}

impl TaxLine for DocumentRange {
    /// 单据号段没有税额, 以净开具数作为数量
    fn line_item(&self) -> LineItem {
        LineItem {
            taxable_value: Some(BigDecimal::from(self.net_issued())),
            ..LineItem::default()
        }
    }
}

/// 零税率 / 免税 / 非 GST 金额
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NilAmounts {
    #[serde(default)]
    pub nil: BigDecimal,
    #[serde(default)]
    pub exempted: BigDecimal,
    #[serde(default)]
    pub non_gst: BigDecimal,
}

/// 表 8: 每个申报期一条
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NilRatedSupplies {
    #[serde(default)]
    pub intra_registered: NilAmounts,
    #[serde(default)]
    pub intra_unregistered: NilAmounts,
    #[serde(default)]
    pub inter_registered: NilAmounts,
    #[serde(default)]
    pub inter_unregistered: NilAmounts,
}

impl NilRatedSupplies {
    pub fn buckets(&self) -> [(&'static str, &NilAmounts); 4] {
        [
            ("intra_registered", &self.intra_registered),
            ("intra_unregistered", &self.intra_unregistered),
            ("inter_registered", &self.inter_registered),
            ("inter_unregistered", &self.inter_unregistered),
        ]
    }

    pub fn nil_total(&self) -> BigDecimal {
        self.sum_by(|a| &a.nil)
    }

    pub fn exempted_total(&self) -> BigDecimal {
        self.sum_by(|a| &a.exempted)
    }

    pub fn non_gst_total(&self) -> BigDecimal {
        self.sum_by(|a| &a.non_gst)
    }

    fn sum_by<F>(&self, pick: F) -> BigDecimal
    where
        F: Fn(&NilAmounts) -> &BigDecimal,
    {
        self.buckets()
            .iter()
            .fold(BigDecimal::zero(), |acc, (_, amounts)| acc + pick(amounts))
    }
}
