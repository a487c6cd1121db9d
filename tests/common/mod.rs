#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use gst_return_rust::db::{RecordStore, Scope};
use gst_return_rust::models::{B2bInvoiceInput, B2csInput, FilingPeriod, RateLine, Session, TaxRate};
use gst_return_rust::MemoryStore;
use std::str::FromStr;
use std::sync::Arc;

pub const USER_ID: &str = "user-1";
/// 供货方在 33 州
pub const SUPPLIER_GSTIN: &str = "33ABCDE1234F1Z5";
pub const HOME_STATE: &str = "33";

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn dyn_store(store: &Arc<MemoryStore>) -> Arc<dyn RecordStore> {
    store.clone()
}

pub fn session() -> Session {
    Session::new(USER_ID, Some(SUPPLIER_GSTIN.to_string()))
}

pub fn period() -> FilingPeriod {
    FilingPeriod::new("2025-2026", "Q1", "Apr").unwrap()
}

pub fn scope() -> Scope {
    Scope::new(USER_ID, period())
}

pub fn b2b_input(recipient_gstin: &str, pos: &str, taxable: &str, rate: u32) -> B2bInvoiceInput {
    let taxable = dec(taxable);
    let total = &taxable + &taxable * BigDecimal::from(rate) / BigDecimal::from(100);
    B2bInvoiceInput {
        recipient_gstin: recipient_gstin.to_string(),
        recipient_name: "Test Recipient".to_string(),
        invoice_number: format!("INV-{}", pos),
        invoice_date: NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
        total_invoice_value: total,
        pos_code: pos.to_string(),
        rate_lines: vec![RateLine {
            rate: TaxRate::percent(rate).unwrap(),
            taxable_value: taxable,
        }],
        cess: BigDecimal::from(0),
    }
}

pub fn b2cs_input(pos: &str, taxable: &str, rate: u32) -> B2csInput {
    B2csInput {
        pos_code: pos.to_string(),
        taxable_value: dec(taxable),
        rate: TaxRate::percent(rate).unwrap(),
        cess: BigDecimal::from(0),
    }
}
