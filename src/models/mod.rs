pub mod gstr1;
pub mod gstr3b;
pub mod line_item;
pub mod period;
pub mod session;
pub mod summary;
pub mod tax;

pub use gstr1::{
    B2bInvoice, B2bInvoiceInput, B2csInput, B2csRow, DocumentRange, DocumentRangeInput,
    DocumentType, HsnInput, HsnRow, HsnTab, NilAmounts, NilRatedSupplies, RateLine, Uqc,
};
pub use gstr3b::{
    ItcStatement, ItcWorksheet, OutwardColumn, OutwardRow, OutwardWorksheet, PaymentInputs,
    PaymentWorksheet, RowCode, RowSource, SavedOutwardRow,
};
pub use line_item::{LineItem, SectionTotal, TaxLine};
pub use period::{FilingPeriod, PeriodError, Quarter};
pub use session::Session;
pub use summary::{ConsolidatedSummary, SummarySection, SummaryTile};
pub use tax::{clamp2, floor_zero, round2, SupplyType, TaxAmounts, TaxHead, TaxRate, TaxSplit};
