use crate::models::{SectionTotal, TaxLine};
use bigdecimal::{BigDecimal, Zero};

fn or_zero(value: Option<BigDecimal>) -> BigDecimal {
    value.unwrap_or_else(BigDecimal::zero)
}

/// 汇总一个分节的明细 (顺序无关, 缺失数值按 0)
pub fn aggregate<'a, T, I>(items: I) -> SectionTotal
where
    T: TaxLine + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .fold(SectionTotal::default(), |mut total, item| {
            let line = item.line_item();
            total.count += 1;
            total.taxable_value += or_zero(line.taxable_value);
            total.igst += or_zero(line.igst);
            total.cgst += or_zero(line.cgst);
            total.sgst += or_zero(line.sgst);
            total.cess += or_zero(line.cess);
            total
        })
}

/// Sums two section totals field by field.
pub fn combine(a: &SectionTotal, b: &SectionTotal) -> SectionTotal {
    SectionTotal {
        count: a.count + b.count,
        taxable_value: &a.taxable_value + &b.taxable_value,
        igst: &a.igst + &b.igst,
        cgst: &a.cgst + &b.cgst,
        sgst: &a.sgst + &b.sgst,
        cess: &a.cess + &b.cess,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, SupplyType};
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn item(taxable: &str, igst: Option<&str>, cgst: Option<&str>) -> LineItem {
        LineItem {
            taxable_value: Some(dec(taxable)),
            rate: None,
            supply_type: Some(SupplyType::InterState),
            igst: igst.map(dec),
            cgst: cgst.map(dec),
            sgst: cgst.map(dec),
            cess: None,
        }
    }

    #[test]
    fn empty_collection_is_zero() {
        let total = aggregate::<LineItem, _>(&[]);
        assert!(total.is_zero());
    }

    #[test]
    fn missing_fields_count_as_zero() {
        let items = vec![item("100", Some("18"), None), LineItem::default()];
        let total = aggregate(&items);
        assert_eq!(total.count, 2);
        assert_eq!(total.taxable_value, dec("100"));
        assert_eq!(total.igst, dec("18"));
        assert!(total.cgst.is_zero());
        assert!(total.cess.is_zero());
    }

    #[test]
    fn aggregation_is_idempotent_and_order_free() {
        let items = vec![
            item("100", Some("18"), None),
            item("250.50", None, Some("22.55")),
            item("10", Some("0.5"), None),
        ];
        let first = aggregate(&items);
        let second = aggregate(&items);
        assert_eq!(first, second);

        let reversed: Vec<LineItem> = items.iter().rev().cloned().collect();
        assert_eq!(aggregate(&reversed), first);
    }

    #[test]
    fn combine_adds_counts_and_amounts() {
        let a = aggregate(&[item("100", Some("18"), None)]);
        let b = aggregate(&[item("50", None, Some("4.5"))]);
        let sum = combine(&a, &b);
        assert_eq!(sum.count, 2);
        assert_eq!(sum.taxable_value, dec("150"));
        assert_eq!(sum.sgst, dec("4.5"));
    }
}
