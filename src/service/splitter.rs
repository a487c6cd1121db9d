use crate::models::{clamp2, SupplyType, TaxRate, TaxSplit};
use bigdecimal::{BigDecimal, Zero};

/// 按税率和供给类型拆分税额 (纯函数)
///
/// 跨州: `igst = taxable * rate / 100`; 州内: `cgst = sgst = taxable * (rate/2) / 100`。
/// 结果四舍五入到两位小数, 负数截为 0。
pub fn split_tax(taxable_value: &BigDecimal, rate: &TaxRate, supply_type: SupplyType) -> TaxSplit {
    let hundred = BigDecimal::from(100);
    match supply_type {
        SupplyType::InterState => TaxSplit {
            igst: clamp2(&(taxable_value * rate.value() / &hundred)),
            cgst: BigDecimal::zero(),
            sgst: BigDecimal::zero(),
        },
        SupplyType::IntraState => {
            let half_rate = rate.value() / BigDecimal::from(2);
            let half = clamp2(&(taxable_value * &half_rate / &hundred));
            TaxSplit {
                igst: BigDecimal::zero(),
                cgst: half.clone(),
                sgst: half,
            }
        }
    }
}

/// Sums the split of several rate lines sharing one supply type.
pub fn split_lines<'a, I>(lines: I, supply_type: SupplyType) -> (BigDecimal, TaxSplit)
where
    I: IntoIterator<Item = (&'a BigDecimal, &'a TaxRate)>,
{
    lines.into_iter().fold(
        (BigDecimal::zero(), TaxSplit::default()),
        |(taxable, acc), (value, rate)| {
            let split = split_tax(value, rate, supply_type);
            (
                taxable + value,
                TaxSplit {
                    igst: acc.igst + split.igst,
                    cgst: acc.cgst + split.cgst,
                    sgst: acc.sgst + split.sgst,
                },
            )
        },
    )
}
