//! Производные показатели: проценты и средние с защитой от деления на ноль.
//!
//! Суммы и произведения насыщаются на границах `Decimal`, а не паникуют:
//! абсурдные значения в документе не должны ронять пересчёт.

use crate::types::Money;
use rust_decimal::Decimal;

/// Делит `numerator` на `denominator`, возвращая ноль при нулевом или
/// отрицательном знаменателе.
#[inline]
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .unwrap_or(if numerator.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

/// Доля `part` от `whole` в процентах.
#[inline]
pub fn percent(part: Decimal, whole: Decimal) -> Decimal {
    ratio(part, whole).saturating_mul(Decimal::ONE_HUNDRED)
}

/// Сумма с насыщением.
pub fn saturating_sum<I>(values: I) -> Money
where
    I: IntoIterator<Item = Money>,
{
    values.into_iter().fold(Money::ZERO, Money::saturating_add)
}

/// Рентабельность: наценка к закупке в процентах.
#[inline]
pub fn profitability(markup: Money, purchase: Money) -> Decimal {
    percent(markup, purchase)
}

/// Средний чек.
#[inline]
pub fn average_check(total: Money, order_count: usize) -> Money {
    ratio(total, Decimal::from(order_count))
}

/// Среднее арифметическое, ноль для пустого набора.
pub fn mean<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0usize), |(sum, count), v| {
            (sum.saturating_add(v), count + 1)
        });
    ratio(sum, Decimal::from(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_gives_zero() {
        assert_eq!(percent(Decimal::from(80), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(average_check(Decimal::from(200), 0), Decimal::ZERO);
        assert_eq!(mean(Vec::<Decimal>::new()), Decimal::ZERO);
    }

    #[test]
    fn markup_over_purchase() {
        let value = profitability(Decimal::from(80), Decimal::from(120));
        assert_eq!(value.round_dp(2), Decimal::new(6667, 2));
        // Наценка может превышать закупку.
        assert_eq!(
            profitability(Decimal::from(300), Decimal::from(100)),
            Decimal::from(300)
        );
    }

    #[test]
    fn extreme_values_saturate() {
        let huge = Decimal::MAX;
        assert_eq!(saturating_sum([huge, huge]), Decimal::MAX);
        assert_eq!(saturating_sum([Decimal::MIN, Decimal::NEGATIVE_ONE]), Decimal::MIN);
        assert_eq!(percent(huge, Decimal::ONE), Decimal::MAX);
        assert_eq!(ratio(huge, Decimal::new(1, 10)), Decimal::MAX);
        assert_eq!(ratio(Decimal::MIN, Decimal::new(1, 10)), Decimal::MIN);
        assert_eq!(mean([huge, huge]), Decimal::MAX / Decimal::TWO);
    }

    #[test]
    fn mean_is_unweighted() {
        let values = [Decimal::from(30), Decimal::from(70)];
        assert_eq!(mean(values), Decimal::from(50));
    }
}
