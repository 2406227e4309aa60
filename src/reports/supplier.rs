//! Рентабельность поставщиков: объём закупок, доля и давность последней закупки.

use crate::error::ReportError;
use crate::list::{Searchable, SortValue, Sortable, Summarize};
use crate::metrics::{mean, percent, profitability, saturating_sum};
use crate::normalize::Sources;
use crate::report::ReportOptions;
use crate::types::{LineItem, Money, NO_SUPPLIER};
use crate::utils::days_between;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::debug;

/// Строка отчёта по поставщикам.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRow {
    /// Имя поставщика.
    pub name: String,
    /// Закупочная стоимость проданных позиций.
    pub total_purchase: Money,
    /// Наценка по позициям поставщика.
    pub total_markup: Money,
    /// Наценка к закупке, %.
    pub profitability: Decimal,
    /// Количество позиций.
    pub item_quantity: Money,
    /// Число заказов с товарами поставщика.
    pub order_count: usize,
    /// Дата последнего заказа с товарами поставщика.
    pub last_purchase_date: Option<DateTime<Utc>>,
    /// Дней с последней закупки.
    pub days_since_last_purchase: Option<i64>,
    /// Доля в общей закупке, %.
    pub share_percent: Decimal,
}

#[derive(Default)]
struct SupplierAcc<'a> {
    purchase: Money,
    markup: Money,
    quantity: Money,
    order_ids: HashSet<&'a str>,
    last: Option<DateTime<Utc>>,
}

/// Имя поставщика позиции: ссылка на справочник, само значение или заглушка.
fn supplier_name<'a>(sources: &'a Sources, item: &'a LineItem) -> &'a str {
    match item.supplier.as_deref() {
        Some(reference) => sources
            .supplier(reference)
            .map_or(reference, |supplier| supplier.name.as_str()),
        None => NO_SUPPLIER,
    }
}

/// Строит отчёт по поставщикам.
pub fn supplier_report(sources: &Sources, options: &ReportOptions) -> Vec<SupplierRow> {
    let mut map: BTreeMap<&str, SupplierAcc<'_>> = BTreeMap::new();

    for order in options.orders(sources) {
        for item in order.active_items() {
            let entry = map.entry(supplier_name(sources, item)).or_default();
            entry.purchase = entry.purchase.saturating_add(item.purchase_total());
            entry.markup = entry.markup.saturating_add(item.markup);
            entry.quantity = entry.quantity.saturating_add(item.quantity);
            entry.order_ids.insert(order.id.as_str());
            entry.last = entry.last.max(order.created_at);
        }
    }

    let grand_total: Money = saturating_sum(map.values().map(|acc| acc.purchase));
    let rows: Vec<SupplierRow> = map
        .into_iter()
        .map(|(name, acc)| SupplierRow {
            name: name.to_string(),
            total_purchase: acc.purchase,
            total_markup: acc.markup,
            profitability: profitability(acc.markup, acc.purchase),
            item_quantity: acc.quantity,
            order_count: acc.order_ids.len(),
            last_purchase_date: acc.last,
            days_since_last_purchase: acc.last.map(|last| days_between(options.now, last)),
            share_percent: percent(acc.purchase, grand_total),
        })
        .collect();

    debug!(rows = rows.len(), grand_total = %grand_total, "Supplier report aggregated");
    rows
}

impl Searchable for SupplierRow {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.name.as_str())]
    }
}

/// Ключи сортировки отчёта по поставщикам.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplierSortKey {
    /// Имя.
    Name,
    /// Закупка.
    Purchase,
    /// Наценка.
    Markup,
    /// Рентабельность.
    Profitability,
    /// Количество.
    Quantity,
    /// Число заказов.
    OrderCount,
    /// Дата последней закупки.
    LastPurchase,
    /// Дней с последней закупки.
    DaysSince,
    /// Доля.
    Share,
}

impl FromStr for SupplierSortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name" => Self::Name,
            "totalPurchase" => Self::Purchase,
            "totalMarkup" => Self::Markup,
            "profitability" => Self::Profitability,
            "itemQuantity" => Self::Quantity,
            "orderCount" => Self::OrderCount,
            "lastPurchaseDate" => Self::LastPurchase,
            "daysSinceLastPurchase" => Self::DaysSince,
            "sharePercent" => Self::Share,
            _ => {
                return Err(ReportError::UnknownSortKey {
                    report: "suppliers",
                    key: s.to_string(),
                });
            }
        })
    }
}

impl Sortable for SupplierRow {
    type Key = SupplierSortKey;

    fn sort_value(&self, key: SupplierSortKey) -> SortValue<'_> {
        match key {
            SupplierSortKey::Name => SortValue::text(&self.name),
            SupplierSortKey::Purchase => self.total_purchase.into(),
            SupplierSortKey::Markup => self.total_markup.into(),
            SupplierSortKey::Profitability => self.profitability.into(),
            SupplierSortKey::Quantity => self.item_quantity.into(),
            SupplierSortKey::OrderCount => self.order_count.into(),
            SupplierSortKey::LastPurchase => SortValue::instant(self.last_purchase_date),
            SupplierSortKey::DaysSince => self.days_since_last_purchase.into(),
            SupplierSortKey::Share => self.share_percent.into(),
        }
    }
}

/// Итоги отчёта по поставщикам.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierTotals {
    /// Число поставщиков.
    pub count: usize,
    /// Общая закупка.
    pub total_purchase: Money,
    /// Общая наценка.
    pub total_markup: Money,
    /// Общая наценка к общей закупке, %.
    pub profitability: Decimal,
    /// Общее количество позиций.
    pub item_quantity: Money,
    /// Средняя доля: простое среднее долей строк, без весов.
    pub average_share_percent: Decimal,
}

impl Summarize for SupplierRow {
    type Totals = SupplierTotals;

    fn summarize(rows: &[Self]) -> SupplierTotals {
        let total_purchase = saturating_sum(rows.iter().map(|r| r.total_purchase));
        let total_markup = saturating_sum(rows.iter().map(|r| r.total_markup));
        SupplierTotals {
            count: rows.len(),
            total_purchase,
            total_markup,
            profitability: profitability(total_markup, total_purchase),
            item_quantity: saturating_sum(rows.iter().map(|r| r.item_quantity)),
            average_share_percent: mean(rows.iter().map(|r| r.share_percent)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{SortState, present};
    use crate::reports::fixtures::{at, dec, from_supplier, item, order};
    use crate::types::{Order, Supplier};

    fn sources(orders: Vec<Order>, suppliers: Vec<Supplier>) -> Sources {
        Sources::new(orders, Vec::new(), suppliers, Vec::new(), Vec::new())
    }

    fn options() -> ReportOptions {
        ReportOptions::at(at(2024, 3, 11))
    }

    #[test]
    fn shares_and_unweighted_average() {
        let sources = sources(
            vec![
                order("a", "c1", vec![from_supplier(item("Фильтр", "X", 150, 1, 100, ""), "A")]),
                order(
                    "b",
                    "c1",
                    vec![
                        from_supplier(item("Фильтр", "X", 150, 2, 100, ""), "A"),
                        from_supplier(item("Масло", "M", 900, 1, 700, ""), "B"),
                    ],
                ),
            ],
            Vec::new(),
        );
        let rows = supplier_report(&sources, &options());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "A");
        assert_eq!(rows[0].total_purchase, dec(300));
        assert_eq!(rows[0].share_percent, dec(30));
        assert_eq!(rows[0].order_count, 2);
        assert_eq!(rows[0].item_quantity, dec(3));
        assert_eq!(rows[1].share_percent, dec(70));

        let view = present(rows, "", None);
        assert_eq!(view.totals.average_share_percent, dec(50));
        assert_eq!(view.totals.total_purchase, dec(1000));

        // Среднее берётся по показанным строкам, без пересчёта долей.
        let only_b = present(supplier_report(&sources, &options()), "b", None);
        assert_eq!(only_b.totals.average_share_percent, dec(70));
    }

    #[test]
    fn missing_supplier_and_reference_resolution() {
        let sources = sources(
            vec![order(
                "a",
                "c1",
                vec![
                    item("Коврик", "K", 100, 1, 50, ""),
                    from_supplier(item("Фильтр", "X", 150, 1, 100, ""), "s1"),
                ],
            )],
            vec![Supplier {
                id: "s1".into(),
                name: "Автоконтинент".into(),
            }],
        );
        let rows = supplier_report(&sources, &options());
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Автоконтинент", NO_SUPPLIER]);
    }

    #[test]
    fn days_since_last_purchase_uses_latest_order() {
        let filter = || from_supplier(item("Фильтр", "X", 150, 1, 100, ""), "A");
        let mut old = order("a", "c1", vec![filter()]);
        old.created_at = Some(at(2024, 2, 1));
        let recent = order("b", "c1", vec![filter()]);
        let oil = from_supplier(item("Масло", "M", 900, 1, 700, ""), "B");
        let mut undated = order("c", "c1", vec![oil]);
        undated.created_at = None;
        let rows = supplier_report(&sources(vec![old, recent, undated], Vec::new()), &options());
        assert_eq!(rows[0].last_purchase_date, Some(at(2024, 3, 1)));
        assert_eq!(rows[0].days_since_last_purchase, Some(10));
        assert_eq!(rows[1].days_since_last_purchase, None);

        let mut sorted = rows;
        crate::list::sort_rows(&mut sorted, SortState::asc(SupplierSortKey::DaysSince));
        assert_eq!(sorted[1].name, "B");
    }

    #[test]
    fn all_zero_purchases_give_zero_share() {
        let mut gift = from_supplier(item("Наклейка", "N", 10, 1, 0, ""), "A");
        gift.purchase = None;
        let rows = supplier_report(
            &sources(vec![order("a", "c1", vec![gift])], Vec::new()),
            &options(),
        );
        assert_eq!(rows[0].share_percent, Decimal::ZERO);
        assert_eq!(rows[0].profitability, Decimal::ZERO);
    }

    #[test]
    fn rejected_lines_do_not_create_suppliers() {
        let disk = from_supplier(item("Диск", "D", 900, 1, 700, "Отказ"), "Z");
        let sources = sources(vec![order("a", "c1", vec![disk])], Vec::new());
        assert!(supplier_report(&sources, &options()).is_empty());
    }
}
