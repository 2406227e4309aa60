//! Рентабельность товаров: продажи, наценка и закупка по артикулу и названию.

use crate::error::ReportError;
use crate::list::{Searchable, SortValue, Sortable, Summarize};
use crate::metrics::{profitability, saturating_sum};
use crate::normalize::Sources;
use crate::report::ReportOptions;
use crate::types::{LineItem, Money};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::debug;

/// Ключ товара: артикул и название.
///
/// Позиции без артикула получают пустой артикул, поэтому разные товары с
/// одинаковым названием и без артикула попадают в одну группу.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductKey<'a> {
    /// Артикул.
    pub article: &'a str,
    /// Название.
    pub name: &'a str,
}

impl<'a> ProductKey<'a> {
    /// Ключ позиции заказа.
    #[inline]
    pub fn of(item: &'a LineItem) -> Self {
        Self {
            article: &item.article,
            name: &item.name,
        }
    }
}

/// Строка отчёта о рентабельности товаров.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    /// Артикул.
    pub article: String,
    /// Название.
    pub name: String,
    /// Первый встреченный производитель.
    pub manufacturer: Option<String>,
    /// Число заказов с товаром.
    pub order_count: usize,
    /// Продано штук.
    pub quantity: Money,
    /// Сумма продаж.
    pub total: Money,
    /// Наценка.
    pub markup: Money,
    /// Закупочная стоимость проданного.
    pub total_purchase: Money,
    /// Наценка к закупке, %.
    pub avg_markup_percentage: Decimal,
}

#[derive(Default)]
struct ProductAcc<'a> {
    manufacturer: Option<&'a str>,
    order_ids: HashSet<&'a str>,
    quantity: Money,
    total: Money,
    markup: Money,
    purchase: Money,
}

/// Строит отчёт о рентабельности товаров.
pub fn product_report(sources: &Sources, options: &ReportOptions) -> Vec<ProductRow> {
    let mut map: BTreeMap<ProductKey<'_>, ProductAcc<'_>> = BTreeMap::new();

    for order in options.orders(sources) {
        for item in order.active_items() {
            let entry = map.entry(ProductKey::of(item)).or_default();
            if entry.manufacturer.is_none() {
                entry.manufacturer = item.manufacturer.as_deref();
            }
            entry.order_ids.insert(order.id.as_str());
            entry.quantity = entry.quantity.saturating_add(item.quantity);
            entry.total = entry.total.saturating_add(item.total);
            entry.markup = entry.markup.saturating_add(item.markup);
            entry.purchase = entry.purchase.saturating_add(item.purchase_total());
        }
    }

    let rows: Vec<ProductRow> = map
        .into_iter()
        .map(|(key, acc)| ProductRow {
            article: key.article.to_string(),
            name: key.name.to_string(),
            manufacturer: acc.manufacturer.map(str::to_string),
            order_count: acc.order_ids.len(),
            quantity: acc.quantity,
            total: acc.total,
            markup: acc.markup,
            total_purchase: acc.purchase,
            avg_markup_percentage: profitability(acc.markup, acc.purchase),
        })
        .collect();

    debug!(rows = rows.len(), "Product report aggregated");
    rows
}

impl Searchable for ProductRow {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![
            Cow::Borrowed(self.name.as_str()),
            Cow::Borrowed(self.article.as_str()),
        ];
        if let Some(manufacturer) = &self.manufacturer {
            fields.push(Cow::Borrowed(manufacturer.as_str()));
        }
        fields
    }
}

/// Ключи сортировки отчёта о рентабельности товаров.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortKey {
    /// Название.
    Name,
    /// Артикул.
    Article,
    /// Производитель.
    Manufacturer,
    /// Число заказов.
    OrderCount,
    /// Количество.
    Quantity,
    /// Сумма продаж.
    Total,
    /// Наценка.
    Markup,
    /// Закупка.
    Purchase,
    /// Наценка, %.
    Profitability,
}

impl FromStr for ProductSortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name" => Self::Name,
            "article" => Self::Article,
            "manufacturer" => Self::Manufacturer,
            "orderCount" => Self::OrderCount,
            "quantity" => Self::Quantity,
            "total" => Self::Total,
            "markup" => Self::Markup,
            "totalPurchase" => Self::Purchase,
            "avgMarkupPercentage" => Self::Profitability,
            _ => {
                return Err(ReportError::UnknownSortKey {
                    report: "products",
                    key: s.to_string(),
                });
            }
        })
    }
}

impl Sortable for ProductRow {
    type Key = ProductSortKey;

    fn sort_value(&self, key: ProductSortKey) -> SortValue<'_> {
        match key {
            ProductSortKey::Name => SortValue::text(&self.name),
            ProductSortKey::Article => SortValue::text(&self.article),
            ProductSortKey::Manufacturer => self
                .manufacturer
                .as_deref()
                .map_or(SortValue::Empty, SortValue::text),
            ProductSortKey::OrderCount => self.order_count.into(),
            ProductSortKey::Quantity => self.quantity.into(),
            ProductSortKey::Total => self.total.into(),
            ProductSortKey::Markup => self.markup.into(),
            ProductSortKey::Purchase => self.total_purchase.into(),
            ProductSortKey::Profitability => self.avg_markup_percentage.into(),
        }
    }
}

/// Итоги отчёта о рентабельности товаров.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTotals {
    /// Число товаров.
    pub count: usize,
    /// Продано штук.
    pub quantity: Money,
    /// Сумма продаж.
    pub total: Money,
    /// Наценка.
    pub markup: Money,
    /// Закупка.
    pub total_purchase: Money,
    /// Общая наценка к общей закупке, %.
    pub avg_markup_percentage: Decimal,
}

impl Summarize for ProductRow {
    type Totals = ProductTotals;

    fn summarize(rows: &[Self]) -> ProductTotals {
        let markup = saturating_sum(rows.iter().map(|r| r.markup));
        let total_purchase = saturating_sum(rows.iter().map(|r| r.total_purchase));
        ProductTotals {
            count: rows.len(),
            quantity: saturating_sum(rows.iter().map(|r| r.quantity)),
            total: saturating_sum(rows.iter().map(|r| r.total)),
            markup,
            total_purchase,
            avg_markup_percentage: profitability(markup, total_purchase),
        }
    }
}
