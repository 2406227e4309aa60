//! Юнит-экономика: прибыль и закупка по товарам в разрезе каналов продаж.

use crate::error::ReportError;
use crate::list::{Searchable, SortValue, Sortable, Summarize};
use crate::metrics::profitability;
use crate::normalize::Sources;
use crate::report::ReportOptions;
use crate::reports::product::ProductKey;
use crate::types::{Channel, LineItem, Money};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Add;
use std::str::FromStr;
use tracing::debug;

/// Показатели одного канала.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelFigures {
    /// Продано штук.
    pub quantity: Money,
    /// Выручка.
    pub revenue: Money,
    /// Прибыль (наценка).
    pub profit: Money,
    /// Закупочная стоимость.
    pub purchase: Money,
    /// Прибыль к закупке, %.
    pub profitability: Decimal,
}

impl ChannelFigures {
    fn push(&mut self, item: &LineItem) {
        self.quantity = self.quantity.saturating_add(item.quantity);
        self.revenue = self.revenue.saturating_add(item.total);
        self.profit = self.profit.saturating_add(item.markup);
        self.purchase = self.purchase.saturating_add(item.purchase_total());
    }

    /// Пересчитывает процент по накопленным суммам.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.profitability = profitability(self.profit, self.purchase);
        self
    }
}

impl Add for ChannelFigures {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            quantity: self.quantity.saturating_add(rhs.quantity),
            revenue: self.revenue.saturating_add(rhs.revenue),
            profit: self.profit.saturating_add(rhs.profit),
            purchase: self.purchase.saturating_add(rhs.purchase),
            profitability: Decimal::ZERO,
        }
        .finish()
    }
}

/// Строка юнит-экономики.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomicsRow {
    /// Артикул.
    pub article: String,
    /// Название.
    pub name: String,
    /// Производитель.
    pub manufacturer: Option<String>,
    /// Интернет-магазин.
    pub site: ChannelFigures,
    /// Торговый зал.
    pub showroom: ChannelFigures,
    /// Оба канала вместе.
    pub combined: ChannelFigures,
}

#[derive(Default)]
struct UnitAcc<'a> {
    manufacturer: Option<&'a str>,
    site: ChannelFigures,
    showroom: ChannelFigures,
}

/// Строит юнит-экономику по товарам.
pub fn unit_economics(sources: &Sources, options: &ReportOptions) -> Vec<UnitEconomicsRow> {
    let mut map: BTreeMap<ProductKey<'_>, UnitAcc<'_>> = BTreeMap::new();

    for order in options.orders(sources) {
        for item in order.active_items() {
            let entry = map.entry(ProductKey::of(item)).or_default();
            if entry.manufacturer.is_none() {
                entry.manufacturer = item.manufacturer.as_deref();
            }
            match order.channel {
                Channel::Site => entry.site.push(item),
                Channel::Showroom => entry.showroom.push(item),
            }
        }
    }

    let rows: Vec<UnitEconomicsRow> = map
        .into_iter()
        .map(|(key, acc)| UnitEconomicsRow {
            article: key.article.to_string(),
            name: key.name.to_string(),
            manufacturer: acc.manufacturer.map(str::to_string),
            site: acc.site.finish(),
            showroom: acc.showroom.finish(),
            combined: acc.site + acc.showroom,
        })
        .collect();

    debug!(rows = rows.len(), "Unit economics aggregated");
    rows
}

impl Searchable for UnitEconomicsRow {
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

/// Ключи сортировки юнит-экономики.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitEconomicsSortKey {
    /// Название.
    Name,
    /// Артикул.
    Article,
    /// Прибыль с сайта.
    SiteProfit,
    /// Прибыль с зала.
    ShowroomProfit,
    /// Общая прибыль.
    Profit,
    /// Общая закупка.
    Purchase,
    /// Общая рентабельность.
    Profitability,
}

impl FromStr for UnitEconomicsSortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name" => Self::Name,
            "article" => Self::Article,
            "siteProfit" => Self::SiteProfit,
            "showroomProfit" => Self::ShowroomProfit,
            "profit" => Self::Profit,
            "purchase" => Self::Purchase,
            "profitability" => Self::Profitability,
            _ => {
                return Err(ReportError::UnknownSortKey {
                    report: "unit-economics",
                    key: s.to_string(),
                });
            }
        })
    }
}

impl Sortable for UnitEconomicsRow {
    type Key = UnitEconomicsSortKey;

    fn sort_value(&self, key: UnitEconomicsSortKey) -> SortValue<'_> {
        match key {
            UnitEconomicsSortKey::Name => SortValue::text(&self.name),
            UnitEconomicsSortKey::Article => SortValue::text(&self.article),
            UnitEconomicsSortKey::SiteProfit => self.site.profit.into(),
            UnitEconomicsSortKey::ShowroomProfit => self.showroom.profit.into(),
            UnitEconomicsSortKey::Profit => self.combined.profit.into(),
            UnitEconomicsSortKey::Purchase => self.combined.purchase.into(),
            UnitEconomicsSortKey::Profitability => self.combined.profitability.into(),
        }
    }
}

/// Итоги юнит-экономики по каналам.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomicsTotals {
    /// Число товаров.
    pub count: usize,
    /// Интернет-магазин.
    pub site: ChannelFigures,
    /// Торговый зал.
    pub showroom: ChannelFigures,
    /// Оба канала.
    pub combined: ChannelFigures,
}

impl Summarize for UnitEconomicsRow {
    type Totals = UnitEconomicsTotals;

    fn summarize(rows: &[Self]) -> UnitEconomicsTotals {
        let site = rows
            .iter()
            .fold(ChannelFigures::default(), |acc, r| acc + r.site);
        let showroom = rows
            .iter()
            .fold(ChannelFigures::default(), |acc, r| acc + r.showroom);
        UnitEconomicsTotals {
            count: rows.len(),
            site,
            showroom,
            combined: site + showroom,
        }
    }
}
