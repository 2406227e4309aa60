//! Отчёт по клиентам: заказы, продажи, маржа, средний чек и долг.

use crate::error::ReportError;
use crate::list::{Searchable, SortValue, Sortable, Summarize};
use crate::metrics::{average_check, saturating_sum};
use crate::normalize::Sources;
use crate::report::ReportOptions;
use crate::types::{Money, UNKNOWN_CLIENT};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::debug;

/// Строка отчёта по клиентам.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRow {
    /// Идентификатор клиента (пустой для заказов без клиента).
    pub client_id: String,
    /// Полное имя или подпись неизвестного клиента.
    pub name: String,
    /// Фамилия.
    pub last_name: String,
    /// Имя.
    pub first_name: String,
    /// Телефон.
    pub phone: String,
    /// Электронная почта.
    pub email: String,
    /// Признак активности.
    pub is_active: bool,
    /// Число заказов.
    pub order_count: usize,
    /// Сумма продаж без отказов.
    pub total_amount: Money,
    /// Маржа без отказов.
    pub total_margin: Money,
    /// Средний чек.
    pub avg_check: Money,
    /// Оплачено с учётом возвратов.
    pub total_paid: Money,
    /// Долг клиента.
    pub debt: Money,
    /// Дата последнего заказа.
    pub last_order_date: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct ClientAcc<'a> {
    order_ids: HashSet<&'a str>,
    total: Money,
    margin: Money,
    paid: Money,
    debt: Money,
    last_order: Option<DateTime<Utc>>,
}

impl ClientAcc<'_> {
    fn into_figures(self, row: &mut ClientRow) {
        row.order_count = self.order_ids.len();
        row.total_amount = self.total;
        row.total_margin = self.margin;
        row.avg_check = average_check(self.total, row.order_count);
        row.total_paid = self.paid;
        row.debt = self.debt;
        row.last_order_date = self.last_order;
    }
}

fn empty_row(client_id: &str) -> ClientRow {
    ClientRow {
        client_id: client_id.to_string(),
        name: UNKNOWN_CLIENT.to_string(),
        last_name: UNKNOWN_CLIENT.to_string(),
        first_name: String::new(),
        phone: String::new(),
        email: String::new(),
        is_active: false,
        order_count: 0,
        total_amount: Decimal::ZERO,
        total_margin: Decimal::ZERO,
        avg_check: Decimal::ZERO,
        total_paid: Decimal::ZERO,
        debt: Decimal::ZERO,
        last_order_date: None,
    }
}

/// Строит отчёт по клиентам.
///
/// В отчёт попадает каждый загруженный клиент, даже без заказов, и по одной
/// строке на каждую ссылку на клиента, которого нет в справочнике.
pub fn client_report(sources: &Sources, options: &ReportOptions) -> Vec<ClientRow> {
    let mut map: HashMap<&str, ClientAcc<'_>> = HashMap::new();
    let mut unknown: Vec<&str> = Vec::new();

    for order in options.orders(sources) {
        let key = order.client_id.as_deref().unwrap_or_default();
        if !map.contains_key(key) && sources.client(key).is_none() {
            unknown.push(key);
        }
        let entry = map.entry(key).or_default();
        entry.order_ids.insert(order.id.as_str());
        for item in order.active_items() {
            entry.total = entry.total.saturating_add(item.total);
            entry.margin = entry.margin.saturating_add(item.markup);
        }
        entry.paid = entry.paid.saturating_add(order.paid());
        entry.debt = entry.debt.saturating_add(order.debt());
        entry.last_order = entry.last_order.max(order.created_at);
    }

    let mut rows = Vec::with_capacity(sources.clients.len() + unknown.len());
    for client in &sources.clients {
        let mut row = ClientRow {
            client_id: client.id.clone(),
            name: client.full_name(),
            last_name: client.last_name.clone(),
            first_name: client.first_name.clone(),
            phone: client.phone.clone(),
            email: client.email.clone(),
            is_active: client.is_active,
            ..empty_row(&client.id)
        };
        if let Some(acc) = map.remove(client.id.as_str()) {
            acc.into_figures(&mut row);
        }
        rows.push(row);
    }
    for key in &unknown {
        if let Some(acc) = map.remove(key) {
            let mut row = empty_row(key);
            acc.into_figures(&mut row);
            rows.push(row);
        }
    }

    debug!(
        rows = rows.len(),
        unresolved = unknown.len(),
        "Client report aggregated"
    );
    rows
}

impl Searchable for ClientRow {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(&self.last_name),
            Cow::Borrowed(&self.first_name),
            Cow::Borrowed(&self.phone),
            Cow::Borrowed(&self.email),
        ]
    }
}

/// Ключи сортировки отчёта по клиентам.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSortKey {
    /// Полное имя.
    Name,
    /// Активность.
    Active,
    /// Число заказов.
    OrderCount,
    /// Сумма продаж.
    TotalAmount,
    /// Маржа.
    TotalMargin,
    /// Средний чек.
    AvgCheck,
    /// Долг.
    Debt,
    /// Дата последнего заказа.
    LastOrder,
}

impl FromStr for ClientSortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name" => Self::Name,
            "active" => Self::Active,
            "orderCount" => Self::OrderCount,
            "totalAmount" => Self::TotalAmount,
            "totalMargin" => Self::TotalMargin,
            "avgCheck" => Self::AvgCheck,
            "debt" => Self::Debt,
            "lastOrder" => Self::LastOrder,
            _ => {
                return Err(ReportError::UnknownSortKey {
                    report: "clients",
                    key: s.to_string(),
                });
            }
        })
    }
}

impl Sortable for ClientRow {
    type Key = ClientSortKey;

    fn sort_value(&self, key: ClientSortKey) -> SortValue<'_> {
        match key {
            ClientSortKey::Name => SortValue::text(&self.name),
            ClientSortKey::Active => self.is_active.into(),
            ClientSortKey::OrderCount => self.order_count.into(),
            ClientSortKey::TotalAmount => self.total_amount.into(),
            ClientSortKey::TotalMargin => self.total_margin.into(),
            ClientSortKey::AvgCheck => self.avg_check.into(),
            ClientSortKey::Debt => self.debt.into(),
            ClientSortKey::LastOrder => SortValue::instant(self.last_order_date),
        }
    }
}

/// Итоги отчёта по клиентам.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTotals {
    /// Число клиентов в таблице.
    pub count: usize,
    /// Сумма заказов.
    pub order_count: usize,
    /// Сумма продаж.
    pub total_amount: Money,
    /// Сумма маржи.
    pub total_margin: Money,
    /// Общий средний чек: продажи к числу заказов.
    pub avg_check: Money,
    /// Общий долг.
    pub debt: Money,
}

impl Summarize for ClientRow {
    type Totals = ClientTotals;

    fn summarize(rows: &[Self]) -> ClientTotals {
        let order_count = rows.iter().map(|r| r.order_count).sum();
        let total_amount = saturating_sum(rows.iter().map(|r| r.total_amount));
        ClientTotals {
            count: rows.len(),
            order_count,
            total_amount,
            total_margin: saturating_sum(rows.iter().map(|r| r.total_margin)),
            avg_check: average_check(total_amount, order_count),
            debt: saturating_sum(rows.iter().map(|r| r.debt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{SortState, present};
    use crate::reports::fixtures::{client, dec, item, order, paid};

    fn sources(orders: Vec<crate::types::Order>) -> Sources {
        Sources::new(
            orders,
            vec![
                client("c1", "Иванов", "Пётр"),
                client("c2", "Алексеева", "Мария"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn rejected_items_do_not_count_but_orders_do() {
        let sources = sources(vec![
            order("a", "c1", vec![item("Фильтр", "X1", 100, 2, 60, "В пути")]),
            order("b", "c1", vec![item("Фильтр", "X1", 100, 1, 60, "Отказ")]),
        ]);
        let rows = client_report(&sources, &ReportOptions::default());
        let c1 = &rows[0];
        assert_eq!(c1.name, "Иванов Пётр");
        assert_eq!(c1.order_count, 2);
        assert_eq!(c1.total_amount, dec(200));
        assert_eq!(c1.total_margin, dec(80));
        assert_eq!(c1.avg_check, dec(100));
    }

    #[test]
    fn client_without_orders_has_zero_check() {
        let rows = client_report(&sources(Vec::new()), &ReportOptions::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].order_count, 0);
        assert_eq!(rows[1].avg_check, Decimal::ZERO);
    }

    #[test]
    fn unresolved_client_gets_placeholder_row() {
        let sources = sources(vec![order("a", "ghost", vec![item("Масло", "M", 50, 1, 30, "")])]);
        let rows = client_report(&sources, &ReportOptions::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].client_id, "ghost");
        assert_eq!(rows[2].name, UNKNOWN_CLIENT);
        assert_eq!(rows[2].total_amount, dec(50));
    }

    #[test]
    fn created_items_are_not_owed() {
        let sources = sources(vec![paid(
            order(
                "a",
                "c2",
                vec![
                    item("Свеча", "S", 100, 1, 50, "Выдан"),
                    item("Ремень", "R", 300, 1, 200, "Создан"),
                    item("Диск", "D", 500, 1, 400, "Отказ"),
                ],
            ),
            &[150, -20],
        )]);
        let rows = client_report(&sources, &ReportOptions::default());
        let c2 = &rows[1];
        assert_eq!(c2.total_amount, dec(400));
        assert_eq!(c2.total_paid, dec(130));
        assert_eq!(c2.debt, dec(-30));
    }

    #[test]
    fn totals_use_summed_check() {
        let sources = sources(vec![
            order("a", "c1", vec![item("Фильтр", "X1", 100, 3, 60, "")]),
            order("b", "c2", vec![item("Фильтр", "X1", 100, 1, 60, "")]),
            order("c", "c2", vec![item("Фильтр", "X1", 100, 2, 60, "")]),
        ]);
        let rows = client_report(&sources, &ReportOptions::default());
        let view = present(rows, "", Some(SortState::asc(ClientSortKey::Name)));
        assert_eq!(view.rows[0].last_name, "Алексеева");
        assert_eq!(view.totals.order_count, 3);
        assert_eq!(view.totals.total_amount, dec(600));
        assert_eq!(view.totals.avg_check, dec(200));
    }

    #[test]
    fn search_covers_phone_and_email() {
        let mut ivanov = client("c1", "Иванов", "Пётр");
        ivanov.phone = "+7 900 123-45-67".into();
        let mut alekseeva = client("c2", "Алексеева", "Мария");
        alekseeva.email = "maria@example.com".into();
        let sources = Sources::new(
            Vec::new(),
            vec![ivanov, alekseeva],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let rows = client_report(&sources, &ReportOptions::default());
        let by_phone = present(rows.clone(), "123-45", None);
        assert_eq!(by_phone.rows.len(), 1);
        assert_eq!(by_phone.rows[0].client_id, "c1");
        let by_email = present(rows, "MARIA@", None);
        assert_eq!(by_email.rows[0].client_id, "c2");
    }

    #[test]
    fn sort_keys_parse_by_name() {
        assert_eq!("avgCheck".parse::<ClientSortKey>().unwrap(), ClientSortKey::AvgCheck);
        assert!(matches!(
            "price".parse::<ClientSortKey>(),
            Err(ReportError::UnknownSortKey { report: "clients", .. })
        ));
    }
}
