//! Журнал движения денег: оплаты по заказам и ручные операции в одной таблице.

use crate::error::ReportError;
use crate::list::{Searchable, SortValue, Sortable, Summarize};
use crate::metrics::saturating_sum;
use crate::normalize::Sources;
use crate::report::ReportOptions;
use crate::types::{
    Client, Money, NO_CATEGORY, Order, Payment, Transaction, TransactionKind, UNKNOWN_CLIENT,
    UNKNOWN_SUPPLIER,
};
use crate::utils::format_date;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::str::FromStr;
use tracing::debug;

/// Категория для оплат по заказам.
const ORDER_PAYMENT_CATEGORY: &str = "Оплата заказа";
/// Категория для возвратов по заказам.
const ORDER_REFUND_CATEGORY: &str = "Возврат по заказу";

/// Запись журнала.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Идентификатор записи.
    pub id: String,
    /// Дата.
    pub date: Option<DateTime<Utc>>,
    /// Описание.
    pub description: String,
    /// Сумма со знаком.
    pub amount: Money,
    /// Тип операции.
    pub kind: TransactionKind,
    /// Контрагент.
    pub counterparty: Option<String>,
    /// Категория.
    pub category: String,
    /// Номер заказа для оплат по заказам.
    pub order_number: Option<String>,
}

fn payment_entry(sources: &Sources, order: &Order, index: usize, payment: &Payment) -> LedgerEntry {
    let kind = if payment.amount < Decimal::ZERO {
        TransactionKind::Return
    } else {
        TransactionKind::Income
    };
    let (description, category) = match kind {
        TransactionKind::Return => (
            format!("Возврат по заказу №{}", order.number),
            ORDER_REFUND_CATEGORY,
        ),
        _ => (
            format!("Оплата по заказу №{}", order.number),
            ORDER_PAYMENT_CATEGORY,
        ),
    };
    let counterparty = order
        .client_id
        .as_deref()
        .and_then(|id| sources.client(id))
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), |client| client.full_name());
    LedgerEntry {
        id: format!("{}:{index}", order.id),
        date: payment.date.or(order.created_at),
        description,
        amount: payment.amount,
        kind,
        counterparty: Some(counterparty),
        category: category.to_string(),
        order_number: Some(order.number.clone()),
    }
}

fn transaction_entry(sources: &Sources, transaction: &Transaction) -> LedgerEntry {
    let client_id = transaction.client_id.as_deref();
    let supplier_id = transaction.supplier_id.as_deref();
    // Найденный клиент, затем найденный поставщик; заглушка только если
    // ни одна ссылка не разрешилась.
    let counterparty = client_id
        .and_then(|id| sources.client(id))
        .map(Client::full_name)
        .or_else(|| {
            supplier_id
                .and_then(|id| sources.supplier(id))
                .map(|supplier| supplier.name.clone())
        })
        .or_else(|| client_id.map(|_| UNKNOWN_CLIENT.to_string()))
        .or_else(|| supplier_id.map(|_| UNKNOWN_SUPPLIER.to_string()));
    let category = transaction
        .category_id
        .as_deref()
        .and_then(|id| sources.category(id))
        .map(|category| category.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(NO_CATEGORY);
    LedgerEntry {
        id: transaction.id.clone(),
        date: transaction.date,
        description: transaction.description.clone(),
        amount: transaction.amount,
        kind: transaction.kind,
        counterparty,
        category: category.to_string(),
        order_number: None,
    }
}

/// Собирает журнал: сначала оплаты по заказам, затем ручные операции.
///
/// Отрицательная оплата по заказу считается возвратом, какой бы тип ни был
/// записан в истории оплат.
pub fn ledger(sources: &Sources, options: &ReportOptions) -> Vec<LedgerEntry> {
    let mut entries = Vec::new();

    for order in &sources.orders {
        for (index, payment) in order.payments.iter().enumerate() {
            let entry = payment_entry(sources, order, index, payment);
            if options.in_period(entry.date) {
                entries.push(entry);
            }
        }
    }
    let from_orders = entries.len();

    entries.extend(
        sources
            .transactions
            .iter()
            .filter(|transaction| options.in_period(transaction.date))
            .map(|transaction| transaction_entry(sources, transaction)),
    );

    debug!(
        from_orders,
        manual = entries.len() - from_orders,
        "Ledger assembled"
    );
    entries
}

impl Searchable for LedgerEntry {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![
            Cow::Borrowed(self.description.as_str()),
            Cow::Borrowed(self.category.as_str()),
            Cow::Borrowed(self.kind.label()),
        ];
        if let Some(counterparty) = &self.counterparty {
            fields.push(Cow::Borrowed(counterparty.as_str()));
        }
        if let Some(date) = self.date {
            fields.push(Cow::Owned(format_date(date)));
        }
        fields
    }
}

/// Ключи сортировки журнала.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSortKey {
    /// Дата.
    Date,
    /// Сумма.
    Amount,
    /// Тип операции по подписи.
    Kind,
    /// Описание.
    Description,
    /// Контрагент.
    Counterparty,
    /// Категория.
    Category,
}

impl FromStr for LedgerSortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "date" => Self::Date,
            "amount" => Self::Amount,
            "type" => Self::Kind,
            "description" => Self::Description,
            "counterparty" => Self::Counterparty,
            "category" => Self::Category,
            _ => {
                return Err(ReportError::UnknownSortKey {
                    report: "ledger",
                    key: s.to_string(),
                });
            }
        })
    }
}

impl Sortable for LedgerEntry {
    type Key = LedgerSortKey;

    fn sort_value(&self, key: LedgerSortKey) -> SortValue<'_> {
        match key {
            LedgerSortKey::Date => SortValue::instant(self.date),
            LedgerSortKey::Amount => self.amount.into(),
            LedgerSortKey::Kind => SortValue::text(self.kind.label()),
            LedgerSortKey::Description => SortValue::text(&self.description),
            LedgerSortKey::Counterparty => self
                .counterparty
                .as_deref()
                .map_or(SortValue::Empty, SortValue::text),
            LedgerSortKey::Category => SortValue::text(&self.category),
        }
    }
}

/// Итоги журнала.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    /// Число записей.
    pub count: usize,
    /// Поступления.
    pub income: Money,
    /// Расходы.
    pub expense: Money,
    /// Возвраты.
    pub returns: Money,
    /// Переводы.
    pub transfers: Money,
    /// Сальдо: сумма всех записей со знаком.
    pub net: Money,
}

impl Summarize for LedgerEntry {
    type Totals = LedgerTotals;

    fn summarize(rows: &[Self]) -> LedgerTotals {
        let sum_of = |kind: TransactionKind| -> Money {
            saturating_sum(rows.iter().filter(|r| r.kind == kind).map(|r| r.amount))
        };
        LedgerTotals {
            count: rows.len(),
            income: sum_of(TransactionKind::Income),
            expense: sum_of(TransactionKind::Expense),
            returns: sum_of(TransactionKind::Return),
            transfers: sum_of(TransactionKind::Transfer),
            net: saturating_sum(rows.iter().map(|r| r.amount)),
        }
    }
}
