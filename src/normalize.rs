//! Приведение сохранённых записей к полностью заполненным доменным типам.
//!
//! После нормализации агрегаторы могут не проверять поля на отсутствие:
//! пропущенные числа становятся нулём, пропущенные строки пустыми.

use crate::raw::{
    RawClient, RawLineItem, RawOrder, RawPayment, RawSupplier, RawTransaction,
    RawTransactionCategory, Snapshot,
};
use crate::types::{
    Channel, Client, ItemStatus, LineItem, Order, Payment, STATUS_CREATED, STATUS_REJECTED,
    Supplier, Transaction, TransactionCategory, TransactionKind,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Нормализованные коллекции со справочниками для поиска по ссылкам.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    /// Заказы.
    pub orders: Vec<Order>,
    /// Клиенты в исходном порядке.
    pub clients: Vec<Client>,
    /// Поставщики.
    pub suppliers: Vec<Supplier>,
    /// Ручные операции.
    pub transactions: Vec<Transaction>,
    /// Категории операций.
    pub categories: Vec<TransactionCategory>,
    client_index: HashMap<String, usize>,
    supplier_index: HashMap<String, usize>,
    category_index: HashMap<String, usize>,
}

impl Sources {
    /// Собирает источники из уже нормализованных коллекций.
    pub fn new(
        orders: Vec<Order>,
        clients: Vec<Client>,
        suppliers: Vec<Supplier>,
        transactions: Vec<Transaction>,
        categories: Vec<TransactionCategory>,
    ) -> Self {
        let client_index = index_by(&clients, |c| &c.id);
        let supplier_index = index_by(&suppliers, |s| &s.id);
        let category_index = index_by(&categories, |c| &c.id);
        Self {
            orders,
            clients,
            suppliers,
            transactions,
            categories,
            client_index,
            supplier_index,
            category_index,
        }
    }

    /// Нормализует весь снимок.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let sources = Self::new(
            snapshot.orders.iter().map(normalize_order).collect(),
            snapshot.clients.iter().map(normalize_client).collect(),
            snapshot.suppliers.iter().map(normalize_supplier).collect(),
            snapshot
                .transactions
                .iter()
                .map(normalize_transaction)
                .collect(),
            snapshot
                .transaction_categories
                .iter()
                .map(normalize_category)
                .collect(),
        );
        debug!(
            orders = sources.orders.len(),
            clients = sources.clients.len(),
            suppliers = sources.suppliers.len(),
            transactions = sources.transactions.len(),
            categories = sources.categories.len(),
            "Snapshot normalized"
        );
        sources
    }

    /// Ищет клиента по идентификатору.
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.client_index.get(id).map(|&i| &self.clients[i])
    }

    /// Ищет поставщика по идентификатору.
    pub fn supplier(&self, id: &str) -> Option<&Supplier> {
        self.supplier_index.get(id).map(|&i| &self.suppliers[i])
    }

    /// Ищет категорию по идентификатору.
    pub fn category(&self, id: &str) -> Option<&TransactionCategory> {
        self.category_index.get(id).map(|&i| &self.categories[i])
    }
}

fn index_by<T>(items: &[T], key: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        // При дублях побеждает первая запись.
        index.entry(key(item).clone()).or_insert(i);
    }
    index
}

/// Обрезает строку и превращает пустую в `None`.
fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text(value: Option<&String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Разбирает статус позиции.
pub fn parse_status(value: Option<&str>) -> ItemStatus {
    match value.map(str::trim) {
        None | Some("") => ItemStatus::Unset,
        Some(STATUS_REJECTED) => ItemStatus::Rejected,
        Some(STATUS_CREATED) => ItemStatus::Created,
        Some(other) => ItemStatus::Other(other.to_string()),
    }
}

/// Определяет канал: всё, что не `site`, считается торговым залом.
pub fn parse_channel(value: Option<&str>) -> Channel {
    match value.map(str::trim) {
        Some("site") => Channel::Site,
        _ => Channel::Showroom,
    }
}

/// Нормализует позицию заказа.
pub fn normalize_item(raw: &RawLineItem) -> LineItem {
    LineItem {
        name: text(raw.name.as_ref()),
        article: text(raw.article.as_ref()),
        manufacturer: non_empty(raw.manufacturer.as_ref()),
        supplier: non_empty(raw.supplier.as_ref()),
        price: raw.price.unwrap_or(Decimal::ZERO),
        quantity: raw.quantity.unwrap_or(Decimal::ZERO),
        total: raw.total.unwrap_or(Decimal::ZERO),
        purchase: raw.purchase,
        markup: raw.markup.unwrap_or(Decimal::ZERO),
        status: parse_status(raw.status.as_deref()),
    }
}

fn normalize_payment(raw: &RawPayment) -> Payment {
    Payment {
        amount: raw.amount.unwrap_or(Decimal::ZERO),
        date: raw.date,
    }
}

/// Нормализует заказ вместе с позициями и оплатами.
pub fn normalize_order(raw: &RawOrder) -> Order {
    Order {
        id: raw.id.clone(),
        number: non_empty(raw.number.as_ref()).unwrap_or_else(|| raw.id.clone()),
        client_id: non_empty(raw.client_id.as_ref()),
        channel: parse_channel(raw.channel.as_deref()),
        created_at: raw.created_at,
        is_active: raw.is_active.unwrap_or(true),
        items: raw
            .items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(normalize_item)
            .collect(),
        payments: raw
            .payment_history
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(normalize_payment)
            .collect(),
    }
}

/// Нормализует клиента.
pub fn normalize_client(raw: &RawClient) -> Client {
    Client {
        id: raw.id.clone(),
        last_name: text(raw.last_name.as_ref()),
        first_name: text(raw.first_name.as_ref()),
        middle_name: text(raw.middle_name.as_ref()),
        phone: text(raw.phone.as_ref()),
        email: text(raw.email.as_ref()),
        is_active: raw.is_active.unwrap_or(true),
    }
}

/// Нормализует поставщика; пустое имя заменяется идентификатором.
pub fn normalize_supplier(raw: &RawSupplier) -> Supplier {
    Supplier {
        id: raw.id.clone(),
        name: non_empty(raw.name.as_ref()).unwrap_or_else(|| raw.id.clone()),
    }
}

/// Нормализует ручную операцию.
///
/// Неизвестный тип определяется по знаку суммы: неотрицательная сумма
/// считается доходом, отрицательная расходом.
pub fn normalize_transaction(raw: &RawTransaction) -> Transaction {
    let amount = raw.amount.unwrap_or(Decimal::ZERO);
    let kind = raw
        .kind
        .as_deref()
        .and_then(TransactionKind::parse)
        .unwrap_or(if amount < Decimal::ZERO {
            TransactionKind::Expense
        } else {
            TransactionKind::Income
        });
    Transaction {
        id: raw.id.clone(),
        date: raw.date,
        description: text(raw.description.as_ref()),
        amount,
        kind,
        category_id: non_empty(raw.category_id.as_ref()),
        client_id: non_empty(raw.client_id.as_ref()),
        supplier_id: non_empty(raw.supplier_id.as_ref()),
    }
}

/// Нормализует категорию операций.
pub fn normalize_category(raw: &RawTransactionCategory) -> TransactionCategory {
    TransactionCategory {
        id: raw.id.clone(),
        name: text(raw.name.as_ref()),
        kind: raw.kind.as_deref().and_then(TransactionKind::parse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_without_items_gets_empty_lists() {
        let order = normalize_order(&RawOrder {
            id: "o1".into(),
            ..RawOrder::default()
        });
        assert!(order.items.is_empty());
        assert!(order.payments.is_empty());
        assert_eq!(order.number, "o1");
        assert_eq!(order.channel, Channel::Showroom);
        assert!(order.is_active);
    }

    #[test]
    fn missing_numbers_default_per_field() {
        let item = normalize_item(&RawLineItem {
            name: Some(" Колодки ".into()),
            ..RawLineItem::default()
        });
        assert_eq!(item.name, "Колодки");
        assert_eq!(item.article, "");
        assert_eq!(item.quantity, Decimal::ZERO);
        assert_eq!(item.total, Decimal::ZERO);
        assert_eq!(item.markup, Decimal::ZERO);
        assert_eq!(item.purchase, None);
        assert_eq!(item.status, ItemStatus::Unset);
    }

    #[test]
    fn statuses_and_channels() {
        assert_eq!(parse_status(Some(" Отказ ")), ItemStatus::Rejected);
        assert_eq!(parse_status(Some("Создан")), ItemStatus::Created);
        assert_eq!(
            parse_status(Some("В пути")),
            ItemStatus::Other("В пути".into())
        );
        assert_eq!(parse_channel(Some("site")), Channel::Site);
        assert_eq!(parse_channel(Some("showroom")), Channel::Showroom);
        assert_eq!(parse_channel(Some("phone")), Channel::Showroom);
        assert_eq!(parse_channel(None), Channel::Showroom);
    }

    #[test]
    fn unknown_transaction_type_follows_sign() {
        let income = normalize_transaction(&RawTransaction {
            id: "t1".into(),
            amount: Some(Decimal::from(50)),
            kind: Some("other".into()),
            ..RawTransaction::default()
        });
        let expense = normalize_transaction(&RawTransaction {
            id: "t2".into(),
            amount: Some(Decimal::from(-50)),
            ..RawTransaction::default()
        });
        assert_eq!(income.kind, TransactionKind::Income);
        assert_eq!(expense.kind, TransactionKind::Expense);
    }

    #[test]
    fn lookups_resolve_by_id() {
        let snapshot = Snapshot {
            clients: vec![RawClient {
                id: "c1".into(),
                last_name: Some("Иванов".into()),
                ..RawClient::default()
            }],
            suppliers: vec![RawSupplier {
                id: "s1".into(),
                name: None,
            }],
            ..Snapshot::default()
        };
        let sources = Sources::from_snapshot(&snapshot);
        assert_eq!(sources.client("c1").unwrap().last_name, "Иванов");
        assert!(sources.client("c2").is_none());
        assert_eq!(sources.supplier("s1").unwrap().name, "s1");
    }
}
