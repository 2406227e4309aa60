//! Записи в том виде, в котором их отдаёт слой хранения, и загрузка снимка.
//!
//! Все поля, кроме идентификаторов, необязательны: документы в базе
//! заполнялись разными версиями форм, и часть полей может отсутствовать
//! или быть `null`.

use crate::error::ReportError;
use crate::types::Money;
use crate::utils::{parse_instant, parse_money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::io::Read;

// Поля разбираются снисходительно: неверное значение одного поля становится
// `None` и не ломает загрузку всего снимка.

fn money<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Money>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => parse_money(&number.to_string()),
        Value::String(value) => parse_money(&value),
        _ => None,
    })
}

fn instant<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        // Числом приходят миллисекунды Unix.
        Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(value) => parse_instant(&value),
        _ => None,
    })
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text(deserializer).map(Option::unwrap_or_default)
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(value) => Some(value),
        Value::String(value) => match value.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Заказ из базы данных.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrder {
    /// Идентификатор документа.
    #[serde(deserialize_with = "id")]
    pub id: String,
    /// Номер заказа для людей.
    #[serde(deserialize_with = "text")]
    pub number: Option<String>,
    /// Ссылка на клиента.
    #[serde(deserialize_with = "text")]
    pub client_id: Option<String>,
    /// Канал продаж (`site` или `showroom`).
    #[serde(deserialize_with = "text")]
    pub channel: Option<String>,
    /// Дата создания.
    #[serde(deserialize_with = "instant")]
    pub created_at: Option<DateTime<Utc>>,
    /// Признак активности.
    #[serde(deserialize_with = "flag")]
    pub is_active: Option<bool>,
    /// Позиции заказа.
    pub items: Option<Vec<RawLineItem>>,
    /// История оплат.
    pub payment_history: Option<Vec<RawPayment>>,
}

/// Позиция заказа.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLineItem {
    /// Наименование.
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
    /// Артикул.
    #[serde(deserialize_with = "text")]
    pub article: Option<String>,
    /// Производитель.
    #[serde(deserialize_with = "text")]
    pub manufacturer: Option<String>,
    /// Поставщик (имя или идентификатор).
    #[serde(deserialize_with = "text")]
    pub supplier: Option<String>,
    /// Цена продажи за единицу.
    #[serde(deserialize_with = "money")]
    pub price: Option<Money>,
    /// Количество.
    #[serde(deserialize_with = "money")]
    pub quantity: Option<Money>,
    /// Сумма позиции.
    #[serde(deserialize_with = "money")]
    pub total: Option<Money>,
    /// Закупочная цена за единицу.
    #[serde(deserialize_with = "money")]
    pub purchase: Option<Money>,
    /// Наценка по позиции.
    #[serde(deserialize_with = "money")]
    pub markup: Option<Money>,
    /// Статус позиции.
    #[serde(deserialize_with = "text")]
    pub status: Option<String>,
}

/// Запись истории оплат заказа.
///
/// Записанный в документе тип (`type`) не читается: оплату от возврата
/// отличает только знак суммы.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPayment {
    /// Сумма (отрицательная для возврата).
    #[serde(deserialize_with = "money")]
    pub amount: Option<Money>,
    /// Дата оплаты.
    #[serde(deserialize_with = "instant")]
    pub date: Option<DateTime<Utc>>,
}

/// Клиент.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawClient {
    /// Идентификатор документа.
    #[serde(deserialize_with = "id")]
    pub id: String,
    /// Фамилия.
    #[serde(deserialize_with = "text")]
    pub last_name: Option<String>,
    /// Имя.
    #[serde(deserialize_with = "text")]
    pub first_name: Option<String>,
    /// Отчество.
    #[serde(deserialize_with = "text")]
    pub middle_name: Option<String>,
    /// Телефон.
    #[serde(deserialize_with = "text")]
    pub phone: Option<String>,
    /// Электронная почта.
    #[serde(deserialize_with = "text")]
    pub email: Option<String>,
    /// Признак активности.
    #[serde(deserialize_with = "flag")]
    pub is_active: Option<bool>,
}

/// Поставщик.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSupplier {
    /// Идентификатор документа.
    #[serde(deserialize_with = "id")]
    pub id: String,
    /// Отображаемое имя.
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
}

/// Ручная запись в журнале движения денег.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    /// Идентификатор документа.
    #[serde(deserialize_with = "id")]
    pub id: String,
    /// Дата операции.
    #[serde(deserialize_with = "instant")]
    pub date: Option<DateTime<Utc>>,
    /// Описание.
    #[serde(deserialize_with = "text")]
    pub description: Option<String>,
    /// Сумма со знаком.
    #[serde(deserialize_with = "money")]
    pub amount: Option<Money>,
    /// Тип: `income`, `expense`, `return`, `transfer`.
    #[serde(rename = "type", deserialize_with = "text")]
    pub kind: Option<String>,
    /// Ссылка на категорию.
    #[serde(deserialize_with = "text")]
    pub category_id: Option<String>,
    /// Ссылка на клиента.
    #[serde(deserialize_with = "text")]
    pub client_id: Option<String>,
    /// Ссылка на поставщика.
    #[serde(deserialize_with = "text")]
    pub supplier_id: Option<String>,
}

/// Категория операций.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransactionCategory {
    /// Идентификатор документа.
    #[serde(deserialize_with = "id")]
    pub id: String,
    /// Название.
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
    /// Тип операций категории.
    #[serde(rename = "type", deserialize_with = "text")]
    pub kind: Option<String>,
}

/// Снимок всех коллекций, нужных для построения отчётов.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// Заказы.
    pub orders: Vec<RawOrder>,
    /// Клиенты.
    pub clients: Vec<RawClient>,
    /// Поставщики.
    pub suppliers: Vec<RawSupplier>,
    /// Ручные операции.
    pub transactions: Vec<RawTransaction>,
    /// Категории операций.
    pub transaction_categories: Vec<RawTransactionCategory>,
}

impl Snapshot {
    /// Читает JSON-снимок из произвольного `Read`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Разбирает снимок из готовой JSON-строки.
    #[inline]
    pub fn from_json(s: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_collections_default_to_empty() {
        let snapshot = Snapshot::from_json(r#"{"orders": [{"id": "o1"}]}"#).unwrap();
        assert_eq!(snapshot.orders.len(), 1);
        assert!(snapshot.orders[0].items.is_none());
        assert!(snapshot.clients.is_empty());
        assert!(snapshot.transaction_categories.is_empty());
    }

    #[test]
    fn numbers_accept_strings_and_nulls() {
        let json = r#"{"orders": [{"id": "o1", "items": [
            {"name": "Фильтр", "price": "100.50", "quantity": 2, "purchase": null}
        ]}]}"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        let items = snapshot.orders[0].items.as_ref().unwrap();
        assert_eq!(items[0].price, Some(Money::new(10050, 2)));
        assert_eq!(items[0].quantity, Some(Money::from(2)));
        assert_eq!(items[0].purchase, None);
    }

    #[test]
    fn bad_field_values_become_missing() {
        let json = r#"{"orders": [{
            "id": 17,
            "number": 1001,
            "createdAt": "2024-03-01",
            "isActive": "yes",
            "items": [
                {"name": "Фильтр", "price": "abc", "quantity": "1 200,5", "purchase": ""}
            ],
            "paymentHistory": [{"amount": "", "date": "когда-то"}]
        }]}"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        let order = &snapshot.orders[0];
        assert_eq!(order.id, "17");
        assert_eq!(order.number.as_deref(), Some("1001"));
        assert_eq!(
            order.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(order.is_active, None);

        let items = order.items.as_ref().unwrap();
        assert_eq!(items[0].price, None);
        assert_eq!(items[0].quantity, Some(Money::new(12005, 1)));
        assert_eq!(items[0].purchase, None);

        let payments = order.payment_history.as_ref().unwrap();
        assert_eq!(payments[0].amount, None);
        assert_eq!(payments[0].date, None);
    }

    #[test]
    fn dates_as_unix_millis() {
        let json = r#"{"transactions": [{"id": "t1", "date": 1709287200000, "amount": -700}]}"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(
            snapshot.transactions[0].date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(snapshot.transactions[0].amount, Some(Money::from(-700)));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = Snapshot::from_json("[1, 2").unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
    }
}
