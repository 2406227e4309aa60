//! Нормализованные доменные типы, с которыми работают агрегаторы.

use crate::metrics::saturating_sum;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Денежное значение, используем `Decimal` для точных расчётов.
pub type Money = Decimal;

/// Статус позиции, который означает отказ от товара.
pub const STATUS_REJECTED: &str = "Отказ";
/// Статус только что созданной позиции.
pub const STATUS_CREATED: &str = "Создан";

/// Подпись для заказов, клиент которых не найден.
pub const UNKNOWN_CLIENT: &str = "Неизвестный клиент";
/// Подпись для позиций без поставщика.
pub const NO_SUPPLIER: &str = "Без поставщика";
/// Подпись для ссылки на удалённого поставщика.
pub const UNKNOWN_SUPPLIER: &str = "Неизвестный поставщик";
/// Подпись для операций без категории.
pub const NO_CATEGORY: &str = "Без категории";

/// Канал продаж заказа.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Интернет-магазин.
    Site,
    /// Торговый зал.
    #[default]
    Showroom,
}

/// Статус позиции заказа.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemStatus {
    /// «Отказ»: позиция не участвует ни в одном расчёте.
    Rejected,
    /// «Создан»: позиция не участвует в расчёте долга.
    Created,
    /// Статус не указан.
    #[default]
    Unset,
    /// Прочие статусы («В пути», «Выдан» и т.д.).
    Other(String),
}

impl ItemStatus {
    /// Позиция учитывается в продажах, наценке и закупке.
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Rejected)
    }

    /// Позиция учитывается в сумме к оплате.
    #[inline]
    pub const fn is_payable(&self) -> bool {
        !matches!(self, Self::Rejected | Self::Created)
    }
}

/// Позиция заказа после нормализации.
#[derive(Debug, Clone, Default)]
pub struct LineItem {
    /// Наименование.
    pub name: String,
    /// Артикул (пустая строка, если не указан).
    pub article: String,
    /// Производитель.
    pub manufacturer: Option<String>,
    /// Поставщик.
    pub supplier: Option<String>,
    /// Цена продажи за единицу.
    pub price: Money,
    /// Количество.
    pub quantity: Money,
    /// Сумма позиции, как она сохранена в заказе.
    pub total: Money,
    /// Закупочная цена за единицу.
    pub purchase: Option<Money>,
    /// Наценка по позиции, как она сохранена в заказе.
    pub markup: Money,
    /// Статус.
    pub status: ItemStatus,
}

impl LineItem {
    /// Закупочная стоимость всей позиции.
    #[inline]
    pub fn purchase_total(&self) -> Money {
        self.purchase
            .unwrap_or(Decimal::ZERO)
            .saturating_mul(self.quantity)
    }
}

/// Запись об оплате или возврате по заказу.
#[derive(Debug, Clone)]
pub struct Payment {
    /// Сумма со знаком, отрицательная для возврата.
    pub amount: Money,
    /// Дата.
    pub date: Option<DateTime<Utc>>,
}

/// Заказ после нормализации.
#[derive(Debug, Clone)]
pub struct Order {
    /// Идентификатор.
    pub id: String,
    /// Номер заказа.
    pub number: String,
    /// Ссылка на клиента.
    pub client_id: Option<String>,
    /// Канал продаж.
    pub channel: Channel,
    /// Дата создания.
    pub created_at: Option<DateTime<Utc>>,
    /// Признак активности.
    pub is_active: bool,
    /// Позиции.
    pub items: Vec<LineItem>,
    /// Оплаты и возвраты.
    pub payments: Vec<Payment>,
}

impl Order {
    /// Позиции, участвующие в расчётах (без отказов).
    pub fn active_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| item.status.is_active())
    }

    /// Сумма к оплате: позиции без отказов и без статуса «Создан».
    pub fn payable(&self) -> Money {
        saturating_sum(
            self.items
                .iter()
                .filter(|item| item.status.is_payable())
                .map(|item| item.total),
        )
    }

    /// Сумма всех оплат с учётом возвратов.
    pub fn paid(&self) -> Money {
        saturating_sum(self.payments.iter().map(|p| p.amount))
    }

    /// Долг клиента по заказу, отрицательный при переплате.
    #[inline]
    pub fn debt(&self) -> Money {
        self.payable().saturating_sub(self.paid())
    }
}

/// Клиент.
#[derive(Debug, Clone, Default)]
pub struct Client {
    /// Идентификатор.
    pub id: String,
    /// Фамилия.
    pub last_name: String,
    /// Имя.
    pub first_name: String,
    /// Отчество.
    pub middle_name: String,
    /// Телефон.
    pub phone: String,
    /// Электронная почта.
    pub email: String,
    /// Признак активности.
    pub is_active: bool,
}

impl Client {
    /// Полное имя «Фамилия Имя Отчество» без лишних пробелов.
    pub fn full_name(&self) -> String {
        [&self.last_name, &self.first_name, &self.middle_name]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Поставщик.
#[derive(Debug, Clone)]
pub struct Supplier {
    /// Идентификатор.
    pub id: String,
    /// Отображаемое имя.
    pub name: String,
}

/// Тип операции в журнале движения денег.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Поступление.
    Income,
    /// Расход.
    Expense,
    /// Возврат.
    Return,
    /// Перевод между кассами.
    Transfer,
}

impl TransactionKind {
    /// Разбирает тип из сохранённой строки.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "return" => Some(Self::Return),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }

    /// Подпись типа для интерфейса.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Income => "Доход",
            Self::Expense => "Расход",
            Self::Return => "Возврат",
            Self::Transfer => "Перевод",
        }
    }
}

/// Ручная операция после нормализации.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Идентификатор.
    pub id: String,
    /// Дата.
    pub date: Option<DateTime<Utc>>,
    /// Описание.
    pub description: String,
    /// Сумма со знаком.
    pub amount: Money,
    /// Тип.
    pub kind: TransactionKind,
    /// Ссылка на категорию.
    pub category_id: Option<String>,
    /// Ссылка на клиента.
    pub client_id: Option<String>,
    /// Ссылка на поставщика.
    pub supplier_id: Option<String>,
}

/// Категория операций.
#[derive(Debug, Clone)]
pub struct TransactionCategory {
    /// Идентификатор.
    pub id: String,
    /// Название.
    pub name: String,
    /// Тип операций, если указан.
    pub kind: Option<TransactionKind>,
}
