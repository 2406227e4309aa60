//! Агрегаторы отчётов. Каждый модуль сворачивает заказы или операции в
//! строки своей таблицы и описывает для них поиск, сортировку и итоги.

mod client;
mod ledger;
mod product;
mod supplier;
mod unit_economics;

pub use client::{ClientRow, ClientSortKey, ClientTotals, client_report};
pub use ledger::{LedgerEntry, LedgerSortKey, LedgerTotals, ledger};
pub use product::{ProductKey, ProductRow, ProductSortKey, ProductTotals, product_report};
pub use supplier::{SupplierRow, SupplierSortKey, SupplierTotals, supplier_report};
pub use unit_economics::{
    ChannelFigures, UnitEconomicsRow, UnitEconomicsSortKey, UnitEconomicsTotals, unit_economics,
};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Короткие конструкторы заказов для тестов агрегаторов.

    use crate::types::{Channel, Client, LineItem, Order, Payment};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    pub fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    /// Позиция с ценой, количеством и закупкой; сумма и наценка считаются здесь.
    pub fn item(
        name: &str,
        article: &str,
        price: i64,
        qty: i64,
        purchase: i64,
        status: &str,
    ) -> LineItem {
        LineItem {
            name: name.to_string(),
            article: article.to_string(),
            price: dec(price),
            quantity: dec(qty),
            total: dec(price * qty),
            purchase: Some(dec(purchase)),
            markup: dec((price - purchase) * qty),
            status: crate::normalize::parse_status(Some(status)),
            ..LineItem::default()
        }
    }

    pub fn from_supplier(mut item: LineItem, supplier: &str) -> LineItem {
        item.supplier = Some(supplier.to_string());
        item
    }

    pub fn order(id: &str, client: &str, items: Vec<LineItem>) -> Order {
        Order {
            id: id.to_string(),
            number: id.to_uppercase(),
            client_id: Some(client.to_string()),
            channel: Channel::Showroom,
            created_at: Some(at(2024, 3, 1)),
            is_active: true,
            items,
            payments: Vec::new(),
        }
    }

    pub fn on_site(mut order: Order) -> Order {
        order.channel = Channel::Site;
        order
    }

    pub fn paid(mut order: Order, amounts: &[i64]) -> Order {
        order.payments = amounts
            .iter()
            .map(|&amount| Payment {
                amount: dec(amount),
                date: order.created_at,
            })
            .collect();
        order
    }

    pub fn client(id: &str, last: &str, first: &str) -> Client {
        Client {
            id: id.to_string(),
            last_name: last.to_string(),
            first_name: first.to_string(),
            is_active: true,
            ..Client::default()
        }
    }
}
