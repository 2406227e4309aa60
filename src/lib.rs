#![warn(missing_docs)]
//! Библиотека аналитических отчётов магазина автозапчастей.
//!
//! Принимает снимок заказов, клиентов, поставщиков и операций, нормализует
//! записи и строит пять независимых отчётов: по клиентам, рентабельности
//! товаров, юнит-экономике, поставщикам и журнал движения денег. Поиск,
//! сортировка и итоги применяются к любой таблице через [`present`].

mod config;
mod error;
mod list;
mod metrics;
mod normalize;
mod raw;
mod report;
mod reports;
mod types;
mod utils;

pub use crate::config::AnalyticsConfig;
pub use crate::error::ReportError;
pub use crate::list::{
    Direction, ReportView, Searchable, SortState, SortValue, Sortable, Summarize, filter_rows,
    present, sort_rows,
};
pub use crate::metrics::{average_check, mean, percent, profitability, ratio, saturating_sum};
pub use crate::normalize::Sources;
pub use crate::raw::{
    RawClient, RawLineItem, RawOrder, RawPayment, RawSupplier, RawTransaction,
    RawTransactionCategory, Snapshot,
};
pub use crate::report::{Period, ReportBuilder, ReportOptions, Reports};
pub use crate::reports::*;
pub use crate::types::*;
pub use crate::utils::{compare_ru, format_date, parse_date};
