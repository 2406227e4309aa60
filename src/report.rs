//! Параметры построения отчётов и builder для выбора нужных таблиц.

use crate::normalize::Sources;
use crate::reports::{
    ClientRow, LedgerEntry, ProductRow, SupplierRow, UnitEconomicsRow, client_report, ledger,
    product_report, supplier_report, unit_economics,
};
use crate::types::Order;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

/// Период отчёта, границы включаются.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// Первый день периода.
    pub from: NaiveDate,
    /// Последний день периода.
    pub to: NaiveDate,
}

impl Period {
    /// Создаёт период, упорядочивая границы.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            from: a.min(b),
            to: a.max(b),
        }
    }

    /// Попадает ли момент времени в период. Записи без даты не попадают.
    pub fn contains(&self, instant: Option<DateTime<Utc>>) -> bool {
        instant.is_some_and(|at| {
            let day = at.date_naive();
            self.from <= day && day <= self.to
        })
    }
}

/// Общие параметры расчёта, которые видит каждый агрегатор.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Момент «сейчас» для расчёта давности закупок.
    pub now: DateTime<Utc>,
    /// Необязательный период.
    pub period: Option<Period>,
}

impl ReportOptions {
    /// Параметры без периода с заданным моментом «сейчас».
    #[inline]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now, period: None }
    }

    /// Проверяет дату на попадание в период; без периода подходит всё.
    #[inline]
    pub fn in_period(&self, instant: Option<DateTime<Utc>>) -> bool {
        self.period.is_none_or(|period| period.contains(instant))
    }

    /// Заказы, участвующие в расчёте.
    pub fn orders<'a>(&'a self, sources: &'a Sources) -> impl Iterator<Item = &'a Order> + 'a {
        sources
            .orders
            .iter()
            .filter(move |order| self.in_period(order.created_at))
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

/// Набор флагов, определяющий, какие отчёты считать (внутренний тип).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Selection {
    pub clients: bool,
    pub products: bool,
    pub unit_economics: bool,
    pub suppliers: bool,
    pub ledger: bool,
}

impl Selection {
    /// Все отчёты.
    pub const fn everything() -> Self {
        Self {
            clients: true,
            products: true,
            unit_economics: true,
            suppliers: true,
            ledger: true,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::everything()
    }
}

/// Результат одного пересчёта: строки всех выбранных отчётов.
///
/// Поиск, сортировка и итоги применяются к каждой таблице отдельно через
/// [`crate::present`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reports {
    /// Отчёт по клиентам.
    pub clients: Option<Vec<ClientRow>>,
    /// Рентабельность товаров.
    pub products: Option<Vec<ProductRow>>,
    /// Юнит-экономика по каналам.
    pub unit_economics: Option<Vec<UnitEconomicsRow>>,
    /// Рентабельность поставщиков.
    pub suppliers: Option<Vec<SupplierRow>>,
    /// Журнал движения денег.
    pub ledger: Option<Vec<LedgerEntry>>,
}

impl Reports {
    /// Считает все отчёты с параметрами по умолчанию.
    #[inline]
    pub fn compute(sources: &Sources, options: &ReportOptions) -> Self {
        Self::compute_with(sources, options, Selection::everything())
    }

    pub(crate) fn compute_with(
        sources: &Sources,
        options: &ReportOptions,
        selection: Selection,
    ) -> Self {
        let reports = Self {
            clients: compute_optional(selection.clients, || client_report(sources, options)),
            products: compute_optional(selection.products, || product_report(sources, options)),
            unit_economics: compute_optional(selection.unit_economics, || {
                unit_economics(sources, options)
            }),
            suppliers: compute_optional(selection.suppliers, || {
                supplier_report(sources, options)
            }),
            ledger: compute_optional(selection.ledger, || ledger(sources, options)),
        };
        debug!(
            clients = reports.clients.as_ref().map_or(0, Vec::len),
            products = reports.products.as_ref().map_or(0, Vec::len),
            unit_economics = reports.unit_economics.as_ref().map_or(0, Vec::len),
            suppliers = reports.suppliers.as_ref().map_or(0, Vec::len),
            ledger = reports.ledger.as_ref().map_or(0, Vec::len),
            "Reports recomputed"
        );
        reports
    }
}

/// Builder для пересчёта с выбором отчётов и периода.
pub struct ReportBuilder<'a> {
    sources: &'a Sources,
    options: ReportOptions,
    selection: Selection,
}

impl<'a> ReportBuilder<'a> {
    /// Создаёт builder для указанных источников.
    ///
    /// # Пример
    ///
    /// ```
    /// # use autoparts_analytics::{ReportBuilder, Snapshot, Sources};
    /// # let sources = Sources::from_snapshot(&Snapshot::default());
    /// let reports = ReportBuilder::new(&sources)
    ///     .clients(true)
    ///     .ledger(false)
    ///     .compute();
    /// assert!(reports.ledger.is_none());
    /// ```
    #[inline]
    pub fn new(sources: &'a Sources) -> Self {
        Self {
            sources,
            options: ReportOptions::default(),
            selection: Selection::everything(),
        }
    }

    /// Задаёт момент «сейчас».
    #[inline]
    pub const fn now(mut self, now: DateTime<Utc>) -> Self {
        self.options.now = now;
        self
    }

    /// Ограничивает расчёт периодом.
    #[inline]
    pub const fn period(mut self, period: Option<Period>) -> Self {
        self.options.period = period;
        self
    }

    /// Включает или отключает отчёт по клиентам.
    #[inline]
    pub const fn clients(mut self, enabled: bool) -> Self {
        self.selection.clients = enabled;
        self
    }

    /// Включает или отключает рентабельность товаров.
    #[inline]
    pub const fn products(mut self, enabled: bool) -> Self {
        self.selection.products = enabled;
        self
    }

    /// Включает или отключает юнит-экономику.
    #[inline]
    pub const fn unit_economics(mut self, enabled: bool) -> Self {
        self.selection.unit_economics = enabled;
        self
    }

    /// Включает или отключает рентабельность поставщиков.
    #[inline]
    pub const fn suppliers(mut self, enabled: bool) -> Self {
        self.selection.suppliers = enabled;
        self
    }

    /// Включает или отключает журнал движения денег.
    #[inline]
    pub const fn ledger(mut self, enabled: bool) -> Self {
        self.selection.ledger = enabled;
        self
    }

    /// Текущие параметры расчёта.
    #[inline]
    pub const fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Выполняет пересчёт с текущими настройками.
    #[inline]
    pub fn compute(self) -> Reports {
        Reports::compute_with(self.sources, &self.options, self.selection)
    }
}

/// Вызывает агрегатор, только если отчёт выбран.
fn compute_optional<T, F>(enabled: bool, aggregate: F) -> Option<T>
where
    F: FnOnce() -> T,
{
    enabled.then(aggregate)
}
