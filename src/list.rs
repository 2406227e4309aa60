//! Поиск, сортировка и итоги для строк любого отчёта.
//!
//! Каждая строка отчёта описывает, по каким полям её можно искать
//! ([`Searchable`]), как получить значение для сортировки ([`Sortable`])
//! и как свернуть набор строк в итоги ([`Summarize`]). Функция [`present`]
//! склеивает эти шаги в порядке «фильтр → сортировка → итоги».

use crate::utils::{compare_ru, contains_ci, normalize_query};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Строка, поддерживающая текстовый поиск.
pub trait Searchable {
    /// Поля, в которых ищется подстрока.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// Проверяет строку на соответствие уже нормализованному запросу.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| contains_ci(field, needle))
    }
}

/// Строка, поддерживающая сортировку по ключу.
pub trait Sortable {
    /// Перечень ключей сортировки отчёта.
    type Key: Copy + PartialEq;

    /// Значение строки для указанного ключа.
    fn sort_value(&self, key: Self::Key) -> SortValue<'_>;
}

/// Строки, которые сворачиваются в итоговую запись.
pub trait Summarize: Sized {
    /// Итоговая запись.
    type Totals;

    /// Считает итоги по уже отфильтрованным строкам.
    fn summarize(rows: &[Self]) -> Self::Totals;
}

/// Значение ячейки для сравнения.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    /// Признак вида «активен / неактивен».
    Flag(bool),
    /// Число или момент времени.
    Number(Decimal),
    /// Строка.
    Text(Cow<'a, str>),
    /// Значение отсутствует.
    Empty,
}

impl<'a> SortValue<'a> {
    /// Момент времени как число миллисекунд.
    pub fn instant(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Empty, |v| {
            Self::Number(Decimal::from(v.timestamp_millis()))
        })
    }

    /// Строковое значение без копирования.
    #[inline]
    pub fn text(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Flag(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Empty => 3,
        }
    }

    /// Сравнение по возрастанию.
    ///
    /// Активные записи идут раньше неактивных, числа сравниваются как числа,
    /// строки по русскому алфавиту. Значения разных видов упорядочены по
    /// виду, пустые значения всегда в конце.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Flag(a), Self::Flag(b)) => b.cmp(a),
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => compare_ru(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<Decimal> for SortValue<'_> {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for SortValue<'_> {
    fn from(value: usize) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<i64> for SortValue<'_> {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<bool> for SortValue<'_> {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl<'a, T: Into<SortValue<'a>>> From<Option<T>> for SortValue<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Направление сортировки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// По возрастанию.
    #[default]
    Asc,
    /// По убыванию.
    Desc,
}

impl Direction {
    /// Противоположное направление.
    #[inline]
    pub const fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Текущая сортировка таблицы: один активный ключ и направление.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<K> {
    /// Ключ сортировки.
    pub key: K,
    /// Направление.
    pub direction: Direction,
}

impl<K: Copy + PartialEq> SortState<K> {
    /// Сортировка по возрастанию по ключу.
    #[inline]
    pub const fn asc(key: K) -> Self {
        Self {
            key,
            direction: Direction::Asc,
        }
    }

    /// Сортировка по убыванию по ключу.
    #[inline]
    pub const fn desc(key: K) -> Self {
        Self {
            key,
            direction: Direction::Desc,
        }
    }

    /// Реакция на клик по заголовку: тот же ключ меняет направление,
    /// новый ключ начинает с возрастания.
    #[must_use]
    pub fn toggle(self, key: K) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flip(),
            }
        } else {
            Self::asc(key)
        }
    }
}

/// Оставляет строки, в которых хотя бы одно поле содержит запрос.
///
/// Пустой запрос возвращает набор без изменений.
pub fn filter_rows<R: Searchable>(rows: Vec<R>, query: &str) -> Vec<R> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return rows;
    }
    rows.into_iter().filter(|row| row.matches(&needle)).collect()
}

/// Устойчиво сортирует строки по ключу и направлению.
pub fn sort_rows<R: Sortable>(rows: &mut [R], sort: SortState<R::Key>) {
    rows.sort_by(|a, b| {
        let cmp = a.sort_value(sort.key).compare(&b.sort_value(sort.key));
        match sort.direction {
            Direction::Asc => cmp,
            Direction::Desc => cmp.reverse(),
        }
    });
}

/// Готовая к показу таблица: строки и итоги по ним.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView<R: Summarize> {
    /// Отфильтрованные и отсортированные строки.
    pub rows: Vec<R>,
    /// Итоги по показанным строкам.
    pub totals: R::Totals,
}

/// Применяет поиск и сортировку, затем считает итоги по результату.
pub fn present<R>(rows: Vec<R>, query: &str, sort: Option<SortState<R::Key>>) -> ReportView<R>
where
    R: Searchable + Sortable + Summarize,
{
    let mut rows = filter_rows(rows, query);
    if let Some(sort) = sort {
        sort_rows(&mut rows, sort);
    }
    let totals = R::summarize(&rows);
    ReportView { rows, totals }
}
