//! Ошибки загрузки данных и разбора параметров отчётов.
//!
//! Сами агрегаторы ошибок не возвращают: любые пропуски в данных заменяются
//! значениями по умолчанию на этапе нормализации.

/// Ошибка загрузки снимка данных или разбора параметров отчёта.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// Ошибка ввода-вывода при чтении снимка.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Снимок данных не является корректным JSON-документом.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Неизвестный ключ сортировки для отчёта.
    #[error("Unknown sort key '{key}' for report '{report}'")]
    UnknownSortKey {
        /// Имя отчёта.
        report: &'static str,
        /// Переданный ключ.
        key: String,
    },
    /// Неизвестное имя отчёта.
    #[error("Unknown report '{0}'")]
    UnknownReport(String),
    /// Ошибка разбора даты.
    #[error("Invalid date '{value}'")]
    InvalidDate {
        /// Некорректная дата.
        value: String,
    },
}
