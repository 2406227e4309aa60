//! Настройки расчёта из переменных окружения.
//!
//! - `ANALYTICS_NOW`: момент «сейчас» в RFC 3339, по умолчанию текущее время;
//! - `ANALYTICS_FROM`, `ANALYTICS_TO`: границы периода в формате `dd.mm.yyyy`.
//!   Если задана только одна граница, период состоит из одного дня.

use crate::error::ReportError;
use crate::report::{Period, ReportOptions};
use crate::utils::parse_date;
use chrono::{DateTime, Utc};
use std::env;

/// Настройки расчёта, прочитанные из окружения.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Зафиксированный момент «сейчас».
    pub now: Option<DateTime<Utc>>,
    /// Период отчёта.
    pub period: Option<Period>,
}

impl AnalyticsConfig {
    /// Читает настройки из переменных окружения процесса.
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Читает настройки через произвольный источник переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let now = var("ANALYTICS_NOW")
            .map(|value| {
                DateTime::parse_from_rfc3339(value.trim())
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|_| ReportError::InvalidDate { value })
            })
            .transpose()?;

        let from = var("ANALYTICS_FROM").map(|v| parse_date(&v)).transpose()?;
        let to = var("ANALYTICS_TO").map(|v| parse_date(&v)).transpose()?;
        let period = match (from, to) {
            (Some(from), Some(to)) => Some(Period::new(from, to)),
            (Some(day), None) | (None, Some(day)) => Some(Period::new(day, day)),
            (None, None) => None,
        };

        Ok(Self { now, period })
    }

    /// Параметры расчёта для агрегаторов.
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            now: self.now.unwrap_or_else(Utc::now),
            period: self.period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AnalyticsConfig, ReportError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AnalyticsConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_means_no_overrides() {
        assert_eq!(config(&[]).unwrap(), AnalyticsConfig::default());
    }

    #[test]
    fn reads_now_and_period() {
        let cfg = config(&[
            ("ANALYTICS_NOW", "2024-03-11T12:00:00+03:00"),
            ("ANALYTICS_FROM", "01.03.2024"),
            ("ANALYTICS_TO", "31.03.2024"),
        ])
        .unwrap();
        assert_eq!(
            cfg.options().now,
            Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap()
        );
        let period = cfg.period.unwrap();
        assert_eq!(period.from, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(period.to, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn single_bound_is_one_day() {
        let cfg = config(&[("ANALYTICS_TO", "05.03.2024")]).unwrap();
        let period = cfg.period.unwrap();
        assert_eq!(period.from, period.to);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(matches!(
            config(&[("ANALYTICS_FROM", "2024-03-01")]),
            Err(ReportError::InvalidDate { .. })
        ));
        assert!(matches!(
            config(&[("ANALYTICS_NOW", "вчера")]),
            Err(ReportError::InvalidDate { .. })
        ));
    }
}
