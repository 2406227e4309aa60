//! Вспомогательные функции: сравнение строк по-русски, даты, подписи.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::ReportError;
use crate::types::Money;

/// Группа символа в порядке русского алфавитного списка.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Punct,
    Digit,
    Cyrillic,
    Latin,
    Other,
}

fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Space
    } else if ch.is_ascii_digit() {
        CharClass::Digit
    } else if matches!(ch, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё') {
        CharClass::Cyrillic
    } else if ch.is_ascii_alphabetic() {
        CharClass::Latin
    } else if ch.is_ascii_punctuation() {
        CharClass::Punct
    } else {
        CharClass::Other
    }
}

/// Первичный вес символа: без учёта регистра, «ё» равна «е».
fn primary(ch: char) -> (CharClass, char) {
    let lower = ch.to_lowercase().next().unwrap_or(ch);
    let base = if lower == 'ё' { 'е' } else { lower };
    (classify(ch), base)
}

/// Сравнивает строки так, как их упорядочивает русская локаль.
///
/// Кириллица идёт перед латиницей, регистр и «ё» учитываются только
/// при равенстве по буквам: сначала «е» перед «ё», затем строчные перед
/// прописными.
pub fn compare_ru(a: &str, b: &str) -> Ordering {
    let primary_order = a.chars().map(primary).cmp(b.chars().map(primary));
    if primary_order != Ordering::Equal {
        return primary_order;
    }
    let yo = |ch: char| matches!(ch, 'ё' | 'Ё');
    let secondary = a.chars().map(yo).cmp(b.chars().map(yo));
    if secondary != Ordering::Equal {
        return secondary;
    }
    a.chars()
        .map(char::is_uppercase)
        .cmp(b.chars().map(char::is_uppercase))
}

/// Готовит поисковую строку: обрезает пробелы и приводит к нижнему регистру.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Проверяет вхождение уже нормализованного запроса без учёта регистра.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Форматирует дату как `dd.mm.yyyy`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Разбирает дату в формате `dd.mm.yyyy`.
pub fn parse_date(value: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(value.trim(), "%d.%m.%Y").map_err(|_| ReportError::InvalidDate {
        value: value.trim().to_string(),
    })
}

/// Убирает из числовой строки пробелы, в том числе неразрывные, и знак плюса.
fn normalize_number(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !matches!(*ch, ' ' | '\u{a0}' | '\u{202f}' | '+'))
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect()
}

/// Разбирает денежное значение из формы: `1 200,50`, `1e3`, `-300`.
///
/// Пустая строка и мусор дают `None`.
pub fn parse_money(value: &str) -> Option<Money> {
    let normalized = normalize_number(value);
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

/// Разбирает момент времени: RFC 3339, локальное время без зоны (считается
/// UTC), дату `yyyy-mm-dd` или `dd.mm.yyyy` (полночь UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%d.%m.%Y"]
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
        .map(|at| at.and_utc())
}

/// Число полных суток между `now` и более ранней датой `then`.
pub fn days_between(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    (now - then).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn russian_alphabet_order() {
        let mut names = vec!["Яковлев", "ёлкин", "Ершов", "Абрамов", "Smith", "жуков"];
        names.sort_by(|a, b| compare_ru(a, b));
        assert_eq!(
            names,
            vec!["Абрамов", "ёлкин", "Ершов", "жуков", "Яковлев", "Smith"]
        );
    }

    #[test]
    fn case_is_a_tiebreak_only() {
        assert_eq!(compare_ru("иванов", "Иванов"), Ordering::Less);
        assert_eq!(compare_ru("Иванов", "иванова"), Ordering::Less);
        assert_eq!(compare_ru("Ель", "Ёль"), Ordering::Less);
        assert_eq!(compare_ru("Петров", "Петров"), Ordering::Equal);
    }

    #[test]
    fn digits_before_letters() {
        assert_eq!(compare_ru("2108", "Веста"), Ordering::Less);
        assert_eq!(compare_ru("10", "9"), Ordering::Less);
    }

    #[test]
    fn dates_round_trip_through_display_format() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(format_date(date), "05.03.2024");
        assert_eq!(
            parse_date(" 05.03.2024 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert!(matches!(
            parse_date("2024-03-05"),
            Err(ReportError::InvalidDate { .. })
        ));
    }

    #[test]
    fn money_from_form_strings() {
        assert_eq!(parse_money("1 200,50"), Some(Decimal::new(120050, 2)));
        assert_eq!(parse_money("\u{a0}-300 "), Some(Decimal::from(-300)));
        assert_eq!(parse_money("1e3"), Some(Decimal::from(1000)));
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("   "), None);
        assert_eq!(parse_money("abc"), None);
    }

    #[test]
    fn instants_in_several_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("2024-03-01"), Some(midnight));
        assert_eq!(parse_instant("01.03.2024"), Some(midnight));
        assert_eq!(
            parse_instant("2024-03-01T13:00:00+03:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_instant("2024-03-01 10:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap())
        );
        assert_eq!(parse_instant("вчера"), None);
        assert_eq!(parse_instant(""), None);
    }

    #[test]
    fn days_are_counted_in_whole_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let then = Utc.with_ymd_and_hms(2024, 3, 5, 18, 0, 0).unwrap();
        assert_eq!(days_between(now, then), 4);
    }
}
