use crate::error::{Result, SellOutError};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-letter month codes used throughout the consolidated tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonthCode {
    Ene,
    Feb,
    Mar,
    Abr,
    May,
    Jun,
    Jul,
    Ago,
    Sep,
    Oct,
    Nov,
    Dic,
}

const ALL_MONTHS: [MonthCode; 12] = [
    MonthCode::Ene,
    MonthCode::Feb,
    MonthCode::Mar,
    MonthCode::Abr,
    MonthCode::May,
    MonthCode::Jun,
    MonthCode::Jul,
    MonthCode::Ago,
    MonthCode::Sep,
    MonthCode::Oct,
    MonthCode::Nov,
    MonthCode::Dic,
];

impl MonthCode {
    pub fn all() -> &'static [MonthCode; 12] {
        &ALL_MONTHS
    }

    /// Parses a month code, ignoring case and surrounding whitespace.
    pub fn parse(code: &str) -> Result<Self> {
        let normalized = code.trim().to_uppercase();
        ALL_MONTHS
            .iter()
            .copied()
            .find(|m| m.code() == normalized)
            .ok_or_else(|| SellOutError::InvalidMonthCode(code.to_string()))
    }

    pub fn from_number(number: u32) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(ALL_MONTHS[number as usize - 1])
        } else {
            None
        }
    }

    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Ene => "ENE",
            Self::Feb => "FEB",
            Self::Mar => "MAR",
            Self::Abr => "ABR",
            Self::May => "MAY",
            Self::Jun => "JUN",
            Self::Jul => "JUL",
            Self::Ago => "AGO",
            Self::Sep => "SEP",
            Self::Oct => "OCT",
            Self::Nov => "NOV",
            Self::Dic => "DIC",
        }
    }

    /// Full Spanish month name, as used for the month column labels of wide
    /// client sheets.
    pub fn full_name(self) -> &'static str {
        match self {
            Self::Ene => "Enero",
            Self::Feb => "Febrero",
            Self::Mar => "Marzo",
            Self::Abr => "Abril",
            Self::May => "Mayo",
            Self::Jun => "Junio",
            Self::Jul => "Julio",
            Self::Ago => "Agosto",
            Self::Sep => "Septiembre",
            Self::Oct => "Octubre",
            Self::Nov => "Noviembre",
            Self::Dic => "Diciembre",
        }
    }

    pub fn successor(self) -> Self {
        ALL_MONTHS[self.number() as usize % 12]
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One monthly reporting cycle. Ordering is chronological.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Period {
    pub year: i32,
    pub month: MonthCode,
}

impl Period {
    pub fn new(month: MonthCode, year: i32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        // month() is always 1..=12
        let month = ALL_MONTHS[date.month0() as usize];
        Self {
            year: date.year(),
            month,
        }
    }

    pub fn next(self) -> Self {
        if self.month == MonthCode::Dic {
            Self::new(MonthCode::Ene, self.year + 1)
        } else {
            Self::new(self.month.successor(), self.year)
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::from_date(date) == self
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month.number()).cmp(&(other.year, other.month.number()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

/// Maps a month code (case-insensitive) to its ordinal, 1 through 12.
pub fn month_number(month_code: &str) -> Result<u32> {
    MonthCode::parse(month_code).map(MonthCode::number)
}

/// Returns the month following `month_code` in `year`, rolling DIC over into
/// ENE of the next year.
pub fn next_month(month_code: &str, year: i32) -> Result<(MonthCode, i32)> {
    let next = Period::new(MonthCode::parse(month_code)?, year).next();
    Ok((next.month, next.year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_number_is_case_insensitive() {
        assert_eq!(month_number("ENE").unwrap(), 1);
        assert_eq!(month_number("jun").unwrap(), 6);
        assert_eq!(month_number(" Dic ").unwrap(), 12);
    }

    #[test]
    fn test_month_number_rejects_unknown_codes() {
        for bad in ["JAN", "", "DECEMBER", "13"] {
            let err = month_number(bad).unwrap_err();
            assert!(matches!(err, SellOutError::InvalidMonthCode(_)), "{bad}");
        }
    }

    #[test]
    fn test_next_month_over_all_codes() {
        for month in MonthCode::all() {
            let (next, year) = next_month(month.code(), 2024).unwrap();
            if *month == MonthCode::Dic {
                assert_eq!(next, MonthCode::Ene);
                assert_eq!(year, 2025);
            } else {
                assert_eq!(next.number(), month.number() + 1);
                assert_eq!(year, 2024);
            }
        }
    }

    #[test]
    fn test_period_ordering_is_chronological() {
        let dec_2024 = Period::new(MonthCode::Dic, 2024);
        let jan_2025 = Period::new(MonthCode::Ene, 2025);
        let may_2025 = Period::new(MonthCode::May, 2025);
        assert!(dec_2024 < jan_2025);
        assert!(jan_2025 < may_2025);
        assert_eq!(dec_2024.next(), jan_2025);
    }

    #[test]
    fn test_period_from_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        assert_eq!(Period::from_date(date), Period::new(MonthCode::Jul, 2025));
        assert!(Period::new(MonthCode::Jul, 2025).contains(date));
        assert!(!Period::new(MonthCode::Jul, 2024).contains(date));
    }

    #[test]
    fn test_from_number_round_trips_ordinals() {
        assert_eq!(MonthCode::from_number(8), Some(MonthCode::Ago));
        assert_eq!(MonthCode::from_number(0), None);
        assert_eq!(MonthCode::from_number(13), None);
        assert_eq!(MonthCode::Sep.full_name(), "Septiembre");
    }
}
