//! Month arithmetic and localized month labels

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display locale for period labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "es-CO")]
    EsCo,
    #[serde(rename = "en-US")]
    EnUs,
}

const ES_SHORT: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];
const ES_LONG: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];
const EN_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const EN_LONG: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

impl Locale {
    /// Abbreviated name of a month (1-12)
    pub fn short_month(&self, month: u32) -> &'static str {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::EsCo => ES_SHORT[idx],
            Locale::EnUs => EN_SHORT[idx],
        }
    }

    /// Month number (1-12) for a month token in this locale
    ///
    /// Accepts abbreviated and full names in any case, with or without a
    /// trailing period. "sep" and "set" are accepted for September in Spanish.
    pub fn month_number(&self, token: &str) -> Option<u32> {
        let token = token.trim().trim_end_matches('.').to_lowercase();
        if token.is_empty() {
            return None;
        }
        let (short, long, aliases): (&[&str; 12], &[&str; 12], &[(&str, u32)]) = match self {
            Locale::EsCo => (&ES_SHORT, &ES_LONG, &[("sep", 9), ("set", 9), ("setiembre", 9)]),
            Locale::EnUs => (&EN_SHORT, &EN_LONG, &[("sept", 9)]),
        };

        short
            .iter()
            .chain(long.iter())
            .position(|name| name.to_lowercase() == token)
            .map(|pos| (pos % 12) as u32 + 1)
            .or_else(|| aliases.iter().find(|(alias, _)| *alias == token).map(|(_, m)| *m))
    }

    /// "Month Year" label for the month containing `date`
    pub fn period_label(&self, date: NaiveDate) -> String {
        format!("{} {}", self.short_month(date.month()), date.year())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::EsCo => "es-CO",
            Locale::EnUs => "en-US",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "es" | "es-co" => Ok(Locale::EsCo),
            "en" | "en-us" => Ok(Locale::EnUs),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift a month-start date forward by whole months
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Whole calendar months from `start` to `end` (negative if `end` is earlier)
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end.year() as i64 - start.year() as i64) * 12 + (end.month() as i64 - start.month() as i64)
}

/// Resolve a "Month Year" label to the first day of that month
///
/// An unrecognized month falls back to January and an unrecognized year to
/// 1970, independently of each other.
pub fn parse_period_label(label: &str, locale: Locale) -> NaiveDate {
    let mut month = None;
    let mut year = None;

    for token in label.split(|c: char| c.is_whitespace() || c == '/' || c == '-' || c == ',') {
        if token.is_empty() {
            continue;
        }
        if year.is_none() && token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
            year = token.parse::<i32>().ok();
        } else if month.is_none() {
            month = locale.month_number(token);
        }
    }

    NaiveDate::from_ymd_opt(year.unwrap_or(1970), month.unwrap_or(1), 1)
        .unwrap_or_default()
}
