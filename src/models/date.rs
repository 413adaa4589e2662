use std::{fmt, str::FromStr};

use jiff::civil::{Date, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::task::TaskTime;

/// Calendar day a group of tasks belongs to, persisted as "YYYY-MM-DD".
///
/// Ordering follows the calendar, so a sorted collection of keys lists days
/// chronologically.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(Date);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid date '{0}', expected YYYY-MM-DD")]
pub struct DateParseError(pub String);

impl DateKey {
    pub fn new(year: i16, month: i8, day: i8) -> Result<Self, DateParseError> {
        Date::new(year, month, day)
            .map(DateKey)
            .map_err(|_| DateParseError(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn date(&self) -> Date {
        self.0
    }
}

impl From<Date> for DateKey {
    fn from(value: Date) -> Self {
        DateKey(value)
    }
}

impl FromStr for DateKey {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Date::strptime("%Y-%m-%d", trimmed)
            .map(DateKey)
            .map_err(|_| DateParseError(trimmed.to_string()))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime("%Y-%m-%d"))
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.to_string()
    }
}

/// Language used for labels and confirmation prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    Italian,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::English),
            "it" | "it-it" | "italian" | "italiano" => Ok(Locale::Italian),
            other => Err(other.to_string()),
        }
    }
}

impl Locale {
    fn weekday_name(&self, weekday: Weekday) -> &'static str {
        match self {
            Locale::English => match weekday {
                Weekday::Monday => "monday",
                Weekday::Tuesday => "tuesday",
                Weekday::Wednesday => "wednesday",
                Weekday::Thursday => "thursday",
                Weekday::Friday => "friday",
                Weekday::Saturday => "saturday",
                Weekday::Sunday => "sunday",
            },
            Locale::Italian => match weekday {
                Weekday::Monday => "lunedì",
                Weekday::Tuesday => "martedì",
                Weekday::Wednesday => "mercoledì",
                Weekday::Thursday => "giovedì",
                Weekday::Friday => "venerdì",
                Weekday::Saturday => "sabato",
                Weekday::Sunday => "domenica",
            },
        }
    }

    pub fn remove_task_message(&self) -> String {
        match self {
            Locale::English => "Are you sure you want to delete this task?".to_string(),
            Locale::Italian => "Sei sicura di voler eliminare questo task?".to_string(),
        }
    }

    pub fn remove_day_message(&self, date: DateKey) -> String {
        let label = format_date_label(date, None, *self);
        match self {
            Locale::English => format!("Are you sure you want to delete all tasks of {label}?"),
            Locale::Italian => format!("Sei sicura di voler eliminare tutti i task di {label}?"),
        }
    }
}

/// Renders a day as "Saturday, 06/15" (English) or "Sabato 15/06" (Italian),
/// with the time appended when given.
pub fn format_date_label(date: DateKey, time: Option<TaskTime>, locale: Locale) -> String {
    let day = date.date();
    let weekday = locale.weekday_name(day.weekday());
    let formatted = match locale {
        Locale::English => format!("{}, {:02}/{:02}", weekday, day.month(), day.day()),
        Locale::Italian => format!("{} {:02}/{:02}", weekday, day.day(), day.month()),
    };

    let mut label = capitalize_first(&formatted);
    if let Some(time) = time {
        label.push(' ');
        label.push_str(&time.to_string());
    }
    label
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
