use std::{fmt, str::FromStr};

use jiff::civil::Time;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Task {
    /// Display text, trimmed and never blank
    pub text: String,
    /// Whether the task has been ticked off
    #[serde(default)]
    pub completed: bool,
    /// Time of day the task is planned for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TaskTime>,
}

impl Task {
    pub fn new(text: &str, time: Option<TaskTime>) -> Self {
        Self {
            text: text.trim().to_string(),
            completed: false,
            time,
        }
    }
}

/// A wall-clock "HH:MM" time within a day.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct TaskTime(Time);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid time '{0}', expected HH:MM")]
pub struct TimeParseError(pub String);

impl TaskTime {
    pub fn new(hour: i8, minute: i8) -> Result<Self, TimeParseError> {
        Time::new(hour, minute, 0, 0)
            .map(TaskTime)
            .map_err(|_| TimeParseError(format!("{hour}:{minute}")))
    }

    pub fn hour(&self) -> i8 {
        self.0.hour()
    }

    pub fn minute(&self) -> i8 {
        self.0.minute()
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.hour() as u16 * 60 + self.minute() as u16
    }
}

impl FromStr for TaskTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Time::strptime("%H:%M", trimmed)
            .map(TaskTime)
            .map_err(|_| TimeParseError(trimmed.to_string()))
    }
}

impl fmt::Display for TaskTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<String> for TaskTime {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskTime> for String {
    fn from(value: TaskTime) -> Self {
        value.to_string()
    }
}
