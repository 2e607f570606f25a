//! Local time of day, spoken in Spanish.

use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

/// Coarse period of the day, used for greetings and prompt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Spanish name used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "mañana",
            Self::Afternoon => "tarde",
            Self::Evening => "noche",
            Self::Night => "madrugada",
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            Self::Morning => "Buenos días",
            Self::Afternoon => "Buenas tardes",
            Self::Evening | Self::Night => "Buenas noches",
        }
    }
}

/// Snapshot of "now" for one request.
#[derive(Debug, Clone, Serialize)]
pub struct TemporalContext {
    /// ISO date, e.g. "2026-10-18"
    pub date: String,
    /// 24h clock, e.g. "09:05"
    pub time: String,
    /// Spanish weekday name
    pub weekday: &'static str,
    pub period: DayPeriod,
    pub greeting: &'static str,
}

impl TemporalContext {
    /// Context for the local wall clock.
    pub fn now() -> Self {
        Self::at(Local::now().naive_local())
    }

    pub fn at(moment: NaiveDateTime) -> Self {
        let period = DayPeriod::from_hour(moment.hour());
        Self {
            date: moment.format("%Y-%m-%d").to_string(),
            time: moment.format("%H:%M").to_string(),
            weekday: weekday_name(moment.weekday()),
            period,
            greeting: period.greeting(),
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

pub fn month_name(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ];
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// "Son las 09:05"
pub fn spoken_time(moment: NaiveDateTime) -> String {
    format!("Son las {}", moment.format("%H:%M"))
}

/// "Hoy es sábado 18 de octubre"
pub fn spoken_date(moment: NaiveDateTime) -> String {
    format!(
        "Hoy es {} {} de {}",
        weekday_name(moment.weekday()),
        moment.day(),
        month_name(moment.month())
    )
}

/// Current local time, spoken.
pub fn spoken_time_now() -> String {
    spoken_time(Local::now().naive_local())
}

/// Current local date, spoken.
pub fn spoken_date_now() -> String {
    spoken_date(Local::now().naive_local())
}
