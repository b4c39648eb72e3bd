//! Colour coding for the dashboard, and which forecast row counts as today.

use crate::clock::Clock;
use chrono::Timelike;
use chrono_tz::Europe::Amsterdam;
use serde::Serialize;
use std::fmt;

/// CSS colour names used by the pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Yellow,
    Gold,
    Orange,
    DarkOrange,
    OrangeRed,
    LightBlue,
    LightSkyBlue,
    DeepSkyBlue,
    DodgerBlue,
    RoyalBlue,
    LawnGreen,
    Red,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Yellow => "yellow",
            Color::Gold => "gold",
            Color::Orange => "orange",
            Color::DarkOrange => "darkorange",
            Color::OrangeRed => "orangered",
            Color::LightBlue => "lightblue",
            Color::LightSkyBlue => "lightskyblue",
            Color::DeepSkyBlue => "deepskyblue",
            Color::DodgerBlue => "dodgerblue",
            Color::RoyalBlue => "royalblue",
            Color::LawnGreen => "lawngreen",
            Color::Red => "red",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local hour after which the forecast's first row is already yesterday.
const FORECAST_ROLLOVER_HOUR: u32 = 15;

/// 1 once the Amsterdam hour is past 15, else 0.
pub fn forecast_index_offset(clock: &dyn Clock) -> usize {
    let local = clock.now().with_timezone(&Amsterdam);
    if local.hour() > FORECAST_ROLLOVER_HOUR {
        1
    } else {
        0
    }
}

/// Colour for a positive temperature rise.
pub fn warm_delta_color(delta: i64) -> Color {
    match delta {
        1 => Color::Yellow,
        2 => Color::Gold,
        3 => Color::Orange,
        4 => Color::DarkOrange,
        _ => Color::OrangeRed,
    }
}

/// Colour for a negative temperature change.
pub fn cool_delta_color(delta: i64) -> Color {
    match delta {
        -1 => Color::LightBlue,
        -2 => Color::LightSkyBlue,
        -3 => Color::DeepSkyBlue,
        -4 => Color::DodgerBlue,
        _ => Color::RoyalBlue,
    }
}

pub fn delta_color(base: i64, comparand: i64) -> Color {
    let delta = comparand - base;
    if delta > 0 {
        warm_delta_color(delta)
    } else if delta < 0 {
        cool_delta_color(delta)
    } else {
        Color::LawnGreen
    }
}

/// Colours for (today, tomorrow). A level that stays the same reads as falling.
pub fn water_trend_colors(current: i64, tomorrow: i64) -> (Color, Color) {
    if tomorrow > current {
        (Color::LightBlue, Color::DodgerBlue)
    } else {
        (Color::DodgerBlue, Color::LightBlue)
    }
}
