//! Time-of-day classification shared by NPC routines, weather and lighting.

use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY: f32 = 24.0;

const MORNING_START: f32 = 6.0;
const DAY_START: f32 = 9.0;
const EVENING_START: f32 = 18.0;
const NIGHT_START: f32 = 22.0;
const DARK_BEFORE: f32 = 6.0;
const DARK_AFTER: f32 = 19.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPhase {
    Morning,
    Day,
    Evening,
    Night,
}

impl DayPhase {
    pub const ALL: [DayPhase; 4] = [
        DayPhase::Morning,
        DayPhase::Day,
        DayPhase::Evening,
        DayPhase::Night,
    ];

    /// Buckets are half-open: morning [6,9), day [9,18), evening [18,22), night otherwise.
    pub fn from_hour(hour: f32) -> Self {
        let hour = wrap_hour(hour);
        if (MORNING_START..DAY_START).contains(&hour) {
            Self::Morning
        } else if (DAY_START..EVENING_START).contains(&hour) {
            Self::Day
        } else if (EVENING_START..NIGHT_START).contains(&hour) {
            Self::Evening
        } else {
            Self::Night
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Day => 1,
            Self::Evening => 2,
            Self::Night => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Day => "day",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

/// Lighting collaborators switch to night lighting when this is true.
pub fn is_dark(hour: f32) -> bool {
    let hour = wrap_hour(hour);
    hour < DARK_BEFORE || hour > DARK_AFTER
}

pub fn wrap_hour(hour: f32) -> f32 {
    if !hour.is_finite() {
        return 0.0;
    }
    let wrapped = hour.rem_euclid(HOURS_PER_DAY);
    if wrapped >= HOURS_PER_DAY {
        0.0
    } else {
        wrapped
    }
}

/// HUD clock text, e.g. `08:30`.
pub fn format_clock(hour: f32) -> String {
    let hour = wrap_hour(hour);
    let whole_hours = hour.floor() as u32;
    let minutes = ((hour - hour.floor()) * 60.0).floor() as u32;
    format!("{:02}:{:02}", whole_hours, minutes.min(59))
}
