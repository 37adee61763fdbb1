use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::enums::DayOfWeek;

/// One weekly availability slot. A freshly registered doctor gets seven
/// slots with no hours set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub id: i64,
    pub doctor_id: i64,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub day_of_week: DayOfWeek,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub doctor_id: i64,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub day_of_week: DayOfWeek,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulePatch {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub day_of_week: Option<DayOfWeek>,
}

impl SchedulePatch {
    pub fn apply(&self, schedule: &mut Schedule) {
        if let Some(start) = self.start_time {
            schedule.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            schedule.end_time = Some(end);
        }
        if let Some(day) = self.day_of_week {
            schedule.day_of_week = day;
        }
    }
}
