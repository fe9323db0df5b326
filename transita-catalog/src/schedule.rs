use crate::ParseError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointType {
    Boarding,
    Dropping,
}

/// A pickup or drop-off stop on a schedule's route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePoint {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub name: String,
    pub point_type: PointType,
    pub point_time: NaiveTime,
}

/// Read-only reference data: a bus running a route on a recurring timetable.
/// A schedule realized on one concrete calendar date is the scope of all
/// seat availability and bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    /// Weekdays the bus runs, 0 = Monday .. 6 = Sunday.
    pub days_of_week: Vec<i16>,
    pub base_price_minor: i64,
    pub points: Vec<SchedulePoint>,
}

impl Schedule {
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        let day = date.weekday().num_days_from_monday() as i16;
        self.days_of_week.contains(&day)
    }

    /// The departure instant of this schedule realized on `date` (UTC).
    pub fn departure_instant(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(self.departure_time).and_utc()
    }

    pub fn point(&self, id: Uuid) -> Option<&SchedulePoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn has_point(&self, id: Uuid, point_type: PointType) -> bool {
        self.point(id).map_or(false, |p| p.point_type == point_type)
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PointType::Boarding => "BOARDING",
            PointType::Dropping => "DROPPING",
        })
    }
}

impl FromStr for PointType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOARDING" => Ok(PointType::Boarding),
            "DROPPING" => Ok(PointType::Dropping),
            other => Err(ParseError::new("point type", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_on(days: Vec<i16>) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            origin: "Pune".to_string(),
            destination: "Goa".to_string(),
            departure_time: NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
            days_of_week: days,
            base_price_minor: 50000,
            points: vec![],
        }
    }

    #[test]
    fn test_runs_on_weekday_mask() {
        // 2026-08-07 is a Friday (weekday index 4)
        let friday = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert!(schedule_on(vec![4]).runs_on(friday));
        assert!(!schedule_on(vec![0, 1, 2]).runs_on(friday));
    }

    #[test]
    fn test_departure_instant_combines_date_and_time() {
        let schedule = schedule_on(vec![0, 1, 2, 3, 4, 5, 6]);
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let instant = schedule.departure_instant(date);
        assert_eq!(instant.to_rfc3339(), "2026-08-07T21:30:00+00:00");
    }
}
