use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;

/// Wall-clock firing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Every day at `hour:minute`.
    Daily { hour: u32, minute: u32 },
    /// Every hour at `:minute`.
    Hourly { minute: u32 },
}

fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at - Duration::seconds(i64::from(at.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(at.nanosecond()))
}

fn start_of_hour(at: NaiveDateTime) -> NaiveDateTime {
    at - Duration::seconds(i64::from(at.minute() * 60 + at.second()))
        - Duration::nanoseconds(i64::from(at.nanosecond()))
}

impl Schedule {
    /// First firing time strictly after `now`.
    pub fn next_fire(&self, now: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Schedule::Daily { hour, minute } => {
                let today = start_of_day(now)
                    + Duration::hours(i64::from(hour))
                    + Duration::minutes(i64::from(minute));
                if today > now {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
            Schedule::Hourly { minute } => {
                let this_hour = start_of_hour(now) + Duration::minutes(i64::from(minute));
                if this_hour > now {
                    this_hour
                } else {
                    this_hour + Duration::hours(1)
                }
            }
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Schedule::Daily { hour, minute } => write!(f, "daily {:02}:{:02}", hour, minute),
            Schedule::Hourly { minute } => write!(f, "hourly :{:02}", minute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 31)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_daily_later_today() {
        let schedule = Schedule::Daily { hour: 9, minute: 0 };
        assert_eq!(schedule.next_fire(at(8, 59, 59)), at(9, 0, 0));
    }

    #[test]
    fn test_daily_rolls_over_month() {
        let schedule = Schedule::Daily { hour: 9, minute: 0 };
        let next = schedule.next_fire(at(9, 0, 0));
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_hourly() {
        let schedule = Schedule::Hourly { minute: 0 };
        assert_eq!(schedule.next_fire(at(13, 20, 5)), at(14, 0, 0));
        assert_eq!(schedule.next_fire(at(13, 0, 0)), at(14, 0, 0));

        let quarter = Schedule::Hourly { minute: 15 };
        assert_eq!(quarter.next_fire(at(13, 10, 0)), at(13, 15, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Schedule::Daily { hour: 9, minute: 0 }.to_string(), "daily 09:00");
        assert_eq!(Schedule::Hourly { minute: 0 }.to_string(), "hourly :00");
    }
}
