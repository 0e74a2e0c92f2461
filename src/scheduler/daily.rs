//! Once-a-day reminder state machine.
//!
//! Two states: idle (`fired_today == false`) and fired. Ticks arrive with the
//! wall clock already converted to the configured timezone.

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use tracing::{debug, error, info};

use crate::config::ScheduleConfig;
use crate::names;
use crate::ping;
use crate::platform::Messenger;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Today is a no-ping day; neither fire nor reset was evaluated.
    NoPingDay,
    /// The reminder was attempted and today's slot consumed.
    Fired,
    /// Target minute reached but the name list could not be loaded.
    NamesUnavailable,
    /// The fired flag was cleared at the reset hour.
    Reset,
    Idle,
}

pub struct DailyPing {
    schedule: ScheduleConfig,
    messenger: Arc<dyn Messenger>,
    fired_today: bool,
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl DailyPing {
    pub fn new(schedule: ScheduleConfig, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            schedule,
            messenger,
            fired_today: false,
        }
    }

    pub fn fired_today(&self) -> bool {
        self.fired_today
    }

    /// Evaluate one tick at local time `now`.
    ///
    /// A no-ping day short-circuits everything, including the reset, so a
    /// flag set on Friday stays set through the weekend and clears at the
    /// reset hour of the next eligible day.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Tick {
        let day = weekday_name(now.weekday());
        if self.schedule.is_no_ping_day(day) {
            return Tick::NoPingDay;
        }

        let at_target = now.hour() == self.schedule.hour && now.minute() == self.schedule.minute;

        if at_target && !self.fired_today {
            let names = match names::load_names(&self.schedule.names_file).await {
                Ok(names) => names,
                Err(e) => {
                    error!("{:#}", e);
                    return Tick::NamesUnavailable;
                }
            };

            let text = names::reminder_text(&names);
            ping::post_reminder(self.messenger.as_ref(), &text).await;
            // consumed even when the send failed
            self.fired_today = true;
            info!("Lunch ping done for {} {}", day, now.date());
            Tick::Fired
        } else if now.hour() == self.schedule.reset_hour && self.fired_today {
            self.fired_today = false;
            debug!("Reset lunch ping flag at {}", now);
            Tick::Reset
        } else {
            Tick::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::tests::FakeMessenger;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::path::PathBuf;

    struct Harness {
        messenger: Arc<FakeMessenger>,
        ping: DailyPing,
        names_file: tempfile::NamedTempFile,
    }

    fn harness_with(messenger: FakeMessenger, names_yaml: &str) -> Harness {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", names_yaml).unwrap();

        let schedule = ScheduleConfig {
            names_file: file.path().to_path_buf(),
            ..ScheduleConfig::default()
        };
        let messenger = Arc::new(messenger);
        let ping = DailyPing::new(schedule, messenger.clone());
        Harness {
            messenger,
            ping,
            names_file: file,
        }
    }

    fn harness() -> Harness {
        harness_with(
            FakeMessenger::with_chats(&[10, 42]),
            "names:\n  - alice\n  - bob\n",
        )
    }

    // 2024-06-03 is a Monday, 2024-06-08 a Saturday.
    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_weekday_names_are_full_english() {
        assert_eq!(weekday_name(Weekday::Mon), "Monday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
        assert_eq!(weekday_name(at(8, 0, 0, 0).weekday()), "Saturday");
    }

    #[tokio::test]
    async fn test_fires_once_at_target_minute() {
        let mut h = harness();
        assert_eq!(h.ping.tick(at(3, 12, 44, 30)).await, Tick::Idle);
        assert_eq!(h.ping.tick(at(3, 12, 45, 0)).await, Tick::Fired);
        assert!(h.ping.fired_today());
        assert_eq!(
            h.messenger.sent(),
            vec![(42, "ping for lunch @alice @bob".to_string())]
        );
    }

    #[tokio::test]
    async fn test_repeated_ticks_in_target_minute_do_not_resend() {
        let mut h = harness();
        h.ping.tick(at(3, 12, 45, 0)).await;
        assert_eq!(h.ping.tick(at(3, 12, 45, 30)).await, Tick::Idle);
        assert_eq!(h.ping.tick(at(3, 12, 45, 59)).await, Tick::Idle);
        assert_eq!(h.messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_no_fire_on_no_ping_day() {
        let mut h = harness();
        assert_eq!(h.ping.tick(at(8, 12, 45, 0)).await, Tick::NoPingDay);
        assert!(!h.ping.fired_today());
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_no_reset_on_no_ping_day() {
        let mut h = harness();
        // Friday 2024-06-07
        assert_eq!(h.ping.tick(at(7, 12, 45, 0)).await, Tick::Fired);
        assert_eq!(h.ping.tick(at(8, 1, 0, 0)).await, Tick::NoPingDay);
        assert!(h.ping.fired_today());
        assert_eq!(h.ping.tick(at(9, 1, 0, 0)).await, Tick::NoPingDay);
        assert!(h.ping.fired_today());
        // Monday reset hour clears it
        assert_eq!(h.ping.tick(at(10, 1, 0, 0)).await, Tick::Reset);
        assert!(!h.ping.fired_today());
    }

    #[tokio::test]
    async fn test_reset_then_fire_next_day() {
        let mut h = harness();
        assert_eq!(h.ping.tick(at(3, 12, 45, 0)).await, Tick::Fired);
        assert_eq!(h.ping.tick(at(4, 0, 59, 30)).await, Tick::Idle);
        assert_eq!(h.ping.tick(at(4, 1, 0, 0)).await, Tick::Reset);
        assert_eq!(h.ping.tick(at(4, 1, 0, 30)).await, Tick::Idle);
        assert_eq!(h.ping.tick(at(4, 12, 45, 0)).await, Tick::Fired);
        assert_eq!(h.messenger.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_hour_without_fire_is_idle() {
        let mut h = harness();
        assert_eq!(h.ping.tick(at(3, 1, 0, 0)).await, Tick::Idle);
    }

    #[tokio::test]
    async fn test_failed_send_still_consumes_slot() {
        let mut messenger = FakeMessenger::with_chats(&[42]);
        messenger.send_failure = Some((Some(400), "chat not found".to_string()));
        let mut h = harness_with(messenger, "names: [alice]\n");

        assert_eq!(h.ping.tick(at(3, 12, 45, 0)).await, Tick::Fired);
        assert!(h.ping.fired_today());
        assert_eq!(h.ping.tick(at(3, 12, 45, 30)).await, Tick::Idle);
        assert_eq!(h.messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_updates_still_consumes_slot() {
        let mut h = harness_with(FakeMessenger::with_chats(&[]), "names: [alice]\n");
        assert_eq!(h.ping.tick(at(3, 12, 45, 0)).await, Tick::Fired);
        assert!(h.ping.fired_today());
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_names_file_leaves_slot_open() {
        let mut h = harness();
        h.ping.schedule.names_file = PathBuf::from("/nonexistent/lunchping/names.yml");

        assert_eq!(
            h.ping.tick(at(3, 12, 45, 0)).await,
            Tick::NamesUnavailable
        );
        assert!(!h.ping.fired_today());
        assert!(h.messenger.sent().is_empty());

        h.ping.schedule.names_file = h.names_file.path().to_path_buf();
        assert_eq!(h.ping.tick(at(3, 12, 45, 30)).await, Tick::Fired);
        assert_eq!(h.messenger.sent().len(), 1);
    }
}
