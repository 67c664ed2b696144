//! Choosing which stored event to publish next.

use std::{fmt, str::FromStr, sync::Arc};

use {
    chrono::{DateTime, Duration, Local, Timelike, Utc},
    chrono_tz::Tz,
    reshare_common::types::Event,
    tracing::debug,
};

use crate::{Error, Result, clock::Clock};

/// Picks the next event to publish out of the unpublished pool.
pub trait SelectionStrategy: Send + Sync {
    /// `published` must be sorted ascending by `begin`.
    fn select(&self, published: &[Event], unpublished: &[Event]) -> Result<Option<Event>>;
}

/// Timezone the publishing window is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTimezone {
    /// The host's local timezone.
    Local,
    Zone(Tz),
}

impl FromStr for WindowTimezone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        s.parse::<Tz>()
            .map(Self::Zone)
            .map_err(|_| Error::message(format!("unknown timezone: {s}")))
    }
}

impl fmt::Display for WindowTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Zone(tz) => write!(f, "{tz}"),
        }
    }
}

/// Half-open `[begin, end)` hour range on a 24-hour clock.
///
/// `begin > end` wraps around midnight; `begin == end` never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishingWindow {
    begin: u32,
    end: u32,
    timezone: WindowTimezone,
}

impl PublishingWindow {
    pub fn new(begin: u32, end: u32, timezone: WindowTimezone) -> Result<Self> {
        if begin > 23 || end > 23 {
            return Err(Error::message(format!(
                "publishing window hours must be within 0-23, got {begin}-{end}"
            )));
        }
        Ok(Self {
            begin,
            end,
            timezone,
        })
    }

    pub fn begin(&self) -> u32 {
        self.begin
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn timezone(&self) -> WindowTimezone {
        self.timezone
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.begin <= self.end {
            hour >= self.begin && hour < self.end
        } else {
            hour >= self.begin || hour < self.end
        }
    }

    /// Whether `at`, seen in the window's timezone, falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let hour = match self.timezone {
            WindowTimezone::Local => at.with_timezone(&Local).hour(),
            WindowTimezone::Zone(tz) => at.with_timezone(&tz).hour(),
        };
        self.contains_hour(hour)
    }
}

impl fmt::Display for PublishingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00 {}", self.begin, self.end, self.timezone)
    }
}

/// Publishes the earliest upcoming event once the cooldown since the last
/// publication has elapsed, and only inside the publishing window.
///
/// The cooldown is anchored on the last *scheduled* published event (the last
/// element of `published`), not on the most recently dispatched one.
pub struct NextEventStrategy {
    cooldown: Duration,
    window: PublishingWindow,
    clock: Arc<dyn Clock>,
}

impl NextEventStrategy {
    pub fn new(cooldown: Duration, window: PublishingWindow, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            window,
            clock,
        }
    }
}

impl SelectionStrategy for NextEventStrategy {
    fn select(&self, published: &[Event], unpublished: &[Event]) -> Result<Option<Event>> {
        let now = self.clock.now();
        if !self.window.contains(now) {
            debug!(window = %self.window, %now, "outside publishing window");
            return Ok(None);
        }

        let Some(earliest) = unpublished.iter().min_by_key(|e| e.begin()) else {
            return Ok(None);
        };

        let Some(last_time) = published.last().and_then(Event::last_publication_time) else {
            return Ok(Some(earliest.clone()));
        };

        if last_time > now {
            return Err(Error::invariant(format!(
                "last publication time {last_time} is after the current time {now}"
            )));
        }
        // A cooldown reaching past the representable range never ends.
        let cooled_down = last_time
            .checked_add_signed(self.cooldown)
            .is_some_and(|until| until <= now);
        if !cooled_down {
            debug!(
                %last_time,
                cooldown_minutes = self.cooldown.num_minutes(),
                "still in cooldown"
            );
            return Ok(None);
        }

        Ok(Some(earliest.clone()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::clock::FixedClock,
        chrono::TimeZone,
        reshare_common::types::EventPublicationStatus,
        rstest::rstest,
        std::collections::BTreeMap,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    fn utc_window(begin: u32, end: u32) -> PublishingWindow {
        PublishingWindow::new(begin, end, WindowTimezone::Zone(Tz::UTC)).unwrap()
    }

    fn strategy(cooldown: Duration, window: PublishingWindow) -> NextEventStrategy {
        NextEventStrategy::new(cooldown, window, Arc::new(FixedClock::new(now())))
    }

    fn event(name: &str, days_from_now: i64) -> Event {
        let begin = now() + Duration::days(days_from_now);
        Event::new(format!("ext-{name}"), name, begin, begin + Duration::hours(2)).unwrap()
    }

    fn published(name: &str, days_from_now: i64, published_at: DateTime<Utc>) -> Event {
        event(name, days_from_now).with_publication_state(
            EventPublicationStatus::Completed,
            BTreeMap::from([("telegram".to_string(), published_at)]),
        )
    }

    #[test]
    fn first_run_picks_earliest_unpublished() {
        let s = strategy(Duration::minutes(60), utc_window(8, 22));
        let e1 = event("e1", 3);
        let e2 = event("e2", 5);
        let chosen = s.select(&[], &[e2, e1.clone()]).unwrap();
        assert_eq!(chosen, Some(e1));
    }

    #[test]
    fn nothing_to_publish() {
        let s = strategy(Duration::minutes(60), utc_window(8, 22));
        let p = published("p", -1, now() - Duration::days(3));
        assert_eq!(s.select(&[p], &[]).unwrap(), None);
    }

    #[rstest]
    #[case(2, true)]
    #[case(4, false)]
    fn cooldown_in_days(#[case] cooldown_days: i64, #[case] selects: bool) {
        let s = strategy(Duration::days(cooldown_days), utc_window(8, 22));
        let p = published("p", -1, now() - Duration::days(3));
        let e1 = event("e1", 2);
        let chosen = s.select(&[p], &[e1.clone()]).unwrap();
        assert_eq!(chosen, selects.then_some(e1));
    }

    #[test]
    fn failed_attempt_anchors_the_cooldown() {
        let s = strategy(Duration::days(2), utc_window(8, 22));
        let failed = event("p", 3).with_publication_state(
            EventPublicationStatus::Failed,
            BTreeMap::from([("telegram".to_string(), now() - Duration::days(1))]),
        );
        assert_eq!(s.select(&[failed], &[event("e1", 2)]).unwrap(), None);
    }

    #[test]
    fn cooldown_beyond_the_calendar_never_ends() {
        let s = strategy(Duration::MAX, utc_window(8, 22));
        let p = published("p", -8, now() - Duration::days(8));
        assert_eq!(s.select(&[p], &[event("e1", 2)]).unwrap(), None);
    }

    #[test]
    fn publication_in_the_future_is_an_invariant_violation() {
        let s = strategy(Duration::minutes(60), utc_window(8, 22));
        let p = published("p", -1, now() + Duration::minutes(1));
        let err = s.select(&[p], &[event("e1", 2)]).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation { .. }));
    }

    #[test]
    fn last_published_without_times_does_not_block() {
        let s = strategy(Duration::days(10), utc_window(8, 22));
        let p = event("p", -1).with_publication_state(EventPublicationStatus::Failed, BTreeMap::new());
        let e1 = event("e1", 2);
        assert_eq!(s.select(&[p], &[e1.clone()]).unwrap(), Some(e1));
    }

    #[test]
    fn cooldown_is_anchored_on_last_scheduled_event() {
        let s = strategy(Duration::days(2), utc_window(8, 22));
        // Scheduled earlier but published just now: ignored for the cooldown.
        let early = published("early", -5, now() - Duration::minutes(5));
        let late = published("late", -1, now() - Duration::days(3));
        let e1 = event("e1", 2);
        assert_eq!(s.select(&[early, late], &[e1.clone()]).unwrap(), Some(e1));
    }

    #[test]
    fn outside_window_selects_nothing() {
        let s = strategy(Duration::minutes(0), utc_window(14, 18));
        assert_eq!(s.select(&[], &[event("e1", 1)]).unwrap(), None);
    }

    #[rstest]
    #[case(22, 6, 23, true)]
    #[case(22, 6, 22, true)]
    #[case(22, 6, 0, true)]
    #[case(22, 6, 5, true)]
    #[case(22, 6, 6, false)]
    #[case(22, 6, 10, false)]
    #[case(8, 22, 8, true)]
    #[case(8, 22, 21, true)]
    #[case(8, 22, 22, false)]
    #[case(8, 22, 7, false)]
    #[case(9, 9, 9, false)]
    fn window_membership(
        #[case] begin: u32,
        #[case] end: u32,
        #[case] hour: u32,
        #[case] inside: bool,
    ) {
        assert_eq!(utc_window(begin, end).contains_hour(hour), inside);
    }

    #[test]
    fn window_is_evaluated_in_its_timezone() {
        // 12:00 UTC is 14:00 in Rome during summer time.
        let rome = PublishingWindow::new(14, 15, "Europe/Rome".parse().unwrap()).unwrap();
        assert!(rome.contains(now()));
        assert!(!utc_window(14, 15).contains(now()));
    }

    #[test]
    fn window_rejects_out_of_range_hours() {
        assert!(PublishingWindow::new(0, 24, WindowTimezone::Local).is_err());
        assert!(PublishingWindow::new(25, 3, WindowTimezone::Local).is_err());
    }

    #[rstest]
    #[case("local", WindowTimezone::Local)]
    #[case("", WindowTimezone::Local)]
    #[case("UTC", WindowTimezone::Zone(Tz::UTC))]
    #[case("Europe/Rome", WindowTimezone::Zone(Tz::Europe__Rome))]
    fn timezone_parsing(#[case] input: &str, #[case] expected: WindowTimezone) {
        assert_eq!(input.parse::<WindowTimezone>().unwrap(), expected);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert!("Mars/Olympus".parse::<WindowTimezone>().is_err());
    }
}
