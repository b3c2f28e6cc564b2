use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::time::Instant;

/// Provides wall-clock time and sleeping across the application. Everything that stamps or waits
/// goes through this so tests can pin the start time and pause tokio's clock.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Local>;

    fn instant(&self) -> Instant;

    async fn sleep(&self, duration: Duration);

    async fn sleep_until(&self, instant: Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

#[cfg(test)]
pub mod test_clock {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
    use tokio::time::Instant;

    use super::Clock;

    pub const TEST_START_DATE: NaiveDateTime = NaiveDateTime::new(
        match NaiveDate::from_ymd_opt(2018, 7, 4) {
            Some(v) => v,
            None => panic!("invalid test date"),
        },
        NaiveTime::MIN,
    );

    /// Wall clock that starts at [TEST_START_DATE] and advances with tokio's (possibly paused)
    /// clock.
    #[derive(Clone)]
    pub struct TestClock {
        start_time: DateTime<Local>,
        reference: Instant,
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                start_time: Local
                    .from_local_datetime(&TEST_START_DATE)
                    .earliest()
                    .expect("test start should exist in local time"),
                reference: Instant::now(),
            }
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Local> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }
}
