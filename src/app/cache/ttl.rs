//! Expiry calculation for refreshed entries
//!
//! Every entry written by one refresh shares the same expiry: the next
//! occurrence of the rollover time (00:02 local by default) on the following
//! calendar day. Entries written at 23:59 therefore live three minutes, and
//! entries written at 00:01 live a full day and a minute.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};

use super::config::CacheConfig;

/// Time until the rollover on the calendar day after `now`
///
/// Works on naive local wall-clock time, so a daylight-saving shift between
/// `now` and the rollover is not accounted for.
pub fn ttl_until_rollover(now: NaiveDateTime, config: &CacheConfig) -> Duration {
    let rollover = NaiveTime::from_hms_opt(config.rollover_hour, config.rollover_minute, 0)
        .unwrap_or(NaiveTime::MIN);
    let next_day = now.date().succ_opt().unwrap_or(now.date());
    let target = next_day.and_time(rollover);

    target
        .signed_duration_since(now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Time until the next rollover, measured from the local clock
pub fn ttl_from_local_clock(config: &CacheConfig) -> Duration {
    ttl_until_rollover(Local::now().naive_local(), config)
}
