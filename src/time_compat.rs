//! Thread-safe calendar-time conversion
//!
//! Converts a numeric Unix timestamp into its broken-down calendar form, in
//! local time or UTC, with the thread-safety the platform's own conversion
//! routines may lack.
//!
//! On Unix this wraps the classic non-reentrant `localtime`/`gmtime`
//! primitives: those return a pointer into static storage, so conversion and
//! the copy into the caller's buffer run inside a single guarded slot, and
//! concurrent callers are serialized for that short window. Elsewhere the
//! same two entry points delegate to chrono, which needs no serialization.
//! The contracts are identical either way, so calling code never branches on
//! platform.
//!
//! Every call writes into caller-owned storage; nothing is ever returned by
//! reference to shared state. On failure the caller's buffer is left
//! untouched.

/// Broken-down calendar form of a timestamp.
///
/// Field ranges follow the POSIX `struct tm` conventions, except that
/// `year` is the full year (not an offset from 1900) and `month` is 1-based,
/// matching what RTC chips and date records use elsewhere in the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarTime {
    pub year: i32,
    pub month: u8,   // 1-12
    pub day: u8,     // 1-31
    pub hour: u8,    // 0-23
    pub minute: u8,  // 0-59
    pub second: u8,  // 0-60, leap second included
    pub weekday: u8, // days since Sunday, 0-6
    pub yearday: u16, // days since January 1, 0-365
    /// Whether daylight saving time is in effect. Always `false` from the
    /// chrono backend, which does not expose DST.
    pub is_dst: bool,
    /// Offset from UTC in minutes, positive east of UTC.
    pub offset_minutes: i32,
}

/// Convert `timestamp` to local calendar time, writing into `out`.
///
/// Returns `out` on success. `None` means the timestamp is not representable
/// on this platform; `out` is not populated in that case.
///
/// Safe to call from multiple threads; concurrent conversions are serialized
/// internally and never observe each other's fields.
pub fn local_calendar(timestamp: i64, out: &mut CalendarTime) -> Option<&mut CalendarTime> {
    if platform::convert(timestamp, true, out) {
        Some(out)
    } else {
        None
    }
}

/// Convert `timestamp` to UTC calendar time, writing into `out`.
///
/// Same contract as [`local_calendar`]; `is_dst` is always `false` and
/// `offset_minutes` is always 0 for UTC.
pub fn utc_calendar(timestamp: i64, out: &mut CalendarTime) -> Option<&mut CalendarTime> {
    if platform::convert(timestamp, false, out) {
        Some(out)
    } else {
        None
    }
}

#[cfg(unix)]
mod platform {
    use super::CalendarTime;
    use std::sync::Mutex;

    // localtime/gmtime write into static storage shared by every caller.
    // Conversion and the copy out of that storage hold this lock.
    static CONVERSION_SLOT: Mutex<()> = Mutex::new(());

    pub(super) fn convert(timestamp: i64, local: bool, out: &mut CalendarTime) -> bool {
        let secs: libc::time_t = match timestamp.try_into() {
            Ok(secs) => secs,
            Err(_) => return false,
        };

        let tm = {
            let _guard = CONVERSION_SLOT.lock().unwrap_or_else(|e| e.into_inner());
            // SAFETY: the pointer aims at libc's static tm; the slot lock
            // keeps any other thread from overwriting it before the copy.
            let tm_ptr = unsafe {
                if local {
                    libc::localtime(&secs)
                } else {
                    libc::gmtime(&secs)
                }
            };
            if tm_ptr.is_null() {
                return false;
            }
            unsafe { *tm_ptr }
        };

        out.year = tm.tm_year + 1900;
        out.month = (tm.tm_mon + 1) as u8;
        out.day = tm.tm_mday as u8;
        out.hour = tm.tm_hour as u8;
        out.minute = tm.tm_min as u8;
        out.second = tm.tm_sec as u8;
        out.weekday = tm.tm_wday as u8;
        out.yearday = tm.tm_yday as u16;
        out.is_dst = tm.tm_isdst > 0;
        out.offset_minutes = (tm.tm_gmtoff / 60) as i32;
        true
    }
}

#[cfg(not(unix))]
mod platform {
    use super::CalendarTime;
    use chrono::{DateTime, Datelike, Local, LocalResult, Offset, TimeZone, Timelike, Utc};

    pub(super) fn convert(timestamp: i64, local: bool, out: &mut CalendarTime) -> bool {
        if local {
            match Local.timestamp_opt(timestamp, 0) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    fill(out, &dt);
                    true
                }
                LocalResult::None => false,
            }
        } else {
            match Utc.timestamp_opt(timestamp, 0) {
                LocalResult::Single(dt) => {
                    fill(out, &dt);
                    true
                }
                _ => false,
            }
        }
    }

    fn fill<Tz: TimeZone>(out: &mut CalendarTime, dt: &DateTime<Tz>) {
        out.year = dt.year();
        out.month = dt.month() as u8;
        out.day = dt.day() as u8;
        out.hour = dt.hour() as u8;
        out.minute = dt.minute() as u8;
        out.second = dt.second() as u8;
        out.weekday = dt.weekday().num_days_from_sunday() as u8;
        out.yearday = dt.ordinal0() as u16;
        // chrono does not report DST
        out.is_dst = false;
        out.offset_minutes = dt.offset().fix().local_minus_utc() / 60;
    }
}
