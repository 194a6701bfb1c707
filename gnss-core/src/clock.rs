//! Timestamp formatting for the peer: `YY/MM/DD,HH:MM:SS±QQ` with the UTC
//! offset in quarter-hours.

use chrono::{Local, NaiveDateTime, Offset};

/// Format the current local time. The suffix is the local UTC offset in
/// quarter-hours, sign explicit, zero-padded to two digits.
pub fn current_timestamp() -> String {
    let now = Local::now();
    let offset_secs = now.offset().fix().local_minus_utc();
    format_timestamp(&now.naive_local(), offset_secs)
}

/// Format an explicit local time and UTC offset (seconds east of UTC).
pub fn format_timestamp(local: &NaiveDateTime, utc_offset_secs: i32) -> String {
    let quarters = utc_offset_secs / 900;
    let sign = if quarters < 0 { '-' } else { '+' };
    format!(
        "{}{}{:02}",
        local.format("%y/%m/%d,%H:%M:%S"),
        sign,
        quarters.abs()
    )
}
