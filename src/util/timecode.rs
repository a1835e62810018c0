// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timecode formatting for cards, markers and reports.

/// Format seconds as `mm:ss.cc`, or `h:mm:ss.cc` past an hour.
pub fn format_timecode(seconds: f64) -> String {
    let total_centis = (seconds.max(0.0) * 100.0).round() as u64;
    let centis = total_centis % 100;
    let total_secs = total_centis / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    if hours > 0 {
        format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, centis)
    } else {
        format!("{:02}:{:02}.{:02}", mins, secs, centis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timecode() {
        assert_eq!(format_timecode(0.0), "00:00.00");
        assert_eq!(format_timecode(2.5), "00:02.50");
        assert_eq!(format_timecode(75.25), "01:15.25");
        assert_eq!(format_timecode(3723.0), "1:02:03.00");
        assert_eq!(format_timecode(-1.0), "00:00.00");
    }
}
