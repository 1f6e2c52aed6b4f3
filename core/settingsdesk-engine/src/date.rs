//! Renders timestamps with the host's PHP-style date tokens.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Formats `at` with `format`.
///
/// Supported tokens: `d j D l N w z m n M F t L Y y a A g G h H i s U`.
/// A backslash escapes the next character; anything else is copied.
pub fn format_php(at: &NaiveDateTime, format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        let piece = match c {
            '\\' => chars.next().map(String::from).unwrap_or_default(),
            'd' => format!("{:02}", at.day()),
            'j' => at.day().to_string(),
            'D' => at.format("%a").to_string(),
            'l' => at.format("%A").to_string(),
            'N' => at.weekday().number_from_monday().to_string(),
            'w' => at.weekday().num_days_from_sunday().to_string(),
            'z' => at.ordinal0().to_string(),
            'm' => format!("{:02}", at.month()),
            'n' => at.month().to_string(),
            'M' => at.format("%b").to_string(),
            'F' => at.format("%B").to_string(),
            't' => days_in_month(at.year(), at.month()).to_string(),
            'L' => u8::from(is_leap_year(at.year())).to_string(),
            'Y' => at.year().to_string(),
            'y' => format!("{:02}", at.year().rem_euclid(100)),
            'a' => meridiem(at, "am", "pm").to_string(),
            'A' => meridiem(at, "AM", "PM").to_string(),
            'g' => at.hour12().1.to_string(),
            'G' => at.hour().to_string(),
            'h' => format!("{:02}", at.hour12().1),
            'H' => format!("{:02}", at.hour()),
            'i' => format!("{:02}", at.minute()),
            's' => format!("{:02}", at.second()),
            'U' => at.and_utc().timestamp().to_string(),
            other => other.to_string(),
        };
        out.push_str(&piece);
    }
    out
}

fn meridiem<'a>(at: &NaiveDateTime, before_noon: &'a str, after_noon: &'a str) -> &'a str {
    if at.hour() < 12 { before_noon } else { after_noon }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn default_host_format() {
        let t = at(2024, 3, 5, 14, 7, 0);
        assert_eq!(format_php(&t, "F j, Y h:i a"), "March 5, 2024 02:07 pm");
    }

    #[test]
    fn numeric_tokens() {
        let t = at(2024, 2, 9, 0, 5, 9);
        assert_eq!(format_php(&t, "Y-m-d H:i:s"), "2024-02-09 00:05:09");
        assert_eq!(format_php(&t, "y n/j G g A"), "24 2/9 0 12 AM");
        assert_eq!(format_php(&t, "t L"), "29 1");
    }

    #[test]
    fn weekday_tokens() {
        // 2024-03-04 is a Monday.
        let t = at(2024, 3, 4, 9, 0, 0);
        assert_eq!(format_php(&t, "D l N w"), "Mon Monday 1 1");
        assert_eq!(format_php(&t, "M"), "Mar");
    }

    #[test]
    fn backslash_escapes() {
        let t = at(2024, 3, 5, 9, 0, 0);
        assert_eq!(format_php(&t, r"\Y\e\a\r: Y"), "Year: 2024");
        assert_eq!(format_php(&t, "j \\o\\f F"), "5 of March");
        assert_eq!(format_php(&t, "Y\\"), "2024");
        assert_eq!(format_php(&t, "U"), "1709629200");
    }
}
