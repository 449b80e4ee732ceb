//! Minimal ISO-8601 calendar types.
//!
//! Only the forms the command line needs: `YYYY-MM-DD`, `HH:MM:SS[.ffffff]`,
//! and the two joined with `T` or a space. Values are validated against the
//! proleptic Gregorian calendar but carry no timezone.

use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Date {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micros: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

fn is_leap(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn field<T: FromStr>(s: &str) -> Result<T, String> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid numeric field {:?}", s));
    }
    s.parse()
        .map_err(|_| format!("invalid numeric field {:?}", s))
}

impl Date {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, String> {
        if month == 0 || month > 12 {
            return Err(format!("month {} is out of range", month));
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(format!("day {} is out of range", day));
        }
        Ok(Date { year, month, day })
    }
}

impl FromStr for Date {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let (y, m, d) = match (parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d)) => (y, m, d),
            _ => return Err(format!("expected YYYY-MM-DD, got {:?}", s)),
        };
        Date::new(field(y)?, field(m)?, field(d)?)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Time {
    pub fn new(hour: u8, minute: u8, second: u8, micros: u32) -> Result<Self, String> {
        if hour > 23 {
            return Err(format!("hour {} is out of range", hour));
        }
        if minute > 59 {
            return Err(format!("minute {} is out of range", minute));
        }
        if second > 59 {
            return Err(format!("second {} is out of range", second));
        }
        if micros > 999_999 {
            return Err(format!("microsecond {} is out of range", micros));
        }
        Ok(Time {
            hour,
            minute,
            second,
            micros,
        })
    }
}

impl FromStr for Time {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hms, frac) = match s.split_once('.') {
            Some((hms, frac)) => (hms, Some(frac)),
            None => (s, None),
        };
        let mut parts = hms.splitn(3, ':');
        let (h, m) = match (parts.next(), parts.next()) {
            (Some(h), Some(m)) => (h, m),
            _ => return Err(format!("expected HH:MM[:SS], got {:?}", s)),
        };
        let sec = match parts.next() {
            Some(sec) => field(sec)?,
            None => 0,
        };
        let micros = match frac {
            Some(frac) if frac.len() <= 6 => {
                let scale = 10u32.pow(6 - frac.len() as u32);
                field::<u32>(frac)? * scale
            }
            Some(frac) => return Err(format!("fractional second {:?} is too long", frac)),
            None => 0,
        };
        Time::new(field(h)?, field(m)?, sec, micros)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.micros > 0 {
            write!(f, ".{:06}", self.micros)?;
        }
        Ok(())
    }
}

impl FromStr for DateTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date, time) = match s.split_once(['T', ' ']) {
            Some((date, time)) => (date.parse()?, time.parse()?),
            None => (
                s.parse()?,
                Time {
                    hour: 0,
                    minute: 0,
                    second: 0,
                    micros: 0,
                },
            ),
        };
        Ok(DateTime { date, time })
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_dates() {
        let d: Date = "2021-02-28".parse().unwrap();
        assert_eq!(d.to_string(), "2021-02-28");
        assert!("2021-02-29".parse::<Date>().is_err());
        assert!("2020-02-29".parse::<Date>().is_ok());
        assert!("2021-13-01".parse::<Date>().is_err());
        assert!("not-a-date".parse::<Date>().is_err());
    }

    #[test]
    fn parses_and_prints_times() {
        let t: Time = "12:34:56".parse().unwrap();
        assert_eq!(t.to_string(), "12:34:56");
        let t: Time = "12:34".parse().unwrap();
        assert_eq!(t.to_string(), "12:34:00");
        let t: Time = "12:34:56.5".parse().unwrap();
        assert_eq!(t.micros, 500_000);
        assert!("24:00:00".parse::<Time>().is_err());
    }

    #[test]
    fn parses_datetimes() {
        let dt: DateTime = "2021-02-28T12:34:56".parse().unwrap();
        assert_eq!(dt.to_string(), "2021-02-28T12:34:56");
        let dt: DateTime = "2021-02-28".parse().unwrap();
        assert_eq!(dt.time.hour, 0);
    }
}
