use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, NaiveTime};
use thiserror::Error;

/// タイムエントリーの入力検証で発生するエラー。
///
/// いずれもユーザーへの警告として扱い、エントリーは作成しない。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryError {
    #[error("End time must be after start time. (start: {start}, end: {end})")]
    EndNotAfterStart { start: NaiveTime, end: NaiveTime },
    #[error("Barn team member must not be empty.")]
    EmptyMember,
    #[error("Unknown barn team member: {0}")]
    UnknownMember(String),
    #[error("Hourly rate {0} is not allowed.")]
    RateNotAllowed(u32),
    #[error("Hourly rate must be greater than zero.")]
    RateNotPositive,
    #[error("{0} is not one of the selectable times.")]
    TimeOffGrid(NaiveTime),
    #[error("Entry {index} does not exist. ({len} entries logged)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// 1回分の勤務を表すタイムエントリー。
///
/// 勤務時間と給与は開始・終了時刻と時給から計算される値で、個別に変更することはできない。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    member: String,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    hourly_rate: u32,
    hours_worked: f64,
    pay: f64,
}

impl TimeEntry {
    /// 新しい`TimeEntry`を返す。
    ///
    /// 終了時刻が開始時刻以前の場合、時給が0の場合はエラーを返す。日付を跨ぐ勤務は扱わない。
    ///
    /// # Arguments
    ///
    /// * `member` - 勤務したメンバー
    /// * `date` - 勤務日
    /// * `start` - 開始時刻
    /// * `end` - 終了時刻
    /// * `hourly_rate` - 時給
    pub fn new(
        member: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        hourly_rate: u32,
    ) -> Result<Self, EntryError> {
        let member = member.into().trim().to_string();
        if member.is_empty() {
            return Err(EntryError::EmptyMember);
        }
        if hourly_rate == 0 {
            return Err(EntryError::RateNotPositive);
        }
        let hours_worked = calc_hours_worked(start, end)?;
        let pay = calc_pay(hours_worked, hourly_rate);

        Ok(Self {
            member,
            date,
            start,
            end,
            hourly_rate,
            hours_worked,
            pay,
        })
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn hourly_rate(&self) -> u32 {
        self.hourly_rate
    }

    pub fn hours_worked(&self) -> f64 {
        self.hours_worked
    }

    pub fn pay(&self) -> f64 {
        self.pay
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }

    pub fn pay_period(&self) -> PayPeriod {
        PayPeriod::of(self.date)
    }
}

/// 勤務時間を時間単位で計算する。
///
/// 小数点以下2桁で丸める。終了時刻が開始時刻以前の場合はエラーを返す。
pub fn calc_hours_worked(start: NaiveTime, end: NaiveTime) -> Result<f64, EntryError> {
    if end <= start {
        return Err(EntryError::EndNotAfterStart { start, end });
    }
    let seconds = end.signed_duration_since(start).num_seconds();

    Ok(round2(seconds as f64 / 3600.0))
}

/// 勤務時間と時給から給与を計算する。
pub fn calc_pay(hours_worked: f64, hourly_rate: u32) -> f64 {
    round2(hours_worked * f64::from(hourly_rate))
}

/// 小数点以下2桁に丸める。
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 半月単位の給与計算期間。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PayPeriod {
    /// 1日から15日まで。
    First,
    /// 16日から月末まで。
    Second,
}

impl PayPeriod {
    /// 日付が属する給与計算期間を返す。
    pub fn of(date: NaiveDate) -> Self {
        if date.day() <= 15 {
            PayPeriod::First
        } else {
            PayPeriod::Second
        }
    }
}

impl fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayPeriod::First => write!(f, "Pay Period 1"),
            PayPeriod::Second => write!(f, "Pay Period 2"),
        }
    }
}

impl FromStr for PayPeriod {
    type Err = anyhow::Error;

    /// `1`, `2`または`Pay Period 1`の形式を受け付ける。
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        let number = normalized
            .strip_prefix("pay period")
            .unwrap_or(&normalized)
            .trim();
        match number {
            "1" => Ok(PayPeriod::First),
            "2" => Ok(PayPeriod::Second),
            _ => bail!("Invalid pay period: {}", s),
        }
    }
}

/// 年月。`January 2024`の形式で表示する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// 日付が属する年月を返す。
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first_day) => write!(f, "{}", first_day.format("%B %Y")),
            None => write!(f, "{}-{:02}", self.year, self.month),
        }
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    /// `YYYY-MM`または`January 2024`の形式を受け付ける。
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let date = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("1 {}", trimmed), "%d %B %Y"))
            .with_context(|| format!("Failed to parse month: {}", s))?;

        Ok(YearMonth::of(date))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use rstest::rstest;

    use super::{calc_hours_worked, calc_pay, EntryError, PayPeriod, TimeEntry, YearMonth};

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// 勤務時間が時間単位で計算されることを確認する。
    #[rstest]
    #[case::two_and_half(time(9, 0), time(11, 30), 2.5)]
    #[case::half_hour(time(8, 30), time(9, 0), 0.5)]
    #[case::whole_day(time(8, 30), time(22, 0), 13.5)]
    #[case::twenty_minutes(time(9, 0), time(9, 20), 0.33)]
    fn test_calc_hours_worked(
        #[case] start: NaiveTime,
        #[case] end: NaiveTime,
        #[case] expected: f64,
    ) {
        assert_eq!(calc_hours_worked(start, end).unwrap(), expected);
    }

    /// 終了時刻が開始時刻以前の場合はエラーになることを確認する。
    #[rstest]
    #[case::same_time(time(9, 0), time(9, 0))]
    #[case::end_before_start(time(11, 30), time(9, 0))]
    #[case::overnight(time(21, 0), time(1, 0))]
    fn test_calc_hours_worked_rejects(#[case] start: NaiveTime, #[case] end: NaiveTime) {
        assert_eq!(
            calc_hours_worked(start, end),
            Err(EntryError::EndNotAfterStart { start, end })
        );
    }

    #[rstest]
    #[case(2.5, 15, 37.5)]
    #[case(3.0, 17, 51.0)]
    #[case(0.33, 17, 5.61)]
    fn test_calc_pay(#[case] hours: f64, #[case] rate: u32, #[case] expected: f64) {
        assert_eq!(calc_pay(hours, rate), expected);
    }

    #[test]
    fn test_new_time_entry() {
        let entry = TimeEntry::new("Sky", date(2024, 1, 5), time(9, 0), time(11, 30), 15).unwrap();

        assert_eq!(entry.member(), "Sky");
        assert_eq!(entry.hours_worked(), 2.5);
        assert_eq!(entry.pay(), 37.5);
        assert_eq!(entry.month().to_string(), "January 2024");
        assert_eq!(entry.pay_period(), PayPeriod::First);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("  ")]
    fn test_new_time_entry_empty_member(#[case] member: &str) {
        let result = TimeEntry::new(member, date(2024, 1, 5), time(9, 0), time(10, 0), 15);

        assert_eq!(result, Err(EntryError::EmptyMember));
    }

    /// 時給が0の場合はエラーになることを確認する。
    #[rstest]
    #[case::zero(0, Err(EntryError::RateNotPositive))]
    #[case::one(1, Ok(1.0))]
    fn test_new_time_entry_rate(#[case] rate: u32, #[case] expected: Result<f64, EntryError>) {
        let result = TimeEntry::new("Sky", date(2024, 1, 5), time(9, 0), time(10, 0), rate);

        assert_eq!(result.map(|entry| entry.pay()), expected);
    }

    #[rstest]
    #[case::first_day(date(2024, 1, 1), PayPeriod::First)]
    #[case::fifteenth(date(2024, 1, 15), PayPeriod::First)]
    #[case::sixteenth(date(2024, 1, 16), PayPeriod::Second)]
    #[case::thirty_first(date(2024, 1, 31), PayPeriod::Second)]
    #[case::leap_day(date(2024, 2, 29), PayPeriod::Second)]
    fn test_pay_period_of(#[case] input: NaiveDate, #[case] expected: PayPeriod) {
        assert_eq!(PayPeriod::of(input), expected);
    }

    #[rstest]
    #[case("1", PayPeriod::First)]
    #[case("2", PayPeriod::Second)]
    #[case("Pay Period 1", PayPeriod::First)]
    #[case("pay period 2", PayPeriod::Second)]
    fn test_parse_pay_period(#[case] input: &str, #[case] expected: PayPeriod) {
        assert_eq!(input.parse::<PayPeriod>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<PayPeriod>().unwrap(), expected);
    }

    #[rstest]
    #[case("3")]
    #[case("Pay Period")]
    fn test_parse_pay_period_invalid(#[case] input: &str) {
        assert!(input.parse::<PayPeriod>().is_err());
    }

    #[rstest]
    #[case::numeric("2024-01", "January 2024")]
    #[case::label("January 2024", "January 2024")]
    #[case::lowercase("march 2023", "March 2023")]
    fn test_parse_year_month(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(input.parse::<YearMonth>().unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("2024-13")]
    #[case("Smarch 2024")]
    #[case("")]
    fn test_parse_year_month_invalid(#[case] input: &str) {
        assert!(input.parse::<YearMonth>().is_err());
    }
}
