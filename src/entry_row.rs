use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::time_entry::TimeEntry;
use crate::time_slot::{format_time, parse_time};

/// 1行分のヘッダー。
pub const HEADER: [&str; 9] = [
    "Barn Team Member",
    "Date",
    "Month",
    "Pay Period",
    "Start",
    "End",
    "Hours Worked",
    "Hourly Rate",
    "Pay",
];

/// タイムエントリーを1行に平坦化した表現。
///
/// CSVファイルやスプレッドシートの1行に対応する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    #[serde(rename = "Barn Team Member")]
    pub member: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Pay Period")]
    pub pay_period: String,
    #[serde(rename = "Start")]
    pub start: String,
    #[serde(rename = "End")]
    pub end: String,
    #[serde(rename = "Hours Worked")]
    pub hours_worked: f64,
    #[serde(rename = "Hourly Rate")]
    pub hourly_rate: u32,
    #[serde(rename = "Pay")]
    pub pay: f64,
}

impl From<&TimeEntry> for EntryRow {
    fn from(entry: &TimeEntry) -> Self {
        Self {
            member: entry.member().to_string(),
            date: format_date(entry.date()),
            month: entry.month().to_string(),
            pay_period: entry.pay_period().to_string(),
            start: format_time(entry.start()),
            end: format_time(entry.end()),
            hours_worked: entry.hours_worked(),
            hourly_rate: entry.hourly_rate(),
            pay: entry.pay(),
        }
    }
}

impl EntryRow {
    /// スプレッドシートのセルの値から行を作成する。
    ///
    /// 数値のセルは`$`や`,`を含む表示形式でも受け付ける。
    pub fn from_cells(cells: &[String]) -> Result<Self> {
        if cells.len() < HEADER.len() {
            bail!(
                "Expected {} cells but got {}: {:?}",
                HEADER.len(),
                cells.len(),
                cells
            );
        }

        Ok(Self {
            member: cells[0].clone(),
            date: cells[1].clone(),
            month: cells[2].clone(),
            pay_period: cells[3].clone(),
            start: cells[4].clone(),
            end: cells[5].clone(),
            hours_worked: parse_number(&cells[6]).context("Invalid hours worked")?,
            hourly_rate: parse_rate(&cells[7]).context("Invalid hourly rate")?,
            pay: parse_number(&cells[8]).context("Invalid pay")?,
        })
    }

    /// 行をタイムエントリーに変換する。
    ///
    /// 勤務時間と給与は入力値から再計算する。保存されている値と異なる場合は警告を出力する。
    pub fn to_entry(&self) -> Result<TimeEntry> {
        let date = parse_date(&self.date)?;
        let start = parse_time(&self.start)?;
        let end = parse_time(&self.end)?;
        let entry = TimeEntry::new(self.member.as_str(), date, start, end, self.hourly_rate)
            .with_context(|| format!("Invalid row: {:?}", self))?;

        if (entry.hours_worked() - self.hours_worked).abs() >= 0.005
            || (entry.pay() - self.pay).abs() >= 0.005
        {
            warn!(
                "Stored hours/pay ({}, {}) differ from recalculated ({}, {}) for {} on {}",
                self.hours_worked,
                self.pay,
                entry.hours_worked(),
                entry.pay(),
                self.member,
                self.date
            );
        }

        Ok(entry)
    }
}

/// 日付を`01/05/24`の形式で表示する。
pub fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%y").to_string()
}

/// 日付をパースする。
///
/// `01/05/24`の形式に加えて、スプレッドシートが変換しうる`1/5/2024`と`2024-01-05`を受け付ける。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let is_four_digit_year = trimmed
        .rsplit('/')
        .next()
        .map(|year| year.len() == 4)
        .unwrap_or(false);
    let format = if trimmed.contains('-') {
        "%Y-%m-%d"
    } else if is_four_digit_year {
        "%m/%d/%Y"
    } else {
        "%m/%d/%y"
    };

    NaiveDate::parse_from_str(trimmed, format)
        .with_context(|| format!("Failed to parse date: {}", s))
}

fn strip_currency(s: &str) -> String {
    s.trim().chars().filter(|c| *c != '$' && *c != ',').collect()
}

fn parse_number(s: &str) -> Result<f64> {
    strip_currency(s)
        .parse::<f64>()
        .with_context(|| format!("Failed to parse number: {}", s))
}

/// 時給をパースする。
///
/// 正の整数のみを受け付ける。`15.00`のように小数部が0の表示形式は許可する。
fn parse_rate(s: &str) -> Result<u32> {
    let cleaned = strip_currency(s);
    let whole = cleaned
        .strip_suffix(".00")
        .or_else(|| cleaned.strip_suffix(".0"))
        .unwrap_or(&cleaned);
    let rate = whole
        .parse::<u32>()
        .with_context(|| format!("Hourly rate must be a whole number: {}", s))?;
    if rate == 0 {
        bail!("Hourly rate must be greater than zero: {}", s);
    }

    Ok(rate)
}
