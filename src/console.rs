use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveTime;

use crate::entry_row::format_date;
use crate::summary::{MemberMessage, MemberSummary};
use crate::time_entry::{PayPeriod, TimeEntry, YearMonth};
use crate::time_slot::format_time;

/// Consoleに結果を表示するためのtrait。
#[cfg_attr(test, mockall::automock)]
pub trait ConsolePresenter {
    /// タイムエントリーを位置と共に表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示するタイムエントリー
    fn show_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()>;

    /// 給与計算期間の集計結果を表示する。
    fn show_summary(
        &mut self,
        month: YearMonth,
        period: PayPeriod,
        summaries: &[MemberSummary],
    ) -> Result<()>;

    /// メンバーごとのメッセージを表示する。
    fn show_messages(&mut self, messages: &[MemberMessage]) -> Result<()>;

    /// 選択可能なメンバー、時給、時刻を表示する。
    fn show_options(
        &mut self,
        roster: &[String],
        rates: &[u32],
        slots: &[NaiveTime],
    ) -> Result<()>;

    /// 処理結果を表示する。
    fn show_notice(&mut self, message: &str) -> Result<()>;

    /// 警告を表示する。
    fn show_warning(&mut self, message: &str) -> Result<()>;
}

/// 結果をMarkdownの表形式で表示する。
pub struct ConsoleMarkdown<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdown<'a, W> {
    /// 新しい`ConsoleMarkdown`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line).with_context(|| format!("Failed to write: {}", line))
    }

    fn write_table(&mut self, header: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        self.write_line(&format!("| {} |", header.join(" | ")))?;
        self.write_line(&format!("|{}", "---|".repeat(header.len())))?;
        for row in rows {
            self.write_line(&format!("| {} |", row.join(" | ")))?;
        }

        Ok(())
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdown<'a, W> {
    fn show_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()> {
        if time_entries.is_empty() {
            return self.write_line("No entries logged.");
        }

        let rows = time_entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                vec![
                    i.to_string(),
                    entry.member().to_string(),
                    format_date(entry.date()),
                    format_time(entry.start()),
                    format_time(entry.end()),
                    format!("{:.2}", entry.hours_worked()),
                    format!("${}", entry.hourly_rate()),
                    format!("${:.2}", entry.pay()),
                ]
            })
            .collect();
        self.write_table(
            &[
                "#",
                "Barn Team Member",
                "Date",
                "Start",
                "End",
                "Hours Worked",
                "Hourly Rate",
                "Pay",
            ],
            rows,
        )
    }

    fn show_summary(
        &mut self,
        month: YearMonth,
        period: PayPeriod,
        summaries: &[MemberSummary],
    ) -> Result<()> {
        if summaries.is_empty() {
            return self.write_line(&format!("No entries found for {} in {}.", period, month));
        }

        self.write_line(&format!("## {}, {}", period, month))?;
        let rows = summaries
            .iter()
            .map(|summary| {
                vec![
                    summary.member.clone(),
                    format!("{:.2}", summary.total_hours),
                    format!("${:.2}", summary.total_pay),
                ]
            })
            .collect();
        self.write_table(&["Barn Team Member", "Total Hours", "Total Pay"], rows)
    }

    fn show_messages(&mut self, messages: &[MemberMessage]) -> Result<()> {
        for message in messages {
            self.write_line("")?;
            self.write_line(&message.text)?;
        }

        Ok(())
    }

    fn show_options(
        &mut self,
        roster: &[String],
        rates: &[u32],
        slots: &[NaiveTime],
    ) -> Result<()> {
        self.write_line(&format!("- Barn Team Members: {}", roster.join(", ")))?;
        let rates: Vec<String> = rates.iter().map(|rate| format!("${}", rate)).collect();
        self.write_line(&format!("- Hourly Rates: {}", rates.join(", ")))?;
        let slots: Vec<String> = slots.iter().map(|slot| format_time(*slot)).collect();
        self.write_line(&format!("- Times: {}", slots.join(", ")))
    }

    fn show_notice(&mut self, message: &str) -> Result<()> {
        self.write_line(message)
    }

    fn show_warning(&mut self, message: &str) -> Result<()> {
        self.write_line(&format!("Warning: {}", message))
    }
}
