use std::io::Write;

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::entry_row::{EntryRow, HEADER};
use crate::summary::MemberSummary;
use crate::time_entry::TimeEntry;

const SUMMARY_HEADER: [&str; 3] = ["Barn Team Member", "Total Hours", "Total Pay"];

/// エントリーをCSV形式で書き出す。
///
/// エントリーがない場合もヘッダー行は書き出す。
pub fn write_entries_csv<W: Write>(writer: W, entries: &[TimeEntry]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer
        .write_record(HEADER)
        .context("Failed to write header")?;
    for entry in entries {
        csv_writer
            .serialize(EntryRow::from(entry))
            .with_context(|| format!("Failed to write entry: {:?}", entry))?;
    }
    csv_writer.flush().context("Failed to flush CSV")?;

    Ok(())
}

/// 集計結果をCSV形式で書き出す。
pub fn write_summary_csv<W: Write>(writer: W, summaries: &[MemberSummary]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer
        .write_record(SUMMARY_HEADER)
        .context("Failed to write header")?;
    for summary in summaries {
        csv_writer
            .serialize(summary)
            .with_context(|| format!("Failed to write summary: {:?}", summary))?;
    }
    csv_writer.flush().context("Failed to flush CSV")?;

    Ok(())
}
