use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use log::info;

use crate::entry_row::{EntryRow, HEADER};
use crate::entry_store::{split_by_indices, EntryStore};
use crate::time_entry::TimeEntry;

/// エントリーをローカルのCSVファイルに保存する。
///
/// 1行目はヘッダー。追加は1行の追記、削除はファイル全体の書き直しで行う。
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    /// 新しい`CsvFileStore`を返す。
    ///
    /// 親ディレクトリが存在しない場合は作成する。ファイルは最初の追加時に作成する。
    ///
    /// # Arguments
    ///
    /// * `path` - CSVファイルのパス
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self) -> Result<Vec<EntryRow>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        reader
            .deserialize::<EntryRow>()
            .enumerate()
            .map(|(i, row)| {
                row.with_context(|| {
                    format!("Failed to read row {} of {}", i + 1, self.path.display())
                })
            })
            .collect()
    }

    fn write_rows(&self, rows: &[EntryRow]) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .from_path(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        if rows.is_empty() {
            writer
                .write_record(HEADER)
                .context("Failed to write header")?;
        }
        for row in rows {
            writer.serialize(row).context("Failed to write row")?;
        }
        writer.flush().context("Failed to flush CSV file")?;
        info!("Rewrote {} with {} rows", self.path.display(), rows.len());

        Ok(())
    }
}

impl EntryStore for CsvFileStore {
    async fn append(&mut self, entry: TimeEntry) -> Result<()> {
        let is_new = fs::metadata(&self.path)
            .map(|metadata| metadata.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut writer = WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer
            .serialize(EntryRow::from(&entry))
            .context("Failed to write row")?;
        writer.flush().context("Failed to flush CSV file")?;

        Ok(())
    }

    async fn delete(&mut self, indices: &BTreeSet<usize>) -> Result<Vec<TimeEntry>> {
        let rows = self.read_rows()?;
        let (kept, removed) = split_by_indices(rows, indices);
        self.write_rows(&kept)?;

        removed.iter().map(EntryRow::to_entry).collect()
    }

    async fn list(&self) -> Result<Vec<TimeEntry>> {
        self.read_rows()?.iter().map(EntryRow::to_entry).collect()
    }
}
