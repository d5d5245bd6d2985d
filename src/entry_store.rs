use std::collections::BTreeSet;

use anyhow::Result;

use crate::time_entry::TimeEntry;

/// タイムエントリーを保存するためのtrait。
///
/// 追記順を保持し、更新はサポートしない。修正は削除と追加で行う。
#[allow(async_fn_in_trait)]
pub trait EntryStore {
    /// エントリーを末尾に追加する。
    async fn append(&mut self, entry: TimeEntry) -> Result<()>;

    /// 指定された位置のエントリーを削除し、削除したエントリーを返す。
    ///
    /// 残りのエントリーの順序は保持する。範囲外の位置は無視する。
    ///
    /// # Arguments
    ///
    /// * `indices` - 削除するエントリーの位置
    async fn delete(&mut self, indices: &BTreeSet<usize>) -> Result<Vec<TimeEntry>>;

    /// 全てのエントリーを追記順で返す。
    async fn list(&self) -> Result<Vec<TimeEntry>>;
}

/// エントリーをプロセス内のみで保持する。
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<TimeEntry>,
}

impl MemoryStore {
    /// 新しい空の`MemoryStore`を返す。
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryStore for MemoryStore {
    async fn append(&mut self, entry: TimeEntry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }

    async fn delete(&mut self, indices: &BTreeSet<usize>) -> Result<Vec<TimeEntry>> {
        let entries = std::mem::take(&mut self.entries);
        let (kept, removed) = split_by_indices(entries, indices);
        self.entries = kept;

        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<TimeEntry>> {
        Ok(self.entries.clone())
    }
}

/// 指定された位置の要素とそれ以外に分ける。
///
/// どちらも元の順序を保持する。
pub fn split_by_indices<T>(items: Vec<T>, indices: &BTreeSet<usize>) -> (Vec<T>, Vec<T>) {
    items
        .into_iter()
        .enumerate()
        .fold((Vec::new(), Vec::new()), |(mut kept, mut removed), (i, item)| {
            if indices.contains(&i) {
                removed.push(item);
            } else {
                kept.push(item);
            }
            (kept, removed)
        })
}
