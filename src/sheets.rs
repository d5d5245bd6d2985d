use std::collections::BTreeSet;
use std::env;

use anyhow::{anyhow, Context, Result};
use log::info;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::entry_row::{EntryRow, HEADER};
use crate::entry_store::{split_by_indices, EntryStore};
use crate::settings::SheetsSettings;
use crate::time_entry::TimeEntry;

/// Google Sheets APIの`ValueRange`をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Google Sheets APIに送信する`ValueRange`。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    major_dimension: &'static str,
    values: &'a [Vec<CellValue>],
}

/// `values.clear`のリクエストボディ。
#[derive(Debug, Serialize)]
struct ClearValuesRequest {}

/// スプレッドシートに書き込むセルの値。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

/// 行をセルの値に変換する。
fn row_cells(row: &EntryRow) -> Vec<CellValue> {
    vec![
        CellValue::Text(row.member.clone()),
        CellValue::Text(row.date.clone()),
        CellValue::Text(row.month.clone()),
        CellValue::Text(row.pay_period.clone()),
        CellValue::Text(row.start.clone()),
        CellValue::Text(row.end.clone()),
        CellValue::Number(row.hours_worked),
        CellValue::Integer(i64::from(row.hourly_rate)),
        CellValue::Number(row.pay),
    ]
}

/// シート名をA1形式で利用できるようにクォートする。
///
/// シート名に含まれる`'`は`''`にエスケープする。
fn quote_sheet_name(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

fn header_cells() -> Vec<CellValue> {
    HEADER
        .iter()
        .map(|label| CellValue::Text(label.to_string()))
        .collect()
}

/// Google Sheets APIと通信するためのクライアント。
///
/// シートを行単位の追記と全件読み込みのみを行うストアとして扱う。
///
/// # Examples
///
/// ```
/// let client = SheetsClient::new(&settings.sheets).unwrap();
/// let rows = client.read_rows().await.unwrap();
/// ```
pub struct SheetsClient {
    client: Client,
    api_url: String,
    api_token: String,
    spreadsheet_id: String,
    sheet: String,
}

impl SheetsClient {
    /// 新しい`SheetsClient`を返す。
    ///
    /// 環境変数`SHEETS_ACCESS_TOKEN`が設定されていない場合はエラーを返す。
    ///
    /// # Arguments
    ///
    /// * `settings` - スプレッドシートの設定
    pub fn new(settings: &SheetsSettings) -> Result<Self> {
        let api_token =
            env::var("SHEETS_ACCESS_TOKEN").context("SHEETS_ACCESS_TOKEN must be set")?;
        let spreadsheet_id = settings
            .spreadsheet_id
            .as_deref()
            .context("sheets.spreadsheet_id must be set")?;

        Ok(Self::with_token(
            &settings.api_url,
            &api_token,
            spreadsheet_id,
            &settings.sheet_name,
        ))
    }

    /// アクセストークンを指定して新しい`SheetsClient`を返す。
    pub fn with_token(
        api_url: &str,
        api_token: &str,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet: quote_sheet_name(sheet_name),
        }
    }

    /// 指定した行から最終行までのA1形式の範囲を返す。
    fn range_from(&self, first_row: usize) -> String {
        format!("{}!A{}:I", self.sheet, first_row)
    }

    /// シート全体のA1形式の範囲を返す。
    fn full_range(&self) -> String {
        format!("{}!A:I", self.sheet)
    }

    /// `values`配下のURLを返す。
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
        let range = format!("{}{}", range, suffix);
        let mut url = Url::parse(&self.api_url)
            .with_context(|| format!("Invalid Sheets API url: {}", self.api_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Sheets API url cannot be a base: {}", self.api_url))?
            .pop_if_empty()
            .extend([
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);

        Ok(url)
    }

    /// シートの全ての行を取得する。
    pub async fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        let value_range = self
            .client
            .get(self.values_url(&self.full_range(), "")?)
            .bearer_auth(&self.api_token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await
            .with_context(|| format!("Failed to send request to Sheets API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<ValueRange>()
            .await
            .context("Failed to deserialize response")?;
        info!("length of rows: {}", value_range.values.len());

        Ok(value_range.values)
    }

    /// シートの末尾に行を追加する。
    pub async fn append_rows(&self, rows: &[Vec<CellValue>]) -> Result<()> {
        self.client
            .post(self.values_url(&self.full_range(), ":append")?)
            .bearer_auth(&self.api_token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValueRangeBody {
                major_dimension: "ROWS",
                values: rows,
            })
            .send()
            .await
            .with_context(|| format!("Failed to send request to Sheets API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?;

        Ok(())
    }

    /// 指定した行以降の全ての行を消去する。
    ///
    /// # Arguments
    ///
    /// * `first_row` - 消去を始める行(1始まり)
    pub async fn clear_from(&self, first_row: usize) -> Result<()> {
        self.client
            .post(self.values_url(&self.range_from(first_row), ":clear")?)
            .bearer_auth(&self.api_token)
            .json(&ClearValuesRequest {})
            .send()
            .await
            .with_context(|| format!("Failed to send request to Sheets API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?;

        Ok(())
    }

    /// シートの先頭から行を上書きする。
    pub async fn write_rows(&self, rows: &[Vec<CellValue>]) -> Result<()> {
        self.client
            .put(self.values_url(&self.range_from(1), "")?)
            .bearer_auth(&self.api_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&ValueRangeBody {
                major_dimension: "ROWS",
                values: rows,
            })
            .send()
            .await
            .with_context(|| format!("Failed to send request to Sheets API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?;

        Ok(())
    }
}

/// エントリーをGoogle Sheetsに保存する。
///
/// 変更のたびにシート全体を読み込み直す。他のユーザーによる同時編集は検知しない。
pub struct SheetStore {
    client: SheetsClient,
    entries: Vec<TimeEntry>,
    has_header: bool,
}

impl SheetStore {
    /// シートを読み込んで新しい`SheetStore`を返す。
    pub async fn connect(client: SheetsClient) -> Result<Self> {
        let mut store = Self {
            client,
            entries: vec![],
            has_header: false,
        };
        store.reload().await?;

        Ok(store)
    }

    /// シート全体を読み込み直す。
    async fn reload(&mut self) -> Result<()> {
        let (has_header, rows) = parse_sheet_rows(self.client.read_rows().await?)?;
        self.entries = rows
            .iter()
            .map(EntryRow::to_entry)
            .collect::<Result<Vec<_>>>()?;
        self.has_header = has_header;
        info!("Loaded {} entries from the sheet", self.entries.len());

        Ok(())
    }
}

/// シートの行をヘッダーの有無とデータ行に分ける。
///
/// 空の行は無視する。
fn parse_sheet_rows(rows: Vec<Vec<String>>) -> Result<(bool, Vec<EntryRow>)> {
    let has_header = rows
        .first()
        .and_then(|row| row.first())
        .map(|cell| cell.trim() == HEADER[0])
        .unwrap_or(false);

    let entry_rows = rows
        .iter()
        .enumerate()
        .skip(usize::from(has_header))
        .filter(|(_, cells)| cells.iter().any(|cell| !cell.trim().is_empty()))
        .map(|(i, cells)| {
            EntryRow::from_cells(cells).with_context(|| format!("Invalid sheet row {}", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((has_header, entry_rows))
}

impl EntryStore for SheetStore {
    async fn append(&mut self, entry: TimeEntry) -> Result<()> {
        let mut rows = vec![];
        if !self.has_header && self.entries.is_empty() {
            rows.push(header_cells());
        }
        rows.push(row_cells(&EntryRow::from(&entry)));
        self.client
            .append_rows(&rows)
            .await
            .context("Failed to append row to the sheet")?;

        self.reload().await
    }

    async fn delete(&mut self, indices: &BTreeSet<usize>) -> Result<Vec<TimeEntry>> {
        let (_, rows) = parse_sheet_rows(self.client.read_rows().await?)?;
        let (kept, removed) = split_by_indices(rows, indices);

        let mut values = vec![header_cells()];
        values.extend(kept.iter().map(row_cells));
        // 上書きしてから余った末尾の行を消す。途中で失敗してもシートは空にならない
        self.client
            .write_rows(&values)
            .await
            .context("Failed to write rows to the sheet")?;
        self.client
            .clear_from(values.len() + 1)
            .await
            .context("Failed to clear leftover rows of the sheet")?;
        self.reload().await?;

        removed.iter().map(EntryRow::to_entry).collect()
    }

    async fn list(&self) -> Result<Vec<TimeEntry>> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, NaiveTime};
    use mockito::Matcher;
    use rstest::rstest;
    use serde_json::json;

    use super::{SheetStore, SheetsClient};
    use crate::entry_store::EntryStore;
    use crate::time_entry::TimeEntry;

    const VALUES_PATH: &str = "/spreadsheets/sheet-id/values/'Sheet1'!A:I";
    const WRITE_PATH: &str = "/spreadsheets/sheet-id/values/'Sheet1'!A1:I";

    fn entry(member: &str, day: u32) -> TimeEntry {
        TimeEntry::new(
            member,
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            15,
        )
        .unwrap()
    }

    fn header() -> serde_json::Value {
        json!([
            "Barn Team Member",
            "Date",
            "Month",
            "Pay Period",
            "Start",
            "End",
            "Hours Worked",
            "Hourly Rate",
            "Pay"
        ])
    }

    fn row(member: &str, day: u32) -> serde_json::Value {
        json!([
            member,
            format!("01/{:02}/24", day),
            "January 2024",
            "Pay Period 1",
            "09:00 AM",
            "11:30 AM",
            "2.5",
            "15",
            "37.5"
        ])
    }

    fn written_row(member: &str, day: u32) -> serde_json::Value {
        json!([
            member,
            format!("01/{:02}/24", day),
            "January 2024",
            "Pay Period 1",
            "09:00 AM",
            "11:30 AM",
            2.5,
            15,
            37.5
        ])
    }

    fn client(server: &mockito::Server) -> SheetsClient {
        SheetsClient::with_token(&server.url(), "token", "sheet-id", "Sheet1")
    }

    #[tokio::test]
    async fn test_connect_skips_header_and_blank_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", VALUES_PATH)
            .match_header("authorization", "Bearer token")
            .match_query(Matcher::UrlEncoded("majorDimension".into(), "ROWS".into()))
            .with_status(200)
            .with_body(
                json!({
                    "range": "Sheet1!A1:I4",
                    "majorDimension": "ROWS",
                    "values": [header(), row("Sky", 5), [], row("Mia", 10)]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = SheetStore::connect(client(&server)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            store.list().await.unwrap(),
            vec![entry("Sky", 5), entry("Mia", 10)]
        );
    }

    /// 空のシートに追加する場合はヘッダーも書き込むことを確認する。
    #[tokio::test]
    async fn test_append_to_empty_sheet() {
        let mut server = mockito::Server::new_async().await;
        let read = server
            .mock("GET", VALUES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"range": "Sheet1!A1:I1000", "majorDimension": "ROWS"}).to_string())
            .expect(2)
            .create_async()
            .await;
        let append = server
            .mock("POST", "/spreadsheets/sheet-id/values/'Sheet1'!A:I:append")
            .match_header("authorization", "Bearer token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()),
                Matcher::UrlEncoded("insertDataOption".into(), "INSERT_ROWS".into()),
            ]))
            .match_body(Matcher::Json(json!({
                "majorDimension": "ROWS",
                "values": [header(), written_row("Sky", 5)]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut store = SheetStore::connect(client(&server)).await.unwrap();
        store.append(entry("Sky", 5)).await.unwrap();

        read.assert_async().await;
        append.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_rewrites_sheet() {
        let mut server = mockito::Server::new_async().await;
        let read = server
            .mock("GET", VALUES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "range": "Sheet1!A1:I4",
                    "majorDimension": "ROWS",
                    "values": [header(), row("A", 1), row("B", 2), row("C", 3)]
                })
                .to_string(),
            )
            .expect(3)
            .create_async()
            .await;
        let write = server
            .mock("PUT", WRITE_PATH)
            .match_query(Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()))
            .match_body(Matcher::Json(json!({
                "majorDimension": "ROWS",
                "values": [header(), written_row("A", 1), written_row("C", 3)]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        // ヘッダーと残った2行を書き込んだ後、4行目以降を消去する
        let clear = server
            .mock("POST", "/spreadsheets/sheet-id/values/'Sheet1'!A4:I:clear")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut store = SheetStore::connect(client(&server)).await.unwrap();
        let removed = store.delete(&BTreeSet::from([1])).await.unwrap();

        read.assert_async().await;
        write.assert_async().await;
        clear.assert_async().await;
        assert_eq!(removed, vec![entry("B", 2)]);
    }

    /// 書き込みに失敗した場合はシートを消去しないことを確認する。
    #[tokio::test]
    async fn test_delete_write_error_keeps_sheet() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", VALUES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"values": [header(), row("A", 1), row("B", 2), row("C", 3)]}).to_string(),
            )
            .create_async()
            .await;
        server
            .mock("PUT", WRITE_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let clear = server
            .mock("POST", Matcher::Regex(":clear$".to_string()))
            .expect(0)
            .create_async()
            .await;

        let mut store = SheetStore::connect(client(&server)).await.unwrap();
        let result = store.delete(&BTreeSet::from([1])).await;

        assert!(result.is_err());
        clear.assert_async().await;
        assert_eq!(
            store.list().await.unwrap(),
            vec![entry("A", 1), entry("B", 2), entry("C", 3)]
        );
    }

    #[rstest]
    #[case::plain("Sheet1", "/v4/spreadsheets/sheet-id/values/'Sheet1'!A:I")]
    #[case::space("Barn Log", "/v4/spreadsheets/sheet-id/values/'Barn%20Log'!A:I")]
    #[case::apostrophe("Sky's", "/v4/spreadsheets/sheet-id/values/'Sky''s'!A:I")]
    #[case::punctuation("Jan-2024", "/v4/spreadsheets/sheet-id/values/'Jan-2024'!A:I")]
    fn test_values_url_quotes_sheet_name(#[case] sheet_name: &str, #[case] expected: &str) {
        let client = SheetsClient::with_token(
            "https://sheets.googleapis.com/v4",
            "token",
            "sheet-id",
            sheet_name,
        );

        let url = client.values_url(&client.full_range(), "").unwrap();

        assert_eq!(url.path(), expected);
    }

    #[tokio::test]
    async fn test_connect_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", VALUES_PATH)
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        assert!(SheetStore::connect(client(&server)).await.is_err());
    }

    #[tokio::test]
    async fn test_connect_invalid_row() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", VALUES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"values": [header(), ["Sky", "01/05/24"]]}).to_string())
            .create_async()
            .await;

        assert!(SheetStore::connect(client(&server)).await.is_err());
    }
}
