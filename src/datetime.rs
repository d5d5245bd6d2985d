use chrono::NaiveDate;
#[cfg(not(test))]
use chrono::Local;

#[cfg(not(test))]
/// Localタイムゾーンで今日の日付を取得する。
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}


#[cfg(test)]
pub use mock_datetime::today;
