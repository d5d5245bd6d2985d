use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveTime};

/// 選択可能な時刻の一覧を生成する。
///
/// `start`から`interval_minutes`分刻みで、`end`以下の時刻を返す。
///
/// # Arguments
///
/// * `start` - 最初の時刻
/// * `end` - 最後の時刻
/// * `interval_minutes` - 刻み幅(分)
pub fn generate_time_slots(
    start: NaiveTime,
    end: NaiveTime,
    interval_minutes: u32,
) -> Result<Vec<NaiveTime>> {
    if interval_minutes == 0 {
        bail!("Time slot interval must be greater than zero");
    }
    let interval = Duration::minutes(i64::from(interval_minutes));

    let mut slots = Vec::new();
    let mut current = start;
    while current <= end {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(interval);
        // 日付を跨いだら終了する
        if wrapped != 0 || next <= current {
            break;
        }
        current = next;
    }

    Ok(slots)
}

/// 時刻をパースする。
///
/// `13:30`の24時間表記と`01:30 PM`の12時間表記を受け付ける。
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&trimmed.to_uppercase(), "%I:%M %p"))
        .with_context(|| format!("Failed to parse time: {}", s))
}

/// 時刻を`01:30 PM`の形式で表示する。
pub fn format_time(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use rstest::rstest;

    use super::{format_time, generate_time_slots, parse_time};

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_generate_default_time_slots() {
        let slots = generate_time_slots(time(8, 30), time(22, 0), 30).unwrap();

        assert_eq!(slots.len(), 28);
        assert_eq!(slots.first(), Some(&time(8, 30)));
        assert_eq!(slots.get(1), Some(&time(9, 0)));
        assert_eq!(slots.last(), Some(&time(22, 0)));
    }

    #[rstest]
    #[case::end_not_on_grid(time(9, 0), time(10, 10), 30, vec![time(9, 0), time(9, 30), time(10, 0)])]
    #[case::single(time(9, 0), time(9, 0), 30, vec![time(9, 0)])]
    #[case::end_before_start(time(10, 0), time(9, 0), 30, vec![])]
    #[case::until_midnight(time(23, 0), time(23, 59), 30, vec![time(23, 0), time(23, 30)])]
    fn test_generate_time_slots(
        #[case] start: NaiveTime,
        #[case] end: NaiveTime,
        #[case] interval: u32,
        #[case] expected: Vec<NaiveTime>,
    ) {
        assert_eq!(generate_time_slots(start, end, interval).unwrap(), expected);
    }

    #[test]
    fn test_generate_time_slots_zero_interval() {
        assert!(generate_time_slots(time(9, 0), time(10, 0), 0).is_err());
    }

    #[rstest]
    #[case("09:00", time(9, 0))]
    #[case("13:30", time(13, 30))]
    #[case("01:30 PM", time(13, 30))]
    #[case("08:30 am", time(8, 30))]
    #[case(" 12:00 AM ", time(0, 0))]
    fn test_parse_time(#[case] input: &str, #[case] expected: NaiveTime) {
        assert_eq!(parse_time(input).unwrap(), expected);
    }

    #[rstest]
    #[case("25:00")]
    #[case("noon")]
    fn test_parse_time_invalid(#[case] input: &str) {
        assert!(parse_time(input).is_err());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(time(13, 30)), "01:30 PM");
        assert_eq!(format_time(time(8, 30)), "08:30 AM");
    }
}
