//! 시간대 기준 조회 구간 계산.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// 기본 조회 시간대.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Asia::Taipei;

/// epoch 밀리초 기반 조회 구간 (양 끝 포함).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DateRange {
    /// 주어진 시각이 속한 달의 1일 00:00 부터 해당 시각까지의 구간을 계산합니다.
    pub fn month_to_date(now: DateTime<Utc>, tz: Tz) -> Self {
        let local = now.with_timezone(&tz);
        let start = tz
            .with_ymd_and_hms(local.year(), local.month(), 1, 0, 0, 0)
            .earliest()
            // 자정이 존재하지 않는 시간대 전환일은 현재 시각 기준으로 대체
            .unwrap_or(local);

        Self {
            start_ms: start.timestamp_millis(),
            end_ms: now.timestamp_millis(),
        }
    }

    /// 현재 시각 기준 이번 달 구간.
    pub fn current_month(tz: Tz) -> Self {
        Self::month_to_date(Utc::now(), tz)
    }
}

/// epoch 밀리초 문자열을 UTC 시각으로 변환합니다.
pub fn parse_epoch_millis(value: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = value.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_to_date_in_taipei() {
        // 2024-03-15 04:00 UTC = 2024-03-15 12:00 Asia/Taipei
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 4, 0, 0).unwrap();
        let range = DateRange::month_to_date(now, DEFAULT_TIME_ZONE);

        // 2024-03-01 00:00 +08:00 = 2024-02-29 16:00 UTC
        let expected_start = Utc.with_ymd_and_hms(2024, 2, 29, 16, 0, 0).unwrap();
        assert_eq!(range.start_ms, expected_start.timestamp_millis());
        assert_eq!(range.end_ms, now.timestamp_millis());
    }

    #[test]
    fn test_month_boundary_uses_local_month() {
        // 2024-03-31 20:00 UTC 는 타이베이 기준 이미 4월 1일
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 20, 0, 0).unwrap();
        let range = DateRange::month_to_date(now, DEFAULT_TIME_ZONE);

        let expected_start = Utc.with_ymd_and_hms(2024, 3, 31, 16, 0, 0).unwrap();
        assert_eq!(range.start_ms, expected_start.timestamp_millis());
    }

    #[test]
    fn test_parse_epoch_millis() {
        let parsed = parse_epoch_millis("1700000000000").unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
        assert!(parse_epoch_millis("not-a-number").is_none());
        assert!(parse_epoch_millis("").is_none());
    }
}
