//! Bitget 제휴 API 요청/응답 타입.

use crate::error::ExchangeError;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;

/// 성공 응답 코드.
pub const SUCCESS_CODE: &str = "00000";

const DEFAULT_PAGE_NO: &str = "1";
const DEFAULT_PAGE_SIZE: &str = "100";

/// 공통 응답 봉투 `{code, msg, data}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

impl<T: DeserializeOwned> ApiEnvelope<Vec<T>> {
    /// 응답 본문을 해석하고 성공 코드를 확인한 뒤 데이터 목록을 반환합니다.
    ///
    /// `data` 가 null 이면 빈 목록입니다.
    pub fn parse_list(body: &str) -> Result<Vec<T>, ExchangeError> {
        let envelope: ApiEnvelope<Vec<T>> = serde_json::from_str(body)?;
        if !envelope.is_success() {
            return Err(ExchangeError::ApiError {
                code: envelope.code,
                message: envelope.msg,
            });
        }
        Ok(envelope.data.unwrap_or_default())
    }
}

/// 제휴 고객 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub uid: String,
    /// 가입 시각 (epoch 밀리초 문자열)
    #[serde(default)]
    pub register_time: String,
}

/// 기간별 고객 거래량.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerVolume {
    pub uid: String,
    /// 거래량 (API 필드명 철자 그대로)
    #[serde(rename = "volumn")]
    pub volume: String,
    /// 집계 시각 (epoch 밀리초 문자열)
    #[serde(default)]
    pub time: String,
}

impl CustomerVolume {
    pub fn volume_decimal(&self) -> Result<Decimal, ExchangeError> {
        Decimal::from_str(self.volume.trim()).map_err(|e| {
            ExchangeError::ParseError(format!("invalid volume '{}': {}", self.volume, e))
        })
    }
}

/// 제휴 고객 조회 요청 본문.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListRequest<'a> {
    pub uid: &'a str,
    pub page_no: &'a str,
    pub page_size: &'a str,
}

impl<'a> CustomerListRequest<'a> {
    pub fn new(uid: &'a str) -> Self {
        Self {
            uid,
            page_no: DEFAULT_PAGE_NO,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// 고객 거래량 조회 요청 본문. 시각은 epoch 밀리초 문자열입니다.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTradeVolumeRequest<'a> {
    pub uid: &'a str,
    pub start_time: String,
    pub end_time: String,
    pub page_no: &'a str,
    pub page_size: &'a str,
}

impl<'a> CustomerTradeVolumeRequest<'a> {
    pub fn new(uid: &'a str, start_ms: i64, end_ms: i64) -> Self {
        Self {
            uid,
            start_time: start_ms.to_string(),
            end_time: end_ms.to_string(),
            page_no: DEFAULT_PAGE_NO,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// 거래량 목록을 decimal 로 정확히 합산합니다.
pub fn sum_volumes(entries: &[CustomerVolume]) -> Result<Decimal, ExchangeError> {
    entries
        .iter()
        .try_fold(Decimal::ZERO, |acc, entry| -> Result<Decimal, ExchangeError> {
            acc.checked_add(entry.volume_decimal()?)
                .ok_or_else(|| ExchangeError::ParseError("volume sum overflow".to_string()))
        })
}
