//! 명령 인자 검증.

use gatekeeper_core::messages::{invalid_command_format, invalid_uid_format};
use gatekeeper_core::{CommandError, CommandResult};

/// 인자 검증 함수.
pub type ArgPredicate = fn(&str) -> bool;

/// 명령 토큰 수와 인자 형식 검증기.
///
/// 토큰 수는 명령 토큰을 포함해서 셉니다. `max_args` 가 0이면 상한이 없습니다.
#[derive(Debug, Clone, Copy)]
pub struct CommandValidator {
    pub min_args: usize,
    pub max_args: usize,
    pub predicate: Option<ArgPredicate>,
}

impl CommandValidator {
    pub const fn new(min_args: usize, max_args: usize, predicate: Option<ArgPredicate>) -> Self {
        Self {
            min_args,
            max_args,
            predicate,
        }
    }

    /// `/command <uid>` 형식 검증기.
    pub const fn uid() -> Self {
        Self::new(2, 2, Some(is_numeric))
    }

    /// 텍스트를 검증하고 명령 토큰을 제외한 인자를 반환합니다.
    pub fn validate(&self, text: &str, command: &str) -> CommandResult<Vec<String>> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let count = tokens.len();

        if count < self.min_args || (self.max_args > 0 && count > self.max_args) {
            return Err(CommandError::invalid_format(invalid_command_format(command)));
        }

        let args = tokens.get(1..).unwrap_or_default();
        if let Some(predicate) = self.predicate {
            if args.iter().any(|arg| !predicate(arg)) {
                return Err(CommandError::invalid_format(invalid_uid_format(command)));
            }
        }

        Ok(args.iter().map(|arg| arg.to_string()).collect())
    }

    /// 단일 UID 인자를 검증하고 반환합니다.
    pub fn validate_uid(text: &str, command: &str) -> CommandResult<String> {
        Self::uid()
            .validate(text, command)?
            .into_iter()
            .next()
            .ok_or_else(|| CommandError::invalid_format(invalid_command_format(command)))
    }
}

/// 비어 있지 않은 ASCII 숫자열인지 확인합니다.
pub fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
