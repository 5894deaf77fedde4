//! 사용자 응답 메시지 템플릿.

use rust_decimal::Decimal;

pub const VERIFY_COMMAND: &str = "/verify";
pub const VOLUME_COMMAND: &str = "/volume";
pub const ACCOUNT_COMMAND: &str = "/account";
pub const STATUS_COMMAND: &str = "/status";
pub const START_COMMAND: &str = "/start";
pub const HELP_COMMAND: &str = "/help";

pub const WELCOME_MESSAGE: &str = "🦀 VIP 커뮤니티에 오신 것을 환영합니다!

가입 절차:
1️⃣ 파트너 링크로 거래소 계정을 등록하세요
2️⃣ 봇에게 UID를 보내 인증하세요
⚠️ 초대 링크는 1회용입니다

/start          - 봇 사용 시작
/help           - 전체 명령어 안내
/verify <uid>   - UID 인증
/volume <uid>   - 이번 달 거래량 조회
/account <uid>  - 텔레그램 계정 바인딩 변경";

pub const HELP_MESSAGE: &str = "```
/start          - 봇 사용 시작
/help           - 전체 명령어 안내
/status <uid>   - 현재 텔레그램 계정 상태 조회
/verify <uid>   - UID 인증 (숫자 UID 입력)
/volume <uid>   - 이번 달 거래량 조회
/account <uid>  - 텔레그램 계정 바인딩 변경
```";

pub const UNKNOWN_TEXT_MESSAGE: &str = "명령어를 인식하지 못했습니다. /help 로 사용 가능한 명령어를 확인하세요.";

pub const PROCESSING_MESSAGE: &str = "UID를 인증하는 중입니다. 잠시만 기다려 주세요...";
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "인증 서비스를 일시적으로 사용할 수 없습니다. 잠시 후 다시 시도해 주세요❌";
pub const INTERNAL_ERROR_MESSAGE: &str = "서버 처리 중 오류가 발생했습니다. 잠시 후 다시 시도해 주세요";

pub const VERIFY_SUCCESS_MESSAGE: &str = "🦀 인증에 성공했습니다! ✅\n아래는 커뮤니티 및 VIP 그룹 초대 링크입니다";
pub const UID_NOT_FOUND_MESSAGE: &str = "🦀 입력하신 UID가 존재하지 않아 인증에 실패했습니다❌ 확인 후 다시 입력해 주세요";
pub const UID_ALREADY_VERIFIED_MESSAGE: &str = "🦀 이미 인증된 UID입니다. 다시 인증할 필요가 없습니다! ✅";
pub const SOCIAL_ALREADY_BOUND_MESSAGE: &str = "🦀 이미 텔레그램 계정이 바인딩되어 있습니다. /account 로 바인딩을 변경해 주세요❌";
pub const ALREADY_REGISTERED_MESSAGE: &str = "🦀 이미 등록된 고객입니다❌";
pub const NOTHING_TO_UPDATE_MESSAGE: &str = "🦀 이 UID에 바인딩된 계정 정보는 변경할 내용이 없습니다";
pub const MEMBER_INFO_UPDATED_MESSAGE: &str = "🦀 계정 정보가 성공적으로 업데이트되었습니다✅";
pub const BINDING_NOT_FOUND_MESSAGE: &str = "🦀 이 UID로 인증된 기록이 없습니다. 먼저 /verify 로 인증해 주세요❌";

/// 명령 형식 안내 메시지.
pub fn invalid_command_format(command: &str) -> String {
    format!("❌ 올바른 형식을 사용해 주세요: {command} <UID>\n예시: {command} 123456")
}

/// 잘못된 UID 형식 안내 메시지.
pub fn invalid_uid_format(command: &str) -> String {
    format!("❌ 유효하지 않은 UID 형식입니다\n예시: {command} 123456")
}

/// 비활성 바인딩 안내 메시지.
pub fn inactive_binding(uid: &str) -> String {
    format!(
        "🦀 이 UID에 바인딩된 계정이 비활성 상태입니다. /volume {uid} 로 거래량 기준 충족 여부를 확인하거나 그룹 관리자에게 문의해 주세요❌"
    )
}

/// 거래량 조회 결과 메시지. 소수점 둘째 자리까지 표시합니다.
pub fn volume_reply(total: Decimal) -> String {
    format!(
        "🔎 조회 성공! 이번 달 1일부터 오늘까지의 거래량: USDT${:.2}",
        total.round_dp(2)
    )
}

/// 멤버 상태 조회 결과 메시지.
pub fn member_status_reply(uid: &str, role_label: &str) -> String {
    format!("⚠️ UID {uid} 로 조회한 텔레그램 그룹 상태: {role_label}")
}

/// 금지 패턴 게시 경고 메시지.
pub fn user_warning(mention: &str) -> String {
    format!(
        "⚠️ @{mention} 그룹에서 명령어, 텔레그램 링크, 웹 링크, UID 등 민감한 정보를 보내지 말아 주세요. 협조 감사합니다"
    )
}
