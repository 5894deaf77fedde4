//! 명령 워크플로.
//!
//! 거래소 조회와 저장소 트랜잭션을 결합해 명령 하나를 처리합니다.
//! 상태 흐름: 수신 → 검증 → 외부 조회 → {없음 | 저장 | 충돌} → 응답.
//! 어떤 단계도 자동 재시도하지 않습니다.

mod account;
mod status;
mod verify;
mod volume;

pub use account::AccountWorkflow;
pub use status::StatusWorkflow;
pub use verify::VerifyWorkflow;
pub use volume::VolumeWorkflow;
