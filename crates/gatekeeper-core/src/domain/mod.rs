//! 멤버십 인증을 위한 도메인 모델.

mod context;
mod customer;
mod platform;

pub use context::*;
pub use customer::*;
pub use platform::*;
