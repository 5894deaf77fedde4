//! 고객 / 소셜 바인딩 / 트레이딩 바인딩 영속화.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `BindingStore` trait: 저장소 인터페이스
//! - PostgreSQL 구현 (`PgBindingStore`, sqlx 트랜잭션)
//! - 인메모리 구현 (`MemoryBindingStore`, 테스트 및 로컬 실행용)
//! - 고유 제약 위반을 타입이 있는 충돌 에러로 변환

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::*;
pub use memory::MemoryBindingStore;
pub use model::*;
pub use postgres::{Database, PgBindingStore};
pub use store::BindingStore;

/// 스키마 DDL (마이그레이션은 외부에서 관리).
pub const SCHEMA_SQL: &str = include_str!("../schema/bindings.sql");
