//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryEventQueue** / **RedisEventQueue**: 配送キュー
//! - **MemoryDirectory** / **PgDirectory**: 読み取り専用の参照先
//! - **LogMailer** / **MemoryMailer** / **HttpMailer**: メール送信

pub mod http_mailer;
pub mod inmem_queue;
pub mod log_mailer;
pub mod memory_directory;
pub mod memory_mailer;
pub mod pg_directory;
pub mod redis_queue;

pub use self::http_mailer::HttpMailer;
pub use self::inmem_queue::InMemoryEventQueue;
pub use self::log_mailer::LogMailer;
pub use self::memory_directory::MemoryDirectory;
pub use self::memory_mailer::MemoryMailer;
pub use self::pg_directory::PgDirectory;
pub use self::redis_queue::{DEFAULT_QUEUE_KEY, RedisEventQueue};
