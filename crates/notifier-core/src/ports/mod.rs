//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部システム（Redis, PostgreSQL, メール配信）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - Redis は配送キュー（シリアライズ済みイベントのみ）
//! - PostgreSQL は読み取り専用の参照先（CRUD 側が正本）
//! - メール送信は best-effort の出口

pub mod clock;
pub mod directory;
pub mod event_queue;
pub mod mailer;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::directory::{Directory, DirectoryError};
pub use self::event_queue::{EventQueue, QueueError};
pub use self::mailer::{DeliveryReceipt, MailError, Mailer, OutboundEmail};
