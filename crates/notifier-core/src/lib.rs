//! notifier-core
//!
//! Queue-backed notification pipeline for the course platform: request
//! handlers enqueue events, one worker turns them into emails, and a periodic
//! scan reminds facilitators about missing weekly activity logs.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, event, records, week, errors）
//! - **ports**: 抽象化レイヤー（EventQueue, Directory, Mailer, Clock）
//! - **impls**: 実装（InMemory / Redis / Postgres / HTTP）
//! - **app**: アプリケーションロジック（notifier, dispatcher, scanner, worker_loop, builder）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use self::app::{
    DispatchOutcome, Dispatcher, NotificationService, Notifier, NotifierBuilder, OverdueScanner,
    SweepReport, WorkerCounts, WorkerHandle, WorkerLoop,
};
pub use self::config::NotifierConfig;
pub use self::domain::{NotificationEvent, NotifyError};
