//! App - アプリケーション層
//!
//! ports を組み合わせてパイプラインを実装します。
//!
//! # 主要コンポーネント
//! - **Notifier**: producer 側のハンドル（fire-and-forget の enqueue）
//! - **Dispatcher**: イベント 1 件をメール 1 通に変換して送信
//! - **OverdueScanner**: 未提出の週次ログを検出して reminder を積む
//! - **WorkerLoop**: dispatch と scan を独立した 2 タスクで回す
//! - **NotifierBuilder**: 起動時のワイヤリングと検証

pub mod builder;
pub mod dispatcher;
pub mod notifier;
pub mod scanner;
pub mod status;
pub mod templates;
pub mod worker_loop;

pub use self::builder::{BuildError, NotificationService, NotifierBuilder};
pub use self::dispatcher::{DispatchOutcome, Dispatcher};
pub use self::notifier::Notifier;
pub use self::scanner::{OverdueScanner, SweepReport};
pub use self::status::WorkerCounts;
pub use self::worker_loop::{WorkerHandle, WorkerLoop};
