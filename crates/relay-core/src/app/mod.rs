//! App - application layer.
//!
//! ポートを組み合わせてリレーのパイプラインを構成する。
//!
//! # Components
//! - **Dispatcher**: 1メッセージ分の lookup → translate → invoke → record → forward
//! - **OutcomeRecorder**: 試行結果の書き込み (1試行につき1回)
//! - **ResultForwarder**: callback / poison キューへの publish
//! - **DeliveryPolicy**: 失敗したメッセージをいつ諦めるか
//! - **Poller** / **PushHandler**: 2つのエントリポイント
//! - **RelayBuilder**: 配線

pub mod builder;
pub mod delivery_policy;
pub mod dispatcher;
pub mod forwarder;
pub mod poller;
pub mod push;
pub mod recorder;

pub use self::builder::{BuildError, Relay, RelayBuilder};
pub use self::delivery_policy::DeliveryPolicy;
pub use self::dispatcher::{Dispatcher, Disposition};
pub use self::forwarder::ResultForwarder;
pub use self::poller::{BatchReport, ERROR_BACKOFF, PollSettings, Poller, PollerHandle};
pub use self::push::PushHandler;
pub use self::recorder::OutcomeRecorder;
