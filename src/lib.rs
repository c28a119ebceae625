pub mod adapters;
pub mod classifier;
pub mod config;
pub mod feed;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod orchestrator;

pub use adapters::{GeminiAdapter, ModelError, OpenAiAdapter, TextModel};
pub use classifier::{Classification, Classifier, ModelClassifier};
pub use config::{Config, Credentials, ModelProvider};
pub use feed::{FederalRegisterClient, NoticeSource};
pub use ledger::{CsvLedger, Ledger};
pub use models::*;
pub use notifications::{build_digest, Digest, Notifier, ResendNotifier};
pub use orchestrator::{Orchestrator, RunPhase};
