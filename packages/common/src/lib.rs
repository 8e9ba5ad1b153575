pub mod config;
pub mod difficulty;
pub mod language_map;
pub mod retry;
pub mod storage;

pub use config::JudgeAppConfig;
pub use difficulty::Difficulty;
pub use language_map::LanguageMap;
