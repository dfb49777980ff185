//! UCI エンジンの起動・対話と、1 手分の探索をバックグラウンドで回すタスク。

pub mod error;
pub mod info;
pub mod limit;
pub mod process;
pub mod report;
pub mod search;

pub use error::EngineError;
pub use info::{InfoLine, InfoSnapshot, Score};
pub use limit::{SearchLimit, TimeDiscipline};
pub use process::{EngineConfig, EngineProcess};
pub use report::SearchReport;
pub use search::{SearchEvent, SearchRequest, SearchTask};
