pub mod app;
pub mod buckets;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod labels;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;
pub mod window;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use stats::{build_report, summarize};
pub use store::EventStore;
