pub mod config;
pub mod logging;

pub mod disk;
pub mod fallback;
pub mod fetch;
pub mod fetch_head;
pub mod ledger;
pub mod orchestrator;
pub mod progress;
pub mod source;
pub mod storage;
pub mod url_model;
pub mod validate;
