pub mod state_log;

pub use state_log::StateLog;
