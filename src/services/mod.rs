pub mod attendance_api;
pub mod export;
pub mod filter;
pub mod notify;
pub mod poll_registry;
pub mod poller;
pub mod roster;
pub mod status_board;
pub mod workflow;
