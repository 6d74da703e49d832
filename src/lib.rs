//! School Attendance Console
//!
//! Backend for the attendance admin console. It talks to the remote
//! attendance service over HTTP and owns the console's view state: the
//! per-student status messages driven by fingerprint enroll/delete command
//! polling, the cached roster, list filtering, CSV export and parent
//! notification links.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
