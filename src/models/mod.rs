pub mod attendance;
pub mod command;
pub mod student;
