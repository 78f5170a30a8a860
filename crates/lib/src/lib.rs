//! listgate core library: whitelist, invocation resolution, caller authorization,
//! dispatch and the exit funnel shared by the wrapper binaries and the operator CLI.

pub mod caller;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod invocation;
pub mod launcher;
pub mod outcome;
pub mod report;
pub mod whitelist;
