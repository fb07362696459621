pub mod caller;
pub mod share;

pub use caller::{Caller, CallerRecord, ProfileRecord};
pub use share::{ShareRecord, ShareState};
