pub mod call;
pub mod hms;

pub use call::VideoCallService;
pub use hms::HmsClient;
