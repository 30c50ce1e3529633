pub mod identifier;
pub mod timestamp;

pub use identifier::Clip;
pub use timestamp::Timestamp;
