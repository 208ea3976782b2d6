pub mod channel;
pub mod shorts;
