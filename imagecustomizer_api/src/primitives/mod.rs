pub mod bytes;
pub mod gpt;
pub mod paths;
pub(crate) mod shortcuts;
