pub mod detector;
pub mod processor;
pub mod queue;
pub mod storage;
