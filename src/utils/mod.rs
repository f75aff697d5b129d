pub mod input;
pub mod storage;
