pub mod hashing;
pub mod storage;
