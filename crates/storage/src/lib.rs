#![forbid(unsafe_code)]

pub mod json;
pub mod record;
pub mod repository;

pub use record::BankRecord;
pub use repository::{BankSource, InMemoryBankSource, Storage, StorageError};
