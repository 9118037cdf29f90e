mod dir;
mod http;

pub use dir::JsonDirSource;
pub use http::HttpBankSource;
