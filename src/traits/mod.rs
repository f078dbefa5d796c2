pub mod fetcher;

pub use fetcher::{FetchRequest, FetchResponse, Fetcher};
