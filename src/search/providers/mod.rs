pub mod google;

pub use google::{parse_response, GoogleSearchProvider};
