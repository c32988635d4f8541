pub mod client;
pub mod error;
pub mod feed;
pub mod scorer;

pub use client::NewsClient;
pub use error::NewsError;
pub use scorer::lexicon_score;
