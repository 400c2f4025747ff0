mod client;
mod crawler;
mod extract;
mod links;
mod scheduler;
mod store;
mod tests;
mod types;
mod worker;

pub use crawler::{start_crawl, CrawlSettings};
pub use extract::FailurePolicy;
