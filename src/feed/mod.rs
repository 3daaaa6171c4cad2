pub mod client;

pub use client::{FeedClient, FeedError, Instrument, Quote};
