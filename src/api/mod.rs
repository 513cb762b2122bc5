mod client;
mod filter;
mod types;

pub use client::{ApiReply, CreateAiApi, HttpApiClient, classify_reply};
pub use filter::FilterExpr;
pub use types::*;
