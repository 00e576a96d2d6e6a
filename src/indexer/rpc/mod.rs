pub mod blocks;
pub mod client;
pub mod receipts;
