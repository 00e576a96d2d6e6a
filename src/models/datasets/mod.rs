pub mod operations;
pub mod transactions;
