pub mod fees;
pub mod operations;
pub mod transactions;
