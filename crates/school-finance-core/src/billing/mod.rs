pub mod balance;
pub mod fees;
