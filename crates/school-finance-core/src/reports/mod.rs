pub mod debtors;
