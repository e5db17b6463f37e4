pub mod books;
pub mod borrowers;
pub mod circulation;
pub mod core;
pub mod gateway;
pub mod holds;
pub mod loans;
pub mod store;
pub mod utils;
