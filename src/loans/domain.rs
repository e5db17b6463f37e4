pub mod fine;
pub mod ledger;
pub mod model;
