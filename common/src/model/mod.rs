pub mod ledger;
pub mod merge;
pub mod place_holder;
pub mod status;
