pub mod confirmation;
pub mod date;
pub mod store;
pub mod task;
