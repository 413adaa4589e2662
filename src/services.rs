pub mod confirmation;
pub mod tasks;
