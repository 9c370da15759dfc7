pub mod labels;
pub mod snapshot;
pub mod table;
