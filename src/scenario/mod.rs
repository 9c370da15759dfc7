pub mod composer;
pub mod selection;
pub mod transforms;
