pub mod calculator;
pub mod report;
pub mod silos;
