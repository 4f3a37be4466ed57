pub mod aggregate;
pub mod cli;
pub mod coverage;
pub mod error;
pub mod jacoco;
pub mod layout;
pub mod merge;
pub mod model;
pub mod report;
pub mod tool;
