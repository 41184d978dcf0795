pub mod commands;
pub mod model;
pub mod report;
pub mod syntax;
