pub mod args;
pub mod bootstrap;
pub mod config_loader;
pub mod inspect;
pub mod observability;
pub mod report;
