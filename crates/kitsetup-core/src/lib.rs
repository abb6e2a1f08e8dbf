pub mod batch;
pub mod catalog;
pub mod document;
pub mod entry;
pub mod events;
pub mod executor;
pub mod resolver;
pub mod runner;
pub mod settings;
