pub mod add;
pub mod install;
pub mod list;
pub mod remove;
pub mod settings;
pub mod silent_args;
pub mod source;
pub mod transfer;
