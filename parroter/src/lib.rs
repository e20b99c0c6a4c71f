pub mod cache;
pub mod cli;
pub mod prompt;
pub mod session;
pub mod slack;
pub mod webdriver;

pub use cli::{run, Cli};
