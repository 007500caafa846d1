mod args;

pub use args::{Cli, Command, InspectArgs, RenderArgs, SummarizerArgs};
