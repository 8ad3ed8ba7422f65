pub mod cli;
pub mod console;
pub mod decl;
pub mod emit;
pub mod extract;
pub mod generators;
pub mod nested;
pub mod resources;

use std::process::ExitCode;

fn main() -> ExitCode {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
