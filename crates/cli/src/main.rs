use std::process::ExitCode;

fn main() -> ExitCode {
    prodrev_cli::run()
}
