use std::process::ExitCode;

fn main() -> ExitCode {
    rentquote_cli::run()
}
