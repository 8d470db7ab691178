use std::process::ExitCode;

fn main() -> ExitCode {
    wl_cli::run()
}
