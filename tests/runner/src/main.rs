use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    untyped_cts_runner::run()
}
