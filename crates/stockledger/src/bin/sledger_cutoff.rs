//! sledger-cutoff - Inspect and move the block-period cutoff.

fn main() -> std::process::ExitCode {
    stockledger::cmd::cutoff_cmd::main()
}
