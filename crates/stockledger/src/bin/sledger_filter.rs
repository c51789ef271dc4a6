//! sledger-filter - Find items, groups, units and recipes by field or nested path.

fn main() -> std::process::ExitCode {
    stockledger::cmd::filter_cmd::main()
}
