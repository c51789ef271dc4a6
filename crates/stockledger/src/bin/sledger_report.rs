//! sledger-report - Turnover sheets, period turnovers and balances.

fn main() -> std::process::ExitCode {
    stockledger::cmd::report_cmd::main()
}
