use std::process::ExitCode;

use caseview::ui::output;

fn main() -> ExitCode {
    match caseview::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
