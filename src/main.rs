//! Binary entrypoint for the document tree importer.

use std::process::ExitCode;

use doctree_import::start_import;

/// Run the import job named on the command line.
fn main() -> ExitCode {
    start_import::run()
}
