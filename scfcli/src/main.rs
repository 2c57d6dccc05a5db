//! Command-line entry point.

use color_eyre::eyre::Result;
use scfcli::app::CliApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    CliApplication::from_cli()?.run()
}
