use calicoconv_core::convert_and_print;

use crate::loader;
use crate::prelude::{eprintln, *};
use crate::printer::{self, OutputFormat};

#[derive(Debug, clap::Parser)]
#[command(name = "convert")]
#[command(about = "Convert v1 resources to the v3 API")]
pub struct App {
    /// File holding the v1 resources, or "-" for stdin
    #[arg(short, long, env = "CALICOCONV_FILENAME")]
    filename: String,

    /// Output format
    #[arg(short, long, env = "CALICOCONV_OUTPUT", default_value = "yaml")]
    output: OutputFormat,
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Reading v1 resources from {}", app.filename);
    }

    let input = loader::read_input(&app.filename)?;
    let resources = loader::parse_resources(&input)
        .wrap_err_with(|| f!("Failed to load resources from {}", app.filename))?;
    log::debug!("Loaded {} v1 resources", resources.len());

    let mut printer = printer::for_format(app.output, anstream::stdout());
    convert_and_print(&resources, printer.as_mut())
        .wrap_err_with(|| f!("Failed to convert resources from {}", app.filename))?;

    Ok(())
}
