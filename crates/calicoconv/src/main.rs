use crate::prelude::*;
use clap::Parser;

mod convert;
mod error;
mod kinds;
mod loader;
mod prelude;
mod printer;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Convert Calico v1 resource manifests to the projectcalico.org/v3 API"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "CALICOCONV_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Convert a v1 manifest to v3
    Convert(crate::convert::App),

    /// List the convertible kinds
    Kinds(crate::kinds::App),
}

fn main() -> Result<()> {
    let app = App::parse();

    let default_filter = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    color_eyre::install()?;

    match app.command {
        SubCommands::Convert(sub_app) => crate::convert::run(sub_app, app.global),
        SubCommands::Kinds(sub_app) => crate::kinds::run(sub_app, app.global),
    }
}
