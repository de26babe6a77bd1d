use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use rdcheck::settings::{self, CliArgs};
use rdcheck::verification::Verification;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let settings = settings::load_config_with(&args)?;
    if args.dump_config {
        print!("{}", settings::to_toml(&settings)?);
        return Ok(());
    }
    log::debug!("{}", settings);

    let mut verification = Verification::new(settings)?;
    verification.solve()?;
    verification.writeup()?;

    verification.report.ensure()
}
