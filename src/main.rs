use anyhow::Result;
use clap::Parser;
use workgate::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
