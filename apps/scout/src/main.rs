use clap::Parser;

use scout::Args;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	scout::run(Args::parse())
}
