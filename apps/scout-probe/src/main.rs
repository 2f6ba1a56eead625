use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = scout_probe::Args::parse();

	scout_probe::run(args).await
}
