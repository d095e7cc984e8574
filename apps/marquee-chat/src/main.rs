use clap::Parser;

use marquee_chat::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	marquee_chat::run(args).await
}
