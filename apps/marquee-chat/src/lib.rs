//! Terminal front end: one conversation, one turn per input line.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use marquee_service::{Error, MarqueeService};

const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

#[derive(Debug, Parser)]
#[command(
	version = marquee_cli::VERSION,
	rename_all = "kebab",
	styles = marquee_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Resume a thread id instead of starting a new conversation.
	#[arg(long, value_name = "ID")]
	pub thread_id: Option<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = marquee_config::load(&args.config)?;

	init_tracing(&config.service.log_level);

	let service = MarqueeService::connect(&config).await?;
	let thread_id = args.thread_id.unwrap_or_else(|| service.start_conversation());
	let mut stdout = io::stdout();
	let mut lines = BufReader::new(io::stdin()).lines();

	stdout
		.write_all(format!("Thread {thread_id}. Type `quit` to leave.\n> ").as_bytes())
		.await?;
	stdout.flush().await?;

	while let Some(line) = lines.next_line().await? {
		let input = line.trim();

		if EXIT_COMMANDS.contains(&input.to_ascii_lowercase().as_str()) {
			break;
		}
		if !input.is_empty() {
			let reply = match service.chat(&thread_id, input).await {
				Ok(response) => response.answer,
				// A failed turn keeps the session alive; the next line starts a new turn.
				Err(err @ (Error::Timeout { .. } | Error::IterationLimit { .. })) =>
					format!("Sorry, I could not finish that request: {err}"),
				Err(err) => format!("Error: {err}"),
			};

			stdout.write_all(format!("{reply}\n").as_bytes()).await?;
		}

		stdout.write_all(b"> ").await?;
		stdout.flush().await?;
	}

	tracing::info!(thread_id = %thread_id, "Chat session closed.");

	Ok(())
}

/// Logs go to stderr so they do not interleave with replies.
pub fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
