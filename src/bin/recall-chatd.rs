use clap::Parser;
use recall_chat::config::Config;
use recall_chat::daemon;
use recall_chat::error::Result;

#[derive(Parser, Debug)]
#[command(name = "recall-chatd")]
#[command(about = "Chat endpoint with replayed history and optional web search")]
struct Cli {
    /// JSON config file; provider settings come from the environment when omitted.
    #[arg(long, env = "RECALL_CHAT_CONFIG")]
    config: Option<String>,

    #[arg(long, env = "HOST")]
    host: Option<String>,

    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    recall_chat::logging::init_tracing("recall_chatd");
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env(),
    };
    let mut server = config.server.take().unwrap_or_default();
    if cli.host.is_some() {
        server.host = cli.host;
    }
    if cli.port.is_some() {
        server.port = cli.port;
    }
    config.server = Some(server);

    daemon::run(config).await
}
