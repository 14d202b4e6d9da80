use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatbuddy")]
#[command(about = "Chatbuddy: LLM-backed skill webhook for chatbot platforms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file (persona and danger patterns spelled out).
    Init {
        /// Config file path (default: CHATBUDDY_CONFIG_PATH or ~/.chatbuddy/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway. Requires OPENAI_API_KEY (or llm.apiKey in the config file).
    Serve {
        /// Config file path (default: CHATBUDDY_CONFIG_PATH or ~/.chatbuddy/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default: PORT env, then config, then 5000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 0.0.0.0)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Send one utterance to a running gateway and print the reply text.
    Ask {
        /// Text to send as userRequest.utterance.
        utterance: String,

        /// Webhook URL of the running gateway.
        #[arg(long, default_value = "http://127.0.0.1:5000/chatbuddy")]
        url: String,

        /// Value for userRequest.user.id.
        #[arg(long, default_value = "chatbuddy-cli")]
        user: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to load .env: {}", e);
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chatbuddy {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { utterance, url, user }) => {
            if let Err(e) = run_ask(&url, &utterance, &user).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(chatbuddy::config::default_config_path);
    let dir = chatbuddy::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = chatbuddy::config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    config.gateway.port = match port {
        Some(p) => p,
        None => chatbuddy::config::resolve_port(&config)?,
    };
    if let Some(b) = bind {
        config.gateway.bind = b;
    }
    log::info!(
        "starting gateway on {}:{}",
        config.gateway.bind,
        config.gateway.port
    );
    chatbuddy::gateway::run_gateway(config).await
}

async fn run_ask(url: &str, utterance: &str, user: &str) -> anyhow::Result<()> {
    let body = serde_json::json!({
        "userRequest": {
            "utterance": utterance,
            "user": { "id": user }
        }
    });
    let res = reqwest::Client::new().post(url).json(&body).send().await?;
    if !res.status().is_success() {
        anyhow::bail!("gateway returned {}", res.status());
    }
    let envelope: serde_json::Value = res.json().await?;
    let text = envelope
        .pointer("/template/outputs/0/simpleText/text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("response is not a simpleText envelope: {}", envelope))?;
    println!("{}", text);
    Ok(())
}
