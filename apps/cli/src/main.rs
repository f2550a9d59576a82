use std::{path::PathBuf, sync::Arc, time::Duration};

use agent::{BaristaTools, SaveOrderArgs};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    fetch_connection_details, AgentEventDispatcher, OrderReceipt, SessionState, SessionUpdate,
    SessionView, WelcomeView,
};
use livekit_integration::{
    mint_token, LiveKitConfig, LiveKitRoomOptions, LiveKitRoomSession, LoopbackConnector,
    TokenGrants,
};
use shared::{
    config::AppConfig,
    protocol::{AgentDispatch, ConnectionDetailsRequest, RoomConfig, AGENT_EVENTS_TOPIC},
};
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

const DEMO_ROOM: &str = "voice_assistant_room_demo";
const DEMO_WAIT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "barista", about = "Voice barista session tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an agent event payload through the dispatcher and print the receipt.
    Receipt {
        #[arg(long, conflicts_with = "file")]
        payload: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = AGENT_EVENTS_TOPIC)]
        topic: String,
    },
    /// Mint a participant access token.
    Token {
        #[arg(long)]
        room: String,
        #[arg(long)]
        identity: String,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long, env = "LIVEKIT_API_KEY", default_value = "devkey")]
        api_key: String,
        #[arg(long, env = "LIVEKIT_API_SECRET", default_value = "devsecret")]
        api_secret: String,
        #[arg(long, default_value_t = 900)]
        ttl_seconds: i64,
    },
    /// Ask a running token server for connection details.
    Details {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server_url: String,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Play a full ordering session between an in-process agent and client.
    Demo {
        #[arg(long, default_value = "Sam")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Receipt {
            payload,
            file,
            topic,
        } => {
            let bytes = match (payload, file) {
                (Some(payload), _) => payload.into_bytes(),
                (None, Some(path)) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => bail!("pass --payload or --file"),
            };
            render_receipt(&bytes, &topic);
        }
        Command::Token {
            room,
            identity,
            agent,
            api_key,
            api_secret,
            ttl_seconds,
        } => {
            let cfg = LiveKitConfig {
                api_key,
                api_secret,
                ttl_seconds,
            };
            let token = mint_token(
                &cfg,
                &identity.into(),
                &room.into(),
                TokenGrants::default(),
                agent.as_deref(),
            )?;
            println!("{token}");
        }
        Command::Details { server_url, agent } => {
            let request = ConnectionDetailsRequest {
                room_config: agent.map(|agent_name| RoomConfig {
                    agents: vec![AgentDispatch {
                        agent_name: Some(agent_name),
                    }],
                }),
            };
            let details =
                fetch_connection_details(&reqwest::Client::new(), &server_url, &request).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Command::Demo { name } => run_demo(&name).await?,
    }

    Ok(())
}

fn render_receipt(payload: &[u8], topic: &str) {
    let dispatcher = AgentEventDispatcher::default();
    let mut receipt = OrderReceipt::new(dispatcher.notifier().subscribe());
    let mut state = SessionState::default();

    let outcome = dispatcher.handle(&mut state, payload, Some(topic));
    println!("dispatch: {outcome:?}");
    if let Some(image) = &state.generated_image {
        println!("image: {} ({})", image.url, image.prompt);
    }
    receipt.refresh();
    print!("{}", receipt.view());
}

async fn run_demo(customer: &str) -> Result<()> {
    let config = AppConfig::default();
    let welcome = WelcomeView::from_config(&config);
    println!("{}\n{}\n[{}]\n", welcome.title, welcome.tagline, welcome.start_button_text);

    let connector = LoopbackConnector::new();
    let agent_room: Arc<dyn LiveKitRoomSession> =
        connector.join(DEMO_ROOM, "barista-agent").await?;
    let session = SessionView::start(
        &connector,
        LiveKitRoomOptions {
            server_url: "loopback://local".into(),
            room_name: DEMO_ROOM.into(),
            identity: "voice_assistant_user_demo".into(),
            token: String::new(),
        },
        config,
    )
    .await?;
    let mut receipt = session.order_receipt();
    let mut updates = session.subscribe_updates();
    let guard = session.attach();

    let tools = BaristaTools::new(Some(agent_room));
    println!("agent: {}", tools.get_last_order().await);

    session.send_chat("A grande oat latte with vanilla, please").await?;
    let reply = tools
        .invoke(
            "show_image",
            serde_json::json!({
                "url": "https://images.example/grande-oat-latte.png",
                "prompt": "grande oat latte with vanilla"
            }),
        )
        .await?;
    println!("agent: {reply}");
    loop {
        let update = timeout(DEMO_WAIT, updates.recv())
            .await
            .context("timed out waiting for image preview")??;
        if let SessionUpdate::ImageChanged(Some(image)) = update {
            println!("client: showing image {}", image.url);
            break;
        }
    }

    let reply = tools
        .save_order(SaveOrderArgs {
            drink_type: "Latte".into(),
            size: "Grande".into(),
            milk: "Oat".into(),
            extras: vec!["Vanilla".into()],
            name: customer.to_string(),
        })
        .await;
    println!("agent: {reply}");

    timeout(DEMO_WAIT, receipt.next_order())
        .await
        .context("timed out waiting for the order")?
        .context("session closed before the order arrived")?;
    println!();
    print!("{}", receipt.view());

    guard.detach();
    session.leave().await?;
    Ok(())
}
