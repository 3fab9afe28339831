//! Mockup Sherpa console.
//!
//! Reads one utterance per line from stdin and prints the reply. `/status`
//! shows the session summary, `/reset` starts over and `/quit` exits.

use tokio::io::{AsyncBufReadExt, BufReader};

use mockup_sherpa::application::{build_orchestrator, TurnRequest};
use mockup_sherpa::config::AppConfig;
use mockup_sherpa::domain::foundation::SessionId;
use mockup_sherpa::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.logging)?;

    let orchestrator = build_orchestrator(&config).await?;
    let session_id = SessionId::new();
    tracing::info!(session_id = %session_id, "Console session started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                let result = orchestrator.reset_session(session_id).await?;
                println!("{}", result.message);
            }
            "/status" => match orchestrator.session_status(session_id).await? {
                Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                None => println!("No conversation yet."),
            },
            utterance => {
                match orchestrator
                    .handle_turn(TurnRequest::for_session(session_id, utterance))
                    .await
                {
                    Ok(response) => println!("[{}] {}", response.phase.label(), response.message.text),
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    Ok(())
}
