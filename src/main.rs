//! `agentcore-session`: list and invoke tools on a hosted MCP runtime.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use agentcore_session::auth::{
    refresh_if_needed, CognitoRefresher, CredentialProvider, RequestAuth, SdkCredentialProvider,
};
use agentcore_session::config::{load_or_default, AuthMode, ConfigOverrides};
use agentcore_session::parameters::{ParameterSource, ParameterStore};
use agentcore_session::session::{
    ReqwestTransport, SessionClient, SessionError, ToolCallResult, ToolInvocation,
};

#[derive(Parser, Debug)]
#[command(name = "agentcore-session", version, about = "Call tools on a hosted MCP runtime")]
struct Cli {
    /// YAML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    region: Option<String>,
    /// Runtime ARN; looked up in the parameter store when omitted.
    #[arg(long, global = true)]
    runtime_arn: Option<String>,
    #[arg(long, global = true)]
    qualifier: Option<String>,
    #[arg(long, global = true, value_enum)]
    auth: Option<AuthMode>,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a session and list the available tools.
    List,
    /// Create a session and call one tool.
    Call {
        tool: String,
        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Create a session and run the demo batch of tool calls.
    InvokeAll,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    agentcore_session::init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_or_default(cli.config.as_deref())?;
    config.apply_overrides(ConfigOverrides {
        region: cli.region,
        runtime_arn: cli.runtime_arn,
        qualifier: cli.qualifier,
        auth: cli.auth,
    });

    let sdk = config.load_sdk_config().await;
    let region = config.resolve_region(&sdk)?;
    let transport = ReqwestTransport::with_timeout(config.request_timeout())?;
    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(SdkCredentialProvider::from_sdk_config(&sdk)?);
    let store = ParameterStore::new(&sdk);

    tracing::info!(region = %region, auth = ?config.auth, "starting");

    let runtime_arn = match config.runtime_arn.clone() {
        Some(arn) => arn,
        None => store
            .get_parameter(config.runtime_arn_parameter())
            .await
            .context("failed to resolve runtime ARN")?,
    };

    let auth = match config.auth {
        AuthMode::Sigv4 => RequestAuth::sigv4(credentials),
        AuthMode::Bearer => {
            let secret = store
                .get_bearer_secret(&config.bearer_secret)
                .await
                .context("failed to load bearer credentials")?;
            let refresher = CognitoRefresher::new(&sdk);
            let token = refresh_if_needed(
                &secret.bearer_token,
                &secret.client_id,
                &secret.refresh_token,
                &refresher,
                chrono::Utc::now(),
            )
            .await?;
            RequestAuth::bearer(token)
        }
    };

    let endpoint = config.endpoint(&region, &runtime_arn);
    println!("Connecting to: {}", endpoint.url());

    let mut client = SessionClient::new(endpoint, auth, transport);
    let tools = client.connect().await?;
    println!("Session: {}", client.session_id().unwrap_or("-"));

    match cli.command {
        Command::List => {
            println!("\nAvailable tools:");
            for tool in &tools {
                println!("  {}: {}", tool.name, tool.description);
            }
        }
        Command::Call { tool, args } => {
            let arguments: serde_json::Value =
                serde_json::from_str(&args).context("--args must be valid JSON")?;
            let call = ToolInvocation::new(&tool, arguments)?;
            let result = client.invoke_tool(&call.name, &call.arguments).await?;
            print_result(&result);
        }
        Command::InvokeAll => {
            let outcomes = client.invoke_batch(&demo_batch()?).await;
            for outcome in outcomes {
                println!("\n{}:", outcome.tool_name);
                match outcome.outcome {
                    Ok(result) => print_result(&result),
                    Err(e) => println!("  Error: {e}"),
                }
            }
            println!("\nTool testing completed");
        }
    }

    Ok(())
}

fn demo_batch() -> Result<Vec<ToolInvocation>> {
    Ok(vec![
        ToolInvocation::new("add_numbers", serde_json::json!({"a": 5, "b": 3}))?,
        ToolInvocation::new("multiply_numbers", serde_json::json!({"a": 4, "b": 7}))?,
        ToolInvocation::new("greet_user", serde_json::json!({"name": "Alice"}))?,
    ])
}

fn print_result(result: &ToolCallResult) {
    let text = result.text.as_deref().unwrap_or("<no text content>");
    if result.success {
        println!("  Result: {text}");
    } else {
        println!("  Tool error: {text}");
    }
}

/// Bootstrap failures carry the raw response; show all of it.
fn report_failure(error: &anyhow::Error) {
    match error.downcast_ref::<SessionError>() {
        Some(
            SessionError::SessionCreationFailed {
                status,
                request_id,
                body,
            }
            | SessionError::ToolListFailed {
                status,
                request_id,
                body,
            },
        ) => {
            eprintln!("Error: {error}");
            eprintln!("  Status: {status}");
            eprintln!("  Request ID: {}", request_id.as_deref().unwrap_or("-"));
            eprintln!("  Body: {body}");
        }
        _ => eprintln!("Error: {error:#}"),
    }
}
