//! tipbot - command-line entry point
//!
//! ```text
//! tipbot [--env dev] balance <account>
//! tipbot [--env dev] tip <from> <to> <amount> [--private]
//! ```
//!
//! Wiring:
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌─────────────┐    ┌──────────┐
//! │  Config  │───▶│ Orchestrator │───▶│ RateLimiter │───▶│ EthLedger│
//! │  (YAML)  │    │ (gate, FSM)  │    │ (1 req/sec) │    │  (RPC)   │
//! └──────────┘    └──────────────┘    └─────────────┘    └──────────┘
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};

use tipbot::config::AppConfig;
use tipbot::core_types::AccountId;
use tipbot::ledger::{EthLedger, TxSigner};
use tipbot::rate_limiter::RateLimiter;
use tipbot::tip::{
    ChatKind, OutcomeReporter, RequestContext, TipOrchestrator, TransferOutcome, TransferRequest,
};

// ============================================================
// ARGUMENTS
// ============================================================

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn use_private_chat() -> bool {
    std::env::args().any(|a| a == "--private")
}

/// Positional arguments, with flags and their values removed
fn get_positional() -> Vec<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--env" | "-e" => i += 2,
            "--private" => i += 1,
            _ => {
                out.push(args[i].clone());
                i += 1;
            }
        }
    }
    out
}

fn parse_account(s: &str) -> anyhow::Result<AccountId> {
    s.parse()
        .with_context(|| format!("invalid account id: {}", s))
}

enum Command {
    Balance(AccountId),
    Tip {
        from: AccountId,
        to: AccountId,
        amount: String,
    },
}

fn parse_command() -> anyhow::Result<Command> {
    let args = get_positional();
    match args.first().map(String::as_str) {
        Some("balance") if args.len() == 2 => Ok(Command::Balance(parse_account(&args[1])?)),
        Some("tip") if args.len() == 4 => Ok(Command::Tip {
            from: parse_account(&args[1])?,
            to: parse_account(&args[2])?,
            amount: args[3].clone(),
        }),
        _ => bail!(
            "usage: tipbot [--env <env>] balance <account>\n       \
             tipbot [--env <env>] tip <from> <to> <amount> [--private]"
        ),
    }
}

// ============================================================
// MAIN
// ============================================================

fn main() -> anyhow::Result<ExitCode> {
    let command = parse_command()?;

    let env = get_env();
    let config = AppConfig::load(&env).with_context(|| format!("loading config for {}", env))?;
    let _log_guard = tipbot::logging::init_logging(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        "Starting tipbot in {} mode",
        env
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, command))
}

async fn run(config: AppConfig, command: Command) -> anyhow::Result<ExitCode> {
    let signer = TxSigner::from_hex(&config.signing_key()?)?;
    let ledger = EthLedger::connect(&config.ledger, signer).await?;
    tracing::info!(signer = %ledger.signer_address(), "Ledger connected");

    let limiter = Arc::new(RateLimiter::new(config.rate_limit.min_interval()));
    let orchestrator = TipOrchestrator::new(
        Arc::new(ledger),
        limiter,
        config.transfer.clone(),
        config.token.clone(),
    );
    let reporter = OutcomeReporter::new(config.token.clone());

    match command {
        Command::Balance(account) => {
            let ctx = RequestContext {
                chat_kind: ChatKind::Private,
                chat_id: 0,
                sender: Some(account),
                recipient: None,
                sender_name: None,
                recipient_name: None,
            };
            let result = orchestrator.query_balance(&ctx).await;
            println!("{}", reporter.render_balance(&result));
        }
        Command::Tip { from, to, amount } => {
            let mut ctx = RequestContext::group(0, from, to);
            if use_private_chat() {
                ctx.chat_kind = ChatKind::Private;
            }
            let request = TransferRequest::new(ctx, amount);
            println!("{}", reporter.render_pending(&request));

            let outcome = orchestrator.submit_transfer(&request).await;
            println!("{}", reporter.render_outcome(&request, &outcome));

            // Distinct exit status so scripts never blindly retry
            if let TransferOutcome::Ambiguous { .. } = outcome {
                return Ok(ExitCode::from(2));
            }
            if outcome.is_rejected() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
