mod cli;
mod ui;

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use cli::{Cli, Command};
use helpdesk_swarm::anthropic::AnthropicClient;
use helpdesk_swarm::config::HelpdeskConfig;
use helpdesk_swarm::memory::{DurableAppendStore, InMemoryStore, JsonlStore, MemoryCache};
use helpdesk_swarm::ticket::{
    InMemoryTicketStore, JsonFileTicketStore, Ticket, TicketCategory, TicketProcessor,
    TicketSeverity, TicketStore,
};
use helpdesk_swarm::worker::{
    CloserWorker, IntakeWorker, LlmWorker, MemoryCheckWorker, ScriptedWorker, TriageWorker,
    WorkerCapability, WorkerReply,
};
use helpdesk_swarm::workflow::{Role, WorkflowEngine};
use ui::RunProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let mut config = HelpdeskConfig::load()?;
    if let Some(max) = cli.max_handoffs {
        config.max_handoffs = max;
    }

    match cli.command {
        Command::Submit {
            title,
            description,
            severity,
            category,
        } => {
            let processor = live_processor(&config)?;
            let ticket = Ticket::new(title, description, severity.into(), category.into());
            let ticket = processor.tickets().create(ticket).await?;
            info!(ticket = %ticket.id, "Ticket created");
            process(&processor, &ticket).await?;
        }
        Command::Process { id } => {
            let processor = live_processor(&config)?;
            let Some(ticket) = processor.tickets().get(&id).await? else {
                bail!("Ticket not found: {id}");
            };
            process(&processor, &ticket).await?;
        }
        Command::List => {
            let tickets = JsonFileTicketStore::new(&config.tickets_path).list().await?;
            ui::print_tickets(&tickets);
        }
        Command::Show { id } => {
            let Some(ticket) = JsonFileTicketStore::new(&config.tickets_path).get(&id).await?
            else {
                bail!("Ticket not found: {id}");
            };
            println!("{}", serde_json::to_string_pretty(&ticket)?);
        }
        Command::Memory => {
            let cache = MemoryCache::new(JsonlStore::new(&config.memory_path));
            ui::print_memories(&cache.list().await?);
        }
        Command::Demo => run_demo(&config).await?,
    }

    Ok(())
}

async fn process(processor: &TicketProcessor, ticket: &Ticket) -> Result<()> {
    let progress = RunProgress::start(&ticket.title);
    match processor.process_ticket(&ticket.id).await {
        Ok(result) => {
            progress.complete(&result);
            progress.print_report(&result);
            Ok(())
        }
        Err(e) => {
            progress.fail(&e.to_string());
            Err(e.into())
        }
    }
}

/// Wire the helpdesk roles around the given specialists.
fn helpdesk_engine<S: DurableAppendStore + 'static>(
    config: &HelpdeskConfig,
    cache: Arc<MemoryCache<S>>,
    network: impl WorkerCapability + 'static,
    cloud: impl WorkerCapability + 'static,
    summarizer: impl WorkerCapability + 'static,
) -> Result<WorkflowEngine> {
    let engine = WorkflowEngine::builder()
        .worker(Role::Intake, IntakeWorker)
        .worker(Role::MemoryCheck, MemoryCheckWorker::new(cache))
        .worker(Role::Triage, TriageWorker::new(config.fallback_worker))
        .worker(Role::NetworkWorker, network)
        .worker(Role::CloudWorker, cloud)
        .worker(Role::Summarizer, summarizer)
        .worker(Role::Closer, CloserWorker)
        .limits(config.limits())
        .build()?;
    Ok(engine)
}

fn live_processor(config: &HelpdeskConfig) -> Result<TicketProcessor> {
    if config.api_key.is_empty() {
        bail!("ANTHROPIC_API_KEY is not set (or add api_key to helpdesk.toml)");
    }
    let client = Arc::new(AnthropicClient::new(config.api_key.clone())?);
    let cache = Arc::new(MemoryCache::new(JsonlStore::new(&config.memory_path)));
    let engine = helpdesk_engine(
        config,
        cache,
        LlmWorker::network(Arc::clone(&client), &config.model),
        LlmWorker::cloud(Arc::clone(&client), &config.model),
        LlmWorker::summarizer(client, &config.model),
    )?;
    Ok(TicketProcessor::new(
        Arc::new(engine),
        Arc::new(JsonFileTicketStore::new(&config.tickets_path)),
    ))
}

/// Offline walkthrough: the first ticket misses memory and goes through a
/// specialist, the second identical ticket is answered from memory.
async fn run_demo(config: &HelpdeskConfig) -> Result<()> {
    let cache = Arc::new(MemoryCache::new(InMemoryStore::new()));
    let engine = helpdesk_engine(
        config,
        Arc::clone(&cache),
        ScriptedWorker::new(WorkerReply::route(
            Role::MemoryCheck,
            "Restarted the gateway service on 10.0.0.1; host 10.0.0.5 answers ping again.",
        )),
        ScriptedWorker::new(WorkerReply::route(
            Role::MemoryCheck,
            "Bucket policy was missing s3:GetObject; added it for the reporting role.",
        )),
        ScriptedWorker::new(WorkerReply::route(
            Role::Closer,
            "Host 10.0.0.5 was unreachable from the office network. The gateway service \
             had stopped forwarding; restarting it restored connectivity.",
        )),
    )?;
    let processor = TicketProcessor::new(Arc::new(engine), Arc::new(InMemoryTicketStore::new()));

    for _ in 0..2 {
        let ticket = Ticket::new(
            "Cannot reach host",
            "Host 10.0.0.5 does not answer ping from the office network",
            TicketSeverity::High,
            TicketCategory::Network,
        );
        let ticket = processor.tickets().create(ticket).await?;
        process(&processor, &ticket).await?;
    }

    println!();
    ui::print_memories(&cache.list().await?);
    Ok(())
}
