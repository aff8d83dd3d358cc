//! Interface de terminal do helpdesk: spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`RunProgress`] acompanha visualmente
//! o processamento de um ticket no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use helpdesk_swarm::memory::MemoryEntry;
use helpdesk_swarm::ticket::{Ticket, TicketStatus};
use helpdesk_swarm::workflow::RunResult;

/// Indicador visual de progresso para o processamento de um ticket.
///
/// Exibe um spinner animado durante a execução e mensagens coloridas
/// para resolução (verde), guarda acionada (amarelo) e falha (vermelho).
pub struct RunProgress {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl RunProgress {
    /// Inicia o spinner com o título do ticket.
    pub fn start(title: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Processing: {title}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner e exibe o desfecho da execução.
    pub fn complete(&self, result: &RunResult) {
        self.pb.finish_and_clear();
        if result.is_resolved() {
            println!(
                "  {} Resolved after {} handoff(s)",
                self.green.apply_to("✓"),
                result.handoff_count
            );
        } else {
            println!(
                "  {} Stopped by {}",
                self.yellow.apply_to("!"),
                result.terminated_by
            );
        }
    }

    /// Finaliza o spinner após uma falha que abortou a execução.
    pub fn fail(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.red.apply_to("✗"));
    }

    /// Imprime o relatório da execução em JSON com estilo colorido.
    pub fn print_report(&self, result: &RunResult) {
        let style = if result.is_resolved() {
            &self.green
        } else {
            &self.yellow
        };
        println!();
        println!("{}", style.apply_to("─── Run Report ───"));
        println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
    }
}

/// Uma linha por ticket, colorida pelo status.
pub fn print_tickets(tickets: &[Ticket]) {
    if tickets.is_empty() {
        println!("No tickets.");
        return;
    }
    for ticket in tickets {
        let style = match ticket.status {
            TicketStatus::Resolved => Style::new().green(),
            TicketStatus::Error => Style::new().red(),
            TicketStatus::Processing => Style::new().yellow(),
            TicketStatus::Pending => Style::new().dim(),
        };
        println!(
            "{}  {:<10}  {:<8}  {:<8}  {}",
            ticket.id,
            style.apply_to(ticket.status),
            ticket.severity,
            ticket.category,
            ticket.title
        );
    }
}

pub fn print_memories(entries: &[MemoryEntry]) {
    if entries.is_empty() {
        println!("Memory is empty.");
        return;
    }
    let dim = Style::new().dim();
    for entry in entries {
        println!("{}  {}", dim.apply_to(&entry.id), entry.query.replace('\n', " "));
        println!("    → {}", entry.resolution);
    }
}
