//! Interface de linha de comando do helpdesk baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (submit, process,
//! list, show, memory, demo) e flags globais (--max-handoffs, --verbose).

use clap::{Parser, Subcommand, ValueEnum};

use helpdesk_swarm::ticket::{TicketCategory, TicketSeverity};

/// Triagem automática de incidentes de TI com memória de resoluções.
#[derive(Debug, Parser)]
#[command(name = "helpdesk-swarm", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Limite de handoffs por execução (sobrepõe o arquivo de configuração).
    #[arg(long, global = true)]
    pub max_handoffs: Option<u32>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Severidade aceita pela CLI, mapeada para [`TicketSeverity`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for TicketSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Low => TicketSeverity::Low,
            SeverityArg::Medium => TicketSeverity::Medium,
            SeverityArg::High => TicketSeverity::High,
            SeverityArg::Critical => TicketSeverity::Critical,
        }
    }
}

/// Categoria aceita pela CLI, mapeada para [`TicketCategory`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    /// Conectividade, DNS, VPN, roteamento.
    Network,
    /// Serviços de nuvem, buckets, regiões.
    Cloud,
    /// Categoria incerta; vai para o worker padrão.
    Other,
}

impl From<CategoryArg> for TicketCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Network => TicketCategory::Network,
            CategoryArg::Cloud => TicketCategory::Cloud,
            CategoryArg::Other => TicketCategory::Other,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cria um ticket e o processa imediatamente.
    Submit {
        /// Título curto do incidente.
        title: String,

        /// Descrição completa do incidente.
        description: String,

        #[arg(long, value_enum, default_value = "medium")]
        severity: SeverityArg,

        #[arg(long, value_enum, default_value = "other")]
        category: CategoryArg,
    },

    /// Processa (ou reprocessa) um ticket existente.
    Process {
        /// Identificador do ticket.
        id: String,
    },

    /// Lista todos os tickets.
    List,

    /// Mostra um ticket em JSON.
    Show {
        /// Identificador do ticket.
        id: String,
    },

    /// Lista as resoluções memorizadas.
    Memory,

    /// Executa a demonstração offline com workers roteirizados.
    Demo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_submit_subcommand() {
        let cli = Cli::parse_from([
            "helpdesk-swarm",
            "submit",
            "Cannot reach host",
            "Host 10.0.0.5 does not answer ping",
            "--category",
            "network",
        ]);
        match cli.command {
            Command::Submit {
                title,
                description,
                severity,
                category,
            } => {
                assert_eq!(title, "Cannot reach host");
                assert_eq!(description, "Host 10.0.0.5 does not answer ping");
                assert!(matches!(severity, SeverityArg::Medium));
                assert_eq!(TicketCategory::from(category), TicketCategory::Network);
            }
            _ => panic!("expected Submit command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["helpdesk-swarm", "--max-handoffs", "5", "--verbose", "demo"]);
        assert!(cli.verbose);
        assert_eq!(cli.max_handoffs, Some(5));
        assert!(matches!(cli.command, Command::Demo));
    }

    #[test]
    fn cli_parses_show_subcommand() {
        let cli = Cli::parse_from(["helpdesk-swarm", "show", "abc-123"]);
        match cli.command {
            Command::Show { id } => assert_eq!(id, "abc-123"),
            _ => panic!("expected Show command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
