use clap::{Parser, Subcommand, ValueEnum};
use tcboard_client::prelude::{Range, DEFAULT_RELAY_URL};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, default_value = "WARN", ignore_case = true)]
    pub trace: TraceLevel,

    /// Base URL of the relay, including its prefix
    #[arg(long, env = "RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    pub relay: String,

    /// User agent sent to the relay
    #[arg(long, env = "USER_AGENT", default_value = concat!("tcboard/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Overview, company and price history of one ticker.
    Show {
        ticker: String,

        /// History window: 1m, 3m, 6m or 1y
        #[arg(long, short, default_value = "1m", value_parser = parse_range)]
        range: Range,
    },

    /// Ticker suggestions for a partial symbol.
    Suggest { text: String },

    /// Interactive dashboard; type `:help` once started.
    Watch {
        #[arg(default_value = "VHM")]
        ticker: String,
    },
}

fn parse_range(s: &str) -> anyhow::Result<Range> {
    s.parse()
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_parses_range() {
        let cli = Cli::try_parse_from(["tcboard", "show", "vhm", "--range", "6m"]).unwrap();
        match cli.command {
            Commands::Show { ticker, range } => {
                assert_eq!(ticker, "vhm");
                assert_eq!(range, Range::SixMonths);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.trace, TraceLevel::WARN);
    }

    #[test]
    fn test_show_rejects_unknown_range() {
        assert!(Cli::try_parse_from(["tcboard", "show", "vhm", "-r", "5d"]).is_err());
    }

    #[test]
    fn test_watch_defaults_to_vhm() {
        let cli = Cli::try_parse_from(["tcboard", "--trace", "DEBUG", "watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { ticker } if ticker == "VHM"));
        assert_eq!(cli.trace, TraceLevel::DEBUG);
    }
}
