use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*, TraceLevel};
use dotenv::dotenv;
use input::Input;
use std::sync::Arc;
use tcboard_client::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod input;
mod ui;

fn preprocess(trace_level: Level) -> Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // before parsing, so RELAY_URL and USER_AGENT can come from .env
    dotenv().ok();
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level)?;
    trace!("Command line input recorded: {cli:#?}");

    let source = Arc::new(RelayClient::new(&cli.relay, &cli.user_agent)?);
    info!("Using relay at {}", source.base());

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // "> tcboard <COMMAND>"
    match cli.command {
        // "> tcboard show VHM --range 3m"
        Show { ticker, range } => {
            let dashboard = Dashboard::new(source);
            let presenter = ui::present(dashboard.subscribe());
            let start = DashboardState::default().with_range(range);
            let state = dashboard.search(&start, &ticker).await;
            debug!("Settled {} as {:?}", state.selected_ticker, state.phase);

            // closing the channel ends the presenter once it has printed
            drop(dashboard);
            presenter.await?;
        }

        // "> tcboard suggest vn"
        Suggest { text } => {
            let found = fetch_ticker_suggestions(source.as_ref(), &text).await;
            println!("{}", ui::render_suggestions(&found));
        }

        // "> tcboard watch [TICKER]"
        Watch { ticker } => watch(source, &ticker).await?,
    }

    Ok(())
}

/// Line-driven dashboard over stdin, until `:quit` or end of input.
async fn watch(source: Arc<RelayClient>, ticker: &str) -> Result<()> {
    let dashboard = Dashboard::new(Arc::clone(&source));
    let presenter = ui::present(dashboard.subscribe());
    let mut suggester = Suggester::new(source, Debouncer::default());
    let suggestions = ui::present_suggestions(suggester.subscribe());

    println!("{}\n", ui::HELP);
    let mut state = dashboard.search(&DashboardState::default(), ticker).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Input::parse(&line) {
            Input::Search(ticker) => state = dashboard.search(&state, &ticker).await,
            Input::Suggest(text) => suggester.search_input(&text),
            Input::Range(range) => state = dashboard.set_range(&state, range).await,
            Input::Refresh => state = dashboard.refresh(&state).await,
            Input::Help => println!("{}", ui::HELP),
            Input::Quit => break,
            Input::Invalid(message) => eprintln!("{message}"),
        }
    }

    drop(dashboard);
    drop(suggester);
    presenter.await?;
    suggestions.await?;
    Ok(())
}
