use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser, Debug)]
#[command(
    name = "parceltax",
    version,
    about = "Capital gains and dividend income for equity portfolios, parcel by parcel"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Realized capital gains report
    Report(cmd::report::ReportCommand),
    /// Dividend and distribution income totals
    Income(cmd::income::IncomeCommand),
    /// List open parcels after applying all events
    Parcels(cmd::parcels::ParcelsCommand),
    /// Check an event stream for problems without producing a report
    Validate(cmd::validate::ValidateCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Report(cmd) => cmd.exec(),
        Command::Income(cmd) => cmd.exec(),
        Command::Parcels(cmd) => cmd.exec(),
        Command::Validate(cmd) => cmd.exec(),
    }
}
