use crate::demo::{run_demo, run_receipt_scan, DemoArgs, ReceiptScanArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ledgerdesk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Ledgerdesk Back Office",
    about = "Run the expense and import-shipment back office service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the receipt field extractor over an OCR text dump
    Receipt {
        #[command(subcommand)]
        command: ReceiptCommand,
    },
    /// Run an end-to-end CLI demo covering expense policy and shipment costing
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ReceiptCommand {
    /// Print the field suggestions for one OCR text file
    Scan(ReceiptScanArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Receipt {
            command: ReceiptCommand::Scan(args),
        } => run_receipt_scan(args),
        Command::Demo(args) => run_demo(args),
    }
}
