use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use tradetrack_auth::{AuthToken, Persistence, SessionContext};
use tradetrack_client::{ApiClient, ApiConfig, ReportRange};
use tradetrack_core::{InvoiceId, format_inr};
use tradetrack_invoicing::{DocumentRenderer, HtmlRenderer, PrintableDocument};

/// Command-line access to the TradeTrack API.
#[derive(Debug, Parser)]
#[command(name = "tradetrack", version)]
struct Cli {
    /// API token for authenticated requests.
    #[arg(long, env = "TRADETRACK_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and print a token.
    Login {
        /// Username or email address.
        identifier: String,
        #[arg(long, env = "TRADETRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List products offered for invoicing.
    Products,
    /// List invoices.
    Invoices,
    /// Print an invoice as HTML.
    Preview { id: InvoiceId },
    /// Sales report; dates as YYYY-MM-DD.
    Report {
        /// Print sales by product as CSV.
        #[arg(long)]
        csv: bool,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl Cli {
    fn session(&self) -> Result<SessionContext> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => {
                Ok(SessionContext::with_token(AuthToken::new(token))?)
            }
            _ => {
                tracing::warn!("no API token given; requests are anonymous");
                Ok(SessionContext::in_memory())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tradetrack_observability::init();

    let cli = Cli::parse();

    let config = ApiConfig::from_env()?;
    let client = ApiClient::new(config, cli.session()?)?;

    match cli.command {
        Command::Login {
            identifier,
            password,
        } => {
            let profile = client
                .login(&identifier, &password, Persistence::SessionOnly)
                .await?;
            let token = client
                .session()
                .token()
                .ok_or_else(|| anyhow!("login succeeded without a token"))?;
            eprintln!("signed in as {} ({})", profile.username, profile.role());
            println!("{}", token.as_str());
        }
        Command::Products => {
            for product in client.list_products(true).await? {
                println!(
                    "{:>6}  {:<40} {:>14}  {}",
                    product.id,
                    product.name,
                    format_inr(product.price),
                    product.classification_code.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Invoices => {
            for invoice in client.list_invoices().await? {
                println!(
                    "{:>6}  {:<28} {}  {:>14}",
                    invoice.id,
                    invoice.display_number(),
                    invoice.created_at.format("%d/%m/%Y"),
                    format_inr(invoice.total)
                );
            }
        }
        Command::Preview { id } => {
            let invoice = client.get_invoice(id).await?;
            let document = PrintableDocument::from_persisted(&invoice);
            let html = HtmlRenderer::default().render(&document)?;
            eprintln!("{}", document.file_name());
            println!("{html}");
        }
        Command::Report {
            csv: true,
            start,
            end,
        } => {
            print!("{}", client.sales_report_csv(ReportRange::new(start, end)).await?);
        }
        Command::Report {
            csv: false,
            start,
            end,
        } => {
            let report = client.sales_report(ReportRange::new(start, end)).await?;
            println!("total sales:   {}", format_inr(report.total_sales));
            println!("invoices:      {}", report.invoice_count);
            println!("average:       {}", format_inr(report.average_invoice()));
            for row in &report.top_products {
                println!(
                    "  {:<40} {:>6} {:>14}",
                    row.product_name.as_deref().unwrap_or("-"),
                    row.total_quantity,
                    format_inr(row.total_sales)
                );
            }
        }
    }

    Ok(())
}
