//! `policy-kit` command-line tool.
//!
//! ```bash
//! policy-kit render policy.md --title "Access Control Policy"
//! policy-kit layout policy.md --split-overflow
//! policy-kit classify policy.md
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use policy_kit::cli::{Cli, Command, SourceArgs};
use policy_kit::{body_lines, init_logging, Document, ExportResult, LineKind, Paginator};

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> ExportResult<()> {
    match command {
        Command::Render { source, output } => {
            let doc = paginate(&source)?;
            let path = output.unwrap_or_else(|| PathBuf::from(doc.file_name()));
            let pdf = doc.to_pdf();
            std::fs::write(&path, &pdf)?;
            info!(
                path = %path.display(),
                pages = doc.page_count(),
                bytes = pdf.len(),
                "wrote PDF"
            );
        }

        Command::Layout { source } => {
            let doc = paginate(&source)?;
            print_layout(&doc);
        }

        Command::Classify { input } => {
            let body = std::fs::read_to_string(&input)?;
            for (index, line) in body_lines(&body).enumerate() {
                println!("{:>5}  {:<5}  {}", index + 1, LineKind::classify(line), line);
            }
        }
    }

    Ok(())
}

fn paginate(source: &SourceArgs) -> ExportResult<Document> {
    let body = std::fs::read_to_string(&source.input)?;
    let paginator = Paginator::new(source.resolved_layout()?);
    let title = source.resolved_title();

    Ok(match source.resolved_date()? {
        Some(date) => paginator.paginate_on(&title, &body, date),
        None => paginator.paginate(&title, &body),
    })
}

fn print_layout(doc: &Document) {
    println!("{}: {} page(s)", doc.title(), doc.page_count());
    for (number, page) in doc.pages().iter().enumerate() {
        let lines = page.lines();
        match (lines.first(), lines.last()) {
            (Some(first), Some(last)) => println!(
                "  page {}: lines {}-{} ({} runs)",
                number + 1,
                first + 1,
                last + 1,
                page.runs().len()
            ),
            _ => println!(
                "  page {}: no body lines ({} runs)",
                number + 1,
                page.runs().len()
            ),
        }
    }
}
