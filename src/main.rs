use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docrag::{ChatSession, Config, DeleteScope, DocumentScope, Pipeline, QueryScope};

#[derive(Parser)]
#[command(name = "docrag", about = "Document QA over PDFs", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a PDF (local path or URL) into the index
    Ingest {
        /// Path or URL of the PDF
        source: String,
        /// Owning tenant id
        #[arg(long)]
        company_id: String,
        /// Identifier the document is indexed under
        #[arg(long)]
        pdf_id: String,
        #[arg(long)]
        user_id: Option<String>,
        /// Free-form source label stored with each chunk
        #[arg(long)]
        source_label: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Ask a question against the indexed documents
    Ask {
        question: String,
        #[arg(long)]
        company_id: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
        /// Number of context chunks to retrieve
        #[arg(long)]
        top_k: Option<u64>,
        /// Also print a plain-language summary of the answer
        #[arg(long)]
        simplify: bool,
    },
    /// Generate multiple-choice questions from the indexed documents
    Quiz {
        #[arg(long)]
        company_id: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
        /// How many questions to generate
        #[arg(long, default_value_t = 5)]
        num: usize,
    },
    /// Delete every chunk of a document
    Delete {
        pdf_id: String,
        #[arg(long)]
        company_id: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docrag=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pipeline = Pipeline::connect(&config)?;

    match cli.command {
        Commands::Ingest {
            source,
            company_id,
            pdf_id,
            user_id,
            source_label,
            category,
            namespace,
        } => {
            let scope = DocumentScope {
                user_id,
                source: source_label,
                category,
                namespace,
                ..DocumentScope::new(company_id, pdf_id)
            };
            let report = pipeline.ingest_document(&source, &scope).await?;
            info!("Ingestion finished");
            println!("Indexed {} chunks from {}", report.chunks_indexed, source);
        }
        Commands::Ask {
            question,
            company_id,
            namespace,
            top_k,
            simplify,
        } => {
            let scope = QueryScope {
                company_id,
                namespace,
                top_k,
            };
            let mut session = ChatSession::new();
            let answer = pipeline.answer_query(&question, &scope, &mut session).await?;
            println!("{}", answer);

            if simplify {
                let summary = pipeline.simplify(&answer).await?;
                println!("\n--- Simplified ---\n{}", summary);
            }
        }
        Commands::Quiz {
            company_id,
            namespace,
            num,
        } => {
            let scope = QueryScope {
                company_id,
                namespace,
                top_k: None,
            };
            let questions = pipeline.generate_quiz(&scope, num).await?;
            for (i, q) in questions.iter().enumerate() {
                println!("{}. {}", i + 1, q.question);
                for (j, option) in q.options.iter().enumerate() {
                    let letter = (b'a' + j as u8) as char;
                    println!("   {}) {}", letter, option);
                }
                println!("   Answer: {}\n", q.answer);
            }
        }
        Commands::Delete {
            pdf_id,
            company_id,
            namespace,
        } => {
            let scope = DeleteScope {
                company_id,
                namespace,
            };
            pipeline.delete_document(&pdf_id, &scope).await?;
            println!("Deleted chunks for {}", pdf_id);
        }
    }

    Ok(())
}
