use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod error;
mod insights;
mod layout;
mod loader;
mod models;
mod package;
mod pipeline;
mod report;
mod score;

use insights::{GeminiNarrator, Narrator, OfflineNarrator};
use layout::ColumnLayout;
use models::Category;
use report::Template;

#[derive(Parser)]
#[command(name = "survey-reports")]
#[command(about = "Student well-being survey scoring and per-school HTML reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a survey export and write one HTML report per school into a zip archive
    Generate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = package::DEFAULT_ARCHIVE_NAME)]
        out: PathBuf,
        /// Credential for narrative text; offline text is used without it
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long, default_value = insights::DEFAULT_MODEL)]
        model: String,
        #[arg(long, default_value = insights::DEFAULT_API_BASE)]
        api_base: String,
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
        /// Report template to use instead of the built-in one
        #[arg(long)]
        template: Option<PathBuf>,
        /// TOML file naming the school and question columns
        #[arg(long)]
        layout: Option<PathBuf>,
    },
    /// Print per-school statistics without rendering reports
    Summary {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        layout: Option<PathBuf>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Validate a report template
    CheckTemplate {
        #[arg(long)]
        template: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,survey_reports=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            out,
            api_key,
            model,
            api_base,
            timeout_secs,
            template,
            layout,
        } => {
            let template = load_template(template.as_deref())?;
            let layout = load_layout(layout.as_deref())?;
            let table = loader::load_table(&input)
                .with_context(|| format!("failed to load {}", input.display()))?;

            let narrator = match api_key.filter(|k| !k.trim().is_empty()) {
                Some(key) => {
                    info!(model = %model, "using live narrative generation");
                    Narrator::Live(
                        GeminiNarrator::new(
                            key,
                            model,
                            api_base,
                            Duration::from_secs(timeout_secs),
                        )
                        .context("failed to build HTTP client")?,
                    )
                }
                None => Narrator::Offline(OfflineNarrator),
            };

            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} schools")
                    .context("invalid progress bar template")?,
            );
            let reports =
                pipeline::generate_reports(&table, &layout, &template, &narrator, |progress| {
                    bar.set_length(progress.total as u64);
                    bar.set_position(progress.done as u64);
                    debug!(fraction = progress.fraction(), "school processed");
                })
                .await
                .context("survey export does not match the expected layout")?;
            bar.finish_and_clear();

            let archive = package::package(&reports).context("failed to build report archive")?;
            std::fs::write(&out, archive)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Generated {} reports in {}.", reports.len(), out.display());
        }
        Commands::Summary {
            input,
            layout,
            limit,
        } => {
            let layout = load_layout(layout.as_deref())?;
            let table = loader::load_table(&input)
                .with_context(|| format!("failed to load {}", input.display()))?;
            let schools = pipeline::summarize(&table, &layout)
                .context("survey export does not match the expected layout")?;

            if schools.is_empty() {
                println!("No schools found in {}.", input.display());
                return Ok(());
            }

            println!("Schools in first-appearance order:");
            for school in schools.iter().take(limit) {
                let bands: Vec<String> = Category::ALL
                    .iter()
                    .map(|c| {
                        let tally = school.tally(*c);
                        format!("{} {} ({:.1}%)", c.label(), tally.count, tally.pct)
                    })
                    .collect();
                println!(
                    "- {} ({} students): {}; anxiety {:.1}%, parental pressure {:.1}%, support {:.1}%; {} answers defaulted",
                    school.name,
                    school.total,
                    bands.join(", "),
                    school.anxiety_pct,
                    school.parent_pressure_pct,
                    school.support_pct,
                    school.defaulted_answers
                );
            }
        }
        Commands::CheckTemplate { template } => {
            load_template(Some(&template))?;
            println!("Template {} is valid.", template.display());
        }
    }

    Ok(())
}

fn load_template(path: Option<&Path>) -> anyhow::Result<Template> {
    match path {
        Some(path) => Template::load(path)
            .with_context(|| format!("invalid report template {}", path.display())),
        None => Template::builtin().context("built-in report template is invalid"),
    }
}

fn load_layout(path: Option<&Path>) -> anyhow::Result<ColumnLayout> {
    match path {
        Some(path) => Ok(ColumnLayout::load(path)?),
        None => Ok(ColumnLayout::default()),
    }
}
