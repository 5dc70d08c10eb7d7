//! CLI entry point: argument parsing, wizard mode, command dispatch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::carrier::factory::CarrierFactory;
use crate::credentials::{Credentials, HashAlgorithm};
use crate::file;
use crate::item::Item;
use crate::processor;
use crate::ui::{display, prompt};

#[derive(Subcommand)]
pub enum Commands {
    /// Hide files inside a carrier image.
    Hide {
        /// Carrier image (PNG or JPEG).
        #[arg(short, long)]
        carrier: PathBuf,

        /// Output path (defaults to `<carrier>.pxv.<ext>`).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Master passphrase (prompted when absent).
        #[arg(short, long)]
        password: Option<String>,

        /// One passphrase for every item (prompted per item when absent).
        #[arg(long)]
        item_password: Option<String>,

        /// Digest seeding the position walk.
        #[arg(long, default_value = "sha512")]
        algorithm: HashAlgorithm,

        /// Files to hide.
        files: Vec<PathBuf>,
    },

    /// Reveal files hidden in a carrier image.
    Reveal {
        /// Carrier image (PNG or JPEG).
        #[arg(short, long)]
        carrier: PathBuf,

        /// Directory receiving the decoded items.
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Master passphrase (prompted when absent).
        #[arg(short, long)]
        password: Option<String>,

        /// Candidate item passphrases (repeatable; prompted when absent).
        #[arg(long)]
        item_password: Vec<String>,

        /// Digest seeding the position walk.
        #[arg(long, default_value = "sha512")]
        algorithm: HashAlgorithm,
    },

    /// Report how many bits a carrier can hold per bit layer.
    Capacity {
        /// Carrier image (PNG or JPEG).
        carrier: PathBuf,
    },

    /// Start the interactive wizard.
    Interactive,
}

#[derive(Parser)]
#[command(name = "pixveil", version, about = "Hide encrypted payloads inside ordinary PNG and JPEG images.")]
pub struct App {
    #[command(subcommand)]
    command: Option<Commands>,
}

impl App {
    pub fn init() -> Result<Self> {
        let subscriber = tracing_subscriber::fmt().with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(Self::parse())
    }

    pub async fn execute(self) -> Result<()> {
        let factory = CarrierFactory::new();

        match self.command {
            Some(Commands::Hide { carrier, output, password, item_password, algorithm, files }) => {
                Self::run_hide(&factory, &carrier, output, password, item_password, algorithm, files).await
            }
            Some(Commands::Reveal { carrier, output_dir, password, item_password, algorithm }) => {
                Self::run_reveal(&factory, &carrier, &output_dir, password, item_password, algorithm).await
            }
            Some(Commands::Capacity { carrier }) => Self::run_capacity(&factory, &carrier).await,
            Some(Commands::Interactive) | None => Self::run_interactive(&factory).await,
        }
    }

    async fn run_hide(
        factory: &CarrierFactory,
        carrier: &Path,
        output: Option<PathBuf>,
        password: Option<String>,
        item_password: Option<String>,
        algorithm: HashAlgorithm,
        files: Vec<PathBuf>,
    ) -> Result<()> {
        if files.is_empty() {
            bail!("no files to hide; pass them as positional arguments");
        }

        let output = output.unwrap_or_else(|| file::output_path(carrier));
        let password = match password {
            Some(p) => p,
            None => prompt::master_passphrase(true)?,
        };
        let mut credentials = Credentials::new(algorithm, &password);

        let mut items = Vec::with_capacity(files.len());
        for path in &files {
            let content = tokio::fs::read(path).await.with_context(|| format!("failed to read {}", path.display()))?;
            let name = path.file_name().and_then(|n| n.to_str()).context("payload file has no name")?;
            let item = Item::new(name, file::guess_content_type(path), content);

            let passphrase = match &item_password {
                Some(p) => p.clone(),
                None => prompt::item_passphrase(name, true)?,
            };
            items.push((item, passphrase));
        }

        processor::hide(factory, carrier, &output, &mut credentials, items).await?;
        display::show_success("Payload hidden", &output);
        Ok(())
    }

    async fn run_reveal(
        factory: &CarrierFactory,
        carrier: &Path,
        output_dir: &Path,
        password: Option<String>,
        item_passwords: Vec<String>,
        algorithm: HashAlgorithm,
    ) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => prompt::master_passphrase(false)?,
        };
        let mut credentials = Credentials::new(algorithm, &password);

        let candidates = if item_passwords.is_empty() { prompt::candidate_passphrases()? } else { item_passwords };

        let items = processor::reveal(factory, carrier, &mut credentials, &candidates).await?;
        display::show_items(&items);
        Self::write_items(&items, output_dir).await
    }

    async fn run_capacity(factory: &CarrierFactory, carrier: &Path) -> Result<()> {
        let layers = processor::capacity(factory, carrier).await?;
        display::show_capacity(carrier, &layers);
        Ok(())
    }

    async fn run_interactive(factory: &CarrierFactory) -> Result<()> {
        display::clear_screen()?;
        display::print_banner();

        let cwd = std::env::current_dir()?;
        let carriers = file::discover_carriers(&cwd);
        if carriers.is_empty() {
            bail!("no carrier images found under {}", cwd.display());
        }

        let mode = prompt::select_mode()?;
        let carrier = prompt::select_carrier(&carriers)?;

        match mode {
            prompt::WizardMode::Capacity => Self::run_capacity(factory, &carrier).await,
            prompt::WizardMode::Reveal => {
                let password = prompt::master_passphrase(false)?;
                let algorithm = prompt::select_algorithm()?;
                let mut credentials = Credentials::new(algorithm, &password);
                let candidates = prompt::candidate_passphrases()?;

                let items = processor::reveal(factory, &carrier, &mut credentials, &candidates).await?;
                display::show_items(&items);
                Self::write_items(&items, &cwd).await
            }
            prompt::WizardMode::Hide => {
                let payload_candidates: Vec<PathBuf> = std::fs::read_dir(&cwd)?
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .map(|e| e.path())
                    .filter(|p| p != &carrier)
                    .collect();
                let files = prompt::select_payload_files(&payload_candidates)?;
                if files.is_empty() {
                    bail!("no files selected");
                }

                let output = file::output_path(&carrier);
                if output.exists() && !prompt::confirm_overwrite(&output)? {
                    bail!("operation canceled");
                }

                let algorithm = prompt::select_algorithm()?;
                Self::run_hide(factory, &carrier, Some(output), None, None, algorithm, files).await
            }
        }
    }

    /// Writes every decoded item into `dir`, flattening any path in the
    /// stored name.
    async fn write_items(items: &[Item], dir: &Path) -> Result<()> {
        for item in items {
            let Some(data) = item.decoded_data.as_deref() else { continue };

            // Stored names are untrusted: keep only the final component.
            let name = Path::new(&item.name).file_name().and_then(|n| n.to_str()).unwrap_or("unnamed");
            let target = dir.join(name);

            tokio::fs::write(&target, data).await.with_context(|| format!("failed to write {}", target.display()))?;
            display::show_success("Item revealed", &target);
        }
        Ok(())
    }
}
