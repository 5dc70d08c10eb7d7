//! Interactive prompts for the wizard mode and missing CLI arguments.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use inquire::{Confirm, MultiSelect, Password, PasswordDisplayMode, Select};
use strum::IntoEnumIterator;

use crate::config::PASSPHRASE_MIN_LENGTH;
use crate::credentials::HashAlgorithm;

/// Operations offered by the interactive wizard.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Hide,
    Reveal,
    Capacity,
}

impl std::fmt::Display for WizardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Hide => "Hide items in a carrier",
            Self::Reveal => "Reveal hidden items",
            Self::Capacity => "Inspect carrier capacity",
        })
    }
}

/// Prompts for the master passphrase seeding the position walk.
///
/// Hiding asks for confirmation; a typo here makes the payload
/// unrecoverable, not just one item.
pub fn master_passphrase(confirm: bool) -> Result<String> {
    let mut prompt = Password::new("Master passphrase:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message("seeds the position walk; required to reveal");

    if !confirm {
        prompt = prompt.without_confirmation();
    }

    let passphrase = prompt.prompt().context("passphrase input failed")?;
    ensure!(passphrase.len() >= PASSPHRASE_MIN_LENGTH, "passphrase must not be empty");
    Ok(passphrase)
}

/// Prompts for one item's passphrase.
pub fn item_passphrase(name: &str, confirm: bool) -> Result<String> {
    let message = format!("Passphrase for '{name}':");
    let mut prompt = Password::new(&message).with_display_mode(PasswordDisplayMode::Masked);
    if !confirm {
        prompt = prompt.without_confirmation();
    }
    prompt.prompt().context("passphrase input failed")
}

/// Collects candidate passphrases for revealing; empty input stops.
pub fn candidate_passphrases() -> Result<Vec<String>> {
    let mut candidates = Vec::new();
    loop {
        let pass = Password::new("Item passphrase (empty to finish):")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("passphrase input failed")?;

        if pass.is_empty() {
            break;
        }
        candidates.push(pass);
    }
    Ok(candidates)
}

/// Wizard mode selection.
pub fn select_mode() -> Result<WizardMode> {
    Select::new("What do you want to do?", vec![WizardMode::Hide, WizardMode::Reveal, WizardMode::Capacity])
        .prompt()
        .context("mode selection failed")
}

/// Carrier selection from discovered images.
pub fn select_carrier(carriers: &[PathBuf]) -> Result<PathBuf> {
    let display: Vec<String> = carriers.iter().map(|p| p.display().to_string()).collect();
    let chosen = Select::new("Select a carrier image:", display).prompt().context("carrier selection failed")?;
    Ok(PathBuf::from(chosen))
}

/// Payload file selection for hiding.
pub fn select_payload_files(candidates: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let display: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    let chosen = MultiSelect::new("Select files to hide:", display).prompt().context("file selection failed")?;
    Ok(chosen.into_iter().map(PathBuf::from).collect())
}

/// Hash algorithm selection, defaulting to the format's historical choice.
pub fn select_algorithm() -> Result<HashAlgorithm> {
    Select::new("Walk seed digest:", HashAlgorithm::iter().collect()).prompt().context("algorithm selection failed")
}

/// Confirmation before clobbering an existing output file.
pub fn confirm_overwrite(path: &Path) -> Result<bool> {
    Confirm::new(&format!("{} exists. Overwrite?", path.display()))
        .with_default(false)
        .prompt()
        .context("confirmation failed")
}
