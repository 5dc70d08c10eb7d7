//! High-level hide/reveal/capacity operations over carrier files.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::carrier::CarrierManager;
use crate::carrier::factory::{Carrier, CarrierFactory};
use crate::config::LAYER_COUNT;
use crate::container::DataContainer;
use crate::credentials::Credentials;
use crate::item::Item;
use crate::ui::progress::Bar;

/// Loads a carrier file and runs `read` on a fresh manager.
async fn read_carrier(factory: &CarrierFactory, path: &Path) -> Result<Carrier> {
    let mut manager = factory
        .for_path(path)
        .with_context(|| format!("unsupported carrier type: {}", path.display()))?;

    let bytes = tokio::fs::read(path).await.with_context(|| format!("failed to read {}", path.display()))?;

    let bar = Bar::percent("Reading carrier...")?;
    manager.read(bytes, |pct| bar.set_pct(pct)).await.with_context(|| format!("failed to decode {}", path.display()))?;
    bar.finish();

    Ok(manager)
}

/// Reports the exploitable bits per layer of a carrier file.
pub async fn capacity(factory: &CarrierFactory, path: &Path) -> Result<[u64; LAYER_COUNT]> {
    let manager = read_carrier(factory, path).await?;
    Ok(manager.layers_capacity()?)
}

/// Embeds `items` into the carrier and writes the result to `output`.
///
/// Each item comes with its own passphrase; the container is built from
/// scratch, so previously hidden items are not carried over.
pub async fn hide(
    factory: &CarrierFactory,
    carrier_path: &Path,
    output_path: &Path,
    credentials: &mut Credentials,
    items: Vec<(Item, String)>,
) -> Result<()> {
    if items.is_empty() {
        bail!("nothing to hide");
    }

    let mut manager = read_carrier(factory, carrier_path).await?;

    let capacity_bytes = manager.layers_capacity()?.iter().sum::<u64>() / 8;
    tracing::info!(capacity_bytes, items = items.len(), "embedding");

    let mut container = DataContainer::new();
    for (item, passphrase) in &items {
        if item.deleted {
            continue;
        }
        let mut block = item.to_block();
        block.encode(passphrase).with_context(|| format!("failed to encrypt item '{}'", item.name))?;
        container.add_data_block(block);
    }

    let bar = Bar::percent("Embedding...")?;
    manager
        .encode(credentials, &mut container, |pct| bar.set_pct(pct))
        .await
        .context("embedding failed")?;
    bar.finish();

    let bar = Bar::percent("Writing carrier...")?;
    let bytes = manager.write(|pct| bar.set_pct(pct)).await.context("carrier re-encoding failed")?;
    bar.finish();

    tokio::fs::write(output_path, bytes).await.with_context(|| format!("failed to write {}", output_path.display()))?;
    Ok(())
}

/// Extracts the hidden items from a carrier file.
///
/// Every candidate passphrase is tried against every recovered block; items
/// that match none stay undecoded (ciphertext only) rather than failing the
/// operation.
pub async fn reveal(
    factory: &CarrierFactory,
    carrier_path: &Path,
    credentials: &mut Credentials,
    passphrases: &[String],
) -> Result<Vec<Item>> {
    let manager = read_carrier(factory, carrier_path).await?;

    let bar = Bar::percent("Extracting...")?;
    let mut container = manager.decode(credentials, |pct| bar.set_pct(pct)).await.context("extraction failed")?;
    bar.finish();

    let mut items = Vec::new();
    for block in container.data_blocks_mut() {
        for passphrase in passphrases {
            if block.try_decode(passphrase) {
                break;
            }
        }
        items.push(Item::from_block(block));
    }

    tracing::info!(total = items.len(), decoded = items.iter().filter(|i| i.is_decoded()).count(), "extraction complete");
    Ok(items)
}
