use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pixdoc_blob::prelude::*;
use pixdoc_core::{EditorConfig, EditorEvent, EditorEventKind, ImageEditor, Settings, Spinner};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut settings = Settings::new();
    settings.set("editor.collection", "cms");
    settings.set("editor.document", "home");
    settings.set("editor.field", "heroImg");
    let overrides = settings.load_env("PIXDOC__");
    info!(overrides, "settings loaded");

    let config = EditorConfig::from_settings(&settings.snapshot())?;
    let (collection, document, field) = (
        config.collection.clone(),
        config.document.clone(),
        config.field.clone(),
    );

    let transfer = Arc::new(StagingTransfer::new(&config, TransferConfig::default()));
    let store = Arc::new(MemoryDocumentStore::new());
    let editor = Arc::new(
        ImageEditor::new(config, transfer.clone(), store.clone())
            .with_busy(Arc::new(Spinner::new())),
    );

    editor.on(
        EditorEventKind::ReadinessChanged,
        Arc::new(|e: &EditorEvent| {
            if let EditorEvent::ReadinessChanged { value } = e {
                println!("[editor] ready: {value}");
            }
        }),
    );
    editor.on(
        EditorEventKind::SaveComplete,
        Arc::new(|_: &EditorEvent| println!("[editor] save complete")),
    );

    let pump = editor.attach();

    let staged = transfer
        .add_file(FileUpload::new("hero.png", "image/png", 52_431))
        .context("staging hero.png")?;
    println!("[transfer] staged {} ({})", staged.filename, staged.size_str);

    transfer
        .complete_upload(
            &staged.name,
            ProcessedVariants::new(format!("https://cdn.example/{}-opt.png", staged.name))
                .with_thumbnail(format!("https://cdn.example/{}-thumb.png", staged.name)),
        )
        .context("completing upload")?;

    // Let the pump pick up the processed record.
    tokio::time::timeout(Duration::from_secs(5), async {
        while !editor.is_ready() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("processed record never reached the editor")?;

    editor.on_save_clicked().await;
    print_document(&store, &collection, &document)?;

    if editor.delete(&staged.name).await.is_some() {
        tokio::time::sleep(Duration::from_millis(50)).await;
        println!("[editor] removed {} from {field}", staged.name);
    }
    print_document(&store, &collection, &document)?;

    pump.abort();
    Ok(())
}

fn print_document(store: &MemoryDocumentStore, collection: &str, document: &str) -> Result<()> {
    let doc = store
        .get(collection, document)
        .unwrap_or(serde_json::Value::Null);
    println!(
        "[store] {collection}/{document} = {}",
        serde_json::to_string_pretty(&doc)?
    );
    Ok(())
}
