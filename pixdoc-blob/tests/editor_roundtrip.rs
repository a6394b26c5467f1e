use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use pixdoc_blob::prelude::*;
use pixdoc_core::{
    EditorConfig, EditorEvent, FileTransfer, ImageEditor, Spinner, Toaster,
};

#[derive(Default)]
struct Toasts {
    messages: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl Toaster for Toasts {
    fn toast(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}

struct Setup {
    editor: Arc<ImageEditor>,
    transfer: Arc<StagingTransfer>,
    store: Arc<MemoryDocumentStore>,
    toasts: Arc<Toasts>,
    spinner: Arc<Spinner>,
    events: Arc<Mutex<Vec<EditorEvent>>>,
}

fn setup(config: EditorConfig) -> Setup {
    let transfer = Arc::new(StagingTransfer::new(&config, TransferConfig::default()));
    let store = Arc::new(MemoryDocumentStore::new());
    let toasts = Arc::new(Toasts::default());
    let spinner = Arc::new(Spinner::new());

    let editor = Arc::new(
        ImageEditor::new(config, transfer.clone(), store.clone())
            .with_busy(spinner.clone())
            .with_toaster(toasts.clone()),
    );

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    editor
        .on_str("*", Arc::new(move |e: &EditorEvent| sink.lock().push(e.clone())))
        .unwrap();

    Setup {
        editor,
        transfer,
        store,
        toasts,
        spinner,
        events,
    }
}

impl Setup {
    fn readiness(&self) -> Vec<bool> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                EditorEvent::ReadinessChanged { value } => Some(*value),
                _ => None,
            })
            .collect()
    }

    fn saves(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, EditorEvent::SaveComplete))
            .count()
    }

    fn stored_field(&self, field: &str) -> serde_json::Value {
        self.store
            .get("cms", "home")
            .map(|doc| doc[field].clone())
            .unwrap_or(serde_json::Value::Null)
    }
}

async fn eventually<F: Fn() -> bool>(check: F) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn hero() -> EditorConfig {
    EditorConfig::new("cms", "home").with_field("heroImg")
}

#[tokio::test]
async fn upload_save_and_delete_hero_image() {
    let s = setup(hero());
    let pump = s.editor.attach();
    assert_eq!(s.readiness(), vec![false]);

    let staged = assert_ok!(s.transfer.add_file(FileUpload::new("hero.PNG", "image/png", 52_431)));
    eventually(|| s.editor.get_data().contains(&staged.name)).await;
    assert!(!s.editor.is_ready());

    assert_ok!(s.transfer.complete_upload(
        &staged.name,
        ProcessedVariants::new(format!("https://cdn/{}-opt.png", staged.name)),
    ));
    eventually(|| s.editor.is_ready()).await;
    assert_eq!(s.readiness(), vec![false, true]);

    assert!(s.editor.save().await);
    assert_eq!(s.saves(), 1);
    assert_eq!(s.toasts.messages.lock().as_slice(), ["Image saved."]);

    let saved = s.stored_field("heroImg")[&staged.name].clone();
    assert_eq!(saved["filename"], json!(staged.filename));
    assert_eq!(saved["sizeStr"], json!("51.20 KB"));
    assert_eq!(saved["type"], json!("image/png"));
    assert!(saved.get("temporaryUrl").is_none());

    let removed = s.editor.delete(&staged.name).await;
    assert_eq!(removed.map(|r| r.name), Some(staged.name.clone()));
    assert!(s.transfer.get_data().is_empty());
    assert!(s.editor.get_data().is_empty());
    eventually(|| s.stored_field("heroImg").get(&staged.name).is_none()).await;

    assert_eq!(s.readiness(), vec![false, true, false]);
    assert_eq!(s.toasts.messages.lock().last().map(String::as_str), Some("Image deleted."));
    assert_eq!(s.spinner.shown(), 2);
    assert_eq!(s.spinner.hidden(), 2);
    assert!(s.toasts.warnings.lock().is_empty());

    pump.abort();
}

#[tokio::test]
async fn replacing_a_single_image_clears_the_old_field() {
    let s = setup(hero());
    let pump = s.editor.attach();

    let first = s.transfer.add_file(FileUpload::new("a.jpg", "image/jpeg", 900)).unwrap();
    s.transfer
        .complete_upload(&first.name, ProcessedVariants::new("https://cdn/a-opt.jpg"))
        .unwrap();
    eventually(|| s.editor.is_ready()).await;
    assert!(s.editor.save().await);
    assert!(s.stored_field("heroImg").get(&first.name).is_some());

    let second = s.transfer.add_file(FileUpload::new("b.jpg", "image/jpeg", 900)).unwrap();
    eventually(|| s.stored_field("heroImg").get(&first.name).is_none()).await;
    eventually(|| s.editor.get_data().contains(&second.name)).await;
    assert_eq!(s.editor.get_data().len(), 1);

    pump.abort();
}

#[tokio::test]
async fn delete_all_in_gallery_mode() {
    let config = EditorConfig::new("cms", "home").with_allow_multiple(true);
    let s = setup(config);
    let pump = s.editor.attach();

    for file in ["one.png", "two.png", "three.png"] {
        let r = s.transfer.add_file(FileUpload::new(file, "image/png", 4096)).unwrap();
        s.transfer
            .complete_upload(&r.name, ProcessedVariants::new(format!("https://cdn/{file}")))
            .unwrap();
    }
    eventually(|| s.editor.get_data().len() == 3 && s.editor.is_ready()).await;

    assert!(s.editor.save().await);
    assert_eq!(s.toasts.messages.lock().as_slice(), ["Images saved."]);
    assert_eq!(s.stored_field("images").as_object().map(|m| m.len()), Some(3));

    assert!(s.editor.delete_all().await);
    assert!(s.editor.get_data().is_empty());
    assert!(!s.editor.is_ready());
    eventually(|| s.stored_field("images").as_object().is_some_and(|m| m.is_empty())).await;
    assert_eq!(s.toasts.messages.lock().last().map(String::as_str), Some("Images deleted."));

    pump.abort();
}

#[tokio::test]
async fn unknown_delete_warns_and_rejected_files_never_appear() {
    let s = setup(hero());
    let pump = s.editor.attach();

    assert_err!(s.transfer.add_file(FileUpload::new("notes.txt", "text/plain", 10)));
    assert!(s.editor.get_data().is_empty());

    assert!(s.editor.delete("ghost").await.is_none());
    assert_eq!(
        s.toasts.warnings.lock().as_slice(),
        ["Sorry, an unexpected error occurred!"]
    );
    assert_eq!(s.spinner.shown(), s.spinner.hidden());
    assert_eq!(s.readiness(), vec![false]);

    pump.abort();
}
