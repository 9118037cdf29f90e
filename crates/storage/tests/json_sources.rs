use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::BankId;
use storage::json::JsonDirSource;
use storage::repository::{BankSource, InMemoryBankSource, Storage, StorageError};
use storage::BankRecord;

const BANK_DOC: &str = r#"{
    "pass_percent": 70,
    "questions": [
        {
            "prompt": { "question": "2 + 2?", "answers": ["3", "4"], "explanation": "Arithmetic." },
            "assessment_type": "single-select",
            "correct_response": ["B"]
        },
        {
            "prompt": { "question": "Primes?", "answers": ["2", "4", "5"] },
            "assessment_type": "multi-select",
            "correct_response": ["a", "c"]
        }
    ]
}"#;

async fn build_dir(files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quiz-banks-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    for (name, body) in files {
        tokio::fs::write(dir.join(name), body).await.unwrap();
    }
    dir
}

#[tokio::test]
async fn json_dir_reads_and_decodes_documents() {
    let dir = build_dir(&[("test002_questions.json", BANK_DOC)]).await;
    let storage = Storage::json_dir(&dir);

    let record = storage.banks.fetch_bank(BankId::Test002).await.unwrap();
    let bank = record.into_bank(BankId::Test002).unwrap();
    assert_eq!(bank.len(), 2);
    assert_eq!(bank.pass_percent().value(), 70);
    assert!(bank.question(0).unwrap().is_correct_option(1));

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn json_dir_missing_file_is_not_found() {
    let dir = build_dir(&[]).await;
    let source = JsonDirSource::new(&dir);

    let err = source.fetch_bank(BankId::Full).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(BankId::Full)));
    assert!(err.is_unreachable());

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn json_dir_garbage_is_not_unreachable() {
    let dir = build_dir(&[("questions.json", "[1, 2")]).await;
    let source = JsonDirSource::new(&dir);

    let err = source.fetch_bank(BankId::Questions).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
    assert!(!err.is_unreachable());

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn unreachable_http_falls_back_to_directory() {
    let dir = build_dir(&[("test005_questions.json", BANK_DOC)]).await;
    // Port 9 (discard) on loopback refuses connections.
    let http = storage::json::HttpBankSource::new("http://127.0.0.1:9/banks").unwrap();
    let storage = Storage::http_with_fallback(http, &dir);

    let record = storage.banks.fetch_bank(BankId::Test005).await.unwrap();
    assert_eq!(record.questions.len(), 2);

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn in_memory_storage_serves_cloned_records() {
    let record = BankRecord::from_json(BANK_DOC.as_bytes()).unwrap();
    let source = InMemoryBankSource::new()
        .with_bank(BankId::Test006, record.clone())
        .unwrap();
    let storage = Storage::in_memory(source.clone());

    let fetched = storage.banks.fetch_bank(BankId::Test006).await.unwrap();
    assert_eq!(fetched, record);

    let shared: Arc<dyn BankSource> = Arc::new(source);
    assert_eq!(shared.describe(), "in-memory");
}
