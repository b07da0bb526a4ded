#![allow(dead_code)]

use std::sync::{Arc, Once};

use pasio::clients::{MockClient, MockHandle};
use pasio::config::ServiceConfig;
use pasio::models::{Answer, Question, UserProfile};
use pasio::prompts::{BATCH_SIZE, CATEGORIES};
use pasio::AssessmentService;
use serde_json::{json, Value};

pub fn init_tracing() {
    static START: Once = Once::new();
    START.call_once(|| {
        let _ = dotenvy::dotenv();
        let filter = if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::EnvFilter::from_default_env()
        } else {
            tracing_subscriber::EnvFilter::new("pasio=debug")
        };
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .without_time()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Service over a fresh mock with the default configuration.
pub fn mock_service() -> (AssessmentService<MockClient>, Arc<MockHandle>) {
    mock_service_with(ServiceConfig::default())
}

pub fn mock_service_with(config: ServiceConfig) -> (AssessmentService<MockClient>, Arc<MockHandle>) {
    init_tracing();
    let (client, handle) = MockClient::new();
    (AssessmentService::new(client, config), handle)
}

pub fn dewi() -> UserProfile {
    UserProfile::new("Dewi", "20")
}

pub fn budi_visual() -> UserProfile {
    UserProfile::new("Budi", "17").with_disability("Disabilitas Visual")
}

fn category_for(index: usize) -> &'static str {
    CATEGORIES[index * CATEGORIES.len() / BATCH_SIZE]
}

pub fn essay_batch_json() -> Value {
    let items: Vec<Value> = (0..BATCH_SIZE)
        .map(|i| {
            json!({
                "id": i + 1,
                "question": format!("Apa yang membuatmu bersemangat? ({})", i + 1),
                "options": [],
                "category": category_for(i),
                "type": "essay"
            })
        })
        .collect();
    Value::Array(items)
}

pub fn multiple_choice_batch_json() -> Value {
    let items: Vec<Value> = (0..BATCH_SIZE)
        .map(|i| {
            json!({
                "id": i + 1,
                "question": format!("Kegiatan mana yang paling kamu sukai? ({})", i + 1),
                "options": ["Menggambar", "Bermain musik", "Membaca", "Olahraga"],
                "category": category_for(i),
                "type": "multiple-choice"
            })
        })
        .collect();
    Value::Array(items)
}

pub fn result_json() -> Value {
    json!({
        "passion": ["Desain Grafis", "Fotografi"],
        "learningStyle": "Visual",
        "careerPotential": ["Desainer UI/UX", "Fotografer", "Animator"],
        "recommendations": "Kembangkan portofolio visual dan ikuti komunitas desain.",
        "tips": ["Gunakan peta pikiran", "Belajar dari video tutorial"],
        "activities": ["Kelas desain daring", "Lomba poster"]
    })
}

/// One answer per question, echoing the first option for multiple choice.
pub fn answer_all(questions: &[Question]) -> Vec<Answer> {
    questions
        .iter()
        .map(|q| match q.options.first() {
            Some(option) => Answer::for_question(q, option.clone()),
            None => Answer::for_question(q, "Saya suka menggambar dan mendesain poster."),
        })
        .collect()
}

/// Wrap JSON the way chatty models tend to.
pub fn chatty(value: &Value) -> String {
    format!(
        "Tentu! Berikut hasilnya dalam format yang diminta:\n```json\n{}\n```\nSemoga membantu.",
        serde_json::to_string_pretty(value).unwrap()
    )
}
