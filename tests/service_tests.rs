mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use pasio::clients::{MockClient, MockResponse};
use pasio::config::{ModalityPolicy, ServiceConfig};
use pasio::error::{AssessmentError, ErrorKind, PipelineError, TransportError};
use pasio::interceptors::FileInterceptor;
use pasio::models::{Answer, QuestionType, UserProfile};
use pasio::prompts::BATCH_SIZE;
use pasio::AssessmentService;

use crate::test_utils::{
    answer_all, budi_visual, chatty, dewi, essay_batch_json, init_tracing, mock_service, mock_service_with,
    multiple_choice_batch_json, result_json,
};

#[tokio::test]
async fn essay_flow_end_to_end() {
    let (service, handle) = mock_service();
    handle.push_text(chatty(&essay_batch_json()));
    handle.push_text(chatty(&result_json()));

    let questions = service.generate_questions(&dewi()).await.unwrap();
    assert_eq!(questions.len(), BATCH_SIZE);
    assert!(questions.iter().all(|q| q.kind == QuestionType::Essay));
    assert!(service.has_session());

    let generation_prompt = handle.last_prompt().unwrap();
    assert!(generation_prompt.contains("Nama: Dewi"));
    assert!(generation_prompt.contains("ESSAY"));

    let answers = answer_all(&questions);
    let result = service.analyze_answers(&dewi(), &answers).await.unwrap();
    assert_eq!(result.learning_style, "Visual");
    assert_eq!(result.passion, vec!["Desain Grafis", "Fotografi"]);

    let analysis_prompt = handle.last_prompt().unwrap();
    assert!(analysis_prompt.contains("Kondisi: Tidak ada"));
    assert!(analysis_prompt.contains("Q15 (personality):"));
    assert_eq!(handle.remaining(), 0);
}

#[tokio::test]
async fn multiple_choice_for_profile_with_disability() {
    let (service, handle) = mock_service();
    handle.push_text(multiple_choice_batch_json().to_string());

    let questions = service.generate_questions(&budi_visual()).await.unwrap();
    assert!(questions.iter().all(|q| q.kind == QuestionType::MultipleChoice && q.options.len() == 4));

    let prompt = handle.last_prompt().unwrap();
    assert!(prompt.contains("Disabilitas Visual"));
    assert!(prompt.contains("PILIHAN GANDA dengan 4 opsi"));
}

#[tokio::test]
async fn prose_only_response_is_an_extraction_failure() {
    let (service, handle) = mock_service();
    handle.push_text("Maaf, saya tidak bisa membuat pertanyaan saat ini.");

    let err = service.generate_questions(&dewi()).await.unwrap_err();
    assert!(matches!(err, AssessmentError::QuestionGeneration(PipelineError::Extraction(_))));
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert!(!service.has_session());
}

#[tokio::test]
async fn transport_error_is_wrapped_and_classified() {
    let (service, handle) = mock_service();
    handle.push_error(TransportError::RateLimit);

    let err = service.generate_questions(&dewi()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.is_transient());
    assert_eq!(err.to_string(), "failed to generate questions");
}

#[tokio::test]
async fn wrong_modality_rejected_unless_lenient() {
    let (strict, handle) = mock_service();
    handle.push_text(essay_batch_json().to_string());
    let err = strict.generate_questions(&budi_visual()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);

    let (lenient, handle) =
        mock_service_with(ServiceConfig::default().with_modality_policy(ModalityPolicy::Lenient));
    handle.push_text(essay_batch_json().to_string());
    let questions = lenient.generate_questions(&budi_visual()).await.unwrap();
    assert_eq!(questions.len(), BATCH_SIZE);
}

#[tokio::test]
async fn analysis_before_generation_is_not_initialized() {
    let (service, handle) = mock_service();
    let answers = vec![Answer { question_id: 1, answer: "Musik".into(), category: "passion".into() }];

    let err = service.analyze_answers(&dewi(), &answers).await.unwrap_err();
    assert!(matches!(err, AssessmentError::NotInitialized));
    assert!(handle.prompts().is_empty());
}

#[tokio::test]
async fn answers_outside_the_batch_are_rejected() {
    let (service, handle) = mock_service();
    handle.push_text(essay_batch_json().to_string());
    service.generate_questions(&dewi()).await.unwrap();

    let answers = vec![Answer { question_id: 99, answer: "Musik".into(), category: "passion".into() }];
    let err = service.analyze_answers(&dewi(), &answers).await.unwrap_err();
    assert!(matches!(err, AssessmentError::UnknownQuestion { question_id: 99 }));
    assert_eq!(handle.prompts().len(), 1);
}

#[tokio::test]
async fn incomplete_profile_never_reaches_the_client() {
    let (service, handle) = mock_service();
    let err = service.generate_questions(&UserProfile::new("  ", "20")).await.unwrap_err();
    assert!(matches!(err, AssessmentError::InvalidProfile(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(handle.prompts().is_empty());
}

#[tokio::test]
async fn overlapping_calls_are_busy() {
    init_tracing();
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::Delayed(
        Duration::from_millis(200),
        essay_batch_json().to_string(),
    )]);
    let service = AssessmentService::new(client, ServiceConfig::default());
    let profile = dewi();

    let (first, second) = tokio::join!(service.generate_questions(&profile), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        service.generate_questions(&profile).await
    });

    assert_eq!(first.unwrap().len(), BATCH_SIZE);
    let err = second.unwrap_err();
    assert!(matches!(err, AssessmentError::Busy));
    assert_eq!(err.kind(), ErrorKind::Busy);
}

#[tokio::test]
async fn service_is_reusable_after_failure() {
    let (service, handle) = mock_service();
    handle.push_text("bukan json");
    handle.push_text(essay_batch_json().to_string());

    assert!(service.generate_questions(&dewi()).await.is_err());
    let questions = service.generate_questions(&dewi()).await.unwrap();
    assert_eq!(questions.len(), BATCH_SIZE);
}

#[tokio::test]
async fn failed_generation_keeps_previous_session() {
    let (service, handle) = mock_service();
    handle.push_text(essay_batch_json().to_string());
    handle.push_error(TransportError::Http("connection reset".into()));
    handle.push_text(result_json().to_string());

    let questions = service.generate_questions(&dewi()).await.unwrap();
    assert!(service.generate_questions(&dewi()).await.is_err());

    let result = service.analyze_answers(&dewi(), &answer_all(&questions)).await.unwrap();
    assert_eq!(result.learning_style, "Visual");
}

#[tokio::test]
async fn analysis_failure_is_wrapped() {
    let (service, handle) = mock_service();
    handle.push_text(essay_batch_json().to_string());
    handle.push_text("{\"passion\": [\"Musik\"]}");

    let questions = service.generate_questions(&dewi()).await.unwrap();
    let err = service.analyze_answers(&dewi(), &answer_all(&questions)).await.unwrap_err();
    assert!(matches!(err, AssessmentError::AnswerAnalysis(_)));
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert_eq!(err.user_message(), "Gagal menganalisis jawaban. Silakan coba lagi.");
}

#[tokio::test]
async fn reset_session_requires_new_generation() {
    let (service, handle) = mock_service();
    handle.push_text(essay_batch_json().to_string());
    let questions = service.generate_questions(&dewi()).await.unwrap();

    service.reset_session();
    let err = service.analyze_answers(&dewi(), &answer_all(&questions)).await.unwrap_err();
    assert!(matches!(err, AssessmentError::NotInitialized));
}

#[tokio::test]
async fn schema_guidance_is_appended_when_enabled() {
    let (service, handle) = mock_service_with(ServiceConfig::default().with_schema_guidance(true));
    handle.push_text(essay_batch_json().to_string());
    service.generate_questions(&dewi()).await.unwrap();
    assert!(handle.last_prompt().unwrap().contains("## Response Format"));
}

#[tokio::test]
async fn interceptor_records_each_exchange() {
    let dir = std::env::temp_dir().join(format!("pasio-interceptor-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let (client, handle) = MockClient::new();
    handle.push_text(essay_batch_json().to_string());
    handle.push_text(result_json().to_string());
    let service = AssessmentService::new(client, ServiceConfig::default())
        .with_interceptor(Arc::new(FileInterceptor::new(&dir)));

    let questions = service.generate_questions(&dewi()).await.unwrap();
    service.analyze_answers(&dewi(), &answer_all(&questions)).await.unwrap();

    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("analyze_answers_"));
    assert!(names[1].starts_with("generate_questions_"));

    let recorded = std::fs::read_to_string(dir.join(&names[1])).unwrap();
    assert!(recorded.contains("## Prompt"));
    assert!(recorded.contains("Nama: Dewi"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn unwritable_interceptor_does_not_fail_the_operation() {
    let blocker = std::env::temp_dir().join(format!("pasio-blocker-{}", std::process::id()));
    std::fs::write(&blocker, "not a directory").unwrap();

    let (client, handle) = MockClient::new();
    handle.push_text(essay_batch_json().to_string());
    let service = AssessmentService::new(client, ServiceConfig::default())
        .with_interceptor(Arc::new(FileInterceptor::new(blocker.join("nested"))));

    let questions = service.generate_questions(&dewi()).await.unwrap();
    assert_eq!(questions.len(), BATCH_SIZE);

    let _ = std::fs::remove_file(&blocker);
}

#[tokio::test]
async fn trailing_comma_batch_is_a_decode_failure() {
    let (service, handle) = mock_service();
    let mut text = essay_batch_json().to_string();
    text.insert(text.len() - 1, ',');
    handle.push_text(text);

    let err = service.generate_questions(&dewi()).await.unwrap_err();
    assert!(matches!(err, AssessmentError::QuestionGeneration(PipelineError::Decode { .. })));
    assert_eq!(err.kind(), ErrorKind::Decode);
}
