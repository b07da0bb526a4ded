use pasio::models::{Answer, TestResult, UserProfile, KNOWN_DISABILITIES};
use pasio::prompts::{build_analysis_prompt, build_question_prompt, with_schema_guidance, Modality, NO_DISABILITY_MARKER};

#[test]
fn essay_prompt_for_profile_without_disability() {
    let prompt = build_question_prompt(&UserProfile::new("Dewi", "20"));
    assert!(prompt.contains("Nama: Dewi"));
    assert!(prompt.contains("Usia: 20 tahun"));
    assert!(prompt.contains("TIPE PERTANYAAN: ESSAY"));
    assert!(prompt.contains("\"type\": \"essay\""));
    assert!(prompt.contains("\"options\": []"));
    assert!(prompt.contains("TEPAT 15 pertanyaan"));
    assert!(!prompt.contains("PILIHAN GANDA dengan 4 opsi"));
    assert!(prompt.trim_end().ends_with("OUTPUT HARUS JSON ARRAY SAJA, TANPA PENJELASAN TAMBAHAN."));
}

#[test]
fn multiple_choice_prompt_lists_conditions() {
    let profile = UserProfile::new("Budi", "17")
        .with_disability("Disabilitas Visual")
        .with_disability("Disabilitas Motorik");
    let prompt = build_question_prompt(&profile);
    assert!(prompt.contains("User memiliki kondisi: Disabilitas Visual, Disabilitas Motorik."));
    assert!(prompt.contains("PILIHAN GANDA dengan 4 opsi"));
    assert!(prompt.contains("TIPE PERTANYAAN: MULTIPLE-CHOICE"));
    assert!(prompt.contains("\"type\": \"multiple-choice\""));
}

#[test]
fn analysis_prompt_without_disability_uses_marker() {
    let answers = vec![
        Answer { question_id: 1, answer: "Menggambar".into(), category: "passion".into() },
        Answer { question_id: 2, answer: "Video".into(), category: "learning".into() },
    ];
    let prompt = build_analysis_prompt(&UserProfile::new("Dewi", "20"), &answers);
    assert!(prompt.contains(&format!("Kondisi: {NO_DISABILITY_MARKER}")));
    assert!(prompt.contains("Q1 (passion): Menggambar\nQ2 (learning): Video"));
    assert!(prompt.trim_end().ends_with("OUTPUT HARUS JSON OBJECT SAJA, TANPA PENJELASAN TAMBAHAN."));
}

#[test]
fn analysis_prompt_with_disability_lists_it() {
    let profile = UserProfile::new("Budi", "17").with_disability("Disabilitas Audio");
    let prompt = build_analysis_prompt(&profile, &[]);
    assert!(prompt.contains("Kondisi: Disabilitas Audio"));
    assert!(!prompt.contains(NO_DISABILITY_MARKER));
}

#[test]
fn schema_guidance_appends_result_schema() {
    let prompt = with_schema_guidance::<TestResult>("Analisis ini.".to_string());
    assert!(prompt.starts_with("Analisis ini."));
    assert!(prompt.contains("## Response Format"));
    assert!(prompt.contains("learningStyle"));
    assert!(prompt.contains("careerPotential"));
}

#[test]
fn every_known_disability_switches_to_multiple_choice() {
    for label in KNOWN_DISABILITIES {
        let profile = UserProfile::new("Sari", "19").with_disability(label);
        assert_eq!(Modality::for_profile(&profile), Modality::MultipleChoice, "{label}");
        let prompt = build_question_prompt(&profile);
        assert!(prompt.contains(&format!("User memiliki kondisi: {label}.")));
        assert!(prompt.contains("PILIHAN GANDA dengan 4 opsi"));
    }
}
