//! Prompt construction for question generation and answer analysis.
//!
//! User-supplied text (name, age, answers) is embedded verbatim. Nothing here
//! escapes or truncates it, so a profile can steer the model; callers that
//! accept untrusted input should bound it themselves.

use schemars::{schema_for, JsonSchema};

use crate::models::{Answer, UserProfile};

/// Questions requested per generation call.
pub const BATCH_SIZE: usize = 15;
/// Options requested per multiple-choice question.
pub const OPTIONS_PER_QUESTION: usize = 4;
/// Question categories, each receiving `BATCH_SIZE / 3` questions.
pub const CATEGORIES: [&str; 3] = ["passion", "learning", "personality"];

/// Marker used in the analysis prompt when the profile lists no disability.
pub const NO_DISABILITY_MARKER: &str = "Tidak ada";

/// Question format requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    MultipleChoice,
    Essay,
}

impl Modality {
    /// Any reported disability switches the quiz to multiple choice.
    pub fn for_profile(profile: &UserProfile) -> Self {
        if profile.has_disability() {
            Self::MultipleChoice
        } else {
            Self::Essay
        }
    }

    pub fn question_type(self) -> crate::models::QuestionType {
        match self {
            Self::MultipleChoice => crate::models::QuestionType::MultipleChoice,
            Self::Essay => crate::models::QuestionType::Essay,
        }
    }

    pub fn type_label(self) -> &'static str {
        self.question_type().as_str()
    }

    fn profile_line(self, profile: &UserProfile) -> String {
        match self {
            Self::MultipleChoice => format!(
                "User memiliki kondisi: {}. Buat pertanyaan PILIHAN GANDA dengan {} opsi yang jelas dan mudah dipahami.",
                profile.disabilities.join(", "),
                OPTIONS_PER_QUESTION
            ),
            Self::Essay => {
                "User tidak memiliki kondisi khusus. Buat pertanyaan ESSAY yang mendalam dan reflektif.".to_string()
            }
        }
    }

    fn format_rule(self) -> String {
        match self {
            Self::MultipleChoice => format!(
                "Setiap pertanyaan HARUS punya {} pilihan jawaban yang spesifik dan berbeda.",
                OPTIONS_PER_QUESTION
            ),
            Self::Essay => {
                "Setiap pertanyaan adalah ESSAY (options kosong []), user akan menulis jawaban bebas.".to_string()
            }
        }
    }

    fn style_rule(self) -> &'static str {
        match self {
            Self::MultipleChoice => {
                "Jawaban harus mencerminkan tipe berbeda (visual, auditory, kinesthetic, logical, social)"
            }
            Self::Essay => "Pertanyaan harus terbuka dan mendorong refleksi mendalam",
        }
    }

    fn options_placeholder(self) -> &'static str {
        match self {
            Self::MultipleChoice => r#"["opsi A", "opsi B", "opsi C", "opsi D"]"#,
            Self::Essay => "[]",
        }
    }

    fn worked_example(self) -> &'static str {
        match self {
            Self::MultipleChoice => r#"CONTOH PILIHAN GANDA:
{
  "id": 1,
  "question": "Ketika belajar hal baru, cara mana yang paling kamu sukai?",
  "options": ["Melihat gambar atau video", "Mendengar penjelasan guru", "Praktek langsung", "Membaca buku"],
  "category": "learning",
  "type": "multiple-choice"
}"#,
            Self::Essay => r#"CONTOH ESSAY:
{
  "id": 1,
  "question": "Ceritakan pengalaman yang paling membuatmu bersemangat dalam 6 bulan terakhir. Apa yang membuatnya spesial?",
  "options": [],
  "category": "passion",
  "type": "essay"
}"#,
        }
    }
}

/// Prompt asking for one batch of adaptive questions for `profile`.
pub fn build_question_prompt(profile: &UserProfile) -> String {
    let modality = Modality::for_profile(profile);
    let per_category = BATCH_SIZE / CATEGORIES.len();

    format!(
        r#"Kamu adalah sistem assessment untuk menentukan passion, minat, dan gaya belajar.

PROFIL USER:
- Nama: {name}
- Usia: {age} tahun
- {profile_line}

TIPE PERTANYAAN: {type_upper}

TUGAS: Generate TEPAT {batch} pertanyaan adaptive untuk menilai:
1. Passion & interest ({n} pertanyaan)
2. Learning style ({n} pertanyaan)
3. Personality & career fit ({n} pertanyaan)

ATURAN:
- Gunakan bahasa Indonesia yang sederhana dan jelas
- {format_rule}
- {style_rule}
- Jangan terlalu teknis atau akademis
- Sesuaikan dengan usia user

FORMAT OUTPUT (HARUS JSON VALID):
[
  {{
    "id": 1,
    "question": "pertanyaan di sini",
    "options": {options},
    "category": "{categories}",
    "type": "{type_label}"
  }}
]

{example}

OUTPUT HARUS JSON ARRAY SAJA, TANPA PENJELASAN TAMBAHAN."#,
        name = profile.name,
        age = profile.age,
        profile_line = modality.profile_line(profile),
        type_upper = modality.type_label().to_uppercase(),
        batch = BATCH_SIZE,
        n = per_category,
        format_rule = modality.format_rule(),
        style_rule = modality.style_rule(),
        options = modality.options_placeholder(),
        categories = CATEGORIES.join("/"),
        type_label = modality.type_label(),
        example = modality.worked_example(),
    )
}

/// One `Q<id> (<category>): <answer>` line per answer, in the given order.
pub fn answers_summary(answers: &[Answer]) -> String {
    answers
        .iter()
        .map(|a| format!("Q{} ({}): {}", a.question_id, a.category, a.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking for the narrative analysis of a completed quiz.
pub fn build_analysis_prompt(profile: &UserProfile, answers: &[Answer]) -> String {
    let conditions = if profile.disabilities.is_empty() {
        NO_DISABILITY_MARKER.to_string()
    } else {
        profile.disabilities.join(", ")
    };

    format!(
        r#"Kamu adalah AI career counselor dan learning style expert.

PROFIL USER:
- Nama: {name}
- Usia: {age} tahun
- Kondisi: {conditions}

JAWABAN USER:
{summary}

TUGAS: Analisis jawaban dan berikan assessment lengkap.

FORMAT OUTPUT (HARUS JSON VALID):
{{
  "passion": ["passion 1", "passion 2", "passion 3"],
  "learningStyle": "nama gaya belajar (Visual/Auditory/Kinesthetic/Reading-Writing/Social/Solitary/Logical)",
  "careerPotential": ["karir 1", "karir 2", "karir 3", "karir 4"],
  "recommendations": "penjelasan lengkap 2-3 paragraf tentang hasil assessment ini dan kenapa cocok untuk user",
  "tips": ["tip 1", "tip 2", "tip 3", "tip 4"],
  "activities": ["aktivitas 1", "aktivitas 2", "aktivitas 3", "aktivitas 4"]
}}

ATURAN:
- Berikan analisis yang personal dan spesifik
- Gunakan bahasa Indonesia yang hangat dan supportif
- Passion harus spesifik (misal: "Desain Grafis", "Pemrograman", "Musik")
- Career harus realistis dan beragam
- Tips harus actionable dan praktis
- Activities harus konkret dan bisa dilakukan

OUTPUT HARUS JSON OBJECT SAJA, TANPA PENJELASAN TAMBAHAN."#,
        name = profile.name,
        age = profile.age,
        conditions = conditions,
        summary = answers_summary(answers),
    )
}

/// Append a JSON Schema for `T` to `prompt`.
pub fn with_schema_guidance<T>(prompt: String) -> String
where
    T: JsonSchema,
{
    let schema = schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nThe JSON must match this schema:\n```json\n{}\n```",
        prompt, schema_json
    )
}
