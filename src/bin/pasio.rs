use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pasio::app::{AppState, QuizProgress, Screen};
use pasio::clients::{ClientType, FlexibleClient, MockHandle};
use pasio::config::{ModalityPolicy, ServiceConfig};
use pasio::interceptors::FileInterceptor;
use pasio::models::{Answer, QuestionType, TestResult, UserProfile, KNOWN_DISABILITIES};
use pasio::prompts::{build_analysis_prompt, build_question_prompt, Modality, BATCH_SIZE, CATEGORIES, OPTIONS_PER_QUESTION};
use pasio::AssessmentService;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClientArg {
    Gemini,
    Deepseek,
    Claude,
    Mock,
}

impl From<ClientArg> for ClientType {
    fn from(arg: ClientArg) -> Self {
        match arg {
            ClientArg::Gemini => ClientType::Gemini,
            ClientArg::Deepseek => ClientType::DeepSeek,
            ClientArg::Claude => ClientType::Claude,
            ClientArg::Mock => ClientType::Mock,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Passion, learning style and career assessment powered by an LLM", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    PASIO_CLIENT       Client type when --client is absent (gemini|deepseek|claude|mock).
                       Without it the first provider with a key is used, else gemini.
    GEMINI_API_KEY     API key for Gemini (EXPO_PUBLIC_GEMINI_API_KEY also accepted)
    DEEPSEEK_API_KEY   API key for DeepSeek
    ANTHROPIC_API_KEY  API key for Claude
    RUST_LOG           Log filter, e.g. pasio=debug

EXAMPLES:
    pasio quiz --name Dewi --age 20
    pasio quiz --name Budi --age 17 --disability \"Disabilitas Visual\"
    pasio quiz --name Dewi --age 20 --client mock --record-dir ./exchanges
    pasio prompt questions --name Dewi --age 20")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the whole assessment interactively
    Quiz(QuizArgs),
    /// Print a prompt without calling any API
    Prompt {
        #[command(subcommand)]
        kind: PromptKind,
    },
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: String,
    /// Reported condition; repeat for several. Any value switches to multiple choice.
    /// Known labels: "Disabilitas Visual", "Disabilitas Audio", "Disabilitas Kognitif", "Disabilitas Motorik"
    #[arg(long = "disability")]
    disabilities: Vec<String>,
}

impl ProfileArgs {
    fn to_profile(&self) -> UserProfile {
        for label in self.disabilities.iter().filter(|d| !KNOWN_DISABILITIES.contains(&d.as_str())) {
            warn!(label = %label, known = ?KNOWN_DISABILITIES, "Unrecognized disability label, using it as given");
        }
        self.disabilities
            .iter()
            .fold(UserProfile::new(&self.name, &self.age), |p, d| p.with_disability(d))
    }
}

#[derive(Args)]
struct QuizArgs {
    #[command(flatten)]
    profile: ProfileArgs,

    /// Client type [default: PASIO_CLIENT, else the first provider with a key, else gemini]
    #[arg(short, long, value_enum)]
    client: Option<ClientArg>,

    /// Write every prompt/response pair as markdown into this directory
    #[arg(long)]
    record_dir: Option<PathBuf>,

    /// Append a JSON Schema of the expected output to each prompt
    #[arg(long)]
    schema_guidance: bool,

    /// Accept questions whose type differs from the requested one
    #[arg(long)]
    lenient: bool,
}

#[derive(Subcommand)]
enum PromptKind {
    /// Question generation prompt
    Questions(ProfileArgs),
    /// Answer analysis prompt
    Analysis {
        #[command(flatten)]
        profile: ProfileArgs,
        /// JSON file with an array of {questionId, answer, category}
        #[arg(long)]
        answers: PathBuf,
    },
}

fn init_tracing() {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pasio=warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Quiz(args) => run_quiz(args).await,
        Command::Prompt { kind: PromptKind::Questions(profile) } => {
            println!("{}", build_question_prompt(&profile.to_profile()));
            Ok(())
        }
        Command::Prompt { kind: PromptKind::Analysis { profile, answers } } => {
            let raw = std::fs::read_to_string(&answers)
                .with_context(|| format!("reading {}", answers.display()))?;
            let answers: Vec<Answer> = serde_json::from_str(&raw).context("parsing answers file")?;
            println!("{}", build_analysis_prompt(&profile.to_profile(), &answers));
            Ok(())
        }
    }
}

async fn run_quiz(args: QuizArgs) -> Result<()> {
    let client_type = match args.client {
        Some(arg) => arg.into(),
        None => ClientType::from_env()?,
    };
    let profile = args.profile.to_profile();

    let client = if client_type == ClientType::Mock {
        let (client, handle) = FlexibleClient::mock();
        eprintln!("Mode demo: jawaban AI di bawah ini adalah contoh, bukan hasil analisis nyata.");
        seed_demo_script(&handle, Modality::for_profile(&profile));
        client
    } else {
        FlexibleClient::from_type(client_type)?
    };
    info!(client = %client_type, "Starting assessment");

    let policy = if args.lenient { ModalityPolicy::Lenient } else { ModalityPolicy::Strict };
    let config = ServiceConfig::default()
        .with_modality_policy(policy)
        .with_schema_guidance(args.schema_guidance);
    let mut service = AssessmentService::new(client, config);
    if let Some(dir) = args.record_dir {
        service = service.with_interceptor(Arc::new(FileInterceptor::new(dir)));
    }

    let mut app = AppState::new();
    app.navigate(Screen::Onboarding)?;
    app.set_name(&profile.name);
    app.set_age(&profile.age);
    for label in &profile.disabilities {
        app.toggle_disability(label);
    }

    println!("Menyiapkan pertanyaan untuk {}...", profile.name);
    if let Err(e) = app.start_quiz(&service).await {
        eprintln!("{}", app.error().unwrap_or("Gagal membuat pertanyaan."));
        return Err(e).context("question generation failed");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(question) = app.current_question().cloned() {
        let (pos, total) = app.progress();
        println!("\nPertanyaan {pos} dari {total} [{}]", question.category);
        println!("{}", question.question);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            bail!("input closed before the quiz was finished");
        };
        let line = line?;

        let outcome = match question.kind {
            QuestionType::MultipleChoice => match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 => app.choose_option(n - 1),
                _ => app.submit_answer(&line),
            },
            QuestionType::Essay => app.submit_answer(&line),
        };

        match outcome {
            Ok(QuizProgress::Next(_)) => {}
            Ok(QuizProgress::Finished) => break,
            Err(e) => println!("{} ({e})", app.error().unwrap_or("Jawaban tidak valid")),
        }
    }

    println!("\nMenganalisis jawaban...");
    let outcome = app.finish_quiz(&service).await.map(TestResult::clone);
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", app.error().unwrap_or("Gagal menganalisis jawaban."));
            return Err(e).context("answer analysis failed");
        }
    };
    print_result(&result);
    Ok(())
}

fn print_result(result: &TestResult) {
    println!("\n== Passion ==");
    result.passion.iter().for_each(|p| println!("- {p}"));
    println!("\n== Gaya Belajar ==\n{}", result.learning_style);
    println!("\n== Potensi Karir ==");
    result.career_potential.iter().for_each(|c| println!("- {c}"));
    println!("\n== Rekomendasi ==\n{}", result.recommendations);
    println!("\n== Tips ==");
    result.tips.iter().for_each(|t| println!("- {t}"));
    println!("\n== Aktivitas ==");
    result.activities.iter().for_each(|a| println!("- {a}"));
}

/// Canned replies so `--client mock` can walk through the whole flow offline.
fn seed_demo_script(handle: &MockHandle, modality: Modality) {
    let per_category = BATCH_SIZE / CATEGORIES.len();
    let questions: Vec<serde_json::Value> = (0..BATCH_SIZE)
        .map(|i| {
            let category = CATEGORIES[i / per_category];
            let options: Vec<String> = match modality {
                Modality::MultipleChoice => (1..=OPTIONS_PER_QUESTION).map(|n| format!("Pilihan {n}")).collect(),
                Modality::Essay => Vec::new(),
            };
            serde_json::json!({
                "id": i + 1,
                "question": format!("Pertanyaan contoh {} tentang {}", i + 1, category),
                "options": options,
                "category": category,
                "type": modality.type_label(),
            })
        })
        .collect();
    handle.push_text(format!(
        "Berikut pertanyaannya:\n```json\n{}\n```",
        serde_json::Value::Array(questions)
    ));
    handle.push_text(
        serde_json::json!({
            "passion": ["Desain Grafis", "Musik"],
            "learningStyle": "Visual",
            "careerPotential": ["Desainer UI/UX", "Ilustrator"],
            "recommendations": "Ini adalah hasil contoh dari mode mock.",
            "tips": ["Buat portofolio kecil"],
            "activities": ["Ikut kelas desain daring"]
        })
        .to_string(),
    );
}
