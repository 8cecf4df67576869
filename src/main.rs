use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use morais::api::ExecuteRequest;
use morais::config::session::Session;
use morais::dashboard::Dashboard;
use morais::interaction::{CodeExecutor, InteractionController, SystemClipboard};
use morais::lesson::Lesson;
use morais::progress::ProgressStore;
use morais::render::Renderer;
use morais::vocabulary::{self, Flashcard, FlashcardDeck, VocabularyProgress, VocabularyStreak};
use morais::wordgame::{Game, GameStatus};
use morais::{AppContext, Player, ThemeMode};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "morais")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Work without the server (progress is kept on this device)
    #[arg(long, global = true)]
    offline: bool,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a lesson in the terminal player
    Play {
        /// Lesson ID (defaults to the last lesson played)
        lesson_id: Option<String>,
        /// Load the lesson document from a JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Render a lesson to HTML
    Render {
        lesson_id: Option<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show progress through a lesson
    Progress {
        lesson_id: Option<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print the raw progress record
        #[arg(long)]
        json: bool,
    },
    /// Show dashboard statistics and recent activity
    Dashboard {
        /// Print the HTML widget instead of text
        #[arg(long)]
        html: bool,
    },
    /// Run a code file through the execution service
    Run {
        path: PathBuf,
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Show, answer or get help with the daily challenge
    Challenge {
        #[command(subcommand)]
        action: Option<ChallengeAction>,
    },
    /// Play the daily word game
    Wordle,
    /// Review a flashcard deck
    Vocab {
        /// JSON array of flashcards
        deck: PathBuf,
    },
    /// Show or change the colour theme (dark, light, toggle)
    Theme { mode: Option<String> },
}

#[derive(Subcommand)]
enum ChallengeAction {
    /// Print today's challenge
    Show,
    /// Submit an answer (JSON file)
    Submit { answer: PathBuf },
    /// Spend a helper (JSON file with the helper request)
    Helper { request: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the player screen stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "morais=info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut ctx = AppContext::load(cli.offline)?;
    if let Some(url) = &cli.api_url {
        ctx.config.apply_api_url(url);
        ctx = AppContext::from_parts(ctx.config, ctx.store, cli.offline)?;
    }

    match cli.command.unwrap_or(Commands::Play { lesson_id: None, file: None }) {
        Commands::Play { lesson_id, file } => play(&ctx, lesson_id, file).await,
        Commands::Render { lesson_id, file, output } => render(&ctx, lesson_id, file, output).await,
        Commands::Progress { lesson_id, file, json } => progress(&ctx, lesson_id, file, json).await,
        Commands::Dashboard { html } => dashboard(&ctx, html).await,
        Commands::Run { path, language } => run_code(&ctx, &path, language).await,
        Commands::Challenge { action } => challenge(&ctx, action.unwrap_or(ChallengeAction::Show)).await,
        Commands::Wordle => wordle(),
        Commands::Vocab { deck } => vocab(&ctx, &deck),
        Commands::Theme { mode } => theme(&mut ctx, mode.as_deref()),
    }
}

/// Fetch a lesson by id, or from a JSON document on disk
async fn load_lesson(ctx: &AppContext, lesson_id: Option<String>, file: Option<PathBuf>) -> Result<Arc<Lesson>> {
    let mut fetcher = ctx.fetcher();

    let embedded = match &file {
        Some(path) => {
            let contents =
                std::fs::read_to_string(path).with_context(|| format!("Failed to read lesson from {:?}", path))?;
            let document = serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {:?}", path))?;
            Some(fetcher.embed(document)?)
        }
        None => None,
    };

    let lesson_id = match lesson_id.or(embedded) {
        Some(id) => id,
        None => match Session::load()?.current_lesson_id {
            Some(id) => id,
            None => bail!("No lesson given. Pass a lesson ID or --file."),
        },
    };

    fetcher.fetch_lesson(&lesson_id).await.with_context(|| format!("Could not load lesson {}", lesson_id))
}

async fn play(ctx: &AppContext, lesson_id: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let lesson = load_lesson(ctx, lesson_id, file).await?;
    let store = ProgressStore::load(lesson.clone(), ctx.rule_table(), ctx.persistence()).await;
    let store = Arc::new(Mutex::new(store));

    let executor: Option<Arc<dyn CodeExecutor>> =
        if ctx.offline { None } else { Some(Arc::new(ctx.client.clone())) };
    let controller = InteractionController::new(lesson.clone(), store.clone(), executor, Arc::new(SystemClipboard))
        .with_default_language(ctx.config.default_language.clone());

    tracing::info!("{} opened {}", ctx.display_name(), lesson.id);
    let player = Player::new(lesson, store, controller, ctx.store.clone(), ctx.theme).await;
    player.run(ctx.config.autosave_interval()).await?;
    Ok(())
}

async fn render(
    ctx: &AppContext,
    lesson_id: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let lesson = load_lesson(ctx, lesson_id, file).await?;
    let record = ctx.persistence().load(&lesson.id).await;
    let html = Renderer::new(ctx.theme).render(&lesson, &record).to_html();

    match output {
        Some(path) => {
            std::fs::write(&path, html).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!("Rendered {} to {:?}", lesson.id, path);
        }
        None => println!("{}", html),
    }
    Ok(())
}

async fn progress(ctx: &AppContext, lesson_id: Option<String>, file: Option<PathBuf>, json: bool) -> Result<()> {
    let lesson = load_lesson(ctx, lesson_id, file).await?;
    let store = ProgressStore::load(lesson.clone(), ctx.rule_table(), ctx.persistence()).await;
    let record = store.record();

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("{} ({})", lesson.title, lesson.id);
    println!(
        "{} of {} blocks, {}%{}",
        record.completed_blocks.len(),
        lesson.total_blocks(),
        record.progress,
        if record.completed { " - complete" } else { "" }
    );
    for block in lesson.ordered_blocks() {
        let marker = morais::ui::block_list::status_marker(store.status(&block.id));
        println!("  {} {}", marker, block.display_title());
    }
    Ok(())
}

async fn dashboard(ctx: &AppContext, html: bool) -> Result<()> {
    if ctx.offline {
        bail!("The dashboard needs the server. Drop --offline.");
    }
    let dashboard = Dashboard::load(&ctx.client).await.context("Could not load the dashboard")?;
    if html {
        println!("{}", dashboard.render().to_html());
    } else {
        println!("Welcome back, {}", ctx.display_name());
        print!("{}", dashboard.to_text());
    }
    Ok(())
}

async fn run_code(ctx: &AppContext, path: &PathBuf, language: Option<String>) -> Result<()> {
    if ctx.offline {
        bail!("Code execution is not available offline.");
    }
    let code = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let language = language
        .or_else(|| path.extension().and_then(|e| e.to_str()).and_then(language_for_extension))
        .unwrap_or_else(|| ctx.config.default_language.clone());

    let response = ctx.client.execute(&ExecuteRequest::new(code, language)).await?;
    print!("{}", response.output);
    if let (Some(passed), Some(total)) = (response.tests_passed, response.total_tests) {
        println!("{} of {} tests passed", passed, total);
    }
    match response.runtime_error() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

async fn challenge(ctx: &AppContext, action: ChallengeAction) -> Result<()> {
    if ctx.offline {
        bail!("Challenges need the server. Drop --offline.");
    }
    let reply = match action {
        ChallengeAction::Show => ctx.client.daily_challenge().await.context("Could not load today's challenge")?,
        ChallengeAction::Submit { answer } => {
            ctx.client.submit_challenge(&read_json(&answer)?).await.context("Submission failed")?
        }
        ChallengeAction::Helper { request } => {
            ctx.client.use_challenge_helper(&read_json(&request)?).await.context("Could not use the helper")?
        }
    };
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Read a JSON payload from disk
fn read_json(path: &Path) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("{:?} is not valid JSON", path))
}

fn language_for_extension(ext: &str) -> Option<String> {
    let language = match ext {
        "py" => "python",
        "js" | "mjs" => "javascript",
        "ts" => "typescript",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "c" => "c",
        "cpp" | "cc" => "cpp",
        "rb" => "ruby",
        "sh" => "bash",
        _ => return None,
    };
    Some(language.to_string())
}

fn wordle() -> Result<()> {
    let mut game = Game::daily(vocabulary::today());
    println!("Guess the five-letter word. You have {} tries.", game.remaining());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while game.status() == GameStatus::InProgress {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        match game.guess(line?.trim()) {
            Ok(guess) => println!("  {}", guess.symbols()),
            Err(e) => println!("  {}", e),
        }
    }

    match game.status() {
        GameStatus::Won => println!("Solved in {}!", game.guesses().len()),
        GameStatus::Lost => println!("The word was {}.", game.answer().unwrap_or("?")),
        GameStatus::InProgress => {}
    }
    Ok(())
}

fn vocab(ctx: &AppContext, path: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let cards: Vec<Flashcard> = serde_json::from_str(&contents).context("Flashcard deck must be a JSON array")?;
    let deck = FlashcardDeck::new(cards);

    let mut known = VocabularyProgress::load(&ctx.store);
    let mut streak = VocabularyStreak::load(&ctx.store);
    let today = vocabulary::today();
    streak.record(today);

    let due: Vec<Flashcard> = deck.due(&known).into_iter().cloned().collect();
    println!("{} of {} cards due. Streak: {} days", due.len(), deck.len(), streak.current(today));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    for card in &due {
        print!("{} (enter to flip) ", card.term);
        io::stdout().flush()?;
        if lines.next().transpose()?.is_none() {
            break;
        }
        println!("  {}", card.translation);
        if let Some(example) = &card.example {
            println!("  {}", example);
        }
        print!("Known? [y/N] ");
        io::stdout().flush()?;
        match lines.next().transpose()? {
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => known.mark_known(&card.id),
            Some(_) => known.mark_review(&card.id),
            None => break,
        }
    }

    known.save(&ctx.store)?;
    streak.save(&ctx.store)?;
    Ok(())
}

fn theme(ctx: &mut AppContext, mode: Option<&str>) -> Result<()> {
    let next = match mode {
        None => {
            println!("{}", ctx.theme);
            return Ok(());
        }
        Some("toggle") => ctx.theme.toggled(),
        Some(other) => other.parse::<ThemeMode>().map_err(anyhow::Error::msg)?,
    };
    ctx.set_theme(next)?;
    println!("Theme set to {}", next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn challenge_payload_must_be_json() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("answer.json");
        fs::write(&good, r#"{"challenge_id": 7, "answer": "print(42)"}"#).unwrap();
        assert_eq!(read_json(&good).unwrap()["challenge_id"], 7);

        let bad = dir.path().join("answer.txt");
        fs::write(&bad, "print(42)").unwrap();
        assert!(read_json(&bad).is_err());
        assert!(read_json(&dir.path().join("missing.json")).is_err());
    }
}
