use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use wordbook::app::AppStore;
use wordbook::config::Config;
use wordbook::engine::filter::{FilterOptions, SortKey, SortOrder};
use wordbook::logging;
use wordbook::session::result::QuizResult;
use wordbook::store::JsonStore;
use wordbook::store::schema::{ExportData, ThemeMode};
use wordbook::words::{LevelFilter, Word};

#[derive(Parser)]
#[command(name = "wordbook", version, about = "Vocabulary trainer with quizzes and bookmarks")]
struct Cli {
    #[arg(long, help = "Directory holding saved data")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Log filter (error, warn, info, debug, trace)")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List words, optionally searched, filtered and sorted
    Words {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long, default_value = "all")]
        level: LevelFilter,
        #[arg(short, long, help = "Only bookmarked words")]
        bookmarked: bool,
        #[arg(
            short,
            long,
            default_value = "english",
            help = "english, korean, level or last-studied"
        )]
        sort: SortKey,
        #[arg(long, help = "Sort descending")]
        desc: bool,
    },
    /// Toggle the bookmark on a word
    Bookmark { id: String },
    /// Show today's featured word
    Today,
    /// Show study progress and statistics
    Progress,
    /// List words answered incorrectly in past quizzes
    Wrong,
    /// Take a multiple-choice quiz
    Quiz {
        #[arg(short, long)]
        level: Option<LevelFilter>,
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Show or change settings
    Settings {
        #[arg(long, help = "light, dark or auto")]
        theme: Option<ThemeMode>,
        #[arg(long, help = "Enable or disable reminders")]
        notifications: Option<bool>,
        #[arg(long, help = "Daily reminder time as HH:MM")]
        reminder_time: Option<String>,
    },
    /// Delete all saved progress
    Reset {
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
    /// Write a backup of all saved data
    Export { path: PathBuf },
    /// Restore a backup written by `export`
    Import { path: PathBuf },
    /// Show the effective configuration
    Config {
        #[arg(long, help = "Write it to the config file")]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    logging::init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.data_dir));
    let kv = JsonStore::with_base_dir(data_dir.clone())
        .with_context(|| format!("cannot open data directory {}", data_dir.display()))?;
    let mut store = AppStore::new(kv);
    store.load_data().context("failed to load saved data")?;

    run(cli.command, &config, &mut store)?;

    if let Some(err) = store.last_write_error() {
        eprintln!("warning: some changes could not be saved: {err}");
    }
    Ok(())
}

fn run(command: Command, config: &Config, store: &mut AppStore) -> Result<()> {
    match command {
        Command::Words {
            query,
            level,
            bookmarked,
            sort,
            desc,
        } => {
            store.set_search_query(query);
            store.set_filter_options(FilterOptions {
                level,
                bookmarked_only: bookmarked,
                sort_by: sort,
                sort_order: if desc { SortOrder::Desc } else { SortOrder::Asc },
            });
            let words = store.filtered_words();
            for word in &words {
                print_word_line(word, store.is_bookmarked(&word.id));
            }
            println!("{} word(s)", words.len());
        }
        Command::Bookmark { id } => {
            if store.word(&id).is_none() {
                bail!("no word with id `{id}`");
            }
            if store.toggle_bookmark(&id) {
                println!("bookmarked {id}");
            } else {
                println!("removed bookmark from {id}");
            }
        }
        Command::Today => match store.word_of_the_day() {
            Some(word) => {
                println!("{} ({}) - {}", word.english, word.level, word.korean);
                if !word.example.is_empty() {
                    println!("  {}", word.example);
                    println!("  {}", word.meaning);
                }
            }
            None => println!("no words available"),
        },
        Command::Progress => print_progress(store),
        Command::Wrong => {
            let words = store.wrong_answer_words();
            if words.is_empty() {
                println!("no wrong answers yet");
            }
            for word in words {
                print_word_line(word, store.is_bookmarked(&word.id));
            }
        }
        Command::Quiz { level, count } => {
            let level = level.unwrap_or_else(|| config.level());
            let count = count.unwrap_or(config.default_question_count);
            run_quiz(store, level, count)?;
        }
        Command::Settings {
            theme,
            notifications,
            reminder_time,
        } => {
            if let Some(theme) = theme {
                store.set_theme(theme);
            }
            if notifications.is_some() || reminder_time.is_some() {
                let mut settings = store.settings().notifications.clone();
                if let Some(enabled) = notifications {
                    settings.enabled = enabled;
                }
                if let Some(time) = reminder_time {
                    settings.reminder_time = time;
                }
                if !settings.has_valid_reminder_time() {
                    bail!("reminder time must be HH:MM, got `{}`", settings.reminder_time);
                }
                store.set_notification_settings(settings);
            }
            let settings = store.settings();
            println!("theme: {}", settings.theme);
            println!(
                "notifications: {} (daily reminder at {})",
                if settings.notifications.enabled { "on" } else { "off" },
                settings.notifications.reminder_time
            );
        }
        Command::Reset { yes } => {
            if !yes && !confirm("Delete all progress, bookmarks and settings?")? {
                println!("cancelled");
                return Ok(());
            }
            store.clear_all_data();
            println!("all data cleared");
        }
        Command::Export { path } => {
            let json = serde_json::to_string_pretty(&store.export_data())?;
            fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
            println!("exported to {}", path.display());
        }
        Command::Import { path } => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let data: ExportData = serde_json::from_str(&json)
                .with_context(|| format!("{} is not a wordbook backup", path.display()))?;
            store.import_data(&data)?;
            println!("imported {} word(s)", store.words().len());
        }
        Command::Config { save } => {
            print!("{}", toml::to_string_pretty(config)?);
            if save {
                config.save().context("failed to write config")?;
                println!("saved to {}", Config::config_path().display());
            }
        }
    }
    Ok(())
}

fn print_word_line(word: &Word, bookmarked: bool) {
    let mark = if bookmarked { "*" } else { " " };
    println!(
        "{mark} {:<10} {:<16} {:<14} {:<6} studied {}x",
        word.id, word.english, word.korean, word.level, word.study_count
    );
}

fn print_progress(store: &AppStore) {
    let progress = store.study_progress();
    println!(
        "studied {}/{} words ({}%)",
        progress.studied, progress.total, progress.percentage
    );
    match store.study_stats() {
        Some(stats) => {
            println!("answers: {} ({}% correct)", stats.total_answers, stats.accuracy());
            println!("streak: {} day(s)", stats.streak_days);
            println!("average time: {:.1}s per question", stats.average_time);
        }
        None => println!("no quizzes taken yet"),
    }

    let accuracy = store.level_accuracy();
    for level in wordbook::words::ALL_LEVELS {
        match accuracy.get(level) {
            Some(pct) => println!("  {level:<6} {pct}%"),
            None => println!("  {level:<6} -"),
        }
    }

    let recent = store.recent_results(5);
    if !recent.is_empty() {
        println!("recent quizzes:");
        for result in recent {
            print_result_line(result);
        }
    }
}

fn print_result_line(result: &QuizResult) {
    println!(
        "  {}  {:<6} {}/{} ({}%)",
        result.timestamp.format("%Y-%m-%d %H:%M"),
        result.level,
        result.correct_answers,
        result.total_questions,
        result.accuracy()
    );
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn run_quiz(store: &mut AppStore, level: LevelFilter, count: usize) -> Result<()> {
    let total = store.start_quiz(level, count)?.questions.len();
    println!("{total} question(s). Answer with the option number, or q to stop.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let Some(session) = store.current_quiz() else {
            break;
        };
        let Some(question) = session.current_question() else {
            break;
        };
        println!();
        println!("[{}/{}] {}", session.current_index + 1, total, question.word.english);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        print!("> ");
        io::stdout().flush()?;

        let options = question.options.clone();
        let input = match lines.next() {
            Some(line) => line?,
            None => "q".to_string(),
        };
        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            let result = store.finish_quiz()?;
            print_summary(&result);
            return Ok(());
        }
        let answer = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i).cloned())
            .unwrap_or_else(|| input.to_string());

        let outcome = store.answer_question(&answer)?;
        if outcome.is_correct {
            println!("correct!");
        } else {
            println!("wrong, the answer is {}", outcome.correct_answer);
        }
        if let Some(result) = outcome.result {
            print_summary(&result);
            return Ok(());
        }
    }
    Ok(())
}

fn print_summary(result: &QuizResult) {
    println!();
    println!(
        "score: {}/{} ({}%) in {:.0}s",
        result.correct_answers,
        result.total_questions,
        result.accuracy(),
        result.elapsed_secs
    );
}
