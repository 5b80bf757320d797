//! SQL Tutor - graded SQL exercises against in-memory sample databases.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sql_tutor::catalog::QuizQuestion;
use sql_tutor::cli::{Cli, Command, OutputFormat};
use sql_tutor::config::Config;
use sql_tutor::error::{Result, TutorError};
use sql_tutor::logging;
use sql_tutor::provision::SampleSchema;
use sql_tutor::quiz::{Feedback, QuizState};
use sql_tutor::render;
use sql_tutor::session::TutorSession;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path, cli.verbose),
        None => logging::init_stderr_logging(cli.verbose),
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the selected subcommand and returns the process exit code.
async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    if let Command::Run { schema: Some(schema), .. }
    | Command::Schema { schema: Some(schema) }
    | Command::Shell { schema: Some(schema) } = &cli.command
    {
        config.session.default_schema = *schema;
    }
    let max_rows = config.session.max_display_rows;

    let mut session = TutorSession::open(config).await?;
    let code = match cli.command {
        Command::Run { sql, .. } => {
            let sql = read_sql_argument(sql).await?;
            let outcome = session.run_query(&sql).await?;
            println!("{}", render::format_outcome(&outcome, max_rows));
            0
        }
        Command::Check {
            target,
            sql,
            format,
        } => {
            let sql = read_sql_argument(sql).await?;
            let verdict = session
                .check_exercise(target.level, &target.exercise, &sql)
                .await?;
            match format {
                OutputFormat::Text => println!("{}", render::format_verdict(&verdict, max_rows)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&verdict)
                        .map_err(|e| TutorError::internal(e.to_string()))?
                ),
            }
            if verdict.is_match() {
                0
            } else {
                1
            }
        }
        Command::Exercises { level } => {
            println!("{}", render::format_exercise_list(session.catalog(), level));
            0
        }
        Command::Hint { target } => {
            let exercise = session.solution(target.level, &target.exercise)?;
            println!("Hint for '{}': {}", exercise.title, session.hint(target.level, &target.exercise)?);
            if !exercise.expected_columns.is_empty() {
                println!("Expected columns: {}", exercise.expected_columns.join(", "));
            }
            0
        }
        Command::Solution { target } => {
            let exercise = session.solution(target.level, &target.exercise)?;
            println!("{}", render::format_solution(exercise));
            0
        }
        Command::Schema { .. } => {
            let overview = session.describe_schema().await?;
            println!("{}", render::format_overview(&overview, max_rows));
            0
        }
        Command::Quiz { seed } => {
            let questions = session.catalog().quiz().to_vec();
            run_quiz(&questions, seed).await?;
            0
        }
        Command::Shell { .. } => {
            run_shell(&mut session, max_rows).await?;
            0
        }
    };

    session.close().await?;
    Ok(code)
}

/// Returns the SQL argument, reading stdin when it is "-".
async fn read_sql_argument(sql: String) -> Result<String> {
    if sql != "-" {
        return Ok(sql);
    }
    let mut buffer = String::new();
    tokio::io::stdin().read_to_string(&mut buffer).await?;
    Ok(buffer)
}

fn stdin_lines() -> InputLines {
    BufReader::new(tokio::io::stdin()).lines()
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}

/// Runs the quiz interactively until the learner stops.
async fn run_quiz(questions: &[QuizQuestion], seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut lines = stdin_lines();
    let mut state = QuizState::start(questions, &mut rng);

    loop {
        while let Some(question) = state.current_question().cloned() {
            println!(
                "\n{}",
                render::format_question(&question, state.position(), state.total())
            );
            prompt("Your answer: ")?;
            let Some(input) = lines.next_line().await? else {
                return Ok(());
            };

            let answer = resolve_answer(&question, &input);
            let (next, feedback) = state.submit(&answer);
            match feedback {
                Feedback::Correct => println!("Correct!"),
                Feedback::Incorrect { correct } => {
                    println!("Incorrect! The right answer is: {correct}")
                }
                Feedback::Ignored => {}
            }
            state = next.advance();
        }

        println!(
            "\nQuiz finished! Your score: {}/{} ({:.0}%)",
            state.score(),
            state.total(),
            state.percentage()
        );
        if let Some(assessment) = state.assessment() {
            println!("{assessment}");
        }

        prompt("Play again? [y/N] ")?;
        match lines.next_line().await? {
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                state = state.restart(&mut rng);
            }
            _ => return Ok(()),
        }
    }
}

/// Maps an option number or option text to the option itself.
fn resolve_answer(question: &QuizQuestion, input: &str) -> String {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| question.options.get(i)) {
            return option.clone();
        }
    }
    question
        .options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(input))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

const SHELL_HELP: &str = "\
Enter SQL statements terminated by ';'.
  .load <employees|library>  load a sample database (discards changes)
  .schema                    show the tables of the current database
  .help                      show this help
  .quit                      leave the shell";

/// Runs the interactive query tester.
async fn run_shell(session: &mut TutorSession, max_rows: usize) -> Result<()> {
    println!(
        "SQL Tutor shell, sample database '{}'. Type .help for help.",
        session.schema()
    );
    let mut lines = stdin_lines();
    let mut buffer = String::new();

    loop {
        prompt(if buffer.is_empty() { "sql> " } else { "...> " })?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let trimmed = line.trim();

        if buffer.is_empty() && trimmed.starts_with('.') {
            if !shell_command(session, trimmed, max_rows).await? {
                return Ok(());
            }
            continue;
        }
        if trimmed.is_empty() && buffer.is_empty() {
            continue;
        }

        buffer.push_str(&line);
        buffer.push('\n');
        if trimmed.ends_with(';') {
            run_shell_statement(session, &buffer, max_rows).await;
            buffer.clear();
        }
    }

    if !buffer.trim().is_empty() {
        run_shell_statement(session, &buffer, max_rows).await;
    }
    println!();
    Ok(())
}

async fn run_shell_statement(session: &mut TutorSession, sql: &str, max_rows: usize) {
    match session.run_query(sql).await {
        Ok(outcome) => println!("{}", render::format_outcome(&outcome, max_rows)),
        Err(TutorError::Query(message)) => println!("Error: {message}"),
        Err(e) => println!("{}: {}", e.category(), e),
    }
}

/// Handles a dot-command. Returns false when the shell should exit.
async fn shell_command(session: &mut TutorSession, input: &str, max_rows: usize) -> Result<bool> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();

    match command {
        ".quit" | ".exit" => return Ok(false),
        ".help" => println!("{SHELL_HELP}"),
        ".schema" => {
            let overview = session.describe_schema().await?;
            println!("{}", render::format_overview(&overview, max_rows));
        }
        ".load" => match parts.next().map(str::parse::<SampleSchema>) {
            Some(Ok(schema)) => {
                session.load_schema(schema).await?;
                println!("Loaded sample database '{schema}'.");
            }
            Some(Err(message)) => println!("{message}"),
            None => println!("Usage: .load <employees|library>"),
        },
        other => println!("Unknown command: {other}. Type .help for help."),
    }
    Ok(true)
}
