use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use reg_replace::config::{load_from_path, load_from_paths, ReplaceConfig};
use reg_replace::engine::{Confirmation, Engine, RunReport, Tally};
use reg_replace::matcher::CompiledPattern;
use reg_replace::{Directive, Document, LoadedFile, TextDocument};
use serde_json::json;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const CONFIG_FILE: &str = "reg_replace.toml";
const RULES_DIR: &str = "rules";
const PROMPT: &str = "Replace targets / perform action? (yes | no):";

#[derive(Parser)]
#[command(name = "reg-replace")]
#[command(about = "Apply named regex and scope replacement rules to a file", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a directive such as `trim, tabs`, `?: trim` or `mark=todo: notes`
    Run {
        /// File to rewrite
        file: PathBuf,

        /// Pattern names, optionally prefixed by `?`, `+` or an action and a colon
        directive: String,

        /// Rule file or directory of rule files (discovered if not specified)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cursor offset, in characters, for non-greedy patterns
        #[arg(long)]
        cursor: Option<usize>,

        /// Dry run - show what would change without writing the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Answer yes to the confirmation after a find-only run
        #[arg(short = 'y', long)]
        yes: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured patterns
    List {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate rules and compile every pattern
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

struct RunArgs {
    file: PathBuf,
    directive: String,
    config: Option<PathBuf>,
    cursor: Option<usize>,
    dry_run: bool,
    diff: bool,
    yes: bool,
    json: bool,
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            directive,
            config,
            cursor,
            dry_run,
            diff,
            yes,
            json,
        } => cmd_run(RunArgs {
            file,
            directive,
            config,
            cursor,
            dry_run,
            diff,
            yes,
            json,
        }),

        Commands::List { config } => cmd_list(config),

        Commands::Check { config } => cmd_check(config),
    }
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_env("REG_REPLACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the rule configuration.
///
/// Priority order:
/// 1. Explicit --config flag
/// 2. REG_REPLACE_CONFIG environment variable
/// 3. The nearest `reg_replace.toml` walking up from the current directory
/// 4. Every `*.toml` in `./rules`
fn resolve_config(explicit: Option<PathBuf>) -> Result<ReplaceConfig> {
    if let Some(path) = explicit {
        return load_config_at(&path);
    }

    if let Ok(env_path) = env::var("REG_REPLACE_CONFIG") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return load_config_at(&path);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: REG_REPLACE_CONFIG is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    let cwd = env::current_dir()?;
    for ancestor in cwd.ancestors() {
        let candidate = ancestor.join(CONFIG_FILE);
        if candidate.is_file() {
            return load_config_at(&candidate);
        }
    }

    let rules = cwd.join(RULES_DIR);
    if rules.is_dir() {
        return load_config_at(&rules);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find any rules.".red(),
        "Try one of:".bold(),
        "1. Pass a rule file: reg-replace run FILE DIRECTIVE --config rules.toml",
        "2. Set environment variable: export REG_REPLACE_CONFIG=/path/to/rules.toml",
        "3. Create reg_replace.toml in this directory or a parent"
    )
}

fn load_config_at(path: &Path) -> Result<ReplaceConfig> {
    if path.is_dir() {
        let files = discover_rule_files(path)?;
        Ok(load_from_paths(&files)?)
    } else {
        Ok(load_from_path(path)?)
    }
}

/// Every `.toml` file directly inside `dir`, sorted so later files override
/// earlier ones predictably.
fn discover_rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .toml rule files found in {}", dir.display());
    }
    Ok(files)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (replaced)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn prompt(auto_yes: bool) -> Result<String> {
    if auto_yes {
        return Ok("yes".to_string());
    }
    print!("{} ", PROMPT.bold());
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    // An empty answer takes the default.
    if answer.trim().is_empty() {
        return Ok("yes".to_string());
    }
    Ok(answer)
}

fn print_targets(doc: &TextDocument, report: &RunReport) {
    let mut targets = report.targets.clone();
    targets.sort();
    for region in targets {
        let (line, col) = doc.line_col(region.start());
        let text = doc.text_of(region);
        let first_line = text.lines().next().unwrap_or("");
        println!(
            "  {} {}",
            format!("{}:{}", line + 1, col + 1).cyan(),
            first_line
        );
    }
}

fn print_report(report: &RunReport) {
    if report.is_bad_action() {
        eprintln!("{} {}", "✗".red(), report);
        if let Some(e) = &report.action_error {
            eprintln!("  {}", e);
        }
        return;
    }
    if report.tally.errors().is_empty() {
        println!("{} {}", "✓".green(), report);
    } else {
        println!("{} {}", "⊙".yellow(), report);
    }
    if let Tally::MultiPass {
        sweeps, converged, ..
    } = report.tally
    {
        let state = if converged {
            "converged".green()
        } else {
            "sweep limit reached".yellow()
        };
        println!("  {} sweeps, {}", sweeps, state);
    }
}

fn report_json(file: &Path, doc: &TextDocument, report: &RunReport, changed: bool) -> serde_json::Value {
    let patterns: Vec<serde_json::Value> = match &report.tally {
        Tally::PerPattern(entries) => entries
            .iter()
            .map(|entry| match &entry.outcome {
                Ok(count) => json!({ "name": entry.name, "count": count }),
                Err(e) => json!({ "name": entry.name, "error": e.to_string() }),
            })
            .collect(),
        Tally::MultiPass { errors, .. } => errors
            .iter()
            .map(|(name, e)| json!({ "name": name, "error": e.to_string() }))
            .collect(),
    };
    let sweeps = match &report.tally {
        Tally::MultiPass {
            sweeps, converged, ..
        } => json!({ "sweeps": sweeps, "converged": converged }),
        Tally::PerPattern(_) => serde_json::Value::Null,
    };
    let highlights: serde_json::Map<String, serde_json::Value> = doc
        .highlights()
        .map(|(key, highlight)| (key.to_string(), json!(highlight)))
        .collect();

    json!({
        "file": file.display().to_string(),
        "status": report.to_string(),
        "total": report.tally.total(),
        "patterns": patterns,
        "multi_pass": sweeps,
        "targets": report.targets,
        "action_error": report.action_error.as_ref().map(|e| e.to_string()),
        "folds": doc.folds(),
        "highlights": highlights,
        "changed": changed,
    })
}

fn cmd_run(args: RunArgs) -> Result<()> {
    // 1. Load rules and the target file
    let config = resolve_config(args.config)?;
    let syntax = config
        .syntax
        .compile()
        .context("failed to compile syntax rules")?;
    let loaded = LoadedFile::read(&args.file)?;
    let mut doc = TextDocument::with_syntax(&loaded.contents, syntax);
    doc.set_cursor(args.cursor);

    // 2. Run the directive
    let directive: Directive = args.directive.parse()?;
    let mut engine = Engine::new(config);
    let mut report = engine.run(&mut doc, &directive);

    // 3. Find-only runs stop for confirmation
    if let Some(handshake) = report.pending {
        if !args.json {
            println!(
                "{} {} target(s) in {}",
                "?".cyan(),
                report.targets.len(),
                args.file.display()
            );
            print_targets(&doc, &report);
        }
        if args.dry_run {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report_json(&args.file, &doc, &report, false))?);
            } else {
                print_report(&report);
            }
            return Ok(());
        }

        let answer = prompt(args.yes)?;
        match engine.confirm(&mut doc, &handshake, &answer)? {
            Confirmation::Replaced(confirmed) => report = confirmed,
            Confirmation::Declined => {
                println!("{}", "Declined; nothing changed.".dimmed());
                return Ok(());
            }
        }
    }

    // 4. Report and write back
    let after = doc.text();
    let changed = after != loaded.contents;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&args.file, &doc, &report, changed))?);
    } else {
        print_report(&report);
        for (key, highlight) in doc.highlights() {
            println!(
                "  {} {}: {} region(s), {} {}",
                "mark".cyan(),
                key,
                highlight.regions.len(),
                highlight.color,
                highlight.style
            );
        }
        if !doc.folds().is_empty() {
            println!("  {} {} region(s)", "fold".cyan(), doc.folds().len());
        }
    }

    if args.diff && changed {
        display_diff(&args.file, &loaded.contents, &after);
    }

    if changed {
        if args.dry_run {
            if !args.json {
                println!("{}", "[DRY RUN - file not written]".cyan());
            }
        } else {
            loaded.write_back(&after)?;
            if !args.json {
                println!("Wrote {}", args.file.display());
            }
        }
    }

    if report.is_bad_action() || !report.tally.errors().is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_list(config: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config)?;

    println!("{}", "Configured patterns:".bold());
    println!();

    for (name, pattern) in &config.patterns {
        let mode = match (&pattern.scope, &pattern.find) {
            (Some(scope), Some(find)) => format!("scope {} / find {}", scope, find),
            (Some(scope), None) => format!("scope {}", scope),
            (None, Some(find)) => format!("find {}", find),
            (None, None) => "-".to_string(),
        };
        let greedy = if pattern.is_scope_mode() {
            pattern.greedy_scope
        } else {
            pattern.greedy
        };
        println!("  {} {}", name.bold(), mode.dimmed());
        println!(
            "    replace: {:?}, {}",
            pattern.replace,
            if greedy { "greedy" } else { "nearest cursor" }
        );
        if !pattern.scope_filter.is_empty() {
            println!("    scope filter: {}", pattern.scope_filter.join(", "));
        }
    }

    println!();
    println!("{} pattern(s)", config.patterns.len());
    Ok(())
}

fn cmd_check(config: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config)?;

    let mut failed = 0;
    for (name, pattern) in &config.patterns {
        match CompiledPattern::compile(pattern) {
            Ok(_) => println!("{} {}", "✓".green(), name),
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), name, e);
                failed += 1;
            }
        }
    }

    println!();
    println!(
        "{} ok, {} failed",
        format!("{}", config.patterns.len() - failed).green(),
        format!("{}", failed).red()
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
