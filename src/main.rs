//! Fertilikey CLI
//!
//! Command-line interface for the institution benefits directory.
//! Starts the interactive search by default; the other subcommands answer a
//! single question and exit.

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use fertilikey::detail::{Citations, DetailView, Indicator, LongText, Segment};
use fertilikey::directory::Directory;
use fertilikey::search::{find_by_name, Controller, NoFocus};
use fertilikey::{logging, AppConfig, FertilikeyError, FieldMapping};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Fertilikey - fertility & family benefits by institution
///
/// Search a directory of institutions and see their paid leave and
/// fertility coverage.
#[derive(Parser)]
#[command(name = "fertilikey")]
#[command(version)]
#[command(about = "Fertility & family benefits by institution", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory listing endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Search-log endpoint (selections are POSTed here)
    #[arg(long, global = true)]
    log_endpoint: Option<String>,

    /// Wire field naming
    #[arg(long, global = true, value_enum)]
    mapping: Option<MappingPreset>,

    /// Log file path
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Minimum log level (debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum MappingPreset {
    Standard,
    Sponsor,
    Auto,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive search (default)
    Tui,

    /// List suggestions for a query
    Search {
        /// Institution name or city (use -- before it if it starts with -)
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show the benefits of one institution
    Show {
        /// Exact institution name, or a query matching exactly one
        #[arg(allow_hyphen_values = true)]
        name: String,

        /// Show the benefits and additional information text in full
        #[arg(long)]
        full: bool,
    },

    /// List every institution in the directory
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    logging::init(
        &logging::default_log_path(config.log_file.as_deref()),
        config.log_level(),
    );
    logging::separator("session start");
    logging::info("MAIN", &format!("Fertilikey {} starting up", fertilikey::VERSION));

    let result = match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => fertilikey::tui::run(&config),
        Commands::Search { query, output } => cmd_search(&config, &query, output),
        Commands::Show { name, full } => cmd_show(&config, &name, full),
        Commands::List { output } => cmd_list(&config, output),
    };

    if let Err(e) = result {
        logging::error("MAIN", &e.to_string());
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

/// Defaults, then the config file, then flags.
fn build_config(cli: &Cli) -> fertilikey::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(endpoint) = &cli.log_endpoint {
        config.search_log_endpoint = Some(endpoint.clone());
    }
    if let Some(preset) = cli.mapping {
        config.mapping = match preset {
            MappingPreset::Standard => FieldMapping::standard(),
            MappingPreset::Sponsor => FieldMapping::sponsor(),
            MappingPreset::Auto => FieldMapping::default(),
        };
    }
    if let Some(path) = &cli.log_file {
        config.log_file = Some(path.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Load the directory behind a spinner.
fn load_directory(config: &AppConfig) -> fertilikey::Result<Directory> {
    let start = Instant::now();
    let store = config.directory_store()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Loading institutions from {}", config.endpoint));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = store
        .spawn_load()
        .recv()
        .map_err(|_| FertilikeyError::Config("directory loader exited early".into()))
        .and_then(|result| result.map_err(FertilikeyError::from));

    spinner.finish_and_clear();

    let directory = result?;
    eprintln!(
        "{} Loaded {} institutions in {}",
        style("✓").green().bold(),
        style(directory.len()).cyan(),
        HumanDuration(start.elapsed())
    );
    Ok(directory)
}

/// Search command implementation
fn cmd_search(config: &AppConfig, query: &str, output: OutputFormat) -> fertilikey::Result<()> {
    let directory = load_directory(config)?;
    let mut controller = Controller::new(config.controller_options()).with_directory(directory);
    controller.set_query(query, &mut NoFocus);

    let suggestions = &controller.state().suggestions;

    if let OutputFormat::Json = output {
        println!("{}", serde_json::to_string_pretty(suggestions)?);
        return Ok(());
    }

    if !fertilikey::search::is_searchable(query, config.min_query_chars) {
        println!(
            "{} Queries need more than {} characters",
            style("!").yellow().bold(),
            config.min_query_chars
        );
        return Ok(());
    }

    println!(
        "{} {} suggestions for '{}':",
        style("→").cyan().bold(),
        style(suggestions.len()).green(),
        style(query).yellow()
    );
    println!();
    for (i, record) in suggestions.iter().enumerate() {
        println!(
            "  {} {}  {}",
            style(format!("{:2}.", i + 1)).dim(),
            style(&record.name).bold(),
            style(record.location()).dim()
        );
    }

    Ok(())
}

/// Show command implementation
fn cmd_show(config: &AppConfig, name: &str, full: bool) -> fertilikey::Result<()> {
    let directory = load_directory(config)?;
    let mut controller = Controller::new(config.controller_options())
        .with_directory(directory.clone())
        .with_search_log(config.search_log());

    controller.set_query(name, &mut NoFocus);
    let suggestions = &controller.state().suggestions;
    let exact = suggestions
        .iter()
        .position(|r| r.name.eq_ignore_ascii_case(name.trim()));

    let selected = match (exact, suggestions.len()) {
        (Some(index), _) => controller.select_suggestion(index, &mut NoFocus),
        (None, 1) => controller.confirm_selection(&mut NoFocus),
        (None, count) => {
            // Exact name beyond the suggestion cap
            match find_by_name(&directory, name) {
                Some(record) => {
                    let index = directory.iter().position(|r| r == record).unwrap_or(0);
                    controller.reveal_all(&mut NoFocus);
                    controller.select_suggestion(index, &mut NoFocus)
                }
                None if count == 0 => return Err(FertilikeyError::NotFound(name.to_string())),
                None => {
                    return Err(FertilikeyError::Ambiguous {
                        query: name.to_string(),
                        count,
                    })
                }
            }
        }
    };

    if selected {
        if full {
            controller.toggle_benefits();
            controller.toggle_other_details();
        }
        if let Some(detail) = controller.detail() {
            print_detail(&detail);
        }
    }

    controller.flush_search_log();
    Ok(())
}

/// List command implementation
fn cmd_list(config: &AppConfig, output: OutputFormat) -> fertilikey::Result<()> {
    let directory = load_directory(config)?;

    if let OutputFormat::Json = output {
        println!("{}", serde_json::to_string_pretty(&*directory)?);
        return Ok(());
    }

    let mut controller = Controller::new(config.controller_options()).with_directory(directory);
    controller.reveal_all(&mut NoFocus);
    for (i, record) in controller.state().suggestions.iter().enumerate() {
        println!(
            "  {} {}  {}",
            style(format!("{:4}.", i + 1)).dim(),
            record.name,
            style(record.location()).dim()
        );
    }

    Ok(())
}

fn indicator_symbol(indicator: Indicator) -> console::StyledObject<&'static str> {
    let symbol = indicator.symbol();
    match indicator {
        Indicator::Positive => style(symbol).green().bold(),
        Indicator::Negative => style(symbol).red().bold(),
        Indicator::Unknown => style(symbol).yellow().bold(),
    }
}

fn print_long_text(title: &str, text: &LongText, width: usize) {
    println!();
    println!("  {}", style(title).bold());
    for line in text.visible_lines(width) {
        println!("    {}", line);
    }
    if text.overflows(width) && !text.expanded {
        println!("    {}", style("(use --full to read more)").dim());
    }
}

fn print_detail(detail: &DetailView) {
    let width = console::Term::stdout().size().1.saturating_sub(4).max(40) as usize;

    println!();
    println!("{}", style(&detail.title).bold().underlined());
    println!();

    println!("{} {}", indicator_symbol(detail.paid_leave), style("Paid Leave").bold());
    for leave in &detail.leave_lines {
        println!("    {} {}", style(format!("{}:", leave.label)).dim(), leave.text);
    }
    if let Some(note) = detail.leave_note {
        println!("    {}", style(note).dim());
    }
    println!();

    println!("{} {}", indicator_symbol(detail.fertility), style("Fertility Benefits").bold());
    println!("    {}", detail.fertility_message);
    for item in &detail.fertility_details {
        println!("    • {}", item);
    }
    println!("    {} {}", style("Elective treatment covered:").dim(), detail.elective);

    if let Some(benefits) = &detail.benefits_offered {
        print_long_text("Benefits Offered", benefits, width);
    }
    if let Some(other) = &detail.other_details {
        print_long_text("Additional Information", other, width);
    }

    if detail.citations != Citations::None {
        println!();
        println!("  {}", style(detail.citations.heading()).bold());
        let bulleted = matches!(detail.citations, Citations::List(_));
        for citation in detail.citations.entries() {
            let text: String = citation
                .segments
                .iter()
                .map(|segment| match segment {
                    Segment::Text(t) => t.clone(),
                    Segment::Link(url) => style(url).cyan().underlined().to_string(),
                })
                .collect();
            if bulleted {
                println!("    • {}", text);
            } else {
                println!("    {}", text);
            }
        }
    }

    println!();
    println!("  {}", style(&detail.footer.name).bold());
    if let Some(address) = &detail.footer.address {
        println!("  {}", style(address).dim());
    }
    println!("  {}", style(&detail.footer.location).dim());
    if let Some(url) = &detail.footer.url_display {
        println!("  {}", style(url).cyan());
    }
}
