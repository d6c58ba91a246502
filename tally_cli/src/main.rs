use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tally_core::expenses::{format_amount, parse_amount};
use tally_core::*;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Attendance, GPA, task and spending tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat the day as a holiday (today view only)
    #[arg(long, global = true)]
    holiday: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Quick attendance calculator (default)
    Calc {
        /// Classes held so far
        #[arg(long, allow_hyphen_values = true)]
        total: Option<i64>,

        /// Classes attended so far
        #[arg(long, allow_hyphen_values = true)]
        attended: Option<i64>,

        /// Target percentage
        #[arg(long, allow_hyphen_values = true)]
        target: Option<i64>,
    },

    /// Show the classes scheduled for a day and their marks
    Today {
        /// Day to show (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Mark a class present or absent
    Mark {
        subject: String,

        /// present or absent
        status: MarkStatus,

        /// Day to mark (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Per-subject attendance with skip/recovery guidance
    Stats {
        /// Override the configured target percentage
        #[arg(long)]
        target: Option<i64>,
    },

    /// View or edit the weekly class schedule
    Schedule {
        #[command(subcommand)]
        action: Option<ScheduleAction>,
    },

    /// Credit-weighted GPA calculator
    Gpa {
        #[command(subcommand)]
        action: Option<GpaAction>,
    },

    /// To-do list
    Task {
        #[command(subcommand)]
        action: Option<TaskAction>,
    },

    /// Spending ledger
    Expense {
        #[command(subcommand)]
        action: Option<ExpenseAction>,
    },

    /// Show or toggle the color theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },

    /// Export all data to a JSON file
    Export { path: PathBuf },

    /// Replace all data with the contents of a JSON export
    Import {
        path: PathBuf,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Factory reset: wipe schedule, attendance, GPA, tasks and expenses
    Reset {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// List the weekly schedule (default)
    List,
    /// Add a class on a weekday
    Add { day: Weekday, subject: String },
    /// Remove the class at INDEX on a weekday
    Remove {
        day: Weekday,
        index: usize,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum GpaAction {
    /// List course rows and the resulting GPA (default)
    List,
    /// Add a course row
    Add {
        #[arg(long)]
        credits: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
        #[arg(long)]
        obtained: Option<f64>,
    },
    /// Set a field (credits, max, obtained) of a course row
    Set {
        id: String,
        field: CourseField,
        value: f64,
    },
    /// Remove a course row
    Remove { id: String },
    /// Clear all course rows
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// List tasks (default)
    List,
    /// Add a task
    Add { title: String },
    /// Flip a task between done and pending
    Toggle { id: String },
    /// Remove a task
    Remove { id: String },
    /// Remove all completed tasks
    ClearDone,
}

#[derive(Subcommand)]
enum ExpenseAction {
    /// List expenses (default)
    List {
        /// Only show one month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Record an expense
    Add {
        /// Amount, e.g. 12.50
        amount: String,
        category: String,
        #[arg(long)]
        note: Option<String>,
        /// Day of the expense (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Remove an expense
    Remove { id: String },
    /// Write the ledger to a CSV file
    Export { path: PathBuf },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the current theme (default)
    Show,
    /// Switch between light and dark
    Toggle,
}

impl Commands {
    fn view(&self) -> Option<View> {
        match self {
            Commands::Calc { .. } => Some(View::Calc),
            Commands::Today { .. } | Commands::Mark { .. } => Some(View::Today),
            Commands::Stats { .. } => Some(View::Stats),
            Commands::Schedule { .. } => Some(View::Schedule),
            Commands::Gpa { .. } => Some(View::Gpa),
            Commands::Task { .. } => Some(View::Tasks),
            Commands::Expense { .. } => Some(View::Expenses),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tally_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data.data_dir.clone());
    let mut store = FileStore::new(data_dir);

    let view = cli.command.as_ref().map_or(Some(View::Calc), Commands::view);
    let holiday = cli.holiday && view.is_some_and(View::shows_holiday_toggle);
    if cli.holiday && !holiday {
        tracing::warn!("--holiday only applies to the today view; ignoring");
    }

    match cli.command {
        None => cmd_calc(&config, None, None, None),
        Some(Commands::Calc {
            total,
            attended,
            target,
        }) => cmd_calc(&config, total, attended, target),
        Some(Commands::Today { date }) => cmd_today(&store, date.unwrap_or_else(today), holiday),
        Some(Commands::Mark {
            subject,
            status,
            date,
        }) => cmd_mark(&mut store, &subject, status, date.unwrap_or_else(today), holiday),
        Some(Commands::Stats { target }) => {
            cmd_stats(&store, target.unwrap_or(config.attendance.target))
        }
        Some(Commands::Schedule { action }) => {
            cmd_schedule(&mut store, action.unwrap_or(ScheduleAction::List))
        }
        Some(Commands::Gpa { action }) => {
            cmd_gpa(&mut store, &config, action.unwrap_or(GpaAction::List))
        }
        Some(Commands::Task { action }) => cmd_task(&mut store, action.unwrap_or(TaskAction::List)),
        Some(Commands::Expense { action }) => cmd_expense(
            &mut store,
            action.unwrap_or(ExpenseAction::List { month: None }),
        ),
        Some(Commands::Theme { action }) => {
            cmd_theme(&mut store, action.unwrap_or(ThemeAction::Show))
        }
        Some(Commands::Export { path }) => cmd_export(&store, &path),
        Some(Commands::Import { path, yes }) => cmd_import(&mut store, &path, yes),
        Some(Commands::Reset { yes }) => cmd_reset(&mut store, yes),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// Calculator
// ============================================================================

fn cmd_calc(
    config: &Config,
    total: Option<i64>,
    attended: Option<i64>,
    target: Option<i64>,
) -> Result<()> {
    let mut inputs = CalculatorInputs::new(&config.calculator);
    if let Some(total) = total {
        inputs.total = total.max(0);
    }
    if let Some(attended) = attended {
        inputs.attended = attended.max(0);
    }
    if let Some(target) = target {
        inputs.target = target;
    }
    if inputs.normalize() {
        println!("(attended cannot exceed total; using {})", inputs.attended);
    }

    let result = inputs.evaluate();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  ATTENDANCE CALCULATOR");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  {}/{} classes  →  {:.0}%   (target {}%)",
        inputs.attended, inputs.total, result.percent, result.target
    );
    println!();
    display_verdict(&result);
    println!();
    println!("  Safe to skip:  {}", result.safe_skips);
    println!("  Must attend:   {}", result.required_recoveries);
    println!();
    display_forecast(&result);

    Ok(())
}

fn display_verdict(result: &ProjectionResult) {
    if result.is_safe {
        println!("  You're Safe!");
        println!("  Buffer available. You can chill a bit.");
    } else {
        println!("  Warning!");
        println!(
            "  Below {}%. Don't miss any more classes!",
            result.target
        );
    }
}

fn display_forecast(result: &ProjectionResult) {
    const BAR_WIDTH: f64 = 30.0;
    const MIN_BAR: f64 = 15.0;

    println!("  Forecast (attending every class from now on):");
    for point in &result.forecast {
        let filled = (point.projected_percent.max(MIN_BAR) / 100.0 * BAR_WIDTH).round() as usize;
        let marker = if point.meets_target { "✓" } else { " " };
        println!(
            "  +{:<2} {:>6.1}%  {:<30} {}",
            point.incremental_classes,
            point.projected_percent,
            "█".repeat(filled),
            marker
        );
    }

    match result.first_point_meeting_target() {
        Some(p) if !result.is_safe => {
            println!("\n  Back above {}% after {} more classes.", result.target, p.incremental_classes)
        }
        None => println!(
            "\n  Still below {}% after {} more classes.",
            result.target,
            result.forecast.len().saturating_sub(1)
        ),
        _ => {}
    }
}

// ============================================================================
// Attendance
// ============================================================================

fn cmd_today(store: &FileStore, date: NaiveDate, holiday: bool) -> Result<()> {
    let day = Weekday::of(date);

    if holiday {
        println!("Holiday! Enjoy your day off. No classes to mark on {}.", day);
        return Ok(());
    }

    let book = AttendanceBook::load(store)?;
    let classes = book.today(date);

    if classes.is_empty() {
        println!("No classes scheduled for {}.", day);
        println!("Edit your schedule with `tally schedule add {} <subject>`.", day);
        return Ok(());
    }

    println!("Your Schedule ({}, {})", day, date);
    println!();
    for (subject, status) in classes {
        match status {
            Some(status) => println!(
                "  {:<24} MARKED {}",
                subject,
                status.to_string().to_uppercase()
            ),
            None => println!("  {:<24} PENDING", subject),
        }
    }

    Ok(())
}

fn cmd_mark(
    store: &mut FileStore,
    subject: &str,
    status: MarkStatus,
    date: NaiveDate,
    holiday: bool,
) -> Result<()> {
    if holiday {
        println!("Holiday! Nothing marked.");
        return Ok(());
    }

    let counter = AttendanceBook::update(store, |book| book.mark(subject, status, date))?;

    println!("✓ Marked {} {} for {}", subject, status, date);
    println!("  {}/{} classes attended", counter.attended, counter.total);
    Ok(())
}

fn cmd_stats(store: &FileStore, target: i64) -> Result<()> {
    let book = AttendanceBook::load(store)?;
    let reports = book.subject_reports(target);

    if reports.is_empty() {
        println!("No attendance recorded yet.");
        return Ok(());
    }

    for report in &reports {
        let p = &report.projection;
        let guidance = if p.is_safe {
            format!("Safe to bunk: {}", p.safe_skips)
        } else {
            format!("Attend next: {}", p.required_recoveries)
        };
        println!(
            "  {:<20} {:>4.0}%  {:>3}/{:<3} Classes  {}",
            report.subject, p.percent, report.counter.attended, report.counter.total, guidance
        );
    }

    let overall = book.aggregate(target);
    println!();
    println!("  Overall: {:.0}%", overall.projection.percent);
    println!("  Safe bunks: {}", overall.total_safe_skips);

    Ok(())
}

fn cmd_schedule(store: &mut FileStore, action: ScheduleAction) -> Result<()> {
    match action {
        ScheduleAction::List => {
            let book = AttendanceBook::load(store)?;
            if book.is_schedule_empty() {
                println!("Your schedule is empty. Add a class with `tally schedule add <day> <subject>`.");
                return Ok(());
            }
            for day in Weekday::ALL {
                let classes = book.classes_on(day);
                if classes.is_empty() {
                    continue;
                }
                println!("{}", day.to_string().to_uppercase());
                for (idx, subject) in classes.iter().enumerate() {
                    println!("  [{}] {}", idx, subject);
                }
            }
        }

        ScheduleAction::Add { day, subject } => {
            AttendanceBook::update(store, |book| book.add_to_schedule(day, &subject))?;
            println!("✓ Added {} on {}", subject.trim(), day);
        }

        ScheduleAction::Remove { day, index, yes } => {
            let book = AttendanceBook::load(store)?;
            let subject = book
                .classes_on(day)
                .get(index)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("no class #{} on {}", index, day)))?;

            if !confirm(
                &format!("Remove {} on {} from schedule?", subject, day),
                yes,
            )? {
                println!("Cancelled.");
                return Ok(());
            }

            let removed =
                AttendanceBook::update(store, |book| book.remove_from_schedule(day, index))?;
            println!("✓ Removed {} from {}", removed, day);
        }
    }

    Ok(())
}

// ============================================================================
// GPA
// ============================================================================

fn cmd_gpa(store: &mut FileStore, config: &Config, action: GpaAction) -> Result<()> {
    let mut book = GpaBook::open(store)?;

    match action {
        GpaAction::List => {}

        GpaAction::Add {
            credits,
            max,
            obtained,
        } => {
            let id = book.add_row();
            for (field, value) in [
                (CourseField::Credits, credits),
                (CourseField::Max, max),
                (CourseField::Obtained, obtained),
            ] {
                if let Some(value) = value {
                    book.update_row(id, field, value)?;
                }
            }
            book.save(store)?;
            println!("✓ Added course {}", short_id(id));
        }

        GpaAction::Set { id, field, value } => {
            let id = book.resolve(&id)?;
            book.update_row(id, field, value)?;
            book.save(store)?;
        }

        GpaAction::Remove { id } => {
            let id = book.resolve(&id)?;
            book.remove_row(id)?;
            book.save(store)?;
            println!("✓ Removed course {}", short_id(id));
        }

        GpaAction::Reset { yes } => {
            if !confirm("Clear all GPA data?", yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            book.reset();
            book.save(store)?;
            println!("✓ GPA data cleared");
        }
    }

    for (idx, course) in book.courses().iter().enumerate() {
        println!(
            "  Subject {} [{}]  credits {}  max {}  received {}",
            idx + 1,
            short_id(course.id),
            course.credits,
            course.max,
            course.obtained
        );
    }

    let summary = book.calculate(&config.gpa.scale);
    println!();
    println!("  GPA: {:.2}", summary.gpa);
    println!("  Credits: {}", summary.total_credits);

    Ok(())
}

// ============================================================================
// Tasks and expenses
// ============================================================================

fn cmd_task(store: &mut FileStore, action: TaskAction) -> Result<()> {
    let mut list = TaskList::load(store)?;

    match action {
        TaskAction::List => {
            if list.tasks().is_empty() {
                println!("No tasks yet.");
                return Ok(());
            }
            for task in list.tasks() {
                let check = if task.done { "x" } else { " " };
                println!("  [{}] {}  {}", check, short_id(task.id), task.title);
            }
            println!();
            println!("  {} pending", list.pending());
        }

        TaskAction::Add { title } => {
            let id = list.add(&title, Utc::now())?;
            list.save(store)?;
            println!("✓ Added task {}", short_id(id));
        }

        TaskAction::Toggle { id } => {
            let id = list.resolve(&id)?;
            let done = list.toggle(id)?;
            list.save(store)?;
            println!(
                "✓ Task {} marked {}",
                short_id(id),
                if done { "done" } else { "pending" }
            );
        }

        TaskAction::Remove { id } => {
            let id = list.resolve(&id)?;
            let task = list.remove(id)?;
            list.save(store)?;
            println!("✓ Removed task: {}", task.title);
        }

        TaskAction::ClearDone => {
            let removed = list.clear_done();
            list.save(store)?;
            println!("✓ Cleared {} completed tasks", removed);
        }
    }

    Ok(())
}

fn cmd_expense(store: &mut FileStore, action: ExpenseAction) -> Result<()> {
    let mut ledger = Ledger::load(store)?;

    match action {
        ExpenseAction::List { month } => {
            let shown = match month {
                Some(month) => {
                    let (year, month) = parse_month(&month)?;
                    ledger.in_month(year, month)
                }
                None => ledger,
            };

            if shown.entries().is_empty() {
                println!("No expenses recorded.");
                return Ok(());
            }

            for e in shown.entries() {
                println!(
                    "  {}  {}  {:>10}  {:<12} {}",
                    short_id(e.id),
                    e.spent_on,
                    format_amount(e.amount_cents),
                    e.category,
                    e.note.as_deref().unwrap_or("")
                );
            }
            println!();
            for (category, cents) in shown.totals_by_category() {
                println!("  {:<12} {:>10}", category, format_amount(cents));
            }
            println!("  Total: {}", format_amount(shown.total()));
        }

        ExpenseAction::Add {
            amount,
            category,
            note,
            date,
        } => {
            let cents = parse_amount(&amount)?;
            let id = ledger.add(cents, &category, note.as_deref(), date.unwrap_or_else(today))?;
            ledger.save(store)?;
            println!("✓ Recorded {} on {} ({})", format_amount(cents), category.trim(), short_id(id));
        }

        ExpenseAction::Remove { id } => {
            let id = ledger.resolve(&id)?;
            let removed = ledger.remove(id)?;
            ledger.save(store)?;
            println!("✓ Removed expense of {}", format_amount(removed.amount_cents));
        }

        ExpenseAction::Export { path } => {
            let count = ledger.export_csv(&path)?;
            println!("✓ Exported {} expenses", count);
            println!("  CSV: {}", path.display());
        }
    }

    Ok(())
}

fn parse_month(input: &str) -> Result<(i32, u32)> {
    let first_day = format!("{}-01", input.trim());
    let date = NaiveDate::parse_from_str(&first_day, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("invalid month '{}', expected YYYY-MM", input)))?;
    Ok((date.year(), date.month()))
}

// ============================================================================
// Theme, import/export, reset
// ============================================================================

fn cmd_theme(store: &mut FileStore, action: ThemeAction) -> Result<()> {
    let theme = match action {
        ThemeAction::Show => Theme::load(store)?,
        ThemeAction::Toggle => Theme::toggle_stored(store)?,
    };
    println!("Theme: {}", theme);
    Ok(())
}

fn cmd_export(store: &FileStore, path: &Path) -> Result<()> {
    let snapshot = Snapshot::collect(store)?;
    snapshot.write_to(path)?;
    println!("✓ Exported to {}", path.display());
    Ok(())
}

fn cmd_import(store: &mut FileStore, path: &Path, yes: bool) -> Result<()> {
    let snapshot = Snapshot::read_from(path)?;
    snapshot.validate()?;

    if !confirm("Import will replace all current data. Continue?", yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    snapshot.restore(store)?;
    println!(
        "✓ Imported {} subjects, {} courses, {} tasks, {} expenses",
        snapshot.attendance.stats.len(),
        snapshot.courses.len(),
        snapshot.tasks.len(),
        snapshot.expenses.len()
    );
    Ok(())
}

fn cmd_reset(store: &mut FileStore, yes: bool) -> Result<()> {
    if !confirm(
        "Factory Reset: This will wipe your Schedule, Attendance, GPA, Tasks and Expenses. Continue?",
        yes,
    )? {
        println!("Cancelled.");
        return Ok(());
    }

    factory_reset(store)?;
    println!("✓ All data wiped");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
