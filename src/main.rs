use std::fs::File;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scholar::config::CourseSummary;
use scholar::course::{
    ContentKind, Item, ModuleLoader, ModuleView, Section, calculate_module_progress,
    is_item_completed, is_section_completed, lesson_link,
};
use scholar::{App, Config, LmsClient, Session};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scholar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Remember the student whose progress to show
    Login {
        /// Student identifier
        student_id: String,
    },
    /// Forget the current student and cached courses
    Logout,
    /// List recently opened courses
    Courses,
    /// Print a module's sections and items with completion and links
    Outline {
        course_id: String,
        module_id: String,
    },
    /// Print progress through a course or one of its modules
    Progress {
        course_id: String,
        /// Only this module
        #[arg(short, long)]
        module: Option<String>,
    },
    /// Print the route of an item
    Link {
        course_id: String,
        module_id: String,
        section_id: String,
        item_id: String,
        /// Item type (lesson, quiz, exercise, assignment, ...)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
    /// Browse a module interactively
    Browse {
        course_id: String,
        module_id: String,
        /// Item to start on
        #[arg(short, long)]
        item: Option<String>,
    },
}

/// Log to stderr, or to a file while the TUI owns the terminal
fn init_logging(interactive: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scholar=info".into());

    if interactive {
        let dir = Config::data_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {:?}", dir))?;
        let file = File::create(dir.join("scholar.log")).context("Failed to create log file")?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn loader(config: &Config) -> Result<ModuleLoader> {
    let client = LmsClient::from_config(config).context("Failed to create API client")?;
    Ok(ModuleLoader::new(Arc::new(client)))
}

fn print_outline(view: &ModuleView, course_id: &str, module_id: &str) {
    let snapshot = view.snapshot.as_ref();
    let mark = |done: bool| if done { "✓" } else { "○" };

    println!("{}", view.module.display_title());
    if let Some(snapshot) = snapshot {
        let progress = calculate_module_progress(Some(module_id), snapshot);
        println!("{}% ({} of {} completed)", progress.percentage, progress.completed, progress.total);
    } else if let Some(error) = &view.progress_error {
        println!("Progress unavailable: {error}");
    }

    if view.module.sections.is_empty() {
        println!("\n  This module has no sections yet");
    }

    for section in &view.module.sections {
        let kind = section.kind.as_ref().map_or("?", ContentKind::label);
        println!(
            "\n{} {} [{}]",
            mark(is_section_completed(section, snapshot)),
            section.display_title(),
            kind
        );
        if section.items.is_empty() {
            println!("    No items in this section");
        }
        for item in &section.items {
            println!(
                "    {} {}  {}",
                mark(is_item_completed(item, Some(section), snapshot)),
                item.display_title(),
                lesson_link(Some(course_id), Some(module_id), Some(section), item)
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Browse { .. }));
    init_logging(interactive)?;

    let mut session = Session::load()?;

    match cli.command {
        Some(Commands::Login { student_id }) => {
            session.login(student_id.trim());
            session.save()?;
            println!("Logged in as {}", student_id.trim());
        }
        Some(Commands::Logout) => {
            session.logout();
            session.save()?;
            println!("Logged out");
        }
        Some(Commands::Courses) => {
            if session.courses.is_empty() {
                println!("No courses opened yet");
            }
            for CourseSummary { id, title, percentage } in &session.courses {
                println!("{:>3}%  {}  {}", percentage, id, title.as_deref().unwrap_or(""));
            }
        }
        Some(Commands::Outline { course_id, module_id }) => {
            let config = Config::load()?;
            let view = loader(&config)?
                .load_view(&course_id, &module_id, session.student_id(), &CancellationToken::new())
                .await
                .with_context(|| format!("Failed to load module {}", module_id))?;
            print_outline(&view, &course_id, &module_id);
        }
        Some(Commands::Progress { course_id, module }) => {
            let config = Config::load()?;
            let snapshot = loader(&config)?
                .load_progress(&course_id, session.student_id(), &CancellationToken::new())
                .await
                .with_context(|| format!("Failed to load progress for course {}", course_id))?;

            let progress = calculate_module_progress(module.as_deref(), &snapshot);
            let scope = module.as_deref().unwrap_or(course_id.as_str());
            println!(
                "{}: {}% ({} of {} completed)",
                scope, progress.percentage, progress.completed, progress.total
            );

            if module.is_none() {
                for entry in &snapshot.modules {
                    let Some(id) = entry.id.as_deref() else { continue };
                    let p = calculate_module_progress(Some(id), &snapshot);
                    let title = entry.title.as_deref().unwrap_or(id);
                    println!("  {:>3}%  {}", p.percentage, title);
                }
            }

            session.remember_course(CourseSummary {
                id: course_id,
                title: snapshot.title.clone(),
                percentage: calculate_module_progress(None, &snapshot).percentage,
            });
            session.save()?;
        }
        Some(Commands::Link { course_id, module_id, section_id, item_id, kind }) => {
            let section = Section { id: Some(section_id), ..Default::default() };
            let item = Item {
                id: Some(item_id),
                kind: kind.as_deref().map(ContentKind::parse),
                ..Default::default()
            };
            println!("{}", lesson_link(Some(&course_id), Some(&module_id), Some(&section), &item));
        }
        Some(Commands::Browse { course_id, module_id, item }) => {
            let config = Config::load()?;
            let loader = loader(&config)?;
            let mut app = App::new(config, session, loader, course_id, module_id, item)?;
            app.run().await?;
        }
        None => {
            let Some(visit) = session.last_visit.clone() else {
                bail!("Nothing to reopen yet. Run `scholar browse <course-id> <module-id>`");
            };
            let config = Config::load()?;
            let loader = loader(&config)?;
            let mut app =
                App::new(config, session, loader, visit.course_id, visit.module_id, None)?;
            app.run().await?;
        }
    }

    Ok(())
}
