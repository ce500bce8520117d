use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use dialoguer::Confirm;
use quick_copy::app::AppState;
use quick_copy::cli::{BodySource, Cli, Commands};
use quick_copy::clipboard::ClipboardService;
use quick_copy::config::Config;
use quick_copy::keybindings::KeybindingCache;
use quick_copy::logging;
use quick_copy::messaging::{self, MessageHandler, launcher::PopupLauncher};
use quick_copy::repository::SnippetRepository;
use quick_copy::snippet::input::image_file_to_data_url;
use quick_copy::snippet::{SnippetBody, SnippetId, SnippetRequest};
use quick_copy::storage::{JsonFileStore, SqliteStore, seed_welcome_snippet};
use quick_copy::ui::{self, theme::Theme};
use quick_copy::utils::paths::{ensure_directories_exist, get_log_path};
use quick_copy::utils::unicode::{single_line, truncate_to_width};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;

const LIST_PREVIEW_WIDTH: usize = 60;

fn main() -> Result<()> {
    let cli = Cli::parse();
    ensure_directories_exist()?;
    let config = Config::load()?;

    match &cli.command {
        None => logging::init_file(&get_log_path()?)?,
        Some(Commands::Serve { .. }) => logging::init_stderr("info"),
        Some(_) => logging::init_stderr("warn"),
    }

    match cli.command {
        None => {
            let runtime = build_runtime()?;
            let (repository, db_path) = open_repository()?;

            let state = AppState::new(
                repository,
                ClipboardService::system(),
                runtime.handle().clone(),
                Theme::from_config(&config),
                KeybindingCache::from_config(&config.keybindings),
                config.timeoutlen,
                Duration::from_millis(config.ack_duration_ms),
            );

            ui::run_tui(state, &db_path)?;
        }
        Some(Commands::Serve { port }) => {
            let runtime = build_runtime()?;
            let (repository, _) = open_repository()?;
            let handler = MessageHandler::new(
                repository,
                ClipboardService::system(),
                PopupLauncher::new(config.popup_command.clone()),
            );
            runtime.block_on(messaging::server::run(
                port.unwrap_or(config.server_port),
                handler,
            ))?;
        }
        Some(Commands::Add {
            title,
            body,
            selection,
        }) => handle_add(title, body, selection)?,
        Some(Commands::Edit { id, title, body }) => handle_edit(SnippetId::new(id), title, body)?,
        Some(Commands::List { search }) => handle_list(search.as_deref())?,
        Some(Commands::Copy { id }) => handle_copy(
            SnippetId::new(id),
            Duration::from_secs(config.copy_hold_secs),
        )?,
        Some(Commands::Delete { id, yes }) => handle_delete(SnippetId::new(id), yes)?,
    }

    Ok(())
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// First launch seeds the legacy store so the welcome snippet migrates in
/// through the normal load path.
fn open_repository() -> Result<(SnippetRepository, PathBuf)> {
    let legacy = JsonFileStore::open_default()?;
    seed_welcome_snippet(&legacy)?;

    let primary = SqliteStore::open_default()?;
    let db_path = primary.path().to_path_buf();

    let mut repository = SnippetRepository::new(Box::new(primary), Some(Box::new(legacy)));
    repository.load()?;
    Ok((repository, db_path))
}

fn handle_add(title: String, body: BodySource, selection: bool) -> Result<()> {
    let request = if selection {
        let runtime = build_runtime()?;
        let text = runtime
            .block_on(ClipboardService::system().selected_text())
            .context("Failed to read the current selection")?;
        if text.is_empty() {
            bail!("Nothing is selected");
        }
        SnippetRequest::text(title, text)
    } else {
        request_from_body(title, &body)?
            .ok_or_else(|| anyhow!("Provide --content, --image-url, --image-file or --selection"))?
    };

    let (mut repository, _) = open_repository()?;
    let snippet = repository.create(&request)?;
    println!("✓ Added {} ({})", snippet.title, snippet.id);
    Ok(())
}

fn request_from_body(title: String, body: &BodySource) -> Result<Option<SnippetRequest>> {
    let request = if let Some(content) = &body.content {
        SnippetRequest::text(title, content.clone())
    } else if let Some(url) = &body.image_url {
        SnippetRequest::image_url(title, url.clone())
    } else if let Some(path) = &body.image_file {
        SnippetRequest::image_file(title, image_file_to_data_url(path)?)
    } else {
        return Ok(None);
    };
    Ok(Some(request))
}

fn handle_edit(id: SnippetId, title: Option<String>, body: BodySource) -> Result<()> {
    let (mut repository, _) = open_repository()?;
    let current = repository
        .find_by_id(&id)
        .ok_or_else(|| anyhow!("No snippet with id {id}"))?;

    let title = title.unwrap_or_else(|| current.title.clone());
    let request = match request_from_body(title.clone(), &body)? {
        Some(request) => request,
        None => SnippetRequest::from_body(&title, &current.body),
    };

    let snippet = repository.update(&id, &request)?;
    println!("✓ Updated {} ({})", snippet.title, snippet.id);
    Ok(())
}

fn handle_list(search: Option<&str>) -> Result<()> {
    let (repository, _) = open_repository()?;
    let items = repository.search(search.unwrap_or(""));

    if items.is_empty() {
        println!("No snippets found.");
        return Ok(());
    }

    for snippet in items {
        let preview = match &snippet.body {
            SnippetBody::Text { content } => single_line(content),
            SnippetBody::Image {
                image_src,
                image_kind,
            } => format!("{image_kind}: {image_src}"),
        };
        println!("{}  {} [{}]", snippet.id, snippet.title, snippet.kind());
        println!("    {}", truncate_to_width(&preview, LIST_PREVIEW_WIDTH));
    }

    Ok(())
}

/// On X11/Wayland the process serves the clipboard itself, so it stays up for
/// `hold` or until another program copies something.
fn handle_copy(id: SnippetId, hold: Duration) -> Result<()> {
    let (repository, _) = open_repository()?;
    let snippet = repository
        .find_by_id(&id)
        .ok_or_else(|| anyhow!("No snippet with id {id}"))?;

    if cfg!(target_os = "linux") && !hold.is_zero() {
        eprintln!(
            "Keeping \"{}\" on the clipboard for up to {}s (Ctrl-C to stop)...",
            snippet.title,
            hold.as_secs()
        );
    }

    let runtime = build_runtime()?;
    let outcome = runtime.block_on(ClipboardService::system_holding(hold).copy_snippet(snippet));
    if !outcome.success {
        bail!(
            "Copy failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    println!("✓ Copied {} \"{}\"", snippet.kind(), snippet.title);
    Ok(())
}

fn handle_delete(id: SnippetId, yes: bool) -> Result<()> {
    let (mut repository, _) = open_repository()?;
    let title = repository
        .find_by_id(&id)
        .map(|s| s.title.clone())
        .ok_or_else(|| anyhow!("No snippet with id {id}"))?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete \"{title}\"?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Kept.");
            return Ok(());
        }
    }

    repository.delete(&id)?;
    println!("✓ Deleted {title}");
    Ok(())
}
