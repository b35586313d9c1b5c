mod stdio;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use quill_core::LocalFileSystem;
use quill_editor::bridge::BridgeLoader;
use quill_editor::protocol::EditorEvent;
use quill_editor::{settings, EngineBootstrapper, KeyDisposition, Session, SessionServices};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::stdio::{HostCommand, Incoming, LogWindow, StdoutSink};

const SESSION_ID: &str = "quill-1";
const CONTAINER: &str = "editor-root";

/// Quill editor session host speaking JSON lines over stdio
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory documents are served from (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Document to open at startup
    #[arg(value_name = "PATH")]
    path: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    let root = match args.root {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                log::error!("No working directory: {}", e);
                return;
            }
        },
    };

    let settings = settings::load();
    let fs = Arc::new(LocalFileSystem::new(&root));
    log::info!("Serving documents from {:?}", fs.root());

    let mut folder_changes = fs.subscribe();
    tokio::spawn(async move {
        while let Ok(change) = folder_changes.recv().await {
            log::info!("Folder changed: {}/{}", change.dir, change.name);
        }
    });

    let loader = Arc::new(BridgeLoader::new(Arc::new(StdoutSink)));
    let bridge = Arc::clone(loader.engine());
    let locks = quill_core::locks::global();
    let bootstrapper = Arc::new(EngineBootstrapper::new(
        loader,
        locks.clone(),
        settings.engine_config(),
        settings.bootstrap_lock.clone(),
    ));

    let window = Arc::new(LogWindow::default());
    let session = Arc::new(Session::new(
        SESSION_ID,
        bootstrapper,
        SessionServices {
            fs,
            processes: window.clone(),
            title: window.clone(),
            locks,
        },
        settings,
    ));

    if let Some(path) = args.path {
        if let Err(e) = session.set_path(path).await {
            log::warn!("{}", e);
        }
    }
    if let Err(e) = session.attach_container(CONTAINER).await {
        log::warn!("{}", e);
    }

    // Mounting waits for the surface's Ready event, which arrives on stdin.
    let mounting = Arc::clone(&session);
    tokio::spawn(async move {
        if let Err(e) = mounting.mount().await {
            log::error!("{}", e);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match stdio::parse_line(&line) {
            Ok(Incoming::Host(HostCommand::Open { path })) => {
                if let Err(e) = session.set_path(path).await {
                    log::warn!("{}", e);
                }
            }
            Ok(Incoming::Host(HostCommand::Quit)) => break,
            Ok(Incoming::Editor(EditorEvent::KeyDown { editor_id, event })) => {
                let current = session.editor().map(|e| e.id() == editor_id);
                if current != Some(true) {
                    log::debug!("Key event for unknown editor {}", editor_id);
                    continue;
                }
                if session.on_key_down(&event).await == KeyDisposition::Handled {
                    log::debug!("Save handled for {}", session.path());
                }
            }
            Ok(Incoming::Editor(event)) => {
                bridge.handle_event(&event);
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    session.teardown();
    log::info!("Last title: {}", window.title());
}
