use std::io::{BufRead, Write};

use cell_editor_lib::command::{execute_command, EditorCommand, CommandResponse};
use cell_editor_lib::state::{EditingSession, EditorSettings, SessionEvent};
use cell_editor_lib::sync::{HttpSyncClient, RecordingClient, SyncClient};
use cell_editor_lib::viewport::scene::HeadlessScene;

/// Command line options; anything given overrides the saved settings
#[derive(Debug, Default)]
struct CliArgs {
    server: Option<String>,
    mask: Option<String>,
    image: Option<String>,
    voxel_size: Option<f32>,
    offline: bool,
    /// Persist the overrides for later runs
    save_settings: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cell_editor=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    let mut settings = EditorSettings::load();
    if let Some(server) = &args.server {
        settings.server.endpoint = server.clone();
    }
    if let Some(voxel_size) = args.voxel_size {
        settings.voxel_size = voxel_size;
    }
    if args.save_settings {
        settings.save();
    }

    if args.offline {
        tracing::info!("Running offline, requests are only recorded");
        let session = EditingSession::new(HeadlessScene::new(), RecordingClient::new(), settings);
        run(session, &args);
        return;
    }

    match HttpSyncClient::new(&settings.server.endpoint) {
        Ok(client) => {
            tracing::info!("Talking to {}", client.endpoint());
            let session = EditingSession::new(HeadlessScene::new(), client, settings);
            run(session, &args);
        }
        Err(e) => tracing::error!("Failed to start sync client: {e}"),
    }
}

fn parse_args() -> CliArgs {
    let mut parsed = CliArgs::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--server" => parsed.server = args.next(),
            "--mask" => parsed.mask = args.next(),
            "--image" => parsed.image = args.next(),
            "--voxel-size" => match args.next().map(|v| v.parse::<f32>()) {
                Some(Ok(v)) if v > 0.0 => parsed.voxel_size = Some(v),
                _ => tracing::warn!("Ignoring invalid --voxel-size"),
            },
            "--offline" => parsed.offline = true,
            "--save-settings" => parsed.save_settings = true,
            other => tracing::warn!("Unknown argument {other}"),
        }
    }
    parsed
}

/// Read one JSON command per line from stdin, answer one JSON line each
fn run<C: SyncClient>(mut session: EditingSession<HeadlessScene, C>, args: &CliArgs) {
    if let Some(mask) = &args.mask {
        let event = SessionEvent::Load {
            mask_link: mask.clone(),
            image_link: args.image.clone().unwrap_or_default(),
        };
        if let Err(e) = session.handle(event) {
            tracing::error!("Initial load failed: {e}");
        }
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read stdin: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        // Replies that landed in the meantime go first
        for e in session.poll() {
            tracing::warn!("{e}");
        }

        let response = match serde_json::from_str::<EditorCommand>(&line) {
            Ok(cmd) => execute_command(&mut session, cmd),
            Err(e) => CommandResponse {
                success: false,
                error: Some(format!("Invalid command JSON: {e}")),
                data: None,
            },
        };
        match serde_json::to_string(&response) {
            Ok(json) => {
                if writeln!(stdout, "{json}").and_then(|_| stdout.flush()).is_err() {
                    break;
                }
            }
            Err(e) => tracing::error!("Failed to encode response: {e}"),
        }
    }
}
