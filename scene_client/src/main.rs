//! Standalone headless scene client.
//!
//! Usage:
//!   cargo run -p scene_client -- [--addr 127.0.0.1:40000] [--room part1_room] [--name Player]
//!
//! The client joins the room, mirrors remote players, and sends an input
//! command every tick.
//!
//! Console commands:
//!   connect             - Retry joining the configured room
//!   click <x> <y>       - Set a click-to-move target
//!   keys <lrud|->       - Hold the given arrow keys ('-' releases all)
//!   status              - Show scene status
//!   quit                - Exit client

use std::env;
use std::io::{BufRead, Write};
use std::time::Duration;

use scene_client::input::KeyboardState;
use scene_client::GameScene;
use scene_shared::config::SceneConfig;
use scene_shared::math::Vec2;
use scene_shared::stage::HeadlessStage;
use tokio::sync::mpsc;
use tracing::info;

fn parse_args() -> SceneConfig {
    let mut cfg = SceneConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--room" if i + 1 < args.len() => {
                cfg.room_name = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

fn parse_keys(held: &str) -> KeyboardState {
    KeyboardState {
        left: held.contains('l'),
        right: held.contains('r'),
        up: held.contains('u'),
        down: held.contains('d'),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(server = %cfg.server_addr, room = %cfg.room_name, "Starting scene client");

    let mut stage = HeadlessStage::new();
    let mut keys = KeyboardState::default();
    let mut scene = GameScene::new(cfg.clone());

    scene.connect(&mut stage);

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() {
                break;
            }
            let line = line.trim().to_string();
            if !line.is_empty() {
                if console_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        }
    });

    println!("Scene running. Type 'status' for info, 'quit' to exit.");
    println!();

    let tick_interval = Duration::from_secs_f32(1.0 / cfg.tick_hz as f32);
    let dt = tick_interval.as_secs_f32();

    'frame: loop {
        // Process console commands.
        while let Ok(line) = console_rx.try_recv() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                ["connect"] => {
                    scene.connect(&mut stage);
                }
                ["click", x, y] => match (x.parse::<f32>(), y.parse::<f32>()) {
                    (Ok(x), Ok(y)) => scene.pointer_down(Vec2::new(x, y)),
                    _ => println!("Usage: click <x> <y>"),
                },
                ["keys", held] => {
                    keys = if *held == "-" {
                        KeyboardState::default()
                    } else {
                        parse_keys(held)
                    };
                }
                ["status"] => {
                    println!("Connected: {}", scene.is_connected());
                    println!("Entities: {}", scene.mirror().len());
                    if !stage.status_text().is_empty() {
                        println!("Status: {}", stage.status_text());
                    }
                }
                ["quit"] | ["exit"] => break 'frame,
                _ => println!("Unknown command: {line}"),
            }
        }

        scene.update(&mut stage, &keys, dt).await;
        stage.step(dt);

        tokio::time::sleep(tick_interval).await;
    }

    scene.teardown(&mut stage);
    Ok(())
}
