// Keyboard teleop: WASD drive, I/K lower lift, O/L upper lift, U/J claw, P autonomous, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use lift_sync_runtime::config::TOPIC_CMD_OPERATOR;
use lift_sync_runtime::drive::{ClawIntent, DriveButton};
use lift_sync_runtime::lift::ActuatorIntent;
use lift_sync_runtime::messages::OperatorCommand;

const INPUT_TIMEOUT_MS: u64 = 100; // Release inputs after this much time with no key repeat

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_OPERATOR).await?;

    info!("Controls: WASD=drive, I/K=lower lift, O/L=upper lift, U/J=claw, P=autonomous, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut cmd = OperatorCommand::default();
    let mut last_input = Instant::now();

    loop {
        // Autonomous trigger is a one-shot press
        cmd.run_autonomous = false;

        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                if pressed {
                    last_input = Instant::now();
                }

                match code {
                    KeyCode::Char('w') if pressed => cmd.drive.button = Some(DriveButton::Forward),
                    KeyCode::Char('s') if pressed => cmd.drive.button = Some(DriveButton::Backward),
                    KeyCode::Char('a') if pressed => cmd.drive.button = Some(DriveButton::SpinLeft),
                    KeyCode::Char('d') if pressed => cmd.drive.button = Some(DriveButton::SpinRight),

                    KeyCode::Char('i') if pressed => cmd.lower_lift = ActuatorIntent::Raise,
                    KeyCode::Char('k') if pressed => cmd.lower_lift = ActuatorIntent::Lower,
                    KeyCode::Char('o') if pressed => cmd.upper_lift = ActuatorIntent::Raise,
                    KeyCode::Char('l') if pressed => cmd.upper_lift = ActuatorIntent::Lower,

                    KeyCode::Char('u') if pressed => cmd.claw = ClawIntent::Close,
                    KeyCode::Char('j') if pressed => cmd.claw = ClawIntent::Open,

                    KeyCode::Char('p') if pressed => {
                        info!("Requesting autonomous routine");
                        cmd.run_autonomous = true;
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Release everything if no input for INPUT_TIMEOUT_MS
        if last_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            cmd = OperatorCommand::default();
        }

        // Always publish at ~50Hz so the runtime watchdog stays fed
        publisher.put(serde_json::to_string(&cmd)?).await?;
    }

    Ok(())
}
