// 50 Hz control loop with watchdog
// Note: the watchdog stops the robot if operator commands stop arriving, and
// holds the lift if the pot readings go stale, since it can't be kept level blind.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

// local imports
use crate::autonomous::{AutonomousRoutine, StartSide};
use crate::config::{
    CMD_TIMEOUT, LOOP_HZ, RuntimeConfig, SENSOR_TIMEOUT, TOPIC_CMD_OPERATOR, TOPIC_HEALTH,
    TOPIC_RT_MOTORS, TOPIC_SENSOR_ANALOG,
};
use crate::drive::{apply_drive, apply_upper_lift, claw_speed, drive_speeds, upper_lift_speed};
use crate::hal::{ActuatorSink, MotorFrame, MotorId};
use crate::lift::{self, LiftReadings, LiftSynchronizer};
use crate::messages::{OperatorCommand, RuntimeHealth, SensorFrame};

pub struct Runtime {
    config: RuntimeConfig,
    lift: LiftSynchronizer,
    latest_cmd: Option<OperatorCommand>,
    cmd_received_at: Instant,
    latest_sensors: Option<SensorFrame>,
    sensors_received_at: Instant,
    // Previous pot readings, only used to log changes
    last_readings: Option<LiftReadings>,
    autonomous: Option<AutonomousRoutine>,
    health: RuntimeHealth,
}

impl Runtime {
    /// `config` must already be validated
    pub fn new(config: RuntimeConfig, now: Instant) -> Self {
        let lift = LiftSynchronizer::new(config.lift.clone());
        Self {
            config,
            lift,
            latest_cmd: None,
            cmd_received_at: now,
            latest_sensors: None,
            sensors_received_at: now,
            last_readings: None,
            autonomous: None,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn is_autonomous(&self) -> bool {
        self.autonomous.is_some()
    }

    /// Process incoming operator command
    pub fn on_command(&mut self, cmd: OperatorCommand, now: Instant) {
        debug!("Received command: {:?}", &cmd);

        // Only a fresh press starts the routine, holding the button doesn't repeat it
        let was_pressed = self
            .latest_cmd
            .as_ref()
            .is_some_and(|prev| prev.run_autonomous);
        if cmd.run_autonomous && !was_pressed && self.autonomous.is_none() {
            self.start_autonomous(now);
        }

        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Process incoming sensor frame
    pub fn on_sensors(&mut self, frame: SensorFrame, now: Instant) {
        let readings = frame.lift_readings(&self.config.sensors);
        if readings != self.last_readings {
            debug!("Lift pots changed: {:?} -> {:?}", self.last_readings, readings);
            self.last_readings = readings;
        }
        self.latest_sensors = Some(frame);
        self.sensors_received_at = now;
    }

    pub fn start_autonomous(&mut self, now: Instant) {
        let pressed = self
            .latest_sensors
            .as_ref()
            .and_then(|frame| frame.limit_switch(&self.config.sensors));
        let side = StartSide::from_limit_switch(pressed);
        self.autonomous = Some(AutonomousRoutine::new(
            &self.config.autonomous,
            self.config.drive.button_speed,
            side,
            now,
        ));
    }

    /// Lift readings, if the last sensor frame is recent enough to act on
    fn fresh_readings(&self, now: Instant) -> Option<LiftReadings> {
        if now.saturating_duration_since(self.sensors_received_at) > SENSOR_TIMEOUT {
            return None;
        }
        self.latest_sensors
            .as_ref()
            .and_then(|frame| frame.lift_readings(&self.config.sensors))
    }

    fn set_health(&mut self, health: RuntimeHealth) {
        if self.health == health {
            return;
        }
        match health {
            RuntimeHealth::Ok => info!("Runtime healthy"),
            RuntimeHealth::Autonomous => info!("Running autonomous routine"),
            RuntimeHealth::CmdStale => warn!("Operator command stale, stopping robot"),
            RuntimeHealth::SensorStale => warn!("Lift sensors stale, holding lift"),
        }
        self.health = health;
    }

    /// Compute this tick's motor outputs, including watchdog logic
    pub fn compute_actuation(&mut self, now: Instant) -> MotorFrame {
        let mut frame = MotorFrame::new(&self.config.motors, self.config.lift.max_speed);
        let readings = self.fresh_readings(now);

        if let Some(routine) = self.autonomous.as_mut() {
            if routine.tick(now, &mut frame, &self.lift, readings) {
                self.set_health(RuntimeHealth::Autonomous);
                return frame;
            }
            self.autonomous = None;
        }

        let cmd_age = now.saturating_duration_since(self.cmd_received_at);
        let fresh_cmd = self.latest_cmd.clone().filter(|_| cmd_age <= CMD_TIMEOUT);
        let Some(cmd) = fresh_cmd else {
            // Watchdog triggered or no command ever received
            self.set_health(RuntimeHealth::CmdStale);
            frame.stop_all();
            return frame;
        };

        apply_drive(&mut frame, drive_speeds(&cmd.drive, &self.config.drive));
        apply_upper_lift(
            &mut frame,
            upper_lift_speed(cmd.upper_lift, &self.config.upper_lift),
        );
        frame.set_speed(MotorId::Claw, claw_speed(cmd.claw, &self.config.claw));

        match readings {
            Some(readings) => {
                lift::apply(&mut frame, self.lift.command(readings, cmd.lower_lift));
                self.set_health(RuntimeHealth::Ok);
            }
            None => {
                // Lower lift motors stay at 0
                self.set_health(RuntimeHealth::SensorStale);
            }
        }

        frame
    }

    /// All motors stopped, for shutdown
    pub fn stop_frame(&self) -> MotorFrame {
        MotorFrame::new(&self.config.motors, self.config.lift.max_speed)
    }
}

pub async fn run(config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let cmd_subscriber = session.declare_subscriber(TOPIC_CMD_OPERATOR).await?;
    let sensor_subscriber = session.declare_subscriber(TOPIC_SENSOR_ANALOG).await?;
    let pub_motors = session.declare_publisher(TOPIC_RT_MOTORS).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    info!(
        "Lift: tolerance {}, raise {}, lower {}",
        config.lift.tolerance, config.lift.raise_speed, config.lift.lower_speed
    );

    let mut runtime = Runtime::new(config, Instant::now());
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Runtime started: {}Hz loop, {}ms command watchdog, {}ms sensor watchdog",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis(),
        SENSOR_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}, {}", TOPIC_CMD_OPERATOR, TOPIC_SENSOR_ANALOG);
    info!("Publishing to: {}, {}", TOPIC_RT_MOTORS, TOPIC_HEALTH);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = &mut shutdown => {
                info!("Shutting down, stopping all motors");
                let stop_json = serde_json::to_string(&runtime.stop_frame())?;
                pub_motors.put(stop_json).await?;
                return Ok(());
            }
        }
        let now = Instant::now();

        // 1. Drain all pending messages (non-blocking), keep latest
        while let Ok(Some(sample)) = cmd_subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<OperatorCommand>(&payload) {
                Ok(cmd) => runtime.on_command(cmd, now),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }
        while let Ok(Some(sample)) = sensor_subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<SensorFrame>(&payload) {
                Ok(frame) => runtime.on_sensors(frame, now),
                Err(e) => warn!("Failed to parse sensor frame: {}", e),
            }
        }

        // 2. Compute actuation (includes watchdog logic)
        let frame = runtime.compute_actuation(now);

        // 3. Publish motor commands
        let frame_json = serde_json::to_string(&frame)?;
        pub_motors.put(frame_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health())?;
        pub_health.put(health_json).await?;
    }
}
