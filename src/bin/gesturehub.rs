//! Gesture Hub CLI
//!
//! Commands:
//! - run: Drive the controller from a live hand detector and publish commands
//! - replay: Turn a recorded frame session into command payloads (batch mode)
//! - hub: Relay MQTT traffic to a dashboard as NDJSON events
//! - button: Publish a legacy button state
//! - validate: Validate a recorded frame session
//! - doctor: Diagnose configuration and environment
//! - schema: Print frame and payload schemas

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use gesture_hub::config::MqttConfig;
use gesture_hub::hub::{HubState, RelayEvent, KNOWN_BUTTONS};
use gesture_hub::pipeline::{replay, GestureProcessor};
use gesture_hub::source::{DetectorConfig, DetectorProcess, NdjsonFrames};
use gesture_hub::transport::{
    CommandSink, MqttPublisher, MqttSubscriber, SubscriberEvent, WriterSink,
};
use gesture_hub::{
    CommandEncoder, ControllerConfig, GestureError, FRAME_SCHEMA_VERSION, HUB_VERSION,
    PRODUCER_NAME,
};

/// Gesture Hub - hand-gesture control for a small smart home
#[derive(Parser)]
#[command(name = "gesturehub")]
#[command(version = HUB_VERSION)]
#[command(about = "Turn hand gestures into smart-home commands over MQTT", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the controller from a live hand detector
    Run {
        /// Detector executable
        #[arg(long, default_value = "python3")]
        detector: String,

        /// Detector argument (repeatable)
        #[arg(long = "detector-arg", default_values_t = ["hand_detect.py".to_string()])]
        detector_args: Vec<String>,

        /// Camera width passed to the detector
        #[arg(long, default_value = "640")]
        camera_width: u32,

        /// Camera height passed to the detector
        #[arg(long, default_value = "480")]
        camera_height: u32,

        /// Controller tuning file (JSON)
        #[arg(long)]
        tuning: Option<PathBuf>,

        #[command(flatten)]
        broker: BrokerArgs,

        /// Print payloads to stdout instead of publishing
        #[arg(long)]
        dry_run: bool,

        /// Also publish mode preview/lock/exit telemetry
        #[arg(long)]
        telemetry: bool,

        /// Sleep frame_sleep seconds between frames
        #[arg(long)]
        pace: bool,
    },

    /// Turn a recorded frame session into command payloads (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Controller tuning file (JSON)
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Include telemetry payloads
        #[arg(long)]
        telemetry: bool,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Relay MQTT traffic to a dashboard as NDJSON events
    Hub {
        #[command(flatten)]
        broker: BrokerArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Publish a legacy button state
    Button {
        /// Button id (A or B)
        #[arg(long)]
        id: String,

        /// Report the button as pressed (released otherwise)
        #[arg(long)]
        pressed: bool,

        #[command(flatten)]
        broker: BrokerArgs,

        /// Print the payload instead of publishing
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a recorded frame session
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a tuning file
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

/// Broker overrides on top of MQTT_* environment variables
#[derive(Args, Clone, Default)]
struct BrokerArgs {
    /// Broker host
    #[arg(long)]
    broker: Option<String>,

    /// Broker port
    #[arg(long)]
    port: Option<u16>,

    /// Topic
    #[arg(long)]
    topic: Option<String>,
}

impl BrokerArgs {
    fn resolve(&self) -> Result<MqttConfig, GestureError> {
        let mut config = MqttConfig::from_env()?;
        if let Some(broker) = &self.broker {
            config.broker = broker.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one payload per line)
    Ndjson,
    /// JSON array of payloads
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (gesture.frame.v1)
    Input,
    /// Output schema (MQTT payloads)
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_hub=info,gesturehub=info,rumqttc=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), HubCliError> {
    match cli.command {
        Commands::Run {
            detector,
            detector_args,
            camera_width,
            camera_height,
            tuning,
            broker,
            dry_run,
            telemetry,
            pace,
        } => {
            let detector = DetectorConfig {
                command: detector,
                args: detector_args,
                camera_width,
                camera_height,
            };
            cmd_run(&detector, tuning.as_deref(), &broker, dry_run, telemetry, pace)
        }

        Commands::Replay {
            input,
            output,
            tuning,
            telemetry,
            output_format,
        } => cmd_replay(&input, &output, tuning.as_deref(), telemetry, output_format),

        Commands::Hub { broker, output } => cmd_hub(&broker, &output),

        Commands::Button {
            id,
            pressed,
            broker,
            dry_run,
        } => cmd_button(&id, pressed, &broker, dry_run),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Doctor { tuning, json } => cmd_doctor(tuning.as_deref(), json),

        Commands::Schema { schema_type, json_schema } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_run(
    detector: &DetectorConfig,
    tuning: Option<&Path>,
    broker: &BrokerArgs,
    dry_run: bool,
    telemetry: bool,
    pace: bool,
) -> Result<(), HubCliError> {
    let tuning = load_tuning(tuning)?;
    let mqtt = broker.resolve()?;
    let pace = pace.then(|| Duration::from_secs_f64(tuning.frame_sleep));

    let mut source = DetectorProcess::spawn(detector, &tuning)?;

    if dry_run {
        let sink = WriterSink::new(io::stdout());
        let mut processor =
            GestureProcessor::new(tuning, sink, mqtt.topic.clone()).with_telemetry(telemetry);
        drive(&mut source, &mut processor, pace)?;
        return Ok(());
    }

    let publisher = MqttPublisher::connect(&mqtt)?;
    info!(topic = %mqtt.topic, "publishing gesture commands");
    println!("Hold up 1-4 fingers to select: 1=Temperature 2=Lights 3=Blinds 4=Door");

    let mut processor =
        GestureProcessor::new(tuning, publisher, mqtt.topic.clone()).with_telemetry(telemetry);
    let result = drive(&mut source, &mut processor, pace);
    processor.into_sink().disconnect()?;
    result
}

/// Feed detector frames until the detector exits
fn drive<S: CommandSink>(
    source: &mut DetectorProcess,
    processor: &mut GestureProcessor<S>,
    pace: Option<Duration>,
) -> Result<(), HubCliError> {
    while let Some(frame) = source.next_frame() {
        match frame {
            Ok(frame) => {
                processor.process_frame(&frame);
            }
            Err(GestureError::InvalidFrame(msg)) => warn!(error = %msg, "skipping frame"),
            Err(e) => return Err(e.into()),
        }
        if let Some(pace) = pace {
            thread::sleep(pace);
        }
    }

    let stats = processor.stats();
    info!(
        frames = stats.frames,
        commands = stats.commands_published,
        failures = stats.publish_failures,
        "detector stopped"
    );
    Ok(())
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    tuning: Option<&Path>,
    telemetry: bool,
    output_format: OutputFormat,
) -> Result<(), HubCliError> {
    let tuning = load_tuning(tuning)?;
    let input_data = read_input(input)?;

    if input_data.trim().is_empty() {
        return Err(HubCliError::NoFrames);
    }

    let sink = replay(&input_data, &tuning, telemetry)?;
    let payloads: Vec<&str> = sink.payloads();
    info!(payloads = payloads.len(), "replay finished");

    let output_data = format_output(&payloads, &output_format)?;
    write_output(output, &output_data)
}

fn cmd_hub(broker: &BrokerArgs, output: &Path) -> Result<(), HubCliError> {
    let mqtt = broker.resolve()?;
    let mut out: Box<dyn Write> = if output.to_string_lossy() == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(fs::File::create(output)?)
    };

    let mut subscriber = MqttSubscriber::connect(&mqtt)?;
    let mut hub = HubState::new();
    let mut connected = true;

    emit(&mut out, &hub.snapshot(connected))?;

    while let Some(event) = subscriber.next_event() {
        let events = match event {
            SubscriberEvent::Connected if !connected => {
                connected = true;
                vec![RelayEvent::MqttStatus { connected }]
            }
            SubscriberEvent::Connected => Vec::new(),
            SubscriberEvent::Disconnected(reason) => {
                warn!(reason = %reason, "lost broker connection");
                if connected {
                    connected = false;
                    vec![RelayEvent::MqttStatus { connected }]
                } else {
                    Vec::new()
                }
            }
            SubscriberEvent::Message { payload, .. } => hub.handle_payload(&payload),
        };
        emit(&mut out, &events)?;
    }

    Ok(())
}

fn emit(out: &mut dyn Write, events: &[RelayEvent]) -> Result<(), HubCliError> {
    for event in events {
        serde_json::to_writer(&mut *out, event)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_button(id: &str, pressed: bool, broker: &BrokerArgs, dry_run: bool) -> Result<(), HubCliError> {
    if !KNOWN_BUTTONS.contains(&id) {
        return Err(HubCliError::UnknownButton(id.to_string()));
    }

    let mqtt = broker.resolve()?;
    let payload = CommandEncoder::new().encode_button(id, pressed)?;

    if dry_run {
        println!("{}", payload);
        return Ok(());
    }

    let mut publisher = MqttPublisher::connect(&mqtt)?;
    publisher.publish(&mqtt.topic, &payload)?;
    publisher.disconnect()?;
    println!(
        "Button {}: {}",
        id,
        if pressed { "PRESSED" } else { "RELEASED" }
    );
    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), HubCliError> {
    let input_data = read_input(input)?;

    let mut frames = NdjsonFrames::new(input_data.as_bytes());
    let mut total = 0usize;
    let mut with_hands = 0usize;
    let mut errors = Vec::new();

    while let Some(result) = frames.next() {
        total += 1;
        let line = frames.line_no();
        match result.and_then(|frame| frame.validate().map(|_| frame)) {
            Ok(frame) => {
                if !frame.hands.is_empty() {
                    with_hands += 1;
                }
            }
            Err(e) => errors.push(ValidationErrorDetail {
                line,
                error: e.to_string(),
            }),
        }
    }

    let report = ValidationReport {
        schema: FRAME_SCHEMA_VERSION.to_string(),
        total_frames: total,
        valid_frames: total - errors.len(),
        invalid_frames: errors.len(),
        frames_with_hands: with_hands,
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:            {}", report.schema);
        println!("Total frames:      {}", report.total_frames);
        println!("Valid frames:      {}", report.valid_frames);
        println!("Invalid frames:    {}", report.invalid_frames);
        println!("Frames with hands: {}", report.frames_with_hands);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Line {}: {}", err.line, err.error);
            }
        }
    }

    if report.invalid_frames > 0 {
        Err(HubCliError::ValidationFailed(report.invalid_frames))
    } else {
        Ok(())
    }
}

fn cmd_doctor(tuning: Option<&Path>, json: bool) -> Result<(), HubCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Gesture Hub version {}", HUB_VERSION),
    });

    checks.push(DoctorCheck {
        name: "frame_schema".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", FRAME_SCHEMA_VERSION),
    });

    checks.push(match tuning {
        None => DoctorCheck {
            name: "tuning".to_string(),
            status: CheckStatus::Ok,
            message: "No tuning file; using defaults".to_string(),
        },
        Some(path) if !path.exists() => DoctorCheck {
            name: "tuning".to_string(),
            status: CheckStatus::Warning,
            message: "Tuning file does not exist".to_string(),
        },
        Some(path) => match ControllerConfig::load(path) {
            Ok(config) => DoctorCheck {
                name: "tuning".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Tuning file valid (hold {} frames, timeout {}s)",
                    config.mode_hold_frames, config.mode_timeout
                ),
            },
            Err(e) => DoctorCheck {
                name: "tuning".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid tuning file: {}", e),
            },
        },
    });

    checks.push(match MqttConfig::from_env() {
        Ok(config) => {
            let info = config.broker_info();
            DoctorCheck {
                name: "mqtt".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{}:{} topic {} ({})",
                    info.broker,
                    info.port,
                    info.topic,
                    if info.has_auth { "authenticated" } else { "anonymous" }
                ),
            }
        }
        Err(e) => DoctorCheck {
            name: "mqtt".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (use replay -i <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (replay -i - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: HUB_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Gesture Hub Doctor Report");
        println!("=========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(HubCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), HubCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", input_json_schema());
            } else {
                println!("Input Schema: {}", FRAME_SCHEMA_VERSION);
                println!();
                println!("One JSON object per line, preceded by a READY line from live detectors:");
                println!();
                println!("- timestamp: RFC 3339 capture time (optional)");
                println!("- hands: detected hands, best first");
                println!("  - handedness: \"Left\" or \"Right\"");
                println!("  - score: detection confidence 0-1");
                println!("  - landmarks: 21 {{ x, y, z }} points in normalized image coordinates");
                println!("- error: detector-side error for the frame (optional)");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", output_json_schema());
            } else {
                println!("Output Schema: MQTT payloads");
                println!();
                println!("- gesture_command: {{ type, category, action, value, timestamp, finger_count }}");
                println!("  - TEMPERATURE: AC_ON, AC_OFF, UP, DOWN");
                println!("  - LIGHTS: ON, OFF, BRIGHT, DIM");
                println!("  - BLINDS: OPEN, CLOSE");
                println!("  - DOOR: UNLOCK, LOCK");
                println!("- gesture_telemetry: {{ type, event, state, mode, finger_count, reason, timestamp }}");
                println!("  - event: mode_preview, mode_locked, mode_exited");
                println!("- button (legacy): {{ button_id, state }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn load_tuning(path: Option<&Path>) -> Result<ControllerConfig, HubCliError> {
    match path {
        Some(path) => Ok(ControllerConfig::load(path)?),
        None => Ok(ControllerConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, HubCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), HubCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_output(payloads: &[&str], format: &OutputFormat) -> Result<String, HubCliError> {
    match format {
        OutputFormat::Ndjson => {
            if payloads.is_empty() {
                return Ok(String::new());
            }
            Ok(payloads.join("\n") + "\n")
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let values = payloads
                .iter()
                .map(|p| serde_json::from_str::<serde_json::Value>(p))
                .collect::<Result<Vec<_>, _>>()?;
            if matches!(format, OutputFormat::Json) {
                Ok(serde_json::to_string(&values)?)
            } else {
                Ok(serde_json::to_string_pretty(&values)?)
            }
        }
    }
}

fn input_json_schema() -> String {
    let landmark = serde_json::json!({
        "type": "object",
        "required": ["x", "y"],
        "properties": {
            "x": { "type": "number" },
            "y": { "type": "number" },
            "z": { "type": "number" }
        }
    });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": FRAME_SCHEMA_VERSION,
        "description": "One hand-detector frame",
        "type": "object",
        "properties": {
            "timestamp": { "type": "string", "format": "date-time" },
            "hands": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["landmarks"],
                    "properties": {
                        "handedness": { "type": "string", "enum": ["Left", "Right"] },
                        "score": { "type": "number", "minimum": 0, "maximum": 1 },
                        "landmarks": {
                            "type": "array",
                            "minItems": 21,
                            "maxItems": 21,
                            "items": landmark
                        }
                    }
                }
            },
            "error": { "type": "string" }
        }
    })
    .to_string()
}

fn output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "gesture-hub payloads",
        "oneOf": [
            {
                "type": "object",
                "required": ["type", "category", "action", "value", "timestamp"],
                "properties": {
                    "type": { "const": "gesture_command" },
                    "category": { "enum": ["TEMPERATURE", "LIGHTS", "BLINDS", "DOOR"] },
                    "action": { "type": "string" },
                    "value": { "type": "string" },
                    "timestamp": { "type": "string", "pattern": "^\\d{2}:\\d{2}:\\d{2}$" },
                    "finger_count": { "type": ["integer", "null"] }
                }
            },
            {
                "type": "object",
                "required": ["type", "event", "state", "timestamp"],
                "properties": {
                    "type": { "const": "gesture_telemetry" },
                    "event": { "enum": ["mode_preview", "mode_locked", "mode_exited"] },
                    "state": { "enum": ["select_mode", "locked_mode"] },
                    "mode": { "type": ["string", "null"] },
                    "finger_count": { "type": ["integer", "null"] },
                    "reason": { "enum": ["timeout", "pinch_hold", "mode_switch"] },
                    "timestamp": { "type": "string" }
                }
            },
            {
                "type": "object",
                "required": ["button_id", "state"],
                "properties": {
                    "button_id": { "enum": KNOWN_BUTTONS },
                    "state": { "type": "boolean" }
                }
            }
        ]
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum HubCliError {
    Io(io::Error),
    Gesture(GestureError),
    Json(serde_json::Error),
    NoFrames,
    UnknownButton(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for HubCliError {
    fn from(e: io::Error) -> Self {
        HubCliError::Io(e)
    }
}

impl From<GestureError> for HubCliError {
    fn from(e: GestureError) -> Self {
        match e {
            GestureError::Io(e) => HubCliError::Io(e),
            other => HubCliError::Gesture(other),
        }
    }
}

impl From<serde_json::Error> for HubCliError {
    fn from(e: serde_json::Error) -> Self {
        HubCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HubCliError> for CliError {
    fn from(e: HubCliError) -> Self {
        match e {
            HubCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HubCliError::Gesture(e) => {
                let (code, hint) = match &e {
                    GestureError::Config(_) => (
                        "CONFIG_ERROR",
                        "Check MQTT_* variables and the tuning file; run 'gesturehub doctor'",
                    ),
                    GestureError::Mqtt(_) => (
                        "MQTT_ERROR",
                        "Check that the broker is reachable and credentials are correct",
                    ),
                    GestureError::Detector(_) => (
                        "DETECTOR_ERROR",
                        "The detector must print READY and then one frame per line",
                    ),
                    _ => ("PARSE_ERROR", "Ensure input matches gesture.frame.v1"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            HubCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HubCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            HubCliError::UnknownButton(id) => CliError {
                code: "UNKNOWN_BUTTON".to_string(),
                message: format!("Unknown button id: {}", id),
                hint: Some(format!("Use one of {:?}", KNOWN_BUTTONS)),
            },
            HubCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} frames failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            HubCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema: String,
    total_frames: usize,
    valid_frames: usize,
    invalid_frames: usize,
    frames_with_hands: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    line: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
