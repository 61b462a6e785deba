//! CLI application for eye, hair and skin color analysis.
//!
//! Usage:
//!   tint-face <image> --detections faces.json     # Human-readable output
//!   tint-face <image> --detector seeta.bin --json # JSON output
//!   tint-face <image> --detections faces.bin -o report.json

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Parser;
use tint_face::{
    analyze_detections, AnalysisReport, AnalyzeOptions, Analyzer, AnalyzerConfig,
    ColorClassification, Detector, PixelBuffer, RecordedDetector,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tint-face")]
#[command(author, version, about = "Eye, hair and skin color analysis from face landmarks", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Stored detections (.json, .json.bz2 or .bin)
    #[arg(long, conflicts_with = "detector")]
    detections: Option<PathBuf>,

    /// SeetaFace detector model path (box-only detection)
    #[arg(long)]
    detector: Option<PathBuf>,

    /// Minimum face size for the SeetaFace detector
    #[arg(long, default_value = "20")]
    min_face_size: u32,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Analyzer config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible clustering
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for per-person debug crops
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Save the detections used for this run
    #[arg(long)]
    save_detections: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "tint_face=debug,info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_detector(args: &Args) -> Result<Box<dyn Detector>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.detections {
        info!(path = %path.display(), "loading stored detections");
        return Ok(Box::new(RecordedDetector::load(path)?));
    }
    if let Some(path) = &args.detector {
        return seeta_detector(path, args.min_face_size);
    }
    Err("either --detections or --detector is required".into())
}

#[cfg(feature = "rustface")]
fn seeta_detector(
    path: &std::path::Path,
    min_face_size: u32,
) -> Result<Box<dyn Detector>, Box<dyn std::error::Error>> {
    info!(path = %path.display(), "loading face detector");
    Ok(Box::new(tint_face::RustfaceDetector::load(path, min_face_size)?))
}

#[cfg(not(feature = "rustface"))]
fn seeta_detector(
    _path: &std::path::Path,
    _min_face_size: u32,
) -> Result<Box<dyn Detector>, Box<dyn std::error::Error>> {
    Err("built without the `rustface` feature".into())
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    if args.seed.is_some() {
        config.cluster.seed = args.seed;
    }

    let analyzer = Analyzer::new(load_detector(args)?, config)?;

    info!(path = %args.image.display(), "loading image");
    let image = PixelBuffer::open(&args.image)?;

    let detections = analyzer.detect(&image)?;
    if let Some(path) = &args.save_detections {
        detections.save(path)?;
        info!(path = %path.display(), "detections saved");
    }

    let options = AnalyzeOptions {
        debug_dir: args.debug_dir.clone(),
    };
    let report = analyze_detections(&detections, &image, analyzer.config(), &options)?;
    analyzer.shutdown()?;

    let output_str = if args.json {
        report.to_json()?
    } else {
        format_human_readable(&args.image.display().to_string(), &report)
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        info!(path = %path.display(), "output written");
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn color_line<A>(label: &str, color: &ColorClassification<A>, category: impl Fn(&A) -> String) -> String {
    match color {
        ColorClassification::Classified(m) => format!(
            "  {label}: {} ({}, {}) {} - {}% confidence\n",
            category(&m.attribute),
            m.color_name,
            m.simple_color_name,
            m.hex,
            m.confidence
        ),
        ColorClassification::Unknown { reason, .. } => format!("  {label}: unknown ({reason})\n"),
    }
}

fn format_human_readable(image: &str, report: &AnalysisReport) -> String {
    let mut s = String::new();

    let _ = writeln!(s, "Image: {} ({}x{})", image, report.image_info.width, report.image_info.height);
    let _ = writeln!(
        s,
        "Detected: {} face(s), {} body(ies), {} hand(s), {} gesture(s)",
        report.summary.total_faces,
        report.summary.total_bodies,
        report.summary.total_hands,
        report.summary.total_gestures
    );

    if report.people.is_empty() {
        s.push_str("\nNo people found.\n");
        return s;
    }

    for person in &report.people {
        let _ = writeln!(s, "\n--- Person {} ---", person.person_index + 1);
        if let Some(note) = &person.note {
            let _ = writeln!(s, "Note: {}", note);
        }

        if let Some(face) = &person.face {
            s.push_str("Basic info:\n");
            let _ = writeln!(s, "  Face score: {}%", face.score);
            if let Some(age) = face.age {
                let _ = writeln!(s, "  Age: ~{:.1}", age);
            }
            if let Some(gender) = &face.gender {
                let score = face.gender_score.map(|g| format!(" ({}%)", g)).unwrap_or_default();
                let _ = writeln!(s, "  Gender: {}{}", gender, score);
            }
            if let Some(emotion) = &face.primary_emotion {
                let _ = writeln!(s, "  Emotion: {} ({}%)", emotion.emotion, emotion.score);
            }

            s.push_str("\nColors:\n");
            let colors = &face.colors;
            s.push_str(&color_line("Eyes", &colors.eye_color, |a| a.color.to_string()));
            s.push_str(&color_line("Hair", &colors.hair_color, |a| a.color.to_string()));
            s.push_str(&color_line("Skin", &colors.skin_tone, |a| {
                format!("{}, {} undertone, Fitzpatrick {}", a.tone, a.undertone, a.fitzpatrick)
            }));

            s.push_str("\nState:\n");
            let eyes = if face.eyes.both_open {
                "both open".to_string()
            } else {
                format!("L: {}, R: {}", face.eyes.left, face.eyes.right)
            };
            let _ = writeln!(s, "  Eyes: {}", eyes);
            match face.mouth.open_percent {
                Some(p) => {
                    let _ = writeln!(s, "  Mouth: {} ({}%)", face.mouth.state, p);
                }
                None => {
                    let _ = writeln!(s, "  Mouth: {}", face.mouth.state);
                }
            }
            let _ = writeln!(s, "  Head: {}", face.head_direction.direction);
            let _ = writeln!(s, "  Gaze: {}", face.gaze_direction.direction);
            if let Some(distance) = &face.distance {
                let _ = writeln!(s, "  Distance: {:.2}m ({})", distance.meters, distance.description);
            }
        }

        if let Some(body) = &person.body {
            let _ = writeln!(s, "Body: {}, {}", body.posture.posture, body.posture.lean);
        }
        if !person.hands.is_empty() {
            let _ = writeln!(s, "Hands: {}", person.hands.len());
        }
    }

    s
}
