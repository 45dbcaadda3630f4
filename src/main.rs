mod buffering;
mod classification;
mod config;
mod features;
mod inference;
mod model;
mod video;

use classification::classification_error::ClassificationError;
use classification::classification_session::{ClassificationOutcome, ClassificationSession};
use clap::{Parser, Subcommand};
use config::classifier_config::ClassifierConfig;
use features::feature_extractor::KeypointFeatureExtractor;
use features::feature_vector::FeatureVector;
use features::keypoint_layout::LandmarkFrame;
use itertools::Itertools;
use model::ort_inference_session::OrtInferenceSession;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sign-sequence", about = "Classify signs from landmark feature sequences")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the input/output tensors of a model and the contract derived from them.
    Inspect {
        #[arg(long)]
        model: PathBuf,
    },
    /// Feed a JSON array of feature vectors through the live sliding window, one frame at a time.
    /// A `"reset"` entry empties the window.
    Stream {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        features: PathBuf,
    },
    /// Classify a JSON array of landmark frames (null = no detection) as one clip.
    Video {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        frames: PathBuf,
    },
}

/// One entry of a stream file: a frame, or a command for the window.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum StreamEntry {
    Frame(FeatureVector),
    Command(StreamCommand),
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
enum StreamCommand {
    Reset,
}

fn load_config(path: Option<&Path>) -> Result<ClassifierConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(ClassifierConfig::from_json_file(path)?),
        None => Ok(ClassifierConfig::default()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    if !path.exists() {
        return Err(format!("Path does not exist, or cannot be read: {:?}", path).into());
    }
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn inspect(model_path: &Path) -> Result<(), Box<dyn Error>> {
    let defaults = ClassifierConfig::default();
    let session = OrtInferenceSession::new(model_path)?;
    println!(
        "{}",
        session.report(defaults.default_sequence_length, defaults.default_feature_width)
    );
    Ok(())
}

fn stream(
    session: &ClassificationSession,
    entries: Vec<StreamEntry>,
) -> Result<(), Box<dyn Error>> {
    info!(
        entries = entries.len(),
        labels = %session.labels().iter().join(", "),
        "streaming feature vectors"
    );
    for (frame_ix, entry) in entries.into_iter().enumerate() {
        let vector = match entry {
            StreamEntry::Frame(vector) => vector,
            StreamEntry::Command(StreamCommand::Reset) => {
                session.clear();
                println!("{frame_ix}\treset");
                continue;
            }
        };
        match session.classify_frame(vector) {
            Ok(ClassificationOutcome::Predicted(prediction)) => {
                println!("{frame_ix}\t{}", serde_json::to_string(&prediction)?);
            }
            Ok(progress) => println!("{frame_ix}\t{progress}"),
            // Unavailable model is the same for every frame; stop rather than repeat it.
            Err(ClassificationError::ModelUnavailable) => {
                return Err(ClassificationError::ModelUnavailable.into());
            }
            Err(err) => {
                warn!(frame = frame_ix, error = %err, "frame not classified");
                println!("{frame_ix}\t{err}");
            }
        }
    }
    info!(frames = session.frame_count(), state = ?session.state(), "stream finished");
    Ok(())
}

fn video(
    session: &ClassificationSession,
    config: &ClassifierConfig,
    frames: Vec<Option<LandmarkFrame>>,
) -> Result<(), Box<dyn Error>> {
    let extractor =
        KeypointFeatureExtractor::new(session.contract().feature_width, config.fallback);
    info!(frames = frames.len(), width = extractor.feature_width(), "classifying clip");
    let prediction = session.classify_video(&frames, &extractor)?;
    println!("{}", serde_json::to_string(&prediction)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { model } => {
            init_tracing(&ClassifierConfig::default().log_filter);
            inspect(&model)
        }
        Command::Stream { config, features } => {
            let config = load_config(config.as_deref())?;
            init_tracing(&config.log_filter);
            let session = ClassificationSession::from_config(&config)?;
            stream(&session, read_json(&features)?)
        }
        Command::Video { config, frames } => {
            let config = load_config(config.as_deref())?;
            init_tracing(&config.log_filter);
            let session = ClassificationSession::from_config(&config)?;
            video(&session, &config, read_json(&frames)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference::inference_invoker::InferenceInvoker;
    use model::inference_runtime::fixtures::ScriptedRuntime;
    use model::label_table::LabelTable;
    use model::model_contract::{ModelContract, TensorLayout};
    use std::sync::Arc;

    fn entries(json: &str) -> Vec<StreamEntry> {
        serde_json::from_str(json).unwrap()
    }

    fn two_frame_session(runtime: Arc<ScriptedRuntime>) -> ClassificationSession {
        ClassificationSession::new(
            InferenceInvoker::new(runtime),
            ModelContract::new(2, 2, TensorLayout::Rank2),
            LabelTable::from_iter(["idle", "hello", "good"]),
        )
    }

    #[test]
    fn stream_file_mixes_frames_and_resets() {
        let parsed = entries(r#"[[0.1, 0.2], "reset", []]"#);
        assert_eq!(parsed.len(), 3);
        assert!(matches!(&parsed[0], StreamEntry::Frame(v) if v.as_slice() == [0.1, 0.2]));
        assert!(matches!(parsed[1], StreamEntry::Command(StreamCommand::Reset)));
        assert!(matches!(&parsed[2], StreamEntry::Frame(v) if v.as_slice().is_empty()));
        assert!(serde_json::from_str::<Vec<StreamEntry>>(r#"["rewind"]"#).is_err());
    }

    #[test]
    fn reset_entry_clears_the_window() {
        let runtime = Arc::new(ScriptedRuntime::returning(&[3], vec![0.1, 0.7, 0.2]));
        let session = two_frame_session(runtime.clone());

        stream(&session, entries(r#"[[0.1, 0.2], [0.3, 0.4], "reset"]"#)).unwrap();
        assert_eq!(runtime.calls(), 1);
        assert_eq!(session.frame_count(), 0);

        stream(&session, entries(r#"[[0.5, 0.6]]"#)).unwrap();
        assert_eq!(session.frame_count(), 1);
        assert_eq!(runtime.calls(), 1);
    }

    #[test]
    fn stream_stops_when_no_model_is_loaded() {
        let session = ClassificationSession::new(
            InferenceInvoker::unavailable(),
            ModelContract::new(2, 2, TensorLayout::Rank2),
            LabelTable::default(),
        );
        let err = stream(&session, entries(r#"[[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]]"#))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassificationError>(),
            Some(ClassificationError::ModelUnavailable)
        ));
        assert_eq!(session.frame_count(), 1);
    }
}
