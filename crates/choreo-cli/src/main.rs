//! `choreo`: mount a dance session against a pose server from the terminal.

mod config;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use choreo_analytics::SessionAnalytics;
use choreo_client::{Backend, HttpBackend};
use choreo_core::{ClockVideo, PlaybackMode, ReferenceVideo};
use choreo_overlay::{OverlayRenderer, RasterCanvas};
use choreo_session::{DanceProps, DanceSession, KeypointStatus, SessionCallbacks, SessionEvent, SessionState};

use crate::config::ChoreoConfig;

#[derive(Parser, Debug)]
#[command(name = "choreo", version, about = "Mirror a reference dance and get scored live")]
struct Args {
    /// Configuration file (TOML or JSON); `CHOREO_*` variables override it.
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Pose server base URL, overriding the configuration.
    #[arg(long, value_name = "URL", global = true)]
    backend: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count down, dance, and print the session report.
    Dance {
        /// Reference video id; the configured default when omitted.
        #[arg(long, value_name = "ID")]
        video_id: Option<String>,
        /// Seconds to dance before ending; runs until Ctrl-C when omitted.
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,
        /// Half-speed practice run.
        #[arg(long)]
        practice: bool,
        /// Length of the reference video in seconds, if known.
        #[arg(long, value_name = "SECS")]
        video_length: Option<f64>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Ingest a TikTok dance and print its video id.
    Ingest {
        #[arg(value_name = "TIKTOK_LINK")]
        link: String,
    },
    /// Fetch and summarise a reference keypoint file.
    Keypoints {
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,
    },
    /// Render one overlay frame to PNG.
    Snapshot {
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,
        /// Playback position in seconds.
        #[arg(long, value_name = "SECS", default_value_t = 0.0)]
        at: f64,
        /// Output PNG path.
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = ChoreoConfig::load(args.config.as_deref())
        .with_context(|| match &args.config {
            Some(path) => format!("failed to load configuration from {}", path.display()),
            None => "failed to load configuration from the environment".to_string(),
        })?;
    if let Some(url) = args.backend {
        config.backend.base_url = url;
    }

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config.backend)?);
    tracing::debug!(base_url = %config.backend.base_url, "backend configured");

    match args.command {
        Command::Dance {
            video_id,
            duration,
            practice,
            video_length,
            json,
        } => {
            let mode = if practice {
                PlaybackMode::Slow
            } else {
                PlaybackMode::Normal
            };
            dance(
                &config,
                backend,
                DanceProps { video_id, mode },
                duration.map(Duration::from_secs),
                video_length,
                json,
            )
            .await
        }
        Command::Ingest { link } => {
            let video_id = backend.process_tiktok(&link).await?;
            println!("{video_id}");
            Ok(())
        }
        Command::Keypoints { video_id } => keypoints(backend.as_ref(), &video_id).await,
        Command::Snapshot { video_id, at, out } => {
            snapshot(&config, backend.as_ref(), &video_id, at, &out).await
        }
    }
}

async fn dance(
    config: &ChoreoConfig,
    backend: Arc<dyn Backend>,
    props: DanceProps,
    duration: Option<Duration>,
    video_length: Option<f64>,
    json: bool,
) -> Result<()> {
    let size = config.overlay.canvas_size();
    let video = Arc::new(ClockVideo::new(size, video_length));
    let callbacks = SessionCallbacks::new(
        |log| tracing::info!(entries = log.len(), "attempt finished"),
        || tracing::info!("practice requested"),
    );

    let session = DanceSession::mount(
        backend.clone(),
        video,
        Box::new(RasterCanvas::new(size)),
        props,
        callbacks,
        config.session.clone(),
        &config.overlay,
    )
    .await;
    if let KeypointStatus::Unavailable { hint } = session.keypoint_status() {
        eprintln!("{hint}");
    }
    tracing::info!(session = %session.id(), webcam = %session.webcam_feed_url(), "webcam feed");

    let mut events = session.subscribe();
    session.start().await?;
    if !wait_for_playing(&mut events, ctrl_c()).await? {
        session.teardown();
        eprintln!("interrupted before playback started");
        return Ok(());
    }

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut shown = String::new();
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = ctrl_c() => break,
            _ = ticker.tick() => {
                let feedback = session.feedback();
                if feedback.text != shown {
                    println!("[{}] {}", feedback.category.css_class(), feedback.text);
                    shown = feedback.text;
                }
            }
        }
    }

    let log = session.end().await?;
    let store = session.reference_keypoints();
    session.teardown();

    let report = SessionAnalytics::new(log, config.analytics.clone())
        .finalize(backend.as_ref(), Some(store.as_ref()))
        .await;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

/// Print countdown steps until playback begins. Returns `false` when
/// `interrupt` fires first.
async fn wait_for_playing(
    events: &mut broadcast::Receiver<SessionEvent>,
    interrupt: impl Future<Output = ()>,
) -> Result<bool> {
    tokio::pin!(interrupt);
    loop {
        tokio::select! {
            event = events.recv() => match event? {
                SessionEvent::StateChanged(SessionState::CountingDown(step)) => println!("{}", step.label()),
                SessionEvent::StateChanged(SessionState::Playing) => return Ok(true),
                SessionEvent::Error(message) => return Err(anyhow!(message)),
                _ => {}
            },
            _ = &mut interrupt => return Ok(false),
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

async fn keypoints(backend: &dyn Backend, video_id: &str) -> Result<()> {
    let store = backend
        .keypoints(video_id)
        .await
        .with_context(|| format!("failed to load keypoints for '{video_id}'"))?;

    let joints = store.joint_names();
    println!("video:    {video_id}");
    println!("frames:   {}", store.len());
    println!("duration: {:.2}s at {} fps", store.duration_secs(), store.sample_rate());
    println!("joints:   {} ({})", joints.len(), joints.join(", "));
    Ok(())
}

async fn snapshot(
    config: &ChoreoConfig,
    backend: &dyn Backend,
    video_id: &str,
    at: f64,
    out: &Path,
) -> Result<()> {
    let store = backend
        .keypoints(video_id)
        .await
        .with_context(|| format!("failed to load keypoints for '{video_id}'"))?;
    let size = config.overlay.canvas_size();

    let video = ClockVideo::new(size, Some(store.duration_secs()));
    video.seek(at);
    let renderer = OverlayRenderer::new(Arc::new(store), &config.overlay);
    let mut canvas = RasterCanvas::new(size);
    let outcome = renderer.render(&video, &mut canvas);

    canvas.save_png(out)?;
    println!("{:?} -> {}", outcome, out.display());
    Ok(())
}
