//! Command implementations

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::adapters::TerminalPrompter;
use crate::app::{AppContainer, AutoConfirm, DefaultAppContainer, OperationHandle};
use crate::cli::args::{CheckArgs, FormatsArgs, GrabArgs};
use crate::config::AppConfig;
use crate::domain::model::*;
use crate::domain::rules::{CompatibilityStatus, CompatibilityValidator};
use crate::utils::path::PathUtils;

/// How long the main thread waits for a question before checking the worker again
const CONFIRMATION_POLL: Duration = Duration::from_millis(200);

/// Execute the grab command; returns the operation's final result
pub async fn grab(
    container: &DefaultAppContainer,
    config: &AppConfig,
    args: GrabArgs,
) -> Result<OperationResult> {
    let source = Source::from_parts(args.url.clone(), args.file.clone())?;
    info!(%source, "Starting grab operation");

    let request = build_request(container, config, &args, source).await?;
    request.validate()?;

    let handle = OperationHandle::spawn(container.orchestrator(), container.broker(), request)?;

    let token = handle.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the operation");
            token.cancel();
        }
    });

    let auto = config
        .output
        .assume_yes
        .then(|| AutoConfirm::new(config.output.conflict_policy, true));
    let result = tokio::task::spawn_blocking(move || answer_until_finished(handle, auto))
        .await
        .context("Confirmation loop failed")?;

    Ok(result)
}

/// Answer the worker's questions until it returns its result
fn answer_until_finished(handle: OperationHandle, auto: Option<AutoConfirm>) -> OperationResult {
    let prompter = TerminalPrompter::new();
    loop {
        match handle.next_confirmation(CONFIRMATION_POLL) {
            Some(pending) => {
                let answer = match &auto {
                    Some(auto) => auto.answer(&pending.request),
                    None => prompter.ask(&pending.request),
                };
                pending.respond(answer);
            }
            None if handle.is_finished() => break,
            None => {}
        }
    }
    handle.join()
}

async fn build_request(
    container: &DefaultAppContainer,
    config: &AppConfig,
    args: &GrabArgs,
    source: Source,
) -> Result<OperationRequest> {
    let title = match (&args.title, &source) {
        (Some(title), _) => title.clone(),
        (None, Source::Local(path)) => PathUtils::stem(path),
        (None, Source::Remote(url)) => match container.fetcher().resolve_title(url).await {
            Ok(title) => title,
            Err(e) => {
                warn!(error = %e, "Could not resolve the title, using a generic name");
                "media".to_string()
            }
        },
    };

    let mut request = OperationRequest::new(source, title, config.output.directory.clone());
    request.mode = if args.audio_only {
        Mode::AudioOnly
    } else {
        Mode::VideoAudio
    };
    request.fragment = args.fragment();
    request.recode = args.recode_options();

    if args.container.is_some() && !request.recode.video_enabled && !request.recode.audio_enabled {
        warn!("--container has no effect without video or audio re-encode options");
    }

    if args.video_format.is_some() || args.audio_format.is_some() {
        let formats = container
            .prober()
            .list_formats(&request.source)
            .await
            .context("Failed to list the source's formats")?;
        request.video_format = find_format(&formats, args.video_format.as_deref())?;
        request.audio_format = find_format(&formats, args.audio_format.as_deref())?;
    } else if let Source::Local(path) = &request.source {
        let path = path.clone();
        match container.prober().list_formats(&request.source).await {
            Ok(formats) => select_local_streams(&mut request, &formats),
            Err(e) => warn!(path = %path.display(), error = %e, "Could not probe the local file"),
        }
    }

    Ok(request)
}

fn find_format(formats: &[FormatDescriptor], id: Option<&str>) -> Result<Option<FormatDescriptor>> {
    match id {
        None => Ok(None),
        Some(id) => formats
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("Format '{}' is not offered by the source", id)),
    }
}

/// Pick the first video stream; a file without video is processed audio-only
fn select_local_streams(request: &mut OperationRequest, formats: &[FormatDescriptor]) {
    request.video_format = formats.iter().find(|f| f.has_video()).cloned();
    if request.video_format.is_none() {
        request.mode = Mode::AudioOnly;
        request.audio_format = formats
            .iter()
            .find(|f| f.kind == FormatKind::AudioOnly)
            .cloned();
    }
}

/// Execute the formats command
pub async fn formats(container: &DefaultAppContainer, args: FormatsArgs) -> Result<()> {
    let source = Source::from_parts(args.url, args.file)?;
    let formats = container
        .prober()
        .list_formats(&source)
        .await
        .context("Failed to list formats")?;

    println!(
        "{:<12} {:<10} {:<16} {:<12} {:<6} {:<11} {:<6} {:>8}",
        "ID", "KIND", "CODEC", "AUDIO", "EXT", "RESOLUTION", "LANG", "KBPS"
    );
    for f in &formats {
        let kind = match f.kind {
            FormatKind::Combined => "combined",
            FormatKind::VideoOnly => "video",
            FormatKind::AudioOnly => "audio",
        };
        println!(
            "{:<12} {:<10} {:<16} {:<12} {:<6} {:<11} {:<6} {:>8}",
            f.id,
            kind,
            f.codec,
            f.audio_codec.as_deref().unwrap_or("-"),
            f.extension,
            f.resolution
                .map(|r| format!("{}x{}", r.width, r.height))
                .unwrap_or_else(|| "-".to_string()),
            f.language.as_deref().unwrap_or("-"),
            f.bitrate_kbps
                .map(|b| format!("{:.0}", b))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    info!(count = formats.len(), "Listed formats");
    Ok(())
}

/// Execute the check command; returns whether the combination is usable
pub fn check(args: &CheckArgs) -> bool {
    let report = CompatibilityValidator::validate(
        args.container,
        args.video,
        args.audio,
        args.original_video.as_deref(),
        args.original_audio.as_deref(),
    );
    match report.status {
        CompatibilityStatus::Valid => println!("valid"),
        CompatibilityStatus::Warning => println!("warning: {}", report.message),
        CompatibilityStatus::Error => println!("error: {}", report.message),
    }
    report.permits()
}

/// Print the final result of a grab
pub fn report(result: &OperationResult) {
    if result.success {
        println!("{}", result.message);
        return;
    }
    if result.message.is_empty() {
        return;
    }
    eprintln!("{}", result.message);
    if let (true, Some(path)) = (result.keep_partial, result.final_path.as_deref()) {
        eprintln!("Kept {}", path.display());
    }
}
