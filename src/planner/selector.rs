//! Format selector cascade planning

use std::fmt;

use crate::domain::model::{FormatDescriptor, FormatKind, Mode, OperationRequest};

/// Final-tier selector for video+audio requests
pub const FINAL_VIDEO_AUDIO: &str = "bestvideo*+bestaudio/best";
/// Final-tier selector for audio-only requests
pub const FINAL_AUDIO_ONLY: &str = "bestaudio/best";

/// Cascade tier, from most to least restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CascadeTier {
    Precise,
    StrictFlexible,
    Compromise,
    Final,
}

impl fmt::Display for CascadeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CascadeTier::Precise => "precise",
            CascadeTier::StrictFlexible => "strict-flexible",
            CascadeTier::Compromise => "compromise",
            CascadeTier::Final => "final",
        })
    }
}

/// One selector expression handed to the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelector {
    pub tier: CascadeTier,
    pub expression: String,
}

impl FormatSelector {
    fn new(tier: CascadeTier, expression: impl Into<String>) -> Self {
        Self {
            tier,
            expression: expression.into(),
        }
    }

    /// Selector merges separate video and audio streams
    pub fn is_merge(&self) -> bool {
        self.expression.contains('+')
    }
}

/// A cascade step: fetch with a selector, or stop and ask the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    Fetch(FormatSelector),
    /// Describe the best alternative and ask before falling through
    Negotiate,
}

/// Builds the ordered cascade for a request
pub struct SelectorPlanner;

impl SelectorPlanner {
    /// Ordered steps; each is tried only after the previous was unavailable
    pub fn build_cascade(request: &OperationRequest) -> Vec<CascadeStep> {
        if request.needs_audio_extraction() {
            // audio comes from the transcode stage, so fetch the combined stream as-is
            let mut steps = Vec::new();
            if let Some(video) = &request.video_format {
                steps.push(CascadeStep::Fetch(FormatSelector::new(
                    CascadeTier::Precise,
                    video.id.clone(),
                )));
            }
            steps.push(CascadeStep::Fetch(FormatSelector::new(CascadeTier::Final, "best")));
            return steps;
        }

        let mut steps = Vec::new();
        if let Some(expression) = Self::precise(request) {
            steps.push(CascadeStep::Fetch(FormatSelector::new(CascadeTier::Precise, expression)));
        }
        steps.push(CascadeStep::Fetch(FormatSelector::new(
            CascadeTier::StrictFlexible,
            Self::strict_flexible(request),
        )));
        steps.push(CascadeStep::Negotiate);
        steps.push(CascadeStep::Fetch(FormatSelector::new(
            CascadeTier::Final,
            Self::final_fallback(request.mode),
        )));
        steps
    }

    /// Exact ids of the chosen formats
    pub fn precise(request: &OperationRequest) -> Option<String> {
        let video = request.video_format.as_ref();
        let audio = request.audio_format.as_ref();
        match request.mode {
            Mode::AudioOnly => audio.or(video).map(|f| f.id.clone()),
            Mode::VideoAudio => match (video, audio) {
                (Some(v), _) if v.is_combined() => Some(v.id.clone()),
                (Some(v), Some(a)) => Some(format!("{}+{}", v.id, a.id)),
                (Some(v), None) => Some(v.id.clone()),
                (None, _) => None,
            },
        }
    }

    /// Same height and language, any matching id
    pub fn strict_flexible(request: &OperationRequest) -> String {
        let language = request
            .audio_format
            .as_ref()
            .and_then(|f| f.language.as_deref())
            .or_else(|| {
                request
                    .video_format
                    .as_ref()
                    .filter(|f| f.is_combined())
                    .and_then(|f| f.language.as_deref())
            });
        let audio = match language {
            Some(lang) => format!("bestaudio[language={}]", lang),
            None => "bestaudio".to_string(),
        };

        match request.mode {
            Mode::AudioOnly => audio,
            Mode::VideoAudio => {
                let video = request.video_format.as_ref();
                let height = video.and_then(FormatDescriptor::height);
                match (video, height) {
                    (Some(v), Some(h)) if v.is_combined() => format!("best[height={}]", h),
                    (_, Some(h)) => format!("bestvideo[height={}]+{}", h, audio),
                    _ => format!("bestvideo+{}", audio),
                }
            }
        }
    }

    pub fn final_fallback(mode: Mode) -> &'static str {
        match mode {
            Mode::VideoAudio => FINAL_VIDEO_AUDIO,
            Mode::AudioOnly => FINAL_AUDIO_ONLY,
        }
    }

    /// Extension the fetched file is expected to carry
    pub fn expected_extension(request: &OperationRequest) -> String {
        let video = request.video_format.as_ref();
        let audio = request.audio_format.as_ref();
        match request.mode {
            Mode::AudioOnly => audio
                .or(video)
                .map(|f| f.extension.clone())
                .unwrap_or_else(|| "m4a".to_string()),
            Mode::VideoAudio => match (video, audio) {
                (Some(v), Some(a)) if !v.is_combined() => {
                    merge_extension(&v.extension, &a.extension).to_string()
                }
                (Some(v), _) => v.extension.clone(),
                (None, _) => "mp4".to_string(),
            },
        }
    }

    /// Simulate what the generic final selector would most likely pick
    ///
    /// Best-effort only: the fetcher is free to choose differently.
    pub fn describe_best_alternative(formats: &[FormatDescriptor], mode: Mode) -> Option<String> {
        let best_audio = formats
            .iter()
            .filter(|f| f.kind == FormatKind::AudioOnly)
            .max_by(|a, b| bitrate(a).total_cmp(&bitrate(b)));

        match mode {
            Mode::AudioOnly => best_audio
                .or_else(|| best_by_height(formats.iter().filter(|f| f.is_combined())))
                .map(describe),
            Mode::VideoAudio => {
                let best_video = best_by_height(formats.iter().filter(|f| f.has_video()))?;
                match (best_video.kind, best_audio) {
                    (FormatKind::VideoOnly, Some(audio)) => {
                        Some(format!("{} + {}", describe(best_video), describe(audio)))
                    }
                    _ => Some(describe(best_video)),
                }
            }
        }
    }
}

/// Container a `<video>+<audio>` merge ends up in
pub fn merge_extension(video_ext: &str, audio_ext: &str) -> &'static str {
    match (video_ext, audio_ext) {
        ("mp4", "m4a") | ("mp4", "mp4") => "mp4",
        ("webm", "webm") => "webm",
        _ => "mkv",
    }
}

fn bitrate(format: &FormatDescriptor) -> f64 {
    format.bitrate_kbps.unwrap_or(0.0)
}

fn best_by_height<'a>(formats: impl Iterator<Item = &'a FormatDescriptor>) -> Option<&'a FormatDescriptor> {
    formats.max_by(|a, b| {
        a.height()
            .unwrap_or(0)
            .cmp(&b.height().unwrap_or(0))
            .then(bitrate(a).total_cmp(&bitrate(b)))
    })
}

fn describe(format: &FormatDescriptor) -> String {
    let mut parts = Vec::new();
    if let Some(res) = format.resolution {
        parts.push(format!("{}x{}", res.width, res.height));
    }
    parts.push(format!("{} ({})", format.extension, format.codec));
    if let Some(lang) = &format.language {
        parts.push(format!("[{}]", lang));
    }
    if let Some(kbps) = format.bitrate_kbps {
        parts.push(format!("{:.0} kbps", kbps));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Resolution, Source};

    fn format(id: &str, kind: FormatKind, ext: &str, height: Option<u32>) -> FormatDescriptor {
        FormatDescriptor {
            id: id.to_string(),
            kind,
            codec: match kind {
                FormatKind::AudioOnly => "mp4a.40.2".to_string(),
                _ => "avc1.640028".to_string(),
            },
            audio_codec: None,
            extension: ext.to_string(),
            resolution: height.map(|h| Resolution::new(h * 16 / 9, h)),
            language: None,
            bitrate_kbps: None,
            stream_index: None,
        }
    }

    fn request() -> OperationRequest {
        OperationRequest::new(Source::Remote("https://example.com/v".into()), "t", "/tmp")
    }

    fn expressions(steps: &[CascadeStep]) -> Vec<String> {
        steps
            .iter()
            .map(|s| match s {
                CascadeStep::Fetch(sel) => sel.expression.clone(),
                CascadeStep::Negotiate => "?".to_string(),
            })
            .collect()
    }

    #[test]
    fn precise_merges_video_and_audio() {
        let mut req = request();
        req.video_format = Some(format("137", FormatKind::VideoOnly, "mp4", Some(1080)));
        let mut audio = format("140", FormatKind::AudioOnly, "m4a", None);
        audio.language = Some("en".into());
        req.audio_format = Some(audio);

        let steps = SelectorPlanner::build_cascade(&req);
        assert_eq!(
            expressions(&steps),
            vec![
                "137+140",
                "bestvideo[height=1080]+bestaudio[language=en]",
                "?",
                FINAL_VIDEO_AUDIO
            ]
        );
        assert_eq!(SelectorPlanner::expected_extension(&req), "mp4");
    }

    #[test]
    fn combined_format_uses_its_single_id() {
        let mut req = request();
        req.video_format = Some(format("18", FormatKind::Combined, "mp4", Some(360)));
        assert_eq!(SelectorPlanner::precise(&req).as_deref(), Some("18"));
        assert_eq!(SelectorPlanner::strict_flexible(&req), "best[height=360]");
    }

    #[test]
    fn no_selection_starts_flexible() {
        let steps = SelectorPlanner::build_cascade(&request());
        assert_eq!(expressions(&steps), vec!["bestvideo+bestaudio", "?", FINAL_VIDEO_AUDIO]);

        let mut audio_only = request();
        audio_only.mode = Mode::AudioOnly;
        let steps = SelectorPlanner::build_cascade(&audio_only);
        assert_eq!(expressions(&steps), vec!["bestaudio", "?", FINAL_AUDIO_ONLY]);
    }

    #[test]
    fn audio_extraction_short_circuits() {
        let mut req = request();
        req.mode = Mode::AudioOnly;
        req.video_format = Some(format("22", FormatKind::Combined, "mp4", Some(720)));
        let steps = SelectorPlanner::build_cascade(&req);
        assert_eq!(expressions(&steps), vec!["22", "best"]);
        assert!(!steps.contains(&CascadeStep::Negotiate));
    }

    #[test]
    fn tiers_never_tighten() {
        let mut req = request();
        req.video_format = Some(format("137", FormatKind::VideoOnly, "mp4", Some(1080)));
        req.audio_format = Some(format("140", FormatKind::AudioOnly, "m4a", None));
        let tiers: Vec<CascadeTier> = SelectorPlanner::build_cascade(&req)
            .iter()
            .filter_map(|s| match s {
                CascadeStep::Fetch(sel) => Some(sel.tier),
                CascadeStep::Negotiate => None,
            })
            .collect();
        assert!(tiers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(tiers.last(), Some(&CascadeTier::Final));
    }

    #[test]
    fn merge_container_inference() {
        assert_eq!(merge_extension("mp4", "m4a"), "mp4");
        assert_eq!(merge_extension("webm", "webm"), "webm");
        assert_eq!(merge_extension("webm", "m4a"), "mkv");
    }

    #[test]
    fn describes_best_alternative() {
        let mut audio = format("251", FormatKind::AudioOnly, "webm", None);
        audio.codec = "opus".into();
        audio.bitrate_kbps = Some(160.0);
        let formats = vec![
            format("18", FormatKind::Combined, "mp4", Some(360)),
            format("136", FormatKind::VideoOnly, "mp4", Some(720)),
            audio,
        ];
        let text = SelectorPlanner::describe_best_alternative(&formats, Mode::VideoAudio).unwrap();
        assert!(text.starts_with("1280x720 mp4"));
        assert!(text.contains("webm (opus)"));
        assert!(SelectorPlanner::describe_best_alternative(&[], Mode::VideoAudio).is_none());
    }
}
