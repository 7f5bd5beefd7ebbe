// Output naming for the paths an operation creates

use std::path::{Path, PathBuf};

use crate::domain::model::{Container, OperationRequest};
use crate::planner::selector::SelectorPlanner;
use crate::utils::path::PathUtils;

/// `<dir>/<title>.<ext>` for a remote fetch
pub fn download_target(request: &OperationRequest) -> PathBuf {
    request.output_dir.join(format!(
        "{}.{}",
        PathUtils::sanitize_file_name(&request.title),
        SelectorPlanner::expected_extension(request)
    ))
}

/// Base name for files derived from `working`
///
/// A local source contributes the request title; fetched and clipped
/// files keep the name they were given in the output directory.
pub fn derived_stem(request: &OperationRequest, working: &Path) -> String {
    if request.source.local_path() == Some(working) {
        PathUtils::sanitize_file_name(&request.title)
    } else {
        PathUtils::stem(working)
    }
}

/// `<dir>/<stem>.<container>`, or `<stem> (recoded).<ext>` when that would be the input itself
pub fn transcode_target(request: &OperationRequest, working: &Path, container: Container) -> PathBuf {
    let stem = derived_stem(request, working);
    let candidate = request
        .output_dir
        .join(format!("{}.{}", stem, container.extension()));
    if candidate == working {
        request
            .output_dir
            .join(format!("{} (recoded).{}", stem, container.extension()))
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Source;

    #[test]
    fn download_target_uses_sanitized_title() {
        let request = OperationRequest::new(
            Source::Remote("https://example.com/v".into()),
            "A/B: live?",
            "/out",
        );
        assert_eq!(download_target(&request), Path::new("/out/A_B_ live_.mp4"));
    }

    #[test]
    fn transcode_target_never_equals_input() {
        let request = OperationRequest::new(Source::Remote("https://example.com/v".into()), "a", "/d");
        assert_eq!(
            transcode_target(&request, Path::new("/d/a.webm"), Container::Mp4),
            Path::new("/d/a.mp4")
        );
        assert_eq!(
            transcode_target(&request, Path::new("/d/a.mp4"), Container::Mp4),
            Path::new("/d/a (recoded).mp4")
        );
    }

    #[test]
    fn local_sources_derive_into_the_output_dir() {
        let source = Path::new("/home/me/videos/holiday.mkv");
        let request = OperationRequest::new(Source::Local(source.to_path_buf()), "Holiday: day 1", "/out");
        assert_eq!(derived_stem(&request, source), "Holiday_ day 1");
        assert_eq!(
            transcode_target(&request, source, Container::Mp4),
            Path::new("/out/Holiday_ day 1.mp4")
        );

        let beside = OperationRequest::new(Source::Local(PathBuf::from("/d/clip.mp4")), "clip", "/d");
        assert_eq!(
            transcode_target(&beside, Path::new("/d/clip.mp4"), Container::Mp4),
            Path::new("/d/clip (recoded).mp4")
        );
    }
}
