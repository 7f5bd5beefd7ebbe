//! Fragment (time range) planning

use std::path::PathBuf;

use tracing::debug;

use crate::domain::errors::OperationError;
use crate::domain::model::{Container, FragmentRange, TranscodePlan};

/// Resolved seek/duration pair for a clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentPlan {
    /// Seek offset in seconds
    pub start: f64,
    /// Length of the clip in seconds
    pub duration: f64,
}

impl FragmentPlan {
    /// duration = (end or total) - (start or 0), with end clamped to the media; must be positive
    pub fn compute(range: &FragmentRange, total_duration: Option<f64>) -> Result<Self, OperationError> {
        let start = range.start.map(|t| t.as_seconds()).unwrap_or(0.0);
        let end = match (range.end, total_duration) {
            (Some(end), Some(total)) => end.as_seconds().min(total),
            (Some(end), None) => end.as_seconds(),
            (None, total) => total.ok_or_else(|| {
                OperationError::InvalidFragment(
                    "no end time given and the source duration is unknown".to_string(),
                )
            })?,
        };

        let duration = end - start;
        if duration <= 0.0 || !duration.is_finite() {
            return Err(OperationError::InvalidFragment(format!(
                "range {:.3}s - {:.3}s is empty",
                start, end
            )));
        }

        debug!(start, duration, "Fragment resolved");
        Ok(Self { start, duration })
    }

    /// Seek placed before the input
    pub fn pre_input(&self) -> Vec<String> {
        if self.start > 0.0 {
            vec!["-ss".to_string(), format_seconds(self.start)]
        } else {
            Vec::new()
        }
    }

    /// Duration limit placed after the input; copied timestamps restart at zero
    pub fn post_input(&self) -> Vec<String> {
        vec![
            "-t".to_string(),
            format_seconds(self.duration),
            "-avoid_negative_ts".to_string(),
            "make_zero".to_string(),
        ]
    }

    /// Stream-copy plan extracting this fragment
    pub fn to_transcode_plan(&self, input: PathBuf, output: PathBuf, container: Container) -> TranscodePlan {
        let mut plan = TranscodePlan::stream_copy(input, output, container);
        plan.pre_input = self.pre_input();
        plan.post_input = self.post_input();
        plan.duration_estimate = Some(self.duration);
        plan
    }
}

fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TimeSpec;

    fn range(start: Option<f64>, end: Option<f64>) -> FragmentRange {
        FragmentRange::new(start.map(TimeSpec::from_seconds), end.map(TimeSpec::from_seconds))
    }

    #[test]
    fn duration_is_end_minus_start() {
        let plan = FragmentPlan::compute(&range(Some(60.0), Some(90.0)), Some(300.0)).unwrap();
        assert_eq!(plan.start, 60.0);
        assert_eq!(plan.duration, 30.0);
        assert_eq!(plan.pre_input(), vec!["-ss", "60.000"]);
        assert_eq!(plan.post_input(), vec!["-t", "30.000", "-avoid_negative_ts", "make_zero"]);
    }

    #[test]
    fn end_past_the_media_is_clamped() {
        let plan = FragmentPlan::compute(&range(Some(60.0), Some(400.0)), Some(300.0)).unwrap();
        assert_eq!(plan.duration, 240.0);
        assert!(matches!(
            FragmentPlan::compute(&range(Some(300.0), Some(400.0)), Some(300.0)),
            Err(OperationError::InvalidFragment(_))
        ));
    }

    #[test]
    fn open_end_uses_total_duration() {
        let plan = FragmentPlan::compute(&range(Some(100.0), None), Some(300.0)).unwrap();
        assert_eq!(plan.duration, 200.0);
    }

    #[test]
    fn open_start_has_no_seek() {
        let plan = FragmentPlan::compute(&range(None, Some(45.5)), None).unwrap();
        assert!(plan.pre_input().is_empty());
        assert_eq!(&plan.post_input()[..2], ["-t", "45.500"]);
    }

    #[test]
    fn empty_ranges_are_rejected() {
        assert!(matches!(
            FragmentPlan::compute(&range(Some(90.0), Some(90.0)), Some(300.0)),
            Err(OperationError::InvalidFragment(_))
        ));
        assert!(matches!(
            FragmentPlan::compute(&range(Some(400.0), None), Some(300.0)),
            Err(OperationError::InvalidFragment(_))
        ));
        assert!(matches!(
            FragmentPlan::compute(&range(Some(10.0), None), None),
            Err(OperationError::InvalidFragment(_))
        ));
    }

    #[test]
    fn plan_is_a_stream_copy() {
        let plan = FragmentPlan::compute(&range(Some(60.0), Some(90.0)), Some(300.0))
            .unwrap()
            .to_transcode_plan("in.mp4".into(), "out.mp4".into(), Container::Mp4);
        assert!(plan.is_stream_copy());
        assert_eq!(plan.duration_estimate, Some(30.0));

        let args = plan.to_args();
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert!(ss < input && input < t);
    }
}
