// Unit tests for domain models

use super::*;

fn descriptor(id: &str, kind: FormatKind, codec: &str, ext: &str) -> FormatDescriptor {
    FormatDescriptor {
        id: id.to_string(),
        kind,
        codec: codec.to_string(),
        audio_codec: None,
        extension: ext.to_string(),
        resolution: None,
        language: None,
        bitrate_kbps: None,
        stream_index: None,
    }
}

#[test]
fn test_time_spec_parsing() {
    assert_eq!(TimeSpec::parse("90.5").unwrap().as_seconds(), 90.5);
    assert_eq!(TimeSpec::parse("01:30").unwrap().as_seconds(), 90.0);
    assert_eq!(TimeSpec::parse("00:01:30").unwrap().as_seconds(), 90.0);
    assert_eq!(TimeSpec::parse("1:02:03.5").unwrap().as_seconds(), 3723.5);
}

#[test]
fn test_time_spec_rejects_garbage() {
    assert!(TimeSpec::parse("-3").is_err());
    assert!(TimeSpec::parse("00:61:00").is_err());
    assert!(TimeSpec::parse("00:00:75").is_err());
    assert!(TimeSpec::parse("abc").is_err());
    assert!(TimeSpec::parse("1:2:3:4").is_err());
}

#[test]
fn test_time_spec_formatting() {
    let t = TimeSpec::from_components(1, 2, 3, 450);
    assert_eq!(t.format_hms(), "01:02:03.450");
    assert_eq!(TimeSpec::from_seconds(90.0).format_for_filename(), "00-01-30");
    assert_eq!(TimeSpec::from_seconds(1.25).format_for_filename(), "00-00-01.250");
}

#[test]
fn test_source_is_exclusive() {
    assert!(Source::from_parts(Some("https://x".into()), Some("a.mp4".into())).is_err());
    assert!(Source::from_parts(None, None).is_err());
    assert!(Source::from_parts(Some("https://x".into()), None).unwrap().is_remote());
}

#[test]
fn test_fragment_order_validated() {
    let mut request = OperationRequest::new(Source::Remote("https://x".into()), "t", "/tmp");
    request.fragment = Some(FragmentRange::new(
        Some(TimeSpec::from_seconds(30.0)),
        Some(TimeSpec::from_seconds(10.0)),
    ));
    assert!(matches!(
        request.validate(),
        Err(OperationError::InvalidFragment(_))
    ));
}

#[test]
fn test_audio_extraction_from_combined_source() {
    let mut request = OperationRequest::new(Source::Remote("https://x".into()), "t", "/tmp");
    request.mode = Mode::AudioOnly;
    let mut combined = descriptor("18", FormatKind::Combined, "avc1.42001E", "mp4");
    combined.audio_codec = Some("mp4a.40.2".to_string());
    request.video_format = Some(combined);

    assert!(request.validate().is_ok());
    assert!(request.needs_audio_extraction());
    assert!(request.wants_transcode());
    assert_eq!(request.video_choice(), VideoChoice::Drop);
    assert_eq!(request.original_audio_codec(), Some("mp4a.40.2"));
    assert_eq!(request.target_container(), Container::M4a);
}

#[test]
fn test_audio_only_rejects_video_only_format() {
    let mut request = OperationRequest::new(Source::Remote("https://x".into()), "t", "/tmp");
    request.mode = Mode::AudioOnly;
    request.video_format = Some(descriptor("137", FormatKind::VideoOnly, "avc1", "mp4"));
    assert!(request.validate().is_err());
}

#[test]
fn test_gif_never_carries_audio() {
    let mut request = OperationRequest::new(Source::Local("in.mp4".into()), "t", "/tmp");
    request.recode.video_enabled = true;
    request.recode.video_codec = VideoCodec::Gif;
    request.recode.container = Container::Gif;
    request.recode.audio_enabled = true;
    assert_eq!(request.audio_choice(), AudioChoice::Drop);
}

#[test]
fn test_codec_names_parse_at_boundary() {
    assert_eq!(VideoCodec::from_name("avc1.64001F"), Some(VideoCodec::H264));
    assert_eq!(VideoCodec::from_name("vp09.00.40.08"), Some(VideoCodec::Vp9));
    assert_eq!(VideoCodec::from_name("mpeg2video"), None);
    assert_eq!(AudioCodec::from_name("pcm_s24le"), Some(AudioCodec::Pcm));
    assert_eq!(AudioCodec::from_name("mp4a.40.2"), Some(AudioCodec::Aac));
    assert_eq!("webm".parse::<Container>().unwrap(), Container::Webm);
    assert_eq!(
        "12.5mbps".parse::<VideoProfile>().unwrap(),
        VideoProfile::CustomBitrate { mbps: 12.5 }
    );
    assert_eq!("720p".parse::<ResolutionPreset>().unwrap(), ResolutionPreset::P720);
}
