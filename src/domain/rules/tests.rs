// Unit tests for compatibility rules

use super::*;

#[test]
fn test_vp9_copy_into_mp4_warns() {
    let report = CompatibilityValidator::validate(
        Container::Mp4,
        VideoChoice::Copy,
        AudioChoice::Copy,
        Some("vp9"),
        Some("aac"),
    );
    assert_eq!(report.status, CompatibilityStatus::Warning);
    assert!(report.permits());
    assert!(report.message.contains("vp9"));
}

#[test]
fn test_prores_encode_into_mp4_is_error() {
    let report = CompatibilityValidator::validate(
        Container::Mp4,
        VideoChoice::Encode(VideoCodec::ProRes),
        AudioChoice::Encode(AudioCodec::Pcm),
        Some("h264"),
        Some("aac"),
    );
    assert_eq!(report.status, CompatibilityStatus::Error);
    assert!(!report.permits());
}

#[test]
fn test_prores_in_mov_rejects_compressed_audio_copy() {
    let report = CompatibilityValidator::validate(
        Container::Mov,
        VideoChoice::Encode(VideoCodec::ProRes),
        AudioChoice::Copy,
        Some("h264"),
        Some("aac"),
    );
    assert_eq!(report.status, CompatibilityStatus::Error);
    assert!(report.message.contains("uncompressed"));
}

#[test]
fn test_prores_in_mov_accepts_pcm_copy() {
    let report = CompatibilityValidator::validate(
        Container::Mov,
        VideoChoice::Encode(VideoCodec::ProRes),
        AudioChoice::Copy,
        Some("h264"),
        Some("pcm_s24le"),
    );
    assert_eq!(report.status, CompatibilityStatus::Valid);
}

#[test]
fn test_copying_video_into_audio_container_is_error() {
    let report = CompatibilityValidator::validate(
        Container::Mp3,
        VideoChoice::Copy,
        AudioChoice::Encode(AudioCodec::Mp3),
        Some("h264"),
        Some("aac"),
    );
    assert_eq!(report.status, CompatibilityStatus::Error);
}

#[test]
fn test_audio_encode_outside_allowed_set_is_error() {
    let report = CompatibilityValidator::validate(
        Container::Webm,
        VideoChoice::Copy,
        AudioChoice::Encode(AudioCodec::Aac),
        Some("vp9"),
        Some("opus"),
    );
    assert_eq!(report.status, CompatibilityStatus::Error);
}

#[test]
fn test_audio_copy_outside_allowed_set_warns() {
    let report = CompatibilityValidator::validate(
        Container::Mp4,
        VideoChoice::Encode(VideoCodec::H264),
        AudioChoice::Copy,
        Some("vp9"),
        Some("opus"),
    );
    assert_eq!(report.status, CompatibilityStatus::Warning);
    assert!(report.message.contains("opus"));
}

#[test]
fn test_audio_extraction_skips_video_rules() {
    let report = CompatibilityValidator::validate(
        Container::M4a,
        VideoChoice::Drop,
        AudioChoice::Copy,
        Some("avc1.42001E"),
        Some("mp4a.40.2"),
    );
    assert_eq!(report.status, CompatibilityStatus::Valid);
}

#[test]
fn test_validation_is_deterministic() {
    for container in Container::ALL {
        let first = CompatibilityValidator::validate(
            container,
            VideoChoice::Copy,
            AudioChoice::Copy,
            Some("hevc"),
            Some("flac"),
        );
        let second = CompatibilityValidator::validate(
            container,
            VideoChoice::Copy,
            AudioChoice::Copy,
            Some("hevc"),
            Some("flac"),
        );
        assert_eq!(first, second);
    }
}

#[test]
fn test_every_container_has_a_rule() {
    for container in Container::ALL {
        assert!(COMPATIBILITY_RULES.iter().any(|r| r.container == container));
    }
}
