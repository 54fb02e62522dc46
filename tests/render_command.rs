use std::cell::RefCell;
use std::fs;
use std::path::Path;

use ffcompose::core::caption::{
    segment_captions, write_ass, CaptionStyle, SegmentLimits, WordTiming,
};
use ffcompose::core::config::{RenderJob, ToolPaths};
use ffcompose::core::media::{AudioInfo, VideoInfo};
use ffcompose::core::model::Dimensions;
use ffcompose::core::{
    ComposeError, ComposeResult, Executor, FfmpegCommand, MediaInspector, MergeBuilder,
    VideoBuilder,
};

/// Every file lasts `seconds`; anything named `silent.*` has no duration.
struct FakeInspector {
    seconds: f64,
}

impl MediaInspector for FakeInspector {
    fn audio_info(&self, path: &Path) -> ComposeResult<AudioInfo> {
        let silent = path.file_stem().is_some_and(|stem| stem == "silent");
        Ok(AudioInfo {
            duration: (!silent).then_some(self.seconds),
            channels: Some(2),
        })
    }

    fn video_info(&self, _path: &Path) -> ComposeResult<VideoInfo> {
        Ok(VideoInfo {
            duration: Some(self.seconds),
            width: Some(1080),
            height: Some(1920),
        })
    }
}

#[derive(Default)]
struct CapturingExecutor {
    runs: RefCell<Vec<(Vec<String>, String, Option<f64>)>>,
}

impl Executor for CapturingExecutor {
    fn run(
        &self,
        command: &FfmpegCommand,
        label: &str,
        expected_duration: Option<f64>,
        _show_progress: bool,
    ) -> bool {
        self.runs
            .borrow_mut()
            .push((command.tokens(), label.to_string(), expected_duration));
        true
    }
}

fn inspector(seconds: f64) -> FakeInspector {
    FakeInspector { seconds }
}

#[test]
fn image_render_matches_expected_command_line() {
    let builder = VideoBuilder::new(1080, 1920)
        .unwrap()
        .background_image("bg.jpg", None)
        .audio("voice.mp3")
        .output_path("final cut.mp4")
        .media_inspector(inspector(10.0));

    let command = builder.build_command().unwrap();
    assert_eq!(
        command.tokens(),
        vec![
            "ffmpeg",
            "-y",
            "-loop",
            "1",
            "-t",
            "10.0",
            "-i",
            "bg.jpg",
            "-i",
            "voice.mp3",
            "-filter_complex",
            concat!(
                "[0]scale=1080:-2,setsar=1:1,crop=1080:1920,",
                "zoompan=z='zoom+0.001':x=0:y=0:d=251:s=1080x1920:fps=25[bg];[bg]copy[v]"
            ),
            "-map",
            "[v]",
            "-map",
            "1:a",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-crf",
            "23",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
            "-t",
            "10.0",
            "final cut.mp4",
        ]
    );
    // Printed form is shell-safe.
    assert!(command.to_string().ends_with(" 'final cut.mp4'"));
}

#[test]
fn video_with_captions_has_no_audio_flags() {
    let command = VideoBuilder::new(1280, 720)
        .unwrap()
        .background_video("clip.mp4")
        .captions(Some("subs.srt".into()), None)
        .build_command()
        .unwrap();
    let tokens = command.tokens();
    assert!(!tokens.iter().any(|token| token == "-c:a" || token == "-stream_loop"));
    assert_eq!(
        command.flag_value("-filter_complex"),
        Some("[0]scale=1280:720[bg];[bg]subtitles=subs.srt[v]")
    );
    assert_eq!(command.flag_value("-map"), Some("[v]"));
}

#[test]
fn job_file_renders_through_executor() {
    let dir = tempfile::tempdir().unwrap();
    let job_path = dir.path().join("job.json");
    fs::write(
        &job_path,
        r#"{
            "dimensions": [720, 1280],
            "background": {"type": "video", "file": "clip.mp4"},
            "audio": "voice.mp3",
            "captions": {"file": "subs.ass", "force_style": "FontSize=30"},
            "output": "story.mp4"
        }"#,
    )
    .unwrap();

    let builder = RenderJob::load(&job_path)
        .unwrap()
        .into_builder(&ToolPaths::default())
        .unwrap()
        .media_inspector(inspector(6.5));
    let executor = CapturingExecutor::default();
    assert!(builder.execute(&executor));

    let runs = executor.runs.borrow();
    assert_eq!(runs.len(), 1);
    let (command, label, expected) = &runs[0];
    assert_eq!(label, "build video");
    assert_eq!(*expected, Some(6.5));
    assert_eq!(
        command[..10],
        ["ffmpeg", "-y", "-stream_loop", "-1", "-t", "6.5", "-i", "clip.mp4", "-i", "voice.mp3"]
    );
    assert!(command.iter().any(|token| token.contains("[bg]subtitles=subs.ass:force_style=")));
    assert_eq!(
        command[command.len() - 7..],
        ["-c:a", "aac", "-b:a", "192k", "-t", "6.5", "story.mp4"]
    );
}

#[test]
fn unusable_audio_duration_produces_no_command() {
    let builder = VideoBuilder::new(1080, 1920)
        .unwrap()
        .background_image("bg.jpg", None)
        .audio("silent.mp3")
        .media_inspector(inspector(4.0));
    assert!(matches!(
        builder.build_command(),
        Err(ComposeError::DurationUnavailable { .. })
    ));

    let executor = CapturingExecutor::default();
    assert!(!builder.execute(&executor));
    assert!(executor.runs.borrow().is_empty());
}

#[test]
fn merge_uses_first_clip_size() {
    let merge = MergeBuilder::new(inspector(3.0))
        .videos(["intro.mp4", "story.mp4", "outro.mp4"])
        .output_path("all.mp4");
    let command = merge.build_command().unwrap();
    let graph = command.flag_value("-filter_complex").unwrap();
    assert_eq!(graph.matches("scale=1080:1920:force_original_aspect_ratio=decrease").count(), 3);
    assert!(graph.ends_with("concat=n=3:v=1:a=1[v][a]"));

    let executor = CapturingExecutor::default();
    assert!(merge.execute(&executor));
    let runs = executor.runs.borrow();
    assert_eq!(runs[0].1, "merge videos");
    assert_eq!(runs[0].2, Some(9.0));
}

#[test]
fn captions_from_word_timings() {
    let words: Vec<WordTiming> = serde_json::from_str(
        r#"[
            {"text": "Once", "start_ts": 0.0, "end_ts": 0.3},
            {"text": "upon", "start_ts": 0.3, "end_ts": 0.6},
            {"text": "a", "start_ts": 0.6, "end_ts": 0.7},
            {"text": "time", "start_ts": 0.7, "end_ts": 1.1},
            {"text": ".", "start_ts": 1.1, "end_ts": 1.1}
        ]"#,
    )
    .unwrap();
    let limits = SegmentLimits {
        max_length: 10,
        lines: 1,
    };
    let segments = segment_captions(&words, limits);
    assert_eq!(segments.len(), 2);
    // The length check ignores the joining space, so "a" still fits on the first line.
    assert_eq!(segments[0].lines, vec!["Once upon a"]);
    assert_eq!(segments[1].lines, vec!["time."]);
    assert!((segments[0].end_ts - 0.7).abs() < 1e-9);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subs.ass");
    let size = Dimensions::new(1080, 1920).unwrap();
    write_ass(&path, &segments, size, &CaptionStyle::default()).unwrap();
    let script = fs::read_to_string(&path).unwrap();
    assert_eq!(script.matches("Dialogue:").count(), 2);
    assert!(script.contains("{\\pos(540,768)}time."));
}
