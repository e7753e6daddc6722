//! SRT subtitle generation: a pure side artifact of the translated segments,
//! not a pipeline stage.

use crate::pipeline::job::Segment;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Write the translated segments as a standard SRT file: sequential index
/// from 1, `HH:MM:SS,mmm` timestamps, target-language text (falling back to
/// the source text for units that never reached translation).
pub fn write_srt(segments: &[Segment], output: &Path) -> Result<PathBuf> {
    let mut body = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let text = segment.text_fr.as_deref().unwrap_or(&segment.text);
        let _ = writeln!(body, "{}", i + 1);
        let _ = writeln!(
            body,
            "{} --> {}",
            format_timestamp(segment.start),
            format_timestamp(segment.end)
        );
        let _ = writeln!(body, "{}", text.trim());
        body.push('\n');
    }

    std::fs::write(output, body)
        .with_context(|| format!("Failed to write subtitle file: {:?}", output))?;
    Ok(output.to_path_buf())
}

fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str, text_fr: Option<&str>) -> Segment {
        let mut s = Segment::new(start, end, text);
        s.text_fr = text_fr.map(String::from);
        s
    }

    #[test]
    fn timestamps_are_srt_formatted() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(1.5), "00:00:01,500");
        assert_eq!(format_timestamp(3661.25), "01:01:01,250");
    }

    #[test]
    fn writes_sequential_indices_and_translated_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");

        let segments = vec![
            seg(0.0, 2.0, "hello", Some("bonjour")),
            seg(2.0, 4.5, "world", Some("[Erreur de traduction]")),
        ];
        write_srt(&segments, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let expected = "1\n00:00:00,000 --> 00:00:02,000\nbonjour\n\n\
                        2\n00:00:02,000 --> 00:00:04,500\n[Erreur de traduction]\n\n";
        assert_eq!(content, expected);
    }

    #[test]
    fn untranslated_unit_falls_back_to_source_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");

        write_srt(&[seg(0.0, 1.0, "hello", None)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("hello"));
    }
}
