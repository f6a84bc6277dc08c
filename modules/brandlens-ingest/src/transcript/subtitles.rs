//! SRT/VTT subtitle parsing into timed segments.
//!
//! Both formats share the same cue structure: an optional numeric index,
//! a `start --> end` timestamp line, then one or more text lines. The
//! parser is permissive and keyed on timestamp lines, so WEBVTT headers
//! and cue indexes fall out naturally.

use brandlens_common::TranscriptSegment;
use regex::Regex;

/// Parse SRT or VTT text into ordered segments.
///
/// Caption fragments under one timestamp are merged into a single segment;
/// inline markup tags (`<c>`, `<00:00:01.000>`, `<b>`) are stripped; cues
/// with no remaining text are dropped.
pub fn parse_subtitles(raw: &str) -> Vec<TranscriptSegment> {
    let timestamp_re = Regex::new(
        r"(\d{2}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2}[,.]\d{3})",
    )
    .expect("valid regex");
    let markup_re = Regex::new(r"<[^>]+>").expect("valid regex");

    let mut segments: Vec<TranscriptSegment> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        if let Some(caps) = timestamp_re.captures(line) {
            let start = parse_timestamp(&caps[1]);
            let end = parse_timestamp(&caps[2]);
            segments.push(TranscriptSegment::new(start, end, ""));
        } else if let Some(current) = segments.last_mut() {
            let clean = markup_re.replace_all(line, "");
            let clean = clean.trim();
            if !clean.is_empty() {
                if !current.text.is_empty() {
                    current.text.push(' ');
                }
                current.text.push_str(clean);
            }
        }
    }

    segments.retain(|s| !s.text.trim().is_empty());
    segments
}

/// `HH:MM:SS,mmm` or `HH:MM:SS.mmm` to seconds.
fn parse_timestamp(raw: &str) -> f64 {
    let normalized = raw.replace(',', ".");
    let mut seconds = 0.0;
    for part in normalized.split(':') {
        seconds = seconds * 60.0 + part.parse::<f64>().unwrap_or(0.0);
    }
    seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_srt_cues() {
        let srt = "\
1
00:00:00,000 --> 00:00:02,500
Hi everyone

2
00:00:02,500 --> 00:00:05,000
I love Maybelline Fit Me
";
        let segments = parse_subtitles(srt);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].end, 2.5);
        assert_eq!(segments[0].text, "Hi everyone");
        assert_eq!(segments[1].text, "I love Maybelline Fit Me");
    }

    #[test]
    fn parses_vtt_and_strips_markup() {
        let vtt = "\
WEBVTT

00:00:01.000 --> 00:00:03.000
<c.colorCCCCCC>today</c> we try <b>foundation</b>
";
        let segments = parse_subtitles(vtt);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "today we try foundation");
    }

    #[test]
    fn merges_multi_line_cues() {
        let srt = "\
1
00:00:00,000 --> 00:00:04,000
first line
second line
";
        let segments = parse_subtitles(srt);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "first line second line");
    }

    #[test]
    fn drops_empty_cues() {
        let srt = "\
1
00:00:00,000 --> 00:00:02,000
<c></c>

2
00:00:02,000 --> 00:00:04,000
real text
";
        let segments = parse_subtitles(srt);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "real text");
    }

    #[test]
    fn hour_offsets_convert_to_seconds() {
        let srt = "\
1
01:02:03,500 --> 01:02:04,000
late cue
";
        let segments = parse_subtitles(srt);
        assert_eq!(segments[0].start, 3723.5);
    }
}
