/*!
 * SAMI (.smi): HTML-like `<SYNC Start=ms>` blocks.
 *
 * A cue runs until the next SYNC. Build emits an `&nbsp;` SYNC at every
 * cue's end so end times survive a round trip.
 *
 * `&nbsp;` alone marks a blank SYNC that only closes the open cue. An
 * empty-content cue is written as `&#160;` alone and parses back to an
 * empty segment, so untranslated placeholders keep their slot.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CodecOptions, FormatHandler, Segment, SubtitleFormat, Timeline};
use crate::errors::SubtitleError;

/// Duration given to the final cue when no SYNC follows it
pub const LAST_CUE_DURATION_MS: u64 = 2000;

/// Body of a cue whose content is empty
const EMPTY_CUE: &str = "&#160;";

static DETECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<SAMI[^>]*>[\s\S]*<BODY[^>]*>").expect("smi detect regex is valid"));

static BEFORE_BODY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s\S]*?<BODY[^>]*>").expect("smi body regex is valid"));

static AFTER_BODY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</BODY[^>]*>[\s\S]*$").expect("smi body end regex is valid"));

static SYNC_SPLIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<SYNC").expect("smi sync regex is valid"));

static SYNC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^[^>]*?Start\s*=\s*["']?(\d+)["']?[^>]*>([\s\S]*)$"#)
        .expect("smi start regex is valid")
});

static PARAGRAPH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*<P[^>]*>([\s\S]*)$").expect("smi paragraph regex is valid"));

static NEXT_PARAGRAPH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<P[\s>][\s\S]*$").expect("smi next paragraph regex is valid"));

static CLOSE_SYNC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*</SYNC[^>]*>").expect("smi close regex is valid"));

static BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<BR\s*/?>[ \t]*\n?").expect("smi break regex is valid"));

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("smi tag regex is valid"));

/// SAMI handler
pub struct SmiFormat;

fn html_encode(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace("\r\n", "<BR>")
        .replace('\n', "<BR>")
}

fn html_decode(html: &str) -> String {
    html.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extract cue text from the body of a SYNC element, `None` when blank
fn cue_text(body: &str) -> Option<String> {
    let body = CLOSE_SYNC_REGEX.replace(body, "");
    let html = match PARAGRAPH_REGEX.captures(&body) {
        Some(caps) => NEXT_PARAGRAPH_REGEX.replace(&caps[1], "").into_owned(),
        None => body.into_owned(),
    };
    let html = BREAK_REGEX.replace_all(&html, "\n");
    let html = TAG_REGEX.replace_all(&html, "");
    let html = html.trim();

    if html == EMPTY_CUE {
        return Some(String::new());
    }
    if html.replace("&nbsp;", " ").trim().is_empty() {
        return None;
    }
    Some(
        html_decode(html)
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

impl FormatHandler for SmiFormat {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Smi
    }

    fn detect(&self, content: &str) -> bool {
        DETECT_REGEX.is_match(content)
    }

    fn parse(&self, content: &str, _options: &CodecOptions) -> Result<Timeline, SubtitleError> {
        let normalized = content.replace("\r\n", "\n");
        let body = BEFORE_BODY_REGEX.replace(&normalized, "");
        let body = AFTER_BODY_REGEX.replace(&body, "");

        let mut segments: Timeline = Vec::new();
        let mut open: Option<usize> = None;

        for part in SYNC_SPLIT_REGEX.split(&body).skip(1) {
            let Some(caps) = SYNC_REGEX.captures(part) else {
                continue;
            };
            let start_ms: u64 = caps[1]
                .parse()
                .map_err(|_| SubtitleError::InvalidTimestamp(caps[1].to_string()))?;

            if let Some(index) = open.take() {
                segments[index].end_ms = start_ms;
            }

            if let Some(text) = cue_text(&caps[2]) {
                open = Some(segments.len());
                segments.push(Segment {
                    id: segments.len().to_string(),
                    start_ms,
                    end_ms: start_ms + LAST_CUE_DURATION_MS,
                    content: text,
                });
            }
        }

        Ok(segments)
    }

    fn build(&self, segments: &[Segment], _options: &CodecOptions) -> String {
        let mut output = String::new();
        output.push_str("<SAMI>\n<HEAD>\n<TITLE></TITLE>\n");
        output.push_str("<STYLE TYPE=\"text/css\">\n<!--\n");
        output.push_str("P { font-family: Arial; font-weight: normal; color: white; background-color: black; text-align: center; }\n");
        output.push_str(".LANG { Name: English; lang: en-US; SAMIType: CC; }\n");
        output.push_str("-->\n</STYLE>\n</HEAD>\n<BODY>\n");

        for segment in segments {
            let body = if segment.content.trim().is_empty() {
                EMPTY_CUE.to_string()
            } else {
                html_encode(&segment.content)
            };
            output.push_str(&format!(
                "<SYNC Start={}>\n  <P Class=LANG>{}\n",
                segment.start_ms, body
            ));
            output.push_str(&format!(
                "<SYNC Start={}>\n  <P Class=LANG>&nbsp;\n",
                segment.end_ms
            ));
        }

        output.push_str("</BODY>\n</SAMI>\n");
        output
    }
}
