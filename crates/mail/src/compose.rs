//! Composition helpers: editor seeds and reply quoting

use regex::Regex;

use crate::models::Message;

/// Quoted lines are wrapped at this many bytes
pub const QUOTE_WIDTH: usize = 80;

/// Characters trimmed from the ends of quoted lines
const TRIM_CHARS: &[char] = &[' ', '\t', '\r'];

/// Header line that tells the client what to do with editor output
pub const MODE_HEADER: &str = "Mode:";

/// Seed text for a new message
pub fn compose_seed(signature: &str) -> String {
    format!("To: \nSubject: \n{} Send\n\n{}", MODE_HEADER, signature)
}

/// Subject for a reply: unchanged if it already looks like one
pub fn reply_subject(subject: &str, already_reply: &Regex, prefix: &str) -> String {
    if already_reply.is_match(subject) {
        subject.to_string()
    } else {
        format!("{}{}", prefix, subject)
    }
}

/// Quote a body for a reply.
///
/// Each line is trimmed on the right and prefixed with `> `. Lines longer
/// than [`QUOTE_WIDTH`] are split; empty lines become a bare `>`.
pub fn quote_body(body: &str) -> String {
    let mut out = String::new();
    for line in body.split('\n') {
        let mut line = line.trim_end_matches(TRIM_CHARS);
        while line.len() > QUOTE_WIDTH {
            let cut = floor_char_boundary(line, QUOTE_WIDTH);
            if cut == 0 {
                break;
            }
            out.push_str("> ");
            out.push_str(line[..cut].trim_end_matches(TRIM_CHARS));
            out.push('\n');
            line = line[cut..].trim_start_matches(TRIM_CHARS);
        }
        if line.is_empty() {
            out.push_str(">\n");
        } else {
            out.push_str("> ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Seed text for replying to `original`
pub fn reply_seed(original: &Message, already_reply: &Regex, prefix: &str, signature: &str) -> String {
    let mut seed = String::new();
    seed.push_str(&format!("To: {}\n", original.header("From").unwrap_or_default()));
    seed.push_str(&format!(
        "Subject: {}\n",
        reply_subject(original.subject(), already_reply, prefix)
    ));

    if let Some(message_id) = original.header("Message-ID").or(original.header("Message-Id")) {
        let references = match original.header("References") {
            Some(refs) if !refs.is_empty() => format!("{} {}", refs, message_id),
            _ => message_id.to_string(),
        };
        seed.push_str(&format!("In-Reply-To: {}\n", message_id));
        seed.push_str(&format!("References: {}\n", references));
    }

    seed.push_str(&format!("{} Send\n\n", MODE_HEADER));
    seed.push_str(&format!(
        "On {}, {} said:\n",
        original.header("Date").unwrap_or_default(),
        original.header("From").unwrap_or_default()
    ));
    seed.push_str(&quote_body(&original.body_text()));
    seed.push('\n');
    seed.push_str(signature);
    seed
}

/// Remove the `Mode:` directive from the header block of editor output
pub fn strip_mode_header(text: &str) -> String {
    let (head, body) = match text.split_once("\n\n") {
        Some((head, body)) => (head, Some(body)),
        None => (text, None),
    };

    let kept: Vec<&str> = head
        .split('\n')
        .filter(|line| !line.starts_with(MODE_HEADER))
        .collect();

    let mut out = kept.join("\n");
    if let Some(body) = body {
        out.push_str("\n\n");
        out.push_str(body);
    }
    out
}
