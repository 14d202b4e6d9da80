//! Reply text: input normalization, length cap, and the fixed replies.

/// Sent when the utterance is empty after normalization.
pub const EMPTY_MESSAGE_REPLY: &str = "메시지가 비어 있어요. 다시 한 번 입력해 주세요.";

/// Sent instead of any model output when the danger filter matches.
pub const CRISIS_REPLY: &str = "지금 많이 힘드시군요. 그 마음을 털어놓아 주셔서 고마워요.\n\
혼자 견디지 않으셔도 괜찮아요. 지금 바로 전문 상담사와 이야기할 수 있어요.\n\
\n\
- 자살예방 상담전화: 109 (24시간)\n\
- 정신건강 위기상담: 1577-0199\n\
- 청소년 상담전화: 1388\n\
- 긴급한 위험이 있다면: 112 또는 119\n\
\n\
당신의 이야기를 들어줄 사람이 있어요.";

/// Sent whenever the LLM call fails, whatever the reason.
pub const FALLBACK_REPLY: &str = "죄송해요, 지금은 답변을 드리기 어려워요. 잠시 후 다시 말을 걸어 주세요.";

pub const TRUNCATION_MARKER: &str = "...";

/// Collapse each run of control characters (`\r`, `\n`, `\t`, and any other `Cc`)
/// into one space, then trim.
pub fn normalize_utterance(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if c.is_control() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.trim().to_string()
}

/// Cap `text` at `max_chars` characters, appending [`TRUNCATION_MARKER`] when cut.
/// Returns the text and whether it was truncated.
pub fn truncate_reply(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&text[..cut]);
            out.push_str(TRUNCATION_MARKER);
            (out, true)
        }
        None => (text.to_string(), false),
    }
}
