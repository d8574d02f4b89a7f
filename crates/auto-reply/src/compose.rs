//! Prompt assembly from retrieved threads and recent conversation.

use {threadsage_memory::threads::ThreadRecord, threadsage_sessions::ConversationTurn};

/// Built-in prompt used when no template file is configured.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
<Role>
You are a patient expert helping newcomers in this community. You speak clearly and simply, and you always aim to help the user understand and succeed.
You can guide users to their goals, explain concepts without skipping key details, dive deeper when asked, and give examples when relevant.
</Role>

<Task Flow>
When a user asks a question, use the relevant threads below from the community knowledge base and work through these stages in order:
<information> (facts the threads provide) </information>
<goal> (what the user is trying to accomplish) </goal>
<difficulty> (how hard or easy this task is) </difficulty>
<response> (what the user will see based on the stages above, with depth matching the difficulty) </response>
If the threads do not cover the question, say so in <information> and answer from general knowledge.
</Task Flow>

<Examples>
Q: How should I get started?
A:
<information>
Threads from members who started recently agree on a few points:
- Start with one small, concrete project instead of several at once.
- Read the pinned beginner guide before asking setup questions.
- Share progress early so others can point out mistakes.
</information>
<goal> To make a first step that builds momentum without getting overwhelmed. </goal>
<difficulty> Easy: the first steps are well documented and others have walked the same path. </difficulty>
<response> Welcome! The best way in is to pick one small project you care about and finish it.
Read the pinned beginner guide first, since it answers most setup questions. Then post what you are working on, even if it is rough, so others can spot problems while they are still cheap to fix.
Once that first project is done you will know which topics to dig into next.
Want help picking a first project?
</response>
</Examples>

<Conversation History>
{conversation}
</Conversation History>

<User Question and Information from database>
A user just asked this question:
"{question}"

Relevant Threads:
{context}
</User Question and Information from database>

<Reiteration>
You are friendly and professional and want to grow the community through free, helpful and clear advice.
Only return the <response> without the tags.
</Reiteration>
"#;

/// Threads joined by a blank line, each as `Closest Q: … / A: …`.
pub fn format_threads(records: &[ThreadRecord]) -> String {
    records
        .iter()
        .map(|r| format!("Closest Q: {}\nA: {}", r.header, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One `User:` / `Assistant:` pair per turn, oldest first.
pub fn format_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("User: {}\nAssistant: {}\n", t.question, t.answer))
        .collect()
}

/// The body of the first `<response>` block when the model echoed the staged
/// task flow, otherwise the whole answer.
pub fn extract_response(answer: &str) -> &str {
    let Some((_, rest)) = answer.split_once("<response>") else {
        return answer.trim();
    };
    rest.split_once("</response>")
        .map_or(rest, |(body, _)| body)
        .trim()
}

/// Fill the `{conversation}`, `{question}` and `{context}` placeholders.
///
/// Substitution is single-pass, so placeholder-looking text inside the
/// question or threads is left alone.
pub fn build_prompt(template: &str, conversation: &str, question: &str, context: &str) -> String {
    let mut out = String::with_capacity(
        template.len() + conversation.len() + question.len() + context.len(),
    );
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let replacement = [
            ("{conversation}", conversation),
            ("{question}", question),
            ("{context}", context),
        ]
        .into_iter()
        .find(|(placeholder, _)| tail.starts_with(placeholder));
        match replacement {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            },
            None => {
                out.push('{');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, header: &str, content: &str) -> ThreadRecord {
        ThreadRecord {
            id: id.into(),
            header: header.into(),
            content: content.into(),
            category: None,
        }
    }

    #[test]
    fn threads_are_separated_by_blank_lines() {
        let records = [
            record("t1", "How do I start?", "Pick a niche."),
            record("t2", "Which plan?", "The basic one."),
        ];
        assert_eq!(
            format_threads(&records),
            "Closest Q: How do I start?\nA: Pick a niche.\n\nClosest Q: Which plan?\nA: The basic one."
        );
        assert_eq!(format_threads(&[]), "");
    }

    #[test]
    fn history_lines_end_with_newline() {
        let turns = [
            ConversationTurn::new("q1", "a1"),
            ConversationTurn::new("q2", "a2"),
        ];
        assert_eq!(
            format_history(&turns),
            "User: q1\nAssistant: a1\nUser: q2\nAssistant: a2\n"
        );
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn fills_every_placeholder() {
        let prompt = build_prompt(
            "H:{conversation}|Q:\"{question}\"|C:{context}",
            "User: a\nAssistant: b\n",
            "why?",
            "Closest Q: x\nA: y",
        );
        assert_eq!(
            prompt,
            "H:User: a\nAssistant: b\n|Q:\"why?\"|C:Closest Q: x\nA: y"
        );
    }

    #[test]
    fn user_text_is_not_expanded() {
        let prompt = build_prompt("{question} / {context}", "", "what is {context}?", "CTX");
        assert_eq!(prompt, "what is {context}? / CTX");
    }

    #[test]
    fn unknown_braces_survive() {
        assert_eq!(build_prompt("{json} {", "", "", ""), "{json} {");
    }

    #[test]
    fn default_template_has_all_placeholders() {
        for placeholder in ["{conversation}", "{question}", "{context}"] {
            assert!(DEFAULT_PROMPT_TEMPLATE.contains(placeholder), "{placeholder}");
        }
    }

    #[test]
    fn default_template_stages_the_answer() {
        for tag in ["<information>", "<goal>", "<difficulty>", "<response>", "<Examples>"] {
            assert!(DEFAULT_PROMPT_TEMPLATE.contains(tag), "{tag}");
        }
        for placeholder in ["{conversation}", "{question}", "{context}"] {
            assert_eq!(DEFAULT_PROMPT_TEMPLATE.matches(placeholder).count(), 1, "{placeholder}");
        }
    }

    #[test]
    fn staged_answers_keep_only_the_response() {
        let staged = "<information> x </information>\n<goal> y </goal>\n<response>\nDo this.\n</response>";
        assert_eq!(extract_response(staged), "Do this.");
        assert_eq!(extract_response("<response> unterminated"), "unterminated");
        assert_eq!(extract_response("  plain answer\n"), "plain answer");
    }
}
