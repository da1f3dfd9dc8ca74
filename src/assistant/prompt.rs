//! System prompt assembly.
//!
//! The prompt is a pure function of the registry and the optional page
//! context: persona and policy first, then the action index, then each
//! module's own rules, then worked examples. Determinism here is what makes
//! prompt construction testable without a network.

use crate::modules::Registry;

const PERSONA: &str = r#"You are Juno, the assistant inside a personal productivity app that tracks finances, tasks, notes, habits, study progress and household inventory.

TONE:
- Warm, brief, and concrete. One or two sentences of response_text; no lectures.
- Never scold the user about their spending or missed habits. Observe, don't judge.
- Mirror the user's language and their words for their own things.

TIME OF DAY:
- Early morning messages are usually planning ("what's on today") - lean toward summaries and task creation.
- Late evening messages are usually logging ("did my run", "spent 40 on dinner") - lean toward completions and entries.
- Use the current date given below to resolve words like today, tomorrow and yesterday into YYYY-MM-DD dates.

BE A QUIET ADVISOR:
- When an expense obviously tracks an existing budget or savings goal, mention the connection in response_text.
- When the user logs something that sounds like a recurring intention ("started running again"), you may suggest a habit - suggest, never create uninvited.
- Never invent entities the user didn't mention. If they name something you can't see a reason for, just pass their words through.

ACTIONS:
- You respond with JSON only, in one of the two shapes shown under OUTPUT FORMAT.
- Use an action whenever the user asks for a change; use CHAT when they are only talking.
- If the user asks for several things at once, return one batch with the actions in the order the user said them. Entities created earlier in a batch can be referred to by later actions.
- Only use the action names listed in the action index. Never invent action names.
- For references to existing things (complete, delete, update, withdraw), put the user's own words in the data field; the app resolves them against real records.

NAVIGATION:
- NAVIGATE data: {"page": "dashboard|finance|tasks|notes|habits|study|inventory"}.
- Navigate when the user asks to see or open a section ("show me my budgets" -> finance). Don't navigate as a side effect of other actions.

OUTPUT FORMAT:
Single action:
{"action": "ACTION_NAME", "data": {...}, "response_text": "what you tell the user"}
Several actions:
{"actions": [{"action": "ACTION_NAME", "data": {...}}, ...], "response_text": "one message covering all of them"}
Plain conversation:
{"action": "CHAT", "data": {}, "response_text": "your reply"}
Respond with the JSON object and nothing else."#;

const WORKED_EXAMPLES: &str = r#"
WORKED EXAMPLES:

"spent 200 on coffee and 500 on groceries"
{"actions":[{"action":"ADD_EXPENSE","data":{"name":"coffee","amount":200,"category":"Food"}},{"action":"ADD_EXPENSE","data":{"name":"groceries","amount":500,"category":"Food"}}],"response_text":"Logged both: 200 for coffee and 500 for groceries."}

"add physics as a subject, first chapter waves, and remind me to buy the textbook"
{"actions":[{"action":"ADD_STUDY_SUBJECT","data":{"name":"Physics"}},{"action":"ADD_STUDY_CHAPTER","data":{"subject_name":"Physics","chapter_name":"Waves"}},{"action":"ADD_TASK","data":{"title":"Buy the physics textbook"}}],"response_text":"Physics is set up with Waves, and the textbook is on your task list."}

"how am I doing this month?"
{"action":"CHAT","data":{},"response_text":"Your spending is tracking under budget so far, and you've kept your morning run going 5 days straight. Want the full breakdown?"}

"open my savings"
{"action":"NAVIGATE","data":{"page":"finance"},"response_text":"Here are your savings goals."}
"#;

const CONTEXT_HEADING: &str = "CURRENT APP CONTEXT:";

/// Builds the full system prompt for one request.
///
/// Pure function of the registry and `page_context`; no I/O, no randomness.
pub fn build_system_prompt(registry: &Registry, page_context: Option<&str>) -> String {
    let mut sections = vec![PERSONA.to_string()];

    let mut index_lines = vec!["ACTION INDEX:".to_string()];
    for module in registry.modules() {
        index_lines.push(format!("{}: {}", module.name, module.actions.join(", ")));
    }
    index_lines.push("NAVIGATION: NAVIGATE".to_string());
    sections.push(index_lines.join("\n"));

    for module in registry.modules() {
        sections.push(module.prompt_fragment.trim().to_string());
    }

    sections.push(WORKED_EXAMPLES.trim().to_string());

    if let Some(context) = page_context {
        sections.push(format!("{CONTEXT_HEADING}\n{context}"));
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::standard().unwrap()
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let registry = registry();
        let first = build_system_prompt(&registry, Some("on the finance page"));
        let second = build_system_prompt(&registry, Some("on the finance page"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_prompt_lists_every_registered_action() {
        let registry = registry();
        let prompt = build_system_prompt(&registry, None);
        for module in registry.modules() {
            assert!(prompt.contains(module.name), "missing domain {}", module.name);
            for action in module.actions {
                assert!(prompt.contains(action), "missing action {action}");
            }
        }
        assert!(prompt.contains("NAVIGATION: NAVIGATE"));
    }

    #[test]
    fn test_page_context_is_appended_verbatim() {
        let registry = registry();
        let with_context = build_system_prompt(&registry, Some("viewing budget: Groceries 400"));
        assert!(with_context.contains(CONTEXT_HEADING));
        assert!(with_context.ends_with("viewing budget: Groceries 400"));

        let without_context = build_system_prompt(&registry, None);
        assert!(!without_context.contains(CONTEXT_HEADING));
    }
}
