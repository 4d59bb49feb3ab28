//! System prompt rendering.
//!
//! The prompt is rebuilt from the registry on every run so it always reflects
//! the tools actually available. Rendering is deterministic: tool definitions
//! arrive pre-sorted from the registry and managed agents are listed in the
//! order they were attached.

use quarry_core::provider::ToolDefinition;

const PREAMBLE: &str = "\
You are an expert SQL feature-engineering assistant who solves tasks using tool calls.

To solve the task, proceed in steps. At each step you must call exactly one of \
the tools listed below; plain text without a tool call is not accepted. When a \
tool stores its result in a state variable, you can pass that variable's name \
as an argument to a later tool instead of repeating the data.

When the task is solved, call the `final_answer` tool with your answer. If the \
answer itself lives in a state variable, pass the variable's name and the \
stored value will be returned.";

/// Render the system prompt from the active tool and team-member set.
pub fn render_system_prompt(
    tools: &[ToolDefinition],
    managed_agents: &[(String, String)],
) -> String {
    let mut out = String::from(PREAMBLE);

    out.push_str("\n\nAvailable tools:\n");
    for tool in tools {
        out.push_str(&format!(
            "- {}: {}\n  Inputs: {}\n  Returns: {}\n",
            tool.name, tool.description, tool.parameters, tool.output_type
        ));
    }

    if !managed_agents.is_empty() {
        out.push_str("\nYou can also delegate to these team members by calling them like a tool with a 'task' argument:\n");
        for (name, description) in managed_agents {
            out.push_str(&format!("- {name}: {description}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.into(),
            description: format!("The {name} tool"),
            parameters: json!({"type": "object", "properties": {}}),
            output_type: "string".into(),
        }
    }

    #[test]
    fn lists_tools_and_team_members() {
        let prompt = render_system_prompt(
            &[tool("execute_query"), tool("final_answer")],
            &[("analyst".into(), "Answers business questions".into())],
        );
        assert!(prompt.contains("- execute_query: The execute_query tool"));
        assert!(prompt.contains("- final_answer"));
        assert!(prompt.contains("- analyst: Answers business questions"));
        assert!(prompt.contains("exactly one"));
    }

    #[test]
    fn omits_team_section_when_empty() {
        let prompt = render_system_prompt(&[tool("execute_query")], &[]);
        assert!(!prompt.contains("team members"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let tools = [tool("a"), tool("b")];
        assert_eq!(
            render_system_prompt(&tools, &[]),
            render_system_prompt(&tools, &[])
        );
    }
}
