//! Prompt templates for fallback generation

/// Prompt for answering a query, optionally grounded on retrieved context
pub fn answer_prompt(query: &str, context: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("Context: {}\n", context));
    }
    prompt.push_str(&format!("User Query: {}\nAnswer:", query));
    prompt
}

/// Remove the prompt if the model echoed it back, then trim
pub fn strip_prompt_echo(generated: &str, prompt: &str) -> String {
    generated.replace(prompt, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_prompt_without_context() {
        assert_eq!(
            answer_prompt("What is UPI limit?", None),
            "User Query: What is UPI limit?\nAnswer:"
        );
    }

    #[test]
    fn test_answer_prompt_with_context() {
        let prompt = answer_prompt("Home loan rate?", Some("Rates start at 8.5%."));
        assert_eq!(prompt, "Context: Rates start at 8.5%.\nUser Query: Home loan rate?\nAnswer:");

        // Blank context is dropped
        assert_eq!(answer_prompt("q", Some("  ")), answer_prompt("q", None));
    }

    #[test]
    fn test_strip_prompt_echo() {
        let prompt = "User Query: hi\nAnswer:";
        let generated = format!("{} Hello there.\n", prompt);
        assert_eq!(strip_prompt_echo(&generated, prompt), "Hello there.");
        assert_eq!(strip_prompt_echo("  plain  ", prompt), "plain");
    }
}
