use replygen_common::{Error, Result};

/// Instruction template submitted to the model. Four substitution points:
/// `{tone}`, `{action_instruction}`, `{char_limit}`, `{email}`.
pub const DEFAULT_TEMPLATE: &str = r#"You are an email response generator.

Your goal is to:
-- Generate an email response using a "{tone}" tone.

Additional optional instructions include
-- {action_instruction}

Limit the response to:
-- {char_limit} characters.

Only generate a single email. Do not provide examples, alternatives, or additional suggestions. Do not explain your reasoning or wrap the output in commentary.

Here is the email to which the reply must be generated:
-- {email}"#;

/// Values substituted into the template
#[derive(Debug, Clone)]
pub struct PromptVars<'a> {
    pub tone: &'a str,
    pub action_instruction: &'a str,
    pub char_limit: u32,
    pub email: &'a str,
}

/// Renders a parameterized template into the final prompt string
pub struct PromptComposer;

impl PromptComposer {
    /// Substitute the named placeholders into `template`. Pure: same inputs
    /// always yield the same string. The email body goes in verbatim except
    /// for trimming leading/trailing whitespace; no other escaping is
    /// applied. A placeholder outside the supplied set is a defect and
    /// fails the render.
    pub fn render(template: &str, vars: &PromptVars) -> Result<String> {
        let mut out = String::with_capacity(template.len() + vars.email.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            match after.find('}') {
                Some(end) if is_placeholder_name(&after[..end]) => {
                    match &after[..end] {
                        "tone" => out.push_str(vars.tone),
                        "action_instruction" => out.push_str(vars.action_instruction),
                        "char_limit" => out.push_str(&vars.char_limit.to_string()),
                        "email" => out.push_str(vars.email.trim()),
                        other => {
                            return Err(Error::Template(format!(
                                "template references unknown placeholder '{{{}}}'",
                                other
                            )));
                        }
                    }
                    rest = &after[end + 1..];
                }
                // A lone or malformed brace is literal text
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Render with the built-in template
    pub fn render_default(vars: &PromptVars) -> Result<String> {
        Self::render(DEFAULT_TEMPLATE, vars)
    }
}

fn is_placeholder_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}
