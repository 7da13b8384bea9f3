//! Row transformer: task text in, staged scene prompt out.

use serde::Serialize;

use super::rules::{select_rule, RuleCategory};
use crate::error::TransformResult;
use crate::models::{Language, PromptPair};

/// Rewrite a task into a prompt for `language`.
///
/// Never returns an empty string: a task that triggers nothing falls
/// through to the language's fallback template.
pub fn transform(task: &str, language: Language) -> String {
    select_rule(task, language).render(task)
}

/// [`transform`] for an untyped language tag.
///
/// Fails with `UnsupportedLanguage` for anything other than `zh` or `en`.
pub fn transform_lang(task: &str, language: &str) -> TransformResult<String> {
    let language: Language = language.parse()?;
    Ok(transform(task, language))
}

/// Generate both prompts for a task.
pub fn generate_prompts(task: &str) -> PromptPair {
    PromptPair {
        prompt_zh: transform(task, Language::Zh),
        prompt_en: transform(task, Language::En),
    }
}

/// Which rule produced a prompt, and why.
#[derive(Debug, Clone, Serialize)]
pub struct Rewrite {
    pub language: Language,
    pub category: RuleCategory,
    /// Trigger that fired; `None` for the fallback
    pub keyword: Option<&'static str>,
    pub prompt: String,
}

/// Like [`transform`], also reporting the rule that fired.
pub fn explain(task: &str, language: Language) -> Rewrite {
    let rule = select_rule(task, language);
    Rewrite {
        language,
        category: rule.category,
        keyword: rule.matched_keyword(task),
        prompt: rule.render(task),
    }
}
