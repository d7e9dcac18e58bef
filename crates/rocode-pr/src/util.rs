/// Longest commit subject produced from the agent's summary.
pub const COMMIT_SUMMARY_MAX_CHARS: usize = 40;

pub fn truncate_text(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut out = String::new();
    for c in input.chars().take(max_chars.saturating_sub(2)) {
        out.push(c);
    }
    out.push_str("..");
    out
}

/// Collapse a multi-line value onto one line for prompt metadata.
pub fn inline(value: Option<&str>) -> String {
    value
        .unwrap_or_default()
        .trim()
        .replace('\r', "")
        .replace('\n', " ")
}

/// First non-empty line of the agent's answer, shortened to a commit subject.
pub fn summary_title(response: &str, fallback: &str) -> String {
    let first = response
        .lines()
        .map(|line| line.trim().trim_matches(['"', '`', '*']).trim())
        .find(|line| !line.is_empty())
        .unwrap_or(fallback);
    if first.is_empty() {
        return truncate_text(fallback, COMMIT_SUMMARY_MAX_CHARS);
    }
    truncate_text(first, COMMIT_SUMMARY_MAX_CHARS)
}

/// Commit message with an optional `Co-authored-by` trailer.
pub fn commit_message(summary: &str, co_author: Option<(&str, &str)>) -> String {
    let mut message = summary.to_string();
    if let Some((name, email)) = co_author {
        message.push_str(&format!("\n\nCo-authored-by: {} <{}>", name, email));
    }
    message
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Link to the current pipeline run, when running under Azure Pipelines.
pub fn pipeline_footer() -> String {
    footer_from(
        env_value("SYSTEM_COLLECTIONURI"),
        env_value("SYSTEM_TEAMPROJECT"),
        env_value("BUILD_BUILDID"),
    )
}

fn footer_from(
    collection: Option<String>,
    project: Option<String>,
    build_id: Option<String>,
) -> String {
    match (collection, project, build_id) {
        (Some(collection), Some(project), Some(build_id)) => format!(
            "\n\n[pipeline run]({}/{}/_build/results?buildId={})",
            collection.trim_end_matches('/'),
            project.replace(' ', "%20"),
            build_id
        ),
        _ => String::new(),
    }
}

pub fn provider_secret_keys(provider: &str) -> Vec<&'static str> {
    match provider {
        "anthropic" => vec!["ANTHROPIC_API_KEY"],
        "openai" => vec!["OPENAI_API_KEY"],
        "openrouter" => vec!["OPENROUTER_API_KEY"],
        "google" => vec!["GOOGLE_API_KEY", "GOOGLE_GENERATIVE_AI_API_KEY"],
        "mistral" => vec!["MISTRAL_API_KEY"],
        "groq" => vec!["GROQ_API_KEY"],
        "xai" => vec!["XAI_API_KEY"],
        "deepseek" => vec!["DEEPSEEK_API_KEY"],
        "github-copilot" => vec!["GITHUB_COPILOT_TOKEN"],
        "amazon-bedrock" | "bedrock" => {
            vec!["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_REGION"]
        }
        "azure" => vec!["AZURE_OPENAI_API_KEY", "AZURE_OPENAI_ENDPOINT"],
        _ => vec![],
    }
}

/// Warn when none of the provider's usual credentials are in the environment.
/// The agent may still find credentials elsewhere, so this never fails.
pub fn warn_missing_provider_credentials(provider: &str) {
    let keys = provider_secret_keys(provider);
    if keys.is_empty() {
        return;
    }
    if keys.iter().all(|key| env_value(key).is_none()) {
        tracing::warn!(
            provider,
            expected = %keys.join(", "),
            "no credentials for provider found in the environment"
        );
    }
}
