use rocode_config::{RunMode, TriggerKeywords};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error("no trigger comment and no explicit mode: set a mode or provide the thread and comment ids")]
    MissingTrigger,

    #[error("comment does not mention any of {keywords}")]
    NoKeyword { keywords: String },

    #[error("{mode} mode requires one of {keywords} in the comment")]
    MissingModeKeyword { mode: RunMode, keywords: String },

    #[error("comment asks for a review ({keyword}) but the run is in command mode")]
    ConflictingKeyword { keyword: String },

    #[error("command mode requires a trigger thread and comment")]
    MissingCommandContext,
}

/// Maps comment text to a run mode using the configured keyword groups.
#[derive(Debug, Clone)]
pub struct TriggerResolver {
    keywords: TriggerKeywords,
}

fn find_keyword<'a>(content: &str, group: &'a [String]) -> Option<&'a str> {
    let content = content.to_lowercase();
    group
        .iter()
        .find(|keyword| content.contains(&keyword.to_lowercase()))
        .map(String::as_str)
}

fn describe(group: &[String]) -> String {
    group
        .iter()
        .map(|keyword| format!("`{keyword}`"))
        .collect::<Vec<_>>()
        .join(" or ")
}

impl TriggerResolver {
    pub fn new(keywords: TriggerKeywords) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &TriggerKeywords {
        &self.keywords
    }

    /// Mode implied by `content`. Review keywords win when both groups match.
    pub fn detect(&self, content: &str) -> Option<RunMode> {
        if find_keyword(content, &self.keywords.review).is_some() {
            Some(RunMode::Review)
        } else if find_keyword(content, &self.keywords.command).is_some() {
            Some(RunMode::Command)
        } else {
            None
        }
    }

    pub fn validate_trigger(&self, content: &str, mode: RunMode) -> Result<(), TriggerError> {
        match mode {
            RunMode::Review => {
                if find_keyword(content, &self.keywords.review).is_none() {
                    return Err(TriggerError::MissingModeKeyword {
                        mode,
                        keywords: describe(&self.keywords.review),
                    });
                }
            }
            RunMode::Command => {
                if let Some(keyword) = find_keyword(content, &self.keywords.review) {
                    return Err(TriggerError::ConflictingKeyword {
                        keyword: keyword.to_string(),
                    });
                }
                if find_keyword(content, &self.keywords.command).is_none() {
                    return Err(TriggerError::MissingModeKeyword {
                        mode,
                        keywords: describe(&self.keywords.command),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve the run mode. Returns the mode and whether it was explicit.
    ///
    /// An explicit mode skips inference but a trigger comment, when present,
    /// must still match it. Otherwise the comment decides the mode.
    pub fn resolve(
        &self,
        explicit: Option<RunMode>,
        comment: Option<&str>,
    ) -> Result<(RunMode, bool), TriggerError> {
        if let Some(mode) = explicit {
            match comment {
                Some(content) => self.validate_trigger(content, mode)?,
                None if mode == RunMode::Command => {
                    return Err(TriggerError::MissingCommandContext)
                }
                None => {}
            }
            return Ok((mode, true));
        }

        let content = comment.ok_or(TriggerError::MissingTrigger)?;
        let mode = self.detect(content).ok_or_else(|| TriggerError::NoKeyword {
            keywords: describe(
                &self
                    .keywords
                    .review
                    .iter()
                    .chain(self.keywords.command.iter())
                    .cloned()
                    .collect::<Vec<_>>(),
            ),
        })?;
        self.validate_trigger(content, mode)?;
        Ok((mode, false))
    }
}
