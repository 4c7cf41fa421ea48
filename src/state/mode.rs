use serde::{Deserialize, Serialize};

/// Server-side feedback style requested for a grading run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradingMode {
    #[default]
    Fast,
    Detailed,
    AnswerSheet,
}

impl GradingMode {
    pub const ALL: [GradingMode; 3] = [
        GradingMode::Fast,
        GradingMode::Detailed,
        GradingMode::AnswerSheet,
    ];

    /// Badge shown next to returned feedback.
    pub fn badge(self) -> &'static str {
        match self {
            GradingMode::Fast => "⚡ Fast Mode",
            GradingMode::Detailed => "📝 Detailed Mode",
            GradingMode::AnswerSheet => "📋 Answer Sheet Mode",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GradingMode::Fast => "Fast",
            GradingMode::Detailed => "Detailed",
            GradingMode::AnswerSheet => "Answer Sheet",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GradingMode::Fast => "Fast mode provides quick scores with brief justification.",
            GradingMode::Detailed => {
                "Detailed mode includes comprehensive feedback with methodology analysis."
            }
            GradingMode::AnswerSheet => {
                "Answer sheet mode compares numbered answers directly and lists incorrect \
                 responses. Requires reference image."
            }
        }
    }

    /// Parse the mode string echoed back by the server.
    /// Unrecognized values fall back to `Fast`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "detailed" => GradingMode::Detailed,
            "answer_sheet" => GradingMode::AnswerSheet,
            _ => GradingMode::Fast,
        }
    }
}

/// How a slot is currently fed: from disk or from a live camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Upload,
    Camera,
}
