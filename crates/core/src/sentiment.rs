use std::fmt;

/// Qualitative bucket for an average document sentiment score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentimentLabel {
    VeryPositive,
    SomewhatPositive,
    Neutral,
    SomewhatNegative,
    VeryNegative,
}

impl SentimentLabel {
    /// Bucket boundaries: scores strictly beyond +/-0.3 are "very", anything
    /// else on that side is "somewhat", exactly zero is neutral.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            if score > 0.3 {
                Self::VeryPositive
            } else {
                Self::SomewhatPositive
            }
        } else if score < 0.0 {
            if score < -0.3 {
                Self::VeryNegative
            } else {
                Self::SomewhatNegative
            }
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryPositive => "very positive",
            Self::SomewhatPositive => "somewhat positive",
            Self::Neutral => "neutral",
            Self::SomewhatNegative => "somewhat negative",
            Self::VeryNegative => "very negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
