//! Personality registry — fixed instruction templates that condition replies.
//!
//! Clients select a personality by key (`modelId` on the wire). Resolution
//! never fails: unknown or absent keys fall back to [`Personality::default`]
//! so malformed input degrades to the default coach instead of blocking the
//! turn.

use serde::{Deserialize, Serialize};

/// Separator between the personality instruction and the user's text.
pub const PROMPT_SEPARATOR: &str = "\n\n";

/// The closed set of personalities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Friendly coach that helps the user learn a new skill.
    #[default]
    SkillBuilder,
    /// Drafts promotional posts, one section per platform.
    SocialMediaHelper,
    /// Explains concepts simply and checks understanding.
    StudyBuddy,
    /// Beginner-friendly exercise guidance.
    FitnessCoach,
}

impl Personality {
    /// Every registered personality, default first.
    pub fn all() -> &'static [Personality] {
        &[
            Personality::SkillBuilder,
            Personality::SocialMediaHelper,
            Personality::StudyBuddy,
            Personality::FitnessCoach,
        ]
    }

    /// Resolve a client-supplied key. Unknown or missing keys yield the default.
    pub fn resolve(key: Option<&str>) -> Self {
        key.map(str::trim)
            .and_then(|k| Self::all().iter().copied().find(|p| p.key() == k))
            .unwrap_or_default()
    }

    /// The wire key (`modelId`).
    pub fn key(&self) -> &'static str {
        match self {
            Personality::SkillBuilder => "skill_builder",
            Personality::SocialMediaHelper => "social_media_helper",
            Personality::StudyBuddy => "study_buddy",
            Personality::FitnessCoach => "fitness_coach",
        }
    }

    /// Human-readable name for pickers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Personality::SkillBuilder => "Skill Builder",
            Personality::SocialMediaHelper => "Social Media Helper",
            Personality::StudyBuddy => "Study Buddy",
            Personality::FitnessCoach => "Fitness Coach",
        }
    }

    /// The fixed instruction prepended to every prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Personality::SkillBuilder => {
                "You are a friendly and encouraging 'Skill Builder' coach. \
                 Your goal is to help the user learn a new skill. \
                 Based on their message, ask what they want to learn or give them the very first, simple step. \
                 Keep your instructions small and easy."
            }
            Personality::SocialMediaHelper => {
                "You are a creative social media marketing assistant. \
                 Turn the user's request into ready-to-post content. \
                 Write one section per platform, each starting with a bold platform label \
                 (**Instagram:**, **Facebook:**, **X (Twitter):**, **LinkedIn:**), \
                 and suggest a few relevant hashtags for each."
            }
            Personality::StudyBuddy => {
                "You are a patient study buddy. \
                 Explain the topic the user asks about in plain language with a short example, \
                 then ask one quick question to check their understanding."
            }
            Personality::FitnessCoach => {
                "You are a supportive fitness coach for beginners. \
                 Suggest safe, simple exercises with sets and repetitions, \
                 and remind the user to consult a professional if they have health concerns."
            }
        }
    }

    /// Build the full prompt for one turn. Prior turns are never replayed.
    pub fn build_prompt(&self, user_text: &str) -> String {
        format!("{}{PROMPT_SEPARATOR}{user_text}", self.instruction())
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
