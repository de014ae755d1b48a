//! Safety-assistant replies built around knowledge-base guidance.
//!
//! Wraps the resolved section text with emergency framing, a localized
//! greeting when nothing matched, and a short list of follow-up tips.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::knowledge::KnowledgeBase;
use crate::resolve::{MatchTier, NO_GUIDANCE};

/// Substrings that mark a message as an emergency.
pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "help",
    "emergency",
    "sos",
    "urgent",
    "danger",
    "scared",
    "injured",
    "lost",
    "harassed",
    "bleeding",
    "pain",
    "accident",
];

const EMERGENCY_TIPS: &[&str] = &[
    "Call 112 for immediate emergency help",
    "Stay calm and move to a safe location",
    "Share your location with emergency services",
    "Keep emergency numbers saved: Police-100, Ambulance-102, Women Helpline-1091",
];

const GREETING_TIPS: &[&str] = &[
    "Type \"help\" for emergency assistance",
    "Share location for nearby facilities",
    "Ask about travel safety tips",
];

const FOLLOW_UP_TIPS: &[&str] = &[
    "Ask for more specific details",
    "Type \"help\" for emergency assistance",
    "Share location for local guidance",
];

/// Reply language. Unknown names fall back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Hindi,
    Japanese,
}

impl Language {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Hindi" => Language::Hindi,
            "Japanese" => Language::Japanese,
            _ => Language::English,
        }
    }

    fn emergency_prefix(&self) -> &'static str {
        match self {
            Language::English => {
                "🚨 Emergency detected! Call 112 immediately for help. Here's immediate guidance: "
            }
            Language::Hindi => {
                "🚨 आपातकाल का पता चला! तुरंत मदद के लिए 112 डायल करें। यहां तत्काल मार्गदर्शन है: "
            }
            Language::Japanese => "🚨 緊急事態を検出しました！即座に112に電話してください。緊急ガイダンス: ",
        }
    }

    fn greeting(&self) -> &'static str {
        match self {
            Language::English => {
                "Hello! I'm your Safety Assistant. I can help you with travel safety, emergency support, and local information. How can I assist you today?"
            }
            Language::Hindi => {
                "नमस्ते! मैं आपका सुरक्षा सहायक हूं। मैं आपको यात्रा सुरक्षा, आपातकालीन सहायता और स्थानीय जानकारी में मदद कर सकता हूं।"
            }
            Language::Japanese => {
                "こんにちは！私はあなたの安全アシスタントです。旅行の安全、緊急サポート、現地情報をサポートします。"
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

fn default_language() -> String {
    "English".to_string()
}

impl AskRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            language: default_language(),
            lat: None,
            lon: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskReply {
    pub reply: String,
    pub tips: Vec<String>,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub language: String,
    pub location: Option<Location>,
    /// Resolver tier that produced the guidance.
    #[serde(skip)]
    pub tier: Option<MatchTier>,
}

/// True if the message mentions any emergency keyword.
pub fn is_emergency(message: &str) -> bool {
    let lower = message.to_lowercase();
    EMERGENCY_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// A zero or NaN coordinate counts as not shared.
fn is_set(coord: f64) -> bool {
    coord != 0.0 && !coord.is_nan()
}

/// Answers one ask request.
///
/// Fails only when the message is missing or empty. Whitespace-only
/// messages are resolved like any other query.
pub fn ask(kb: &KnowledgeBase, req: &AskRequest) -> anyhow::Result<AskReply> {
    let message = match req.message.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => anyhow::bail!("message is required"),
    };

    let resolution = kb.resolve(message);
    let tier = resolution.tier;
    let guidance = resolution.into_text();
    let language = Language::from_name(&req.language);

    let (reply, tips) = if is_emergency(message) {
        (
            format!("{}{}", language.emergency_prefix(), guidance),
            EMERGENCY_TIPS,
        )
    } else if guidance == NO_GUIDANCE || guidance.trim().is_empty() {
        (language.greeting().to_string(), GREETING_TIPS)
    } else {
        (guidance, FOLLOW_UP_TIPS)
    };

    let location = match (req.lat, req.lon) {
        (Some(lat), Some(lon)) if is_set(lat) && is_set(lon) => Some(Location { lat, lon }),
        _ => None,
    };

    Ok(AskReply {
        reply,
        tips: tips.iter().map(|t| t.to_string()).collect(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        language: req.language.clone(),
        location,
        tier: Some(tier),
    })
}
