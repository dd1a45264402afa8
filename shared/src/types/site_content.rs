use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which the home page document is stored.
pub const HOME_KEY: &str = "home";

/// One "reason to choose us" card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomePageReason {
    pub title: String,
    pub description: String,
    pub icon: String,
}

/// One "what we offer" card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomePageOffer {
    pub title: String,
    pub description: String,
    pub icon: String,
}

/// Editable home page copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageContent {
    pub hero_title: String,
    pub hero_cta_text: String,

    pub about_title: String,
    pub about_body: String,

    pub reasons_title: String,
    pub reasons: Vec<HomePageReason>,

    pub offers_title: String,
    pub offers: Vec<HomePageOffer>,

    pub clients_title: String,
    pub contact_title: String,
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}

impl HomePageContent {
    /// Every title and body is a non-empty string and every card has a
    /// non-empty title and description. Icons may be empty.
    pub fn is_valid(&self) -> bool {
        filled(&self.hero_title)
            && filled(&self.hero_cta_text)
            && filled(&self.about_title)
            && filled(&self.about_body)
            && filled(&self.reasons_title)
            && self
                .reasons
                .iter()
                .all(|r| filled(&r.title) && filled(&r.description))
            && filled(&self.offers_title)
            && self
                .offers
                .iter()
                .all(|o| filled(&o.title) && filled(&o.description))
            && filled(&self.clients_title)
            && filled(&self.contact_title)
    }

    /// Parse and validate an arbitrary JSON value.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value::<Self>(value)
            .ok()
            .filter(Self::is_valid)
    }
}

impl Default for HomePageContent {
    fn default() -> Self {
        let reason = |title: &str, description: &str, icon: &str| HomePageReason {
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        };
        let offer = |title: &str, description: &str, icon: &str| HomePageOffer {
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        };

        Self {
            hero_title: "UNLOCKING THE POWER OF TALENT, WORLDWIDE.".to_string(),
            hero_cta_text: "Let's Get Hiring".to_string(),

            about_title: "Who we are".to_string(),
            about_body: "We are partners committed to your success, dedicated to finding the \
                ideal match for your team. We understand the importance of time and the impact a \
                wrong hire can have on your business. That's why we offer personalized \
                recruitment services that prioritize efficiency and effectiveness. At MatchMakers \
                we try to create the perfect synergy between your company and exceptional talent."
                .to_string(),

            reasons_title: "Main reasons to choose MatchMakers".to_string(),
            reasons: vec![
                reason(
                    "Quality",
                    "We understand the importance of time and the impact a wrong hire can have on your business.",
                    "✅",
                ),
                reason(
                    "Personalization",
                    "We offer personalized recruitment services that prioritize efficiency and effectiveness.",
                    "🧩",
                ),
                reason(
                    "Experience",
                    "Our team members brings over five years of experience in hiring top-tier professionals.",
                    "🏆",
                ),
                reason(
                    "Transparency",
                    "We are committed to transparency at every stage, providing full visibility into our processes.",
                    "🔎",
                ),
            ],

            offers_title: "What we can offer".to_string(),
            offers: vec![
                offer(
                    "Executive search",
                    "Executive search and sourcing of top talent for your company, startup, or new projects.",
                    "🎯",
                ),
                offer(
                    "Team building",
                    "Building high-impact teams where employees truly complement each other and work towards your company's goals.",
                    "🤝",
                ),
                offer(
                    "End-to-end guidance",
                    "Guiding you through every step of the recruitment process with care, making it seamless, transparent, and effective.",
                    "🧭",
                ),
            ],

            clients_title: "Our Clients".to_string(),
            contact_title: "Let's Get Hiring".to_string(),
        }
    }
}
