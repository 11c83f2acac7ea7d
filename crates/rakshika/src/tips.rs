//! Static safety content: daily tips, helplines and community support.

use serde::Serialize;
use tracing::info;

use crate::handoff::{tel_url, Handoff, HandoffResult};
use crate::notify::{Notification, NotificationLevel, Notifier};

/// A daily safety tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetyTip {
    /// Headline.
    pub title: &'static str,
    /// One or two sentences of advice.
    pub description: &'static str,
}

/// A national helpline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Helpline {
    /// Service name.
    pub name: &'static str,
    /// Number to dial.
    pub number: &'static str,
}

impl Helpline {
    /// `tel:` link for the number.
    #[must_use]
    pub fn tel_url(&self) -> String {
        tel_url(self.number)
    }

    /// Hand the number to the dialler.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot open `tel:` links.
    pub async fn call(&self, handoff: &dyn Handoff) -> HandoffResult<()> {
        info!(helpline = self.name, "Opening dialler");
        handoff.navigate(&self.tel_url()).await
    }
}

/// A community support service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportOption {
    /// Service name.
    pub title: &'static str,
    /// What it offers.
    pub description: &'static str,
    /// Button label.
    pub action: &'static str,
}

impl SupportOption {
    /// Acknowledge a request for this service.
    pub fn request(&self, notifier: &dyn Notifier) {
        info!(option = self.title, "Community support requested");
        notifier.notify(
            Notification::new(NotificationLevel::Success, format!("Connecting to {}...", self.title))
                .with_description("Our support team will reach out to you shortly."),
        );
    }
}

/// Tips shown on the home screen.
pub const SAFETY_TIPS: [SafetyTip; 6] = [
    SafetyTip {
        title: "Trust Your Instincts",
        description: "If something feels wrong, it probably is. Don't ignore your gut feelings about people or situations.",
    },
    SafetyTip {
        title: "Stay in Groups",
        description: "There's safety in numbers. Travel with friends or in well-populated areas, especially at night.",
    },
    SafetyTip {
        title: "Share Your Location",
        description: "Let trusted contacts know where you are. Use location sharing features on your phone.",
    },
    SafetyTip {
        title: "Keep Phone Charged",
        description: "Always keep your phone charged and have emergency numbers saved on speed dial.",
    },
    SafetyTip {
        title: "Stay Aware",
        description: "Be aware of your surroundings. Avoid distractions like headphones in unfamiliar areas.",
    },
    SafetyTip {
        title: "Plan Your Route",
        description: "Know your route before traveling. Use well-lit, populated paths and avoid shortcuts through isolated areas.",
    },
];

/// Emergency numbers.
pub static HELPLINES: [Helpline; 4] = [
    Helpline {
        name: "Women Helpline",
        number: "1091",
    },
    Helpline {
        name: "Police Emergency",
        number: "112",
    },
    Helpline {
        name: "Ambulance",
        number: "108",
    },
    Helpline {
        name: "National Commission for Women",
        number: "7827170170",
    },
];

/// Community support services.
pub const SUPPORT_OPTIONS: [SupportOption; 4] = [
    SupportOption {
        title: "Anonymous Chat",
        description: "Connect with trained counselors and support volunteers anonymously.",
        action: "Start Chat",
    },
    SupportOption {
        title: "Support Groups",
        description: "Join community support groups and connect with others who understand.",
        action: "Find Groups",
    },
    SupportOption {
        title: "Legal Assistance",
        description: "Get free legal advice and assistance for women's rights and safety issues.",
        action: "Get Help",
    },
    SupportOption {
        title: "Counseling Services",
        description: "Access professional counseling services for emotional and psychological support.",
        action: "Book Session",
    },
];

/// Round-the-clock support line.
pub const SUPPORT_HOTLINE: &str = "1091";

/// Support mailbox.
pub const SUPPORT_EMAIL: &str = "support@rakshika.org";

/// Look up a helpline by number or (case-insensitive) name.
#[must_use]
pub fn find_helpline(query: &str) -> Option<&'static Helpline> {
    let query = query.trim();
    HELPLINES
        .iter()
        .find(|h| h.number == query || h.name.eq_ignore_ascii_case(query))
}
