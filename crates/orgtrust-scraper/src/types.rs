use orgtrust_core::QualityAnalysis;

/// Structured signals extracted from one business website.
#[derive(Debug, Clone)]
pub struct WebsiteData {
    pub domain: String,
    pub description: Option<String>,
    pub products: Vec<String>,
    pub services: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    /// `false` when the page was only reachable over plaintext HTTP.
    pub ssl_valid: bool,
    /// `None` when the fingerprint matched the previous scrape and the AI
    /// call was skipped — the caller keeps its stored analysis.
    pub quality: Option<QualityAnalysis>,
    /// SHA-256 fingerprint of the normalised extracted text.
    pub content_hash: String,
    /// Page content is identical to the previous scrape.
    pub unchanged: bool,
}

/// Raw per-section extraction result before AI analysis.
#[derive(Debug, Clone, Default)]
pub struct PageExtract {
    pub title: Option<String>,
    pub description: Option<String>,
    pub about_text: Option<String>,
    pub products: Vec<String>,
    pub services: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl PageExtract {
    /// All extracted text in one string, for fingerprinting and AI analysis.
    #[must_use]
    pub fn combined_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(t) = &self.title {
            parts.push(t);
        }
        if let Some(d) = &self.description {
            parts.push(d);
        }
        if let Some(a) = &self.about_text {
            parts.push(a);
        }
        parts.extend(self.products.iter().map(String::as_str));
        parts.extend(self.services.iter().map(String::as_str));
        parts.join("\n")
    }

    /// True when no section produced any usable text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.about_text.is_none()
            && self.products.is_empty()
            && self.services.is_empty()
    }
}
