//! Trust score engine.
//!
//! A pure function combining registry verification, website signal quality,
//! and news sentiment into a bounded, explainable score. No I/O, no clock
//! reads — `now` is an explicit parameter, so identical inputs always produce
//! an identical score and breakdown.

use chrono::{DateTime, Utc};

use crate::domain::{NewsSignal, VerificationStatus};
use crate::quality::QualityAnalysis;

/// Every score starts here before per-signal deltas are applied.
pub const BASELINE: i32 = 50;

const REGISTRY_VERIFIED_DELTA: i32 = 20;
const REGISTRY_FAILED_DELTA: i32 = -35;
const REGISTRY_PENDING_DELTA: i32 = -10;

const WEBSITE_PRESENT_DELTA: i32 = 10;
const WEBSITE_SSL_DELTA: i32 = 5;
const RED_FLAG_PENALTY: i32 = 5;
const RED_FLAG_PENALTY_CAP: i32 = 25;

/// News can move the score by at most this much in either direction, so a
/// single viral story cannot dominate the registry signal.
const NEWS_CAP: f64 = 15.0;
const NEWS_SIGNAL_WEIGHT: f64 = 5.0;
const NEWS_HALF_LIFE_DAYS: f64 = 30.0;

/// Per-signal signed contributions. Together with [`BASELINE`] they sum to
/// the unclamped score, which makes regression assertions like "registry
/// contributes +20 when verified" possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrustScoreBreakdown {
    pub registry: i32,
    pub website: i32,
    pub news: i32,
}

/// A bounded trust score with its explainable breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustScore {
    /// Clamped to `[0, 100]`.
    pub score: u8,
    pub breakdown: TrustScoreBreakdown,
}

/// Computes the trust score for one business record.
///
/// Inputs are the record's current verification status, the website quality
/// analysis (if the site was ever scraped), the observed TLS validity, and
/// the collected news signals. `now` anchors news recency decay.
#[must_use]
pub fn compute_trust_score(
    status: VerificationStatus,
    quality: Option<&QualityAnalysis>,
    ssl_valid: Option<bool>,
    news: &[NewsSignal],
    now: DateTime<Utc>,
) -> TrustScore {
    let breakdown = TrustScoreBreakdown {
        registry: registry_delta(status),
        website: website_delta(quality, ssl_valid),
        news: news_delta(news, now),
    };

    let raw = BASELINE + breakdown.registry + breakdown.website + breakdown.news;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = raw.clamp(0, 100) as u8;

    TrustScore { score, breakdown }
}

/// Registry is the strongest signal: non-verification implies the entity may
/// not legally exist.
fn registry_delta(status: VerificationStatus) -> i32 {
    match status {
        VerificationStatus::Verified => REGISTRY_VERIFIED_DELTA,
        VerificationStatus::Failed => REGISTRY_FAILED_DELTA,
        VerificationStatus::Pending => REGISTRY_PENDING_DELTA,
    }
}

/// Website contribution: a reachable site earns a base delta, valid TLS a
/// bonus, and each red flag a capped penalty. A record that was never scraped
/// contributes nothing rather than being penalised.
fn website_delta(quality: Option<&QualityAnalysis>, ssl_valid: Option<bool>) -> i32 {
    if quality.is_none() && ssl_valid.is_none() {
        return 0;
    }

    let mut delta = WEBSITE_PRESENT_DELTA;
    if ssl_valid == Some(true) {
        delta += WEBSITE_SSL_DELTA;
    }

    let flag_count = quality.map_or(0, |qa| {
        // An unavailable analysis always counts as at least one flag, even if
        // a legacy record lost the flag string itself.
        if qa.is_unavailable() {
            qa.red_flags.len().max(1)
        } else {
            qa.red_flags.len()
        }
    });

    let penalty = i32::try_from(flag_count)
        .unwrap_or(i32::MAX)
        .saturating_mul(RED_FLAG_PENALTY)
        .min(RED_FLAG_PENALTY_CAP);

    delta - penalty
}

/// Recency-decayed, volume-weighted news sentiment, capped to ±[`NEWS_CAP`].
///
/// Each signal contributes `sentiment * 0.5^(age_days / 30) * 5`; a mention
/// from today carries full weight, one from a month ago half.
fn news_delta(news: &[NewsSignal], now: DateTime<Utc>) -> i32 {
    if news.is_empty() {
        return 0;
    }

    let sum: f64 = news
        .iter()
        .map(|signal| {
            let age_secs = (now - signal.published_at).num_seconds().max(0);
            #[allow(clippy::cast_precision_loss)]
            let age_days = age_secs as f64 / 86_400.0;
            let decay = 0.5_f64.powf(age_days / NEWS_HALF_LIFE_DAYS);
            f64::from(signal.sentiment) * decay * NEWS_SIGNAL_WEIGHT
        })
        .sum();

    #[allow(clippy::cast_possible_truncation)]
    let capped = sum.clamp(-NEWS_CAP, NEWS_CAP).round() as i32;
    capped
}
