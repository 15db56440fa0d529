//! Factor collection and scoring.

use chrono::{DateTime, Datelike, Timelike, Utc};
use kyc_providers::ProviderOutcome;
use kyc_types::{DocumentQuality, DocumentRecord, KycResult, RiskLevel, VerificationRecord};
use tracing::{debug, error};

use crate::config::RiskConfig;
use crate::factors::{FactorCategory, Impact, RiskAssessment, RiskFactor};

/// Factor codes that force manual review regardless of the numeric score.
const ALWAYS_MANUAL: &[&str] = &[
    "sanctions_match",
    "inauthentic_documents",
    "business_verification_failed",
    "minor_applicant",
];

/// Scores a verification from its record, documents, and provider results.
///
/// All inputs are passed in, including the clock instant, so a given call is
/// reproducible after the fact.
#[derive(Clone, Debug, Default)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Run a full assessment. Never fails: any internal error degrades to a
    /// HIGH / 80 result with a single `assessment_error` factor and forced
    /// manual review.
    pub fn assess(
        &self,
        record: &VerificationRecord,
        documents: &[DocumentRecord],
        business: Option<&ProviderOutcome>,
        sanctions: Option<&ProviderOutcome>,
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        match self.try_assess(record, documents, business, sanctions, now) {
            Ok(assessment) => assessment,
            Err(err) => {
                error!(
                    verification_id = %record.id,
                    error = %err,
                    "Risk assessment failed, falling back to high risk"
                );
                RiskAssessment {
                    risk_level: RiskLevel::High,
                    risk_score: 80.0,
                    factors: vec![RiskFactor::new(
                        FactorCategory::System,
                        "assessment_error",
                        Impact::High,
                        80.0,
                        format!("Risk assessment could not complete: {err}"),
                    )],
                    recommendations: vec![
                        "Route to manual review; automated assessment failed".to_string(),
                    ],
                    requires_manual_review: true,
                }
            }
        }
    }

    fn try_assess(
        &self,
        record: &VerificationRecord,
        documents: &[DocumentRecord],
        business: Option<&ProviderOutcome>,
        sanctions: Option<&ProviderOutcome>,
        now: DateTime<Utc>,
    ) -> KycResult<RiskAssessment> {
        let mut factors = Vec::new();

        self.geographic_factors(record, &mut factors);
        self.document_factors(documents, &mut factors);
        self.identity_factors(record, now, &mut factors);
        if record.kind.needs_business_check() {
            self.business_factors(record, business, &mut factors);
        }
        self.sanctions_factors(record, sanctions, &mut factors);
        self.behavioral_factors(record, &mut factors);

        let raw: f64 = factors.iter().map(|f| f.score).sum();
        let risk_score = raw.clamp(0.0, 100.0);
        let risk_level = RiskLevel::from_score(risk_score);
        let requires_manual_review = risk_level >= RiskLevel::High
            || factors
                .iter()
                .any(|f| ALWAYS_MANUAL.contains(&f.factor.as_str()));
        let recommendations = recommendations_for(&factors, requires_manual_review);

        debug!(
            verification_id = %record.id,
            score = risk_score,
            level = %risk_level,
            factor_count = factors.len(),
            "Risk assessment complete"
        );

        Ok(RiskAssessment {
            risk_level,
            risk_score,
            factors,
            recommendations,
            requires_manual_review,
        })
    }

    fn geographic_factors(&self, record: &VerificationRecord, out: &mut Vec<RiskFactor>) {
        let cfg = &self.config;
        // Business-only records carry no personal residence country, so the
        // registered business country stands in for it.
        let country = record.country.as_ref().or(record.business_country.as_ref());
        if let Some(country) = country {
            if contains(&cfg.high_risk_countries, country) {
                out.push(RiskFactor::new(
                    FactorCategory::Geographic,
                    "high_risk_country",
                    Impact::High,
                    cfg.high_risk_country_points,
                    format!("Residence country {country} is on the high-risk list"),
                ));
            } else if contains(&cfg.medium_risk_countries, country) {
                out.push(RiskFactor::new(
                    FactorCategory::Geographic,
                    "medium_risk_country",
                    Impact::Medium,
                    cfg.medium_risk_country_points,
                    format!("Residence country {country} is on the medium-risk list"),
                ));
            }
        }
        if let Some(nationality) = &record.nationality {
            if contains(&cfg.high_risk_countries, nationality) {
                out.push(RiskFactor::new(
                    FactorCategory::Geographic,
                    "high_risk_nationality",
                    Impact::High,
                    cfg.high_risk_nationality_points,
                    format!("Nationality {nationality} is on the high-risk list"),
                ));
            }
        }
        if let (Some(country), Some(nationality)) = (country, &record.nationality) {
            if !country.eq_ignore_ascii_case(nationality) {
                out.push(RiskFactor::new(
                    FactorCategory::Geographic,
                    "country_mismatch",
                    Impact::Low,
                    cfg.country_mismatch_points,
                    "Residence country differs from nationality",
                ));
            }
        }
    }

    fn document_factors(&self, documents: &[DocumentRecord], out: &mut Vec<RiskFactor>) {
        let cfg = &self.config;
        if documents.is_empty() {
            out.push(RiskFactor::new(
                FactorCategory::Documents,
                "no_documents",
                Impact::High,
                cfg.no_documents_points,
                "No documents uploaded for this verification",
            ));
            return;
        }
        // One factor per condition no matter how many documents trip it.
        let poor = documents
            .iter()
            .filter(|d| d.quality_rating == Some(DocumentQuality::Poor))
            .count();
        if poor > 0 {
            out.push(RiskFactor::new(
                FactorCategory::Documents,
                "poor_document_quality",
                Impact::Medium,
                cfg.poor_quality_points,
                format!("{poor} document(s) rated poor quality"),
            ));
        }
        let expired = documents.iter().filter(|d| d.is_expired).count();
        if expired > 0 {
            out.push(RiskFactor::new(
                FactorCategory::Documents,
                "expired_document",
                Impact::Medium,
                cfg.expired_document_points,
                format!("{expired} document(s) past their expiry date"),
            ));
        }
        let low_ocr = documents
            .iter()
            .filter(|d| {
                d.ocr_confidence
                    .map_or(false, |c| c < cfg.ocr_confidence_floor)
            })
            .count();
        if low_ocr > 0 {
            out.push(RiskFactor::new(
                FactorCategory::Documents,
                "low_ocr_confidence",
                Impact::Medium,
                cfg.low_ocr_confidence_points,
                format!("{low_ocr} document(s) with text extraction confidence below threshold"),
            ));
        }
        let inauthentic = documents
            .iter()
            .filter(|d| d.is_authentic == Some(false))
            .count();
        if inauthentic > 0 {
            out.push(RiskFactor::new(
                FactorCategory::Documents,
                "inauthentic_documents",
                Impact::High,
                cfg.inauthentic_document_points,
                format!("{inauthentic} document(s) failed the authenticity check"),
            ));
        }
    }

    fn identity_factors(
        &self,
        record: &VerificationRecord,
        now: DateTime<Utc>,
        out: &mut Vec<RiskFactor>,
    ) {
        let cfg = &self.config;
        let incomplete = record.first_name.is_none()
            || record.last_name.is_none()
            || record.date_of_birth.is_none();
        if incomplete {
            out.push(RiskFactor::new(
                FactorCategory::Identity,
                "incomplete_personal_details",
                Impact::Low,
                cfg.incomplete_personal_points,
                "Personal details are incomplete",
            ));
        }
        if let Some(dob) = record.date_of_birth {
            let age = age_on(dob, now);
            if age < cfg.minimum_age {
                out.push(RiskFactor::new(
                    FactorCategory::Identity,
                    "minor_applicant",
                    Impact::High,
                    cfg.minor_applicant_points,
                    format!("Applicant age {age} is below the minimum of {}", cfg.minimum_age),
                ));
            } else if age > cfg.maximum_plausible_age {
                out.push(RiskFactor::new(
                    FactorCategory::Identity,
                    "implausible_age",
                    Impact::Medium,
                    cfg.unusual_age_points,
                    format!("Applicant age {age} is implausibly high"),
                ));
            }
        }
        if let Some(name) = record.full_name() {
            if self.looks_fraudulent(&name) {
                out.push(RiskFactor::new(
                    FactorCategory::Identity,
                    "suspicious_name",
                    Impact::Medium,
                    cfg.fraud_name_points,
                    "Submitted name matches a known fraud pattern",
                ));
            }
        }
    }

    fn business_factors(
        &self,
        record: &VerificationRecord,
        business: Option<&ProviderOutcome>,
        out: &mut Vec<RiskFactor>,
    ) {
        let cfg = &self.config;
        let incomplete =
            record.business_name.is_none() || record.business_registration_number.is_none();
        if incomplete {
            out.push(RiskFactor::new(
                FactorCategory::Business,
                "incomplete_business_details",
                Impact::Medium,
                cfg.incomplete_business_points,
                "Business details are incomplete",
            ));
        }
        if business.map_or(false, |b| !b.success) {
            out.push(RiskFactor::new(
                FactorCategory::Business,
                "business_verification_failed",
                Impact::High,
                cfg.business_verification_failed_points,
                "Business registry verification did not succeed",
            ));
        }
        if let Some(business_type) = &record.business_type {
            if contains(&cfg.high_risk_business_types, business_type) {
                out.push(RiskFactor::new(
                    FactorCategory::Business,
                    "high_risk_business_type",
                    Impact::High,
                    cfg.high_risk_business_points,
                    format!("Business type {business_type} is high risk"),
                ));
            }
        }
    }

    fn sanctions_factors(
        &self,
        record: &VerificationRecord,
        sanctions: Option<&ProviderOutcome>,
        out: &mut Vec<RiskFactor>,
    ) {
        let cfg = &self.config;
        if !record.sanctions_checked {
            return;
        }
        if record.sanctions_clear == Some(false) {
            out.push(RiskFactor::new(
                FactorCategory::Sanctions,
                "sanctions_match",
                Impact::High,
                cfg.sanctions_match_points,
                "Applicant matched a sanctions list",
            ));
        } else if sanctions.map_or(false, |s| s.success && s.confidence < cfg.sanctions_confidence_floor) {
            out.push(RiskFactor::new(
                FactorCategory::Sanctions,
                "sanctions_uncertainty",
                Impact::Medium,
                cfg.sanctions_uncertainty_points,
                "Sanctions screening passed with below-threshold confidence",
            ));
        }
    }

    fn behavioral_factors(&self, record: &VerificationRecord, out: &mut Vec<RiskFactor>) {
        // UTC hours; submission timestamps are stored in UTC.
        if let Some(submitted) = record.submitted_at {
            let hour = submitted.hour();
            if hour >= 22 || hour < 6 {
                out.push(RiskFactor::new(
                    FactorCategory::Behavioral,
                    "night_submission",
                    Impact::Low,
                    self.config.night_submission_points,
                    "Submitted during unusual hours",
                ));
            }
        }
    }

    fn looks_fraudulent(&self, name: &str) -> bool {
        let normalized = name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if self
            .config
            .fraud_name_patterns
            .iter()
            .any(|p| normalized.contains(p.as_str()))
        {
            return true;
        }
        // Three or more consecutive digits in a name is a test-data tell.
        let mut run = 0;
        for ch in normalized.chars() {
            if ch.is_ascii_digit() {
                run += 1;
                if run >= 3 {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    }
}

fn contains(list: &[String], value: &str) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(value))
}

fn age_on(dob: chrono::NaiveDate, now: DateTime<Utc>) -> i32 {
    let today = now.date_naive();
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

fn recommendations_for(factors: &[RiskFactor], manual: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        if !out.iter().any(|existing| existing == s) {
            out.push(s.to_string());
        }
    };
    for factor in factors {
        match factor.factor.as_str() {
            "sanctions_match" => push("Escalate to compliance; potential sanctions list match"),
            "sanctions_uncertainty" => push("Re-run sanctions screening with additional identifiers"),
            "high_risk_country" | "high_risk_nationality" => {
                push("Apply enhanced due diligence for high-risk jurisdiction")
            }
            "inauthentic_documents" => {
                push("Request original documents through an alternate channel")
            }
            "poor_document_quality" | "low_ocr_confidence" => {
                push("Request higher-quality document scans")
            }
            "expired_document" => push("Request current, unexpired documents"),
            "no_documents" => push("Request the required documents before assessment"),
            "incomplete_personal_details" | "incomplete_business_details" => {
                push("Request the missing profile details")
            }
            "minor_applicant" => push("Verify applicant age; applicants must be 18 or older"),
            "implausible_age" => push("Verify the stated date of birth against documents"),
            "suspicious_name" => push("Verify the applicant name against identity documents"),
            "business_verification_failed" => {
                push("Manually confirm business registration with the registry")
            }
            "high_risk_business_type" => push("Apply industry-specific enhanced monitoring"),
            _ => {}
        }
    }
    if manual {
        push("Route to manual review");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use kyc_types::{DocumentType, MerchantId, VerificationId, VerificationKind};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn clean_individual() -> VerificationRecord {
        let mut record = VerificationRecord::new(MerchantId::new(), VerificationKind::Individual);
        record.first_name = Some("Amira".into());
        record.last_name = Some("Haddad".into());
        record.date_of_birth = Some(NaiveDate::from_ymd_opt(1990, 5, 4).unwrap());
        record.nationality = Some("France".into());
        record.country = Some("France".into());
        record.sanctions_checked = true;
        record.sanctions_clear = Some(true);
        record.submitted_at = Some(noon());
        record
    }

    fn good_document(verification_id: VerificationId) -> DocumentRecord {
        let mut doc = DocumentRecord::new(
            verification_id,
            DocumentType::Passport,
            "passport.jpg",
            "kyc-documents/m/passport.jpg",
            200_000,
            "image/jpeg",
            "deadbeef",
        );
        doc.quality_score = Some(92.0);
        doc.quality_rating = Some(DocumentQuality::Excellent);
        doc.ocr_confidence = Some(96.0);
        doc.is_authentic = Some(true);
        doc
    }

    #[test]
    fn clean_profile_scores_low() {
        let engine = RiskEngine::default();
        let record = clean_individual();
        let docs = vec![good_document(record.id)];
        let sanctions = ProviderOutcome::clear(99.0, "scr-1");

        let assessment = engine.assess(&record, &docs, None, Some(&sanctions), noon());
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.risk_score, 0.0);
        assert!(assessment.factors.is_empty());
        assert!(!assessment.requires_manual_review);
    }

    #[test]
    fn sanctions_match_pins_the_score_at_the_cap() {
        let engine = RiskEngine::default();
        let mut record = clean_individual();
        record.sanctions_clear = Some(false);
        record.country = Some("Iran".into());
        record.nationality = Some("Iran".into());
        let docs = vec![good_document(record.id)];

        let assessment = engine.assess(&record, &docs, None, None, noon());
        assert_eq!(assessment.risk_score, 100.0);
        assert_eq!(assessment.risk_level, RiskLevel::VeryHigh);
        assert!(assessment.requires_manual_review);
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "sanctions_match"));
    }

    #[test]
    fn missing_documents_add_fifty_points() {
        let engine = RiskEngine::default();
        let record = clean_individual();

        let assessment = engine.assess(&record, &[], None, None, noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "no_documents" && f.score == 50.0));
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert!(assessment.requires_manual_review);
    }

    #[test]
    fn inauthentic_document_forces_manual_review_at_any_score() {
        let engine = RiskEngine::default();
        let record = clean_individual();
        let mut doc = good_document(record.id);
        doc.is_authentic = Some(false);

        let assessment = engine.assess(&record, &[doc], None, None, noon());
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert!(assessment.requires_manual_review);
    }

    #[test]
    fn low_sanctions_confidence_adds_uncertainty_factor() {
        let engine = RiskEngine::default();
        let record = clean_individual();
        let docs = vec![good_document(record.id)];
        let sanctions = ProviderOutcome::clear(90.0, "scr-2");

        let assessment = engine.assess(&record, &docs, None, Some(&sanctions), noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "sanctions_uncertainty" && f.score == 15.0));
    }

    #[test]
    fn business_bucket_only_runs_for_business_kinds() {
        let engine = RiskEngine::default();
        let failed = ProviderOutcome::failure("not_found", "biz-1", vec!["no match".into()]);

        let individual = clean_individual();
        let docs = vec![good_document(individual.id)];
        let assessment = engine.assess(&individual, &docs, Some(&failed), None, noon());
        assert!(!assessment
            .factors
            .iter()
            .any(|f| f.category == FactorCategory::Business));

        let mut business = clean_individual();
        business.kind = VerificationKind::Business;
        business.business_name = Some("Acme Ltd".into());
        business.business_registration_number = Some("123456".into());
        business.business_type = Some("gambling".into());
        business.business_country = Some("France".into());
        let assessment = engine.assess(&business, &docs, Some(&failed), None, noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "business_verification_failed"));
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "high_risk_business_type"));
    }

    #[test]
    fn minor_applicant_is_flagged() {
        let engine = RiskEngine::default();
        let mut record = clean_individual();
        record.date_of_birth = Some(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        let docs = vec![good_document(record.id)];

        let assessment = engine.assess(&record, &docs, None, None, noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "minor_applicant"));
        assert!(assessment.requires_manual_review);
    }

    #[test]
    fn test_names_are_flagged() {
        let engine = RiskEngine::default();
        let mut record = clean_individual();
        record.first_name = Some("John".into());
        record.last_name = Some("Doe".into());
        let docs = vec![good_document(record.id)];
        let assessment = engine.assess(&record, &docs, None, None, noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "suspicious_name"));

        let mut record = clean_individual();
        record.last_name = Some("Haddad123".into());
        let assessment = engine.assess(&record, &docs, None, None, noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "suspicious_name"));
    }

    #[test]
    fn night_submission_adds_behavioral_factor() {
        let engine = RiskEngine::default();
        let mut record = clean_individual();
        record.submitted_at = Some(Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap());
        let docs = vec![good_document(record.id)];

        let assessment = engine.assess(&record, &docs, None, None, noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "night_submission" && f.score == 5.0));
    }

    #[test]
    fn repeated_document_conditions_score_once() {
        let engine = RiskEngine::default();
        let record = clean_individual();
        let mut blurry_a = good_document(record.id);
        blurry_a.quality_score = Some(30.0);
        blurry_a.quality_rating = Some(DocumentQuality::Poor);
        let mut blurry_b = good_document(record.id);
        blurry_b.document_type = DocumentType::ProofOfAddress;
        blurry_b.quality_score = Some(20.0);
        blurry_b.quality_rating = Some(DocumentQuality::Poor);

        let assessment = engine.assess(&record, &[blurry_a, blurry_b], None, None, noon());
        let quality_points: f64 = assessment
            .factors
            .iter()
            .filter(|f| f.factor == "poor_document_quality")
            .map(|f| f.score)
            .sum();
        assert_eq!(quality_points, 20.0);
        assert_eq!(
            assessment
                .factors
                .iter()
                .filter(|f| f.factor == "poor_document_quality")
                .count(),
            1
        );
    }

    #[test]
    fn business_country_stands_in_when_residence_is_absent() {
        let engine = RiskEngine::default();
        let mut record = VerificationRecord::new(MerchantId::new(), VerificationKind::Business);
        record.business_name = Some("Acme Ltd".into());
        record.business_registration_number = Some("123456".into());
        record.business_country = Some("Iran".into());
        record.sanctions_checked = true;
        record.sanctions_clear = Some(true);
        let docs = vec![good_document(record.id)];
        let verified = ProviderOutcome::clear(97.0, "biz-2");

        let assessment = engine.assess(&record, &docs, Some(&verified), None, noon());
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.factor == "high_risk_country"));
    }

    #[test]
    fn minimal_profiles_are_not_penalised_as_incomplete() {
        let engine = RiskEngine::default();
        let mut record = clean_individual();
        record.nationality = None;
        record.country = None;
        let docs = vec![good_document(record.id)];
        let assessment = engine.assess(&record, &docs, None, None, noon());
        assert!(!assessment
            .factors
            .iter()
            .any(|f| f.factor == "incomplete_personal_details"));

        let mut business = clean_individual();
        business.kind = VerificationKind::Business;
        business.business_name = Some("Acme Ltd".into());
        business.business_registration_number = Some("123456".into());
        let verified = ProviderOutcome::clear(97.0, "biz-3");
        let assessment = engine.assess(&business, &docs, Some(&verified), None, noon());
        assert!(!assessment
            .factors
            .iter()
            .any(|f| f.factor == "incomplete_business_details"));
    }

    #[test]
    fn recommendations_are_deduplicated() {
        let engine = RiskEngine::default();
        let record = clean_individual();
        let mut blurry_a = good_document(record.id);
        blurry_a.quality_score = Some(30.0);
        blurry_a.quality_rating = Some(DocumentQuality::Poor);
        let mut blurry_b = good_document(record.id);
        blurry_b.document_type = DocumentType::ProofOfAddress;
        blurry_b.quality_score = Some(20.0);
        blurry_b.quality_rating = Some(DocumentQuality::Poor);

        let assessment = engine.assess(&record, &[blurry_a, blurry_b], None, None, noon());
        let quality_recs = assessment
            .recommendations
            .iter()
            .filter(|r| r.contains("higher-quality"))
            .count();
        assert_eq!(quality_recs, 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn score_is_always_within_bounds(
                quality in 0.0f64..100.0,
                ocr in 0.0f64..100.0,
                expired in any::<bool>(),
                authentic in any::<bool>(),
                clear in any::<bool>(),
            ) {
                let engine = RiskEngine::default();
                let mut record = clean_individual();
                record.sanctions_clear = Some(clear);
                record.country = Some("Iran".into());
                record.nationality = Some("Somalia".into());
                let mut doc = good_document(record.id);
                doc.quality_score = Some(quality);
                doc.quality_rating = Some(DocumentQuality::from_score(quality));
                doc.ocr_confidence = Some(ocr);
                doc.is_expired = expired;
                doc.is_authentic = Some(authentic);

                let first = engine.assess(&record, &[doc.clone()], None, None, noon());
                let second = engine.assess(&record, &[doc], None, None, noon());

                prop_assert!((0.0..=100.0).contains(&first.risk_score));
                prop_assert_eq!(first.risk_score, second.risk_score);
                prop_assert_eq!(first.factors.len(), second.factors.len());
            }
        }
    }
}
