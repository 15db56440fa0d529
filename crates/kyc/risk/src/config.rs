/// Tuned constants for the risk engine.
///
/// The point values and lists below are compliance-team configuration; the
/// defaults are the production values and are preserved exactly for
/// compatibility across re-runs of historical assessments.
#[derive(Clone, Debug)]
pub struct RiskConfig {
    pub high_risk_countries: Vec<String>,
    pub medium_risk_countries: Vec<String>,
    pub high_risk_business_types: Vec<String>,
    /// Whitespace-normalized name fragments that flag fraud-test submissions.
    pub fraud_name_patterns: Vec<String>,

    // Geographic
    pub high_risk_country_points: f64,
    pub high_risk_nationality_points: f64,
    pub medium_risk_country_points: f64,
    pub country_mismatch_points: f64,

    // Documents
    pub no_documents_points: f64,
    pub poor_quality_points: f64,
    pub expired_document_points: f64,
    pub low_ocr_confidence_points: f64,
    pub ocr_confidence_floor: f64,
    pub inauthentic_document_points: f64,

    // Identity
    pub incomplete_personal_points: f64,
    pub minor_applicant_points: f64,
    pub unusual_age_points: f64,
    pub fraud_name_points: f64,
    pub minimum_age: i32,
    pub maximum_plausible_age: i32,

    // Business
    pub incomplete_business_points: f64,
    pub business_verification_failed_points: f64,
    pub high_risk_business_points: f64,

    // Sanctions
    pub sanctions_match_points: f64,
    pub sanctions_uncertainty_points: f64,
    pub sanctions_confidence_floor: f64,

    // Behavioral
    pub night_submission_points: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_risk_countries: to_strings(&[
                "Afghanistan",
                "Iran",
                "North Korea",
                "Syria",
                "Yemen",
                "Somalia",
                "Libya",
                "Iraq",
                "Sudan",
                "Venezuela",
            ]),
            medium_risk_countries: to_strings(&[
                "Russia", "China", "Pakistan", "Nigeria", "Myanmar", "Belarus", "Cuba",
                "Lebanon", "Turkey",
            ]),
            high_risk_business_types: to_strings(&[
                "money_service_business",
                "cryptocurrency",
                "gambling",
                "adult_entertainment",
                "weapons",
                "tobacco",
            ]),
            fraud_name_patterns: to_strings(&[
                "test user",
                "fake name",
                "john doe",
                "jane doe",
                "admin",
                "null",
                "undefined",
            ]),

            high_risk_country_points: 30.0,
            high_risk_nationality_points: 25.0,
            medium_risk_country_points: 15.0,
            country_mismatch_points: 5.0,

            no_documents_points: 50.0,
            poor_quality_points: 20.0,
            expired_document_points: 25.0,
            low_ocr_confidence_points: 15.0,
            ocr_confidence_floor: 70.0,
            inauthentic_document_points: 40.0,

            incomplete_personal_points: 10.0,
            minor_applicant_points: 30.0,
            unusual_age_points: 15.0,
            fraud_name_points: 20.0,
            minimum_age: 18,
            maximum_plausible_age: 100,

            incomplete_business_points: 25.0,
            business_verification_failed_points: 35.0,
            high_risk_business_points: 30.0,

            sanctions_match_points: 100.0,
            sanctions_uncertainty_points: 15.0,
            sanctions_confidence_floor: 95.0,

            night_submission_points: 5.0,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
