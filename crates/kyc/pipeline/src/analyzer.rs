//! Quality assessment and data extraction seam.
//!
//! A deployed pipeline binds this to an OCR/vision service; the heuristic
//! implementation below is deterministic and used for tests and local runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use kyc_types::{DocumentRecord, KycResult};
use serde_json::json;

/// Everything extraction can learn from one document file.
#[derive(Clone, Debug, Default)]
pub struct DocumentAnalysis {
    /// 0-100.
    pub quality_score: f64,
    pub quality_issues: Vec<String>,
    pub ocr_text: Option<String>,
    /// 0-100.
    pub ocr_confidence: Option<f64>,
    pub extracted_data: Option<serde_json::Value>,
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub issuing_authority: Option<String>,
    pub issuing_country: Option<String>,
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, document: &DocumentRecord, bytes: &[u8]) -> KycResult<DocumentAnalysis>;
}

/// File-size based quality scoring with synthetic extraction output.
///
/// Scans under 50 KB lose thirty points as likely too small to read; under
/// 10 KB the score drops below the rejection threshold.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicAnalyzer;

#[async_trait]
impl DocumentAnalyzer for HeuristicAnalyzer {
    async fn analyze(&self, document: &DocumentRecord, bytes: &[u8]) -> KycResult<DocumentAnalysis> {
        let mut score: f64 = 95.0;
        let mut issues = Vec::new();
        if bytes.len() < 50 * 1024 {
            score -= 30.0;
            issues.push("file too small for a readable scan".to_string());
        }
        if bytes.len() < 10 * 1024 {
            score -= 35.0;
            issues.push("resolution below the legibility floor".to_string());
        }

        let confidence = if score >= 50.0 { 96.0 } else { 55.0 };
        let number = document
            .file_hash
            .get(..8)
            .map(|prefix| format!("DOC-{}", prefix.to_uppercase()));
        Ok(DocumentAnalysis {
            quality_score: score.clamp(0.0, 100.0),
            quality_issues: issues,
            ocr_text: Some(format!("{} {}", document.document_type, document.file_name)),
            ocr_confidence: Some(confidence),
            extracted_data: Some(json!({
                "document_type": document.document_type.to_string(),
                "file_name": document.file_name,
                "document_number": number.clone(),
            })),
            document_number: number,
            issue_date: None,
            expiry_date: None,
            issuing_authority: None,
            issuing_country: None,
        })
    }
}

/// Returns the same analysis for every document. Test-side control over the
/// extraction path (expiry dates, low confidence, missing data).
#[derive(Clone, Debug)]
pub struct FixedAnalyzer {
    pub analysis: DocumentAnalysis,
}

impl FixedAnalyzer {
    pub fn new(analysis: DocumentAnalysis) -> Self {
        Self { analysis }
    }
}

#[async_trait]
impl DocumentAnalyzer for FixedAnalyzer {
    async fn analyze(
        &self,
        _document: &DocumentRecord,
        _bytes: &[u8],
    ) -> KycResult<DocumentAnalysis> {
        Ok(self.analysis.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_types::{DocumentType, VerificationId};

    fn doc() -> DocumentRecord {
        DocumentRecord::new(
            VerificationId::new(),
            DocumentType::Passport,
            "passport.jpg",
            "kyc-documents/x/passport.jpg",
            200_000,
            "image/jpeg",
            "0123456789abcdef",
        )
    }

    #[tokio::test]
    async fn large_files_score_high() {
        let analysis = HeuristicAnalyzer
            .analyze(&doc(), &vec![0u8; 200 * 1024])
            .await
            .unwrap();
        assert_eq!(analysis.quality_score, 95.0);
        assert!(analysis.quality_issues.is_empty());
        assert_eq!(analysis.document_number.as_deref(), Some("DOC-01234567"));
    }

    #[tokio::test]
    async fn small_files_lose_points() {
        let analysis = HeuristicAnalyzer
            .analyze(&doc(), &vec![0u8; 20 * 1024])
            .await
            .unwrap();
        assert_eq!(analysis.quality_score, 65.0);
        assert_eq!(analysis.quality_issues.len(), 1);
    }

    #[tokio::test]
    async fn tiny_files_fall_below_the_rejection_threshold() {
        let analysis = HeuristicAnalyzer
            .analyze(&doc(), &vec![0u8; 1024])
            .await
            .unwrap();
        assert_eq!(analysis.quality_score, 30.0);
        assert_eq!(analysis.ocr_confidence, Some(55.0));
    }
}
