//! Aggregates a finished (or in-flight) job's per-file results into
//! statistics and a structured report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use pdfbatch_core::JobRecord;
use serde::Serialize;

/// Derived statistics for a job, computed from an (owned) snapshot of its
/// record.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatistics {
    pub job_id: String,
    pub operation: String,
    pub status: String,
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub success_rate: f64,
    pub job_duration_seconds: f64,
    pub total_processing_time_seconds: f64,
    pub average_processing_time_seconds: f64,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub total_warnings: usize,
    pub total_errors: usize,
}

/// The six categories per-file error messages are sorted into. Substring
/// match, case-insensitive, first match wins in the order listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    FileNotFound,
    PermissionError,
    CorruptedFile,
    MemoryError,
    TimeoutError,
    UnknownError,
}

/// Categorizes a per-file result message, per §4.6's substring rules.
pub fn categorize_error(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("file not found") || lower.contains("does not exist") {
        ErrorCategory::FileNotFound
    } else if lower.contains("permission") || lower.contains("access") {
        ErrorCategory::PermissionError
    } else if lower.contains("corrupted") || lower.contains("invalid pdf") {
        ErrorCategory::CorruptedFile
    } else if lower.contains("memory") {
        ErrorCategory::MemoryError
    } else if lower.contains("timeout") || lower.contains("timed out") {
        ErrorCategory::TimeoutError
    } else {
        ErrorCategory::UnknownError
    }
}

/// Computes [`JobStatistics`] for `record` as it stands right now.
pub(crate) fn statistics(record: &JobRecord) -> JobStatistics {
    let total_processing_time_seconds: f64 = record
        .results
        .iter()
        .map(|outcome| outcome.execution_time_seconds)
        .sum();
    let average_processing_time_seconds = if record.results.is_empty() {
        0.0
    } else {
        total_processing_time_seconds / record.results.len() as f64
    };
    let success_rate = if record.total_files == 0 {
        0.0
    } else {
        record.processed_files as f64 / record.total_files as f64 * 100.0
    };
    let job_duration_seconds = match record.started_at {
        None => 0.0,
        Some(started_at) => {
            let end = record.completed_at.unwrap_or_else(Utc::now);
            (end - started_at).num_milliseconds() as f64 / 1000.0
        }
    };
    let successful_operations = record.results.iter().filter(|o| o.success).count();
    let failed_operations = record.results.iter().filter(|o| !o.success).count();
    let total_warnings = record.results.iter().map(|o| o.warnings.len()).sum();
    let total_errors = record.results.iter().map(|o| o.errors.len()).sum();

    JobStatistics {
        job_id: record.id.to_string(),
        operation: record.operation.clone(),
        status: format!("{:?}", record.status).to_lowercase(),
        total_files: record.total_files,
        processed_files: record.processed_files,
        failed_files: record.failed_files,
        success_rate,
        job_duration_seconds,
        total_processing_time_seconds,
        average_processing_time_seconds,
        created_at: record.created_at.to_rfc3339(),
        started_at: record.started_at.map(|t| t.to_rfc3339()),
        completed_at: record.completed_at.map(|t| t.to_rfc3339()),
        successful_operations,
        failed_operations,
        total_warnings,
        total_errors,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub operation: String,
    pub status: String,
    pub total_files: usize,
    pub success_rate: f64,
    pub execution_time: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file_index: usize,
    pub file_path: PathBuf,
    pub success: bool,
    pub execution_time: f64,
    pub output_files: Vec<PathBuf>,
    pub warnings_count: usize,
    pub errors_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    pub total_errors: usize,
    pub total_warnings: usize,
    pub failed_files: usize,
    pub error_types: BTreeMap<ErrorCategory, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub average_processing_time: f64,
    pub total_processing_time: f64,
    pub throughput_files_per_second: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_summary: JobSummary,
    pub file_results: Vec<FileResult>,
    pub error_summary: ErrorSummary,
    pub performance_metrics: PerformanceMetrics,
    pub recommendations: Vec<String>,
}

/// Builds the full structured report for `record`.
pub(crate) fn report(record: &JobRecord) -> JobReport {
    let stats = statistics(record);

    let job_summary = JobSummary {
        job_id: stats.job_id.clone(),
        operation: stats.operation.clone(),
        status: stats.status.clone(),
        total_files: stats.total_files,
        success_rate: stats.success_rate,
        execution_time: stats.job_duration_seconds,
    };

    // One row per outcome actually recorded; files never reached (e.g. after
    // cancellation or stop_on_error) have no outcome and are omitted.
    let file_results = record
        .results
        .iter()
        .enumerate()
        .map(|(index, outcome)| FileResult {
            file_index: index + 1,
            file_path: record.files.get(index).cloned().unwrap_or_default(),
            success: outcome.success,
            execution_time: outcome.execution_time_seconds,
            output_files: outcome.output_files.clone(),
            warnings_count: outcome.warnings.len(),
            errors_count: outcome.errors.len(),
            error_message: (!outcome.success).then(|| outcome.message.clone()),
        })
        .collect::<Vec<_>>();

    let mut error_types: BTreeMap<ErrorCategory, usize> = BTreeMap::new();
    for outcome in record.results.iter().filter(|o| !o.success) {
        *error_types.entry(categorize_error(&outcome.message)).or_insert(0) += 1;
    }

    let error_summary = ErrorSummary {
        total_errors: stats.total_errors,
        total_warnings: stats.total_warnings,
        failed_files: stats.failed_files,
        error_types,
    };

    let throughput_files_per_second = if stats.job_duration_seconds > 0.0 {
        stats.total_files as f64 / stats.job_duration_seconds
    } else {
        0.0
    };
    let performance_metrics = PerformanceMetrics {
        average_processing_time: stats.average_processing_time_seconds,
        total_processing_time: stats.total_processing_time_seconds,
        throughput_files_per_second,
    };

    let recommendations = recommendations(record, &stats);

    JobReport {
        job_summary,
        file_results,
        error_summary,
        performance_metrics,
        recommendations,
    }
}

/// Advisory suggestions driven by the thresholds in §7.
fn recommendations(record: &JobRecord, stats: &JobStatistics) -> Vec<String> {
    let mut out = Vec::new();

    if stats.success_rate < 50.0 {
        out.push("Consider checking file integrity before batch processing".to_string());
    }
    if stats.average_processing_time_seconds > 10.0 {
        out.push("Consider reducing batch size for better performance".to_string());
    }
    if stats.total_errors as f64 > stats.total_files as f64 * 0.2 {
        out.push("High error rate detected - review input files and parameters".to_string());
    }
    if record.operation == "compress" && stats.success_rate > 90.0 {
        out.push("Consider using higher compression levels for better size reduction".to_string());
    }
    if record.operation == "ocr" && stats.failed_operations > 0 {
        out.push("OCR failures may indicate scanned PDFs - try image preprocessing".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfbatch_core::{JobStatus, OperationOutcome, OperationParams};

    fn outcome(success: bool, message: &str) -> OperationOutcome {
        OperationOutcome {
            success,
            message: message.to_string(),
            output_files: vec![],
            execution_time_seconds: 0.1,
            warnings: vec![],
            errors: if success { vec![] } else { vec![message.to_string()] },
        }
    }

    #[test]
    fn categorizes_every_listed_substring() {
        assert_eq!(categorize_error("File not found"), ErrorCategory::FileNotFound);
        assert_eq!(categorize_error("does not exist"), ErrorCategory::FileNotFound);
        assert_eq!(categorize_error("Permission denied"), ErrorCategory::PermissionError);
        assert_eq!(categorize_error("no access"), ErrorCategory::PermissionError);
        assert_eq!(categorize_error("Invalid PDF: corrupted"), ErrorCategory::CorruptedFile);
        assert_eq!(categorize_error("out of memory"), ErrorCategory::MemoryError);
        assert_eq!(categorize_error("operation timed out"), ErrorCategory::TimeoutError);
        assert_eq!(categorize_error("something weird"), ErrorCategory::UnknownError);
    }

    #[test]
    fn s2_partial_failure_matches_scenario_expectations() {
        let mut record = JobRecord::new(
            "extract_text".into(),
            vec!["good.pdf".into(), "bad.pdf".into(), "good.pdf".into()],
            OperationParams::new(),
        );
        record.status = JobStatus::Completed;
        record.started_at = Some(Utc::now());
        record.completed_at = Some(Utc::now());
        record.processed_files = 2;
        record.failed_files = 1;
        record.results = vec![
            outcome(true, "ok"),
            outcome(false, "Invalid PDF: corrupted"),
            outcome(true, "ok"),
        ];

        let stats = statistics(&record);
        assert!((stats.success_rate - 66.666_666_666_666_67).abs() < 1e-9);

        let rep = report(&record);
        assert_eq!(rep.error_summary.error_types.get(&ErrorCategory::CorruptedFile), Some(&1));
        assert!(!rep
            .recommendations
            .contains(&"Consider checking file integrity before batch processing".to_string()));
    }

    #[test]
    fn low_success_rate_triggers_file_integrity_recommendation() {
        let mut record = JobRecord::new(
            "extract_text".into(),
            vec!["a.pdf".into(), "b.pdf".into()],
            OperationParams::new(),
        );
        record.status = JobStatus::Completed;
        record.started_at = Some(Utc::now());
        record.completed_at = Some(Utc::now());
        record.processed_files = 0;
        record.failed_files = 2;
        record.results = vec![outcome(false, "bad"), outcome(false, "bad")];

        let rep = report(&record);
        assert!(rep
            .recommendations
            .contains(&"Consider checking file integrity before batch processing".to_string()));
    }

    #[test]
    fn compress_with_high_success_rate_suggests_higher_compression() {
        let mut record = JobRecord::new(
            "compress".into(),
            vec!["a.pdf".into(), "b.pdf".into()],
            OperationParams::new(),
        );
        record.status = JobStatus::Completed;
        record.started_at = Some(Utc::now());
        record.completed_at = Some(Utc::now());
        record.processed_files = 2;
        record.results = vec![outcome(true, "ok"), outcome(true, "ok")];

        let rep = report(&record);
        assert!(rep.recommendations.contains(
            &"Consider using higher compression levels for better size reduction".to_string()
        ));
    }
}
