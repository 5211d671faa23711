//! Output formatting for CLI

use crate::api::{ExecuteResponse, ExportStatus, TaskStatus};
use crate::catalog::RelationshipCatalog;
use crate::session::SubmissionReport;

/// Collections with their suggested joins
pub fn format_collections(catalog: &RelationshipCatalog) -> String {
    let mut output = String::new();
    output.push_str(&format!("{} collection(s):\n", catalog.len()));

    for collection in catalog.collections() {
        output.push_str(&format!("\n{} ({})\n", collection.label(), collection.key));
        for join in &collection.possible_joins {
            output.push_str(&format!(
                "  -> {}: {} = {} [{}]\n",
                join.collection,
                join.suggested_local_field,
                join.suggested_foreign_field,
                join.relationship_type
            ));
            if !join.description.is_empty() {
                output.push_str(&format!("     {}\n", join.description));
            }
        }
    }

    output
}

pub fn format_report(report: &SubmissionReport) -> String {
    let mut output = String::new();

    if !report.errors.is_empty() {
        output.push_str("\n❌ Errors:\n");
        for error in &report.errors {
            output.push_str(&format!("  - {}\n", error));
        }
    }
    if !report.warnings.is_empty() {
        output.push_str("\n⚠️  Warnings:\n");
        for warning in &report.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    let scope = if report.checked_remotely {
        "local and backend checks"
    } else {
        "local checks"
    };
    if report.valid {
        output.push_str(&format!("\n✅ Configuration is valid ({})\n", scope));
    } else {
        output.push_str(&format!("\n❌ Configuration is invalid ({})\n", scope));
    }
    output
}

pub fn format_submission(response: &ExecuteResponse) -> String {
    let mut output = format!("Export task {} is {}\n", response.task_id, response.status);
    if let Some(url) = &response.download_url {
        output.push_str(&format!("Download: {}\n", url));
    }
    output
}

pub fn format_status(status: &ExportStatus) -> String {
    let mut output = format!("Export task {}: {}", status.task_id, status.status);
    if let Some(progress) = status.progress {
        output.push_str(&format!(" ({:.0}%)", progress));
    }
    output.push('\n');

    match status.status {
        TaskStatus::Completed => {
            if let Some(url) = &status.download_url {
                output.push_str(&format!("Download: {}\n", url));
            }
        }
        TaskStatus::Failed => {
            output.push_str(&format!(
                "Error: {}\n",
                status.error.as_deref().unwrap_or("unknown error")
            ));
        }
        TaskStatus::Pending | TaskStatus::Processing => {}
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectionRelationship, PossibleJoin};

    #[test]
    fn test_format_collections_lists_joins() {
        let catalog = RelationshipCatalog::from_collections([CollectionRelationship::new(
            "students", "Students",
        )
        .with_join(PossibleJoin::new("classes", "class_id", "_id"))]);

        let output = format_collections(&catalog);
        assert!(output.starts_with("1 collection(s):"));
        assert!(output.contains("Students (students)"));
        assert!(output.contains("-> classes: class_id = _id [direct]"));
    }

    #[test]
    fn test_format_failed_status() {
        let status = ExportStatus {
            task_id: "t-1".to_string(),
            status: TaskStatus::Failed,
            progress: Some(40.0),
            download_url: None,
            error: Some("timeout".to_string()),
        };
        assert_eq!(format_status(&status), "Export task t-1: failed (40%)\nError: timeout\n");
    }
}
