//! Human-readable run messages.

use crate::claim::{AccountResult, ClaimOutcome};
use crate::error::ConfigError;
use crate::guard::days_in_month;
use crate::orchestrator::RunReport;

/// Username as shown in reports: the part before `@`, if any.
fn display_name(username: &str) -> &str {
    username.split('@').next().unwrap_or(username)
}

fn outcome_text(result: &AccountResult, month_days: Option<u32>) -> String {
    let progress = match month_days {
        Some(total) => format!("{}/{} DAYS", result.days_claimed_total, total),
        None => format!("{} DAYS", result.days_claimed_total),
    };
    match result.outcome {
        ClaimOutcome::NewlyClaimed => format!("CLAIM COMPLETED, CLAIMED: {progress}"),
        ClaimOutcome::AlreadyClaimed => format!("ALREADY CLAIMED: {progress}"),
        ClaimOutcome::Failed(kind) => match &result.detail {
            Some(detail) => format!("ERROR: {kind} ({detail})"),
            None => format!("ERROR: {kind}"),
        },
    }
}

/// One line per account in input order, then the summary.
pub fn format_report(report: &RunReport) -> String {
    let month_days = days_in_month(&report.period_key);
    let width = report
        .results
        .iter()
        .map(|r| display_name(&r.username).chars().count())
        .max()
        .unwrap_or(0);

    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|r| {
            format!(
                "{:<width$}: {}",
                display_name(&r.username),
                outcome_text(r, month_days),
                width = width
            )
        })
        .collect();

    lines.push(format!(
        "Summary: {} succeeded, {} failed",
        report.success_count, report.fail_count
    ));
    match report.fail_count {
        0 if report.success_count > 0 => lines.push("(➜ SUCCESSFULLY CLAIMED!)".to_string()),
        0 => {}
        1 => lines.push("1 failed attempt.".to_string()),
        n => lines.push(format!("{n} failed attempts.")),
    }
    lines.join("\n")
}

/// Message sent when the period already had a successful run.
pub fn format_skipped(period_key: &str) -> String {
    format!("Daily claim skipped: already ran for {period_key}.")
}

/// Message sent when the run could not start.
pub fn format_config_error(err: &ConfigError) -> String {
    format!("Daily claim aborted before any account was processed: {err}")
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::claim::ErrorKind;

    fn report(results: Vec<AccountResult>) -> RunReport {
        RunReport::new(Uuid::new_v4(), "2026-10-18", results)
    }

    #[test]
    fn test_lines_in_order_with_padding() {
        let msg = format_report(&report(vec![
            AccountResult::succeeded("al@mail.test", ClaimOutcome::NewlyClaimed, 6),
            AccountResult::succeeded("bobby@mail.test", ClaimOutcome::AlreadyClaimed, 5),
            AccountResult::failed("cy", ErrorKind::InvalidServer, "Invalid server ID"),
        ]));
        let lines: Vec<_> = msg.lines().collect();
        assert_eq!(lines[0], "al   : CLAIM COMPLETED, CLAIMED: 6/31 DAYS");
        assert_eq!(lines[1], "bobby: ALREADY CLAIMED: 5/31 DAYS");
        assert_eq!(lines[2], "cy   : ERROR: InvalidServer (Invalid server ID)");
        assert_eq!(lines[3], "Summary: 2 succeeded, 1 failed");
        assert_eq!(lines[4], "1 failed attempt.");
    }

    #[test]
    fn test_all_success_summary() {
        let msg = format_report(&report(vec![AccountResult::succeeded(
            "a",
            ClaimOutcome::AlreadyClaimed,
            1,
        )]));
        assert!(msg.ends_with("Summary: 1 succeeded, 0 failed\n(➜ SUCCESSFULLY CLAIMED!)"));
    }

    #[test]
    fn test_empty_report_has_no_success_line() {
        let msg = format_report(&report(vec![]));
        assert_eq!(msg, "Summary: 0 succeeded, 0 failed");
        assert!(!msg.contains("SUCCESSFULLY"));
    }

    #[test]
    fn test_plural_failures() {
        let msg = format_report(&report(vec![
            AccountResult::failed("a", ErrorKind::AuthError, "x"),
            AccountResult::failed("b", ErrorKind::NetworkError, "y"),
        ]));
        assert!(msg.ends_with("2 failed attempts."));
    }

    #[test]
    fn test_skipped_and_config_messages() {
        assert!(format_skipped("2026-10-18").contains("2026-10-18"));
        let msg = format_config_error(&ConfigError::MissingEnvVar("DATA_JSON".into()));
        assert!(msg.contains("DATA_JSON"));
    }
}
