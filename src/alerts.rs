use std::collections::HashMap;

use crate::models::{CategoryCount, DashboardStats, HourCount, LogRecord, Student, UserSummary};
use chrono::Timelike;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertBucket {
    Red,
    Blue,
}

impl AlertBucket {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "red" => Some(AlertBucket::Red),
            "blue" => Some(AlertBucket::Blue),
            _ => None,
        }
    }
}

/// Category-to-bucket mapping loaded from the `alert_rules` table. Categories
/// absent from the table belong to no bucket and never raise an alert.
#[derive(Debug, Clone, Default)]
pub struct AlertRules {
    map: HashMap<String, AlertBucket>,
}

impl AlertRules {
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let map = rows
            .into_iter()
            .filter_map(|(category, bucket)| {
                AlertBucket::parse(&bucket).map(|b| (category, b))
            })
            .collect();
        Self { map }
    }

    pub fn bucket(&self, category: &str) -> Option<AlertBucket> {
        self.map.get(category).copied()
    }
}

#[derive(Debug, Clone, Default)]
struct Accum {
    total_duration: i64,
    log_count: i64,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
    has_red_alert: bool,
    has_blue_alert: bool,
}

/// Per-student aggregate over the given logs. Every student appears in the
/// output, including those with no logs at all. Input order is preserved.
pub fn summarize_students(
    students: &[Student],
    logs: &[LogRecord],
    rules: &AlertRules,
) -> Vec<UserSummary> {
    let mut acc: HashMap<&str, Accum> = HashMap::new();
    for log in logs {
        let entry = acc.entry(log.student_id.as_str()).or_default();
        entry.total_duration += log.duration;
        entry.log_count += 1;
        entry.last_activity = Some(match entry.last_activity {
            Some(prev) => prev.max(log.timestamp),
            None => log.timestamp,
        });
        match rules.bucket(&log.category) {
            Some(AlertBucket::Red) => entry.has_red_alert = true,
            Some(AlertBucket::Blue) => entry.has_blue_alert = true,
            None => {}
        }
    }

    students
        .iter()
        .map(|s| {
            let a = acc.get(s.id.as_str()).cloned().unwrap_or_default();
            UserSummary {
                student_id: s.id.clone(),
                student_name: s.full_name.clone(),
                cpf: s.cpf.clone(),
                pc_id: s.pc_id.clone(),
                total_duration: a.total_duration,
                log_count: a.log_count,
                last_activity: a.last_activity,
                has_red_alert: a.has_red_alert,
                has_blue_alert: a.has_blue_alert,
            }
        })
        .collect()
}

/// Headline dashboard numbers: alert totals count logs, not students, so a
/// student with three social-media visits contributes three alerts.
pub fn dashboard_stats(total_students: i64, logs: &[LogRecord], rules: &AlertRules) -> DashboardStats {
    let mut total_alerts = 0;
    let mut ai_detections = 0;
    for log in logs {
        match rules.bucket(&log.category) {
            Some(AlertBucket::Red) => total_alerts += 1,
            Some(AlertBucket::Blue) => ai_detections += 1,
            None => {}
        }
    }
    DashboardStats {
        total_users: total_students,
        total_alerts,
        ai_detections,
        total_logs: logs.len() as i64,
    }
}

/// Log count per category with one-decimal percentages of the total, sorted
/// most frequent first. Empty input yields an empty breakdown.
pub fn category_breakdown(logs: &[LogRecord]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for log in logs {
        *counts.entry(log.category.as_str()).or_default() += 1;
    }
    let total = logs.len() as f64;

    let mut breakdown: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
            percentage: ((count as f64) * 1000.0 / total).round() / 10.0,
        })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    breakdown
}

/// Activity histogram by UTC hour of day. All 24 buckets are always present.
pub fn activity_by_hour(logs: &[LogRecord]) -> Vec<HourCount> {
    let mut counts = [0i64; 24];
    for log in logs {
        counts[log.timestamp.hour() as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourCount {
            hour: hour as u32,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rules() -> AlertRules {
        AlertRules::from_rows(vec![
            ("Rede Social".to_string(), "red".to_string()),
            ("Streaming & Jogos".to_string(), "red".to_string()),
            ("Outros".to_string(), "red".to_string()),
            ("IA".to_string(), "blue".to_string()),
        ])
    }

    fn student(id: &str, name: &str) -> Student {
        Student {
            id: id.to_string(),
            full_name: name.to_string(),
            cpf: None,
            pc_id: None,
        }
    }

    fn log(student_id: &str, category: &str, duration: i64, hour: u32) -> LogRecord {
        LogRecord {
            id: format!("log-{student_id}-{category}-{hour}"),
            student_id: student_id.to_string(),
            student_name: "Aluno Teste".to_string(),
            url: "https://example.com".to_string(),
            duration,
            category: category.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn mixed_categories_set_both_flags_and_sum_durations() {
        let students = vec![student("s1", "Ana")];
        let logs = vec![
            log("s1", "Rede Social", 10, 9),
            log("s1", "IA", 20, 10),
            log("s1", "Outros", 5, 11),
        ];

        let summaries = summarize_students(&students, &logs, &rules());
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.total_duration, 35);
        assert_eq!(s.log_count, 3);
        assert!(s.has_red_alert);
        assert!(s.has_blue_alert);
        assert_eq!(
            s.last_activity,
            Some(Utc.with_ymd_and_hms(2026, 3, 10, 11, 0, 0).unwrap())
        );
    }

    #[test]
    fn only_ai_logs_never_raise_red() {
        let students = vec![student("s1", "Ana")];
        let logs = vec![log("s1", "IA", 15, 8), log("s1", "IA", 5, 9)];

        let summaries = summarize_students(&students, &logs, &rules());
        assert!(!summaries[0].has_red_alert);
        assert!(summaries[0].has_blue_alert);
    }

    #[test]
    fn student_without_logs_gets_empty_summary() {
        let students = vec![student("s1", "Ana"), student("s2", "Beto")];
        let logs = vec![log("s1", "Rede Social", 10, 9)];

        let summaries = summarize_students(&students, &logs, &rules());
        let idle = &summaries[1];
        assert_eq!(idle.log_count, 0);
        assert_eq!(idle.total_duration, 0);
        assert_eq!(idle.last_activity, None);
        assert!(!idle.has_red_alert);
        assert!(!idle.has_blue_alert);
    }

    #[test]
    fn unknown_category_joins_no_bucket() {
        let students = vec![student("s1", "Ana")];
        let logs = vec![log("s1", "Educacional", 30, 9)];

        let summaries = summarize_students(&students, &logs, &rules());
        assert!(!summaries[0].has_red_alert);
        assert!(!summaries[0].has_blue_alert);

        let stats = dashboard_stats(1, &logs, &rules());
        assert_eq!(stats.total_alerts, 0);
        assert_eq!(stats.ai_detections, 0);
        assert_eq!(stats.total_logs, 1);
    }

    #[test]
    fn stats_count_logs_per_bucket() {
        let logs = vec![
            log("s1", "Rede Social", 10, 9),
            log("s1", "Streaming & Jogos", 10, 10),
            log("s2", "IA", 10, 11),
        ];
        let stats = dashboard_stats(2, &logs, &rules());
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_alerts, 2);
        assert_eq!(stats.ai_detections, 1);
        assert_eq!(stats.total_logs, 3);
    }

    #[test]
    fn breakdown_percentages_sum_to_hundred() {
        let logs = vec![
            log("s1", "Rede Social", 10, 9),
            log("s1", "Rede Social", 10, 10),
            log("s1", "IA", 10, 11),
            log("s2", "Outros", 10, 12),
            log("s2", "Streaming & Jogos", 10, 13),
            log("s2", "IA", 10, 14),
        ];
        let breakdown = category_breakdown(&logs);
        let total: f64 = breakdown.iter().map(|c| c.percentage).sum();
        assert!((total - 100.0).abs() < 0.5, "percentages summed to {total}");

        // Most frequent first.
        assert!(breakdown[0].count >= breakdown[breakdown.len() - 1].count);
    }

    #[test]
    fn breakdown_of_no_logs_is_empty() {
        assert!(category_breakdown(&[]).is_empty());
    }

    #[test]
    fn hour_histogram_always_has_24_buckets() {
        let logs = vec![log("s1", "IA", 10, 9), log("s1", "IA", 10, 9)];
        let hist = activity_by_hour(&logs);
        assert_eq!(hist.len(), 24);
        assert_eq!(hist[9].count, 2);
        assert_eq!(hist[10].count, 0);
        assert_eq!(activity_by_hour(&[]).len(), 24);
    }
}
