use crate::domain::model::{
    EmergencyMode, InvalidDate, ParseReport, ReadmissionPair, ReadmissionReport, Visit,
    VisitColumns,
};
use crate::domain::table::Table;
use crate::utils::dates::{floor_days, parse_timestamp};
use crate::utils::error::{Result, WranglerError};
use std::cmp::Ordering;
use std::collections::HashSet;

pub const DEFAULT_DAYS_THRESHOLD: i64 = 30;
pub const DEFAULT_EMERGENCY_CODE: &str = "1";

#[derive(Debug, Clone)]
pub struct ReadmissionParams {
    /// Diagnosis code prefixes of interest. Only applied as a filter when
    /// `filter_by_diagnosis` is set.
    pub cancer_codes: Vec<String>,
    pub days_threshold: i64,
    pub emergency: EmergencyMode,
    pub emergency_code: String,
    pub filter_by_diagnosis: bool,
}

impl Default for ReadmissionParams {
    fn default() -> Self {
        Self {
            cancer_codes: Vec::new(),
            days_threshold: DEFAULT_DAYS_THRESHOLD,
            emergency: EmergencyMode::All,
            emergency_code: DEFAULT_EMERGENCY_CODE.to_string(),
            filter_by_diagnosis: false,
        }
    }
}

/// Finds visits that follow a discharge of the same patient within a day
/// threshold.
#[derive(Debug, Clone, Default)]
pub struct ReadmissionDetector {
    columns: VisitColumns,
    params: ReadmissionParams,
}

/// A visit paired with the next visit of the same patient.
struct Lookahead<'a> {
    current: &'a Visit,
    next: &'a Visit,
}

impl ReadmissionDetector {
    pub fn new(columns: VisitColumns, params: ReadmissionParams) -> Self {
        Self { columns, params }
    }

    pub fn params(&self) -> &ReadmissionParams {
        &self.params
    }

    pub fn detect(&self, table: &Table) -> Result<ReadmissionReport> {
        tracing::info!(
            "Getting readmission patients with cancer codes {:?}",
            self.params.cancer_codes
        );

        let (mut visits, parse_report) = self.load_visits(table)?;
        log_parse_report(&parse_report);

        visits.sort_by(|a, b| {
            compare_patient_ids(&a.patient_id, &b.patient_id)
                .then_with(|| compare_admissions(a, b))
        });

        let matched: Vec<Lookahead<'_>> = lookaheads(&visits)
            .filter(|pair| self.within_threshold(pair))
            .filter(|pair| self.matches_diagnosis(pair.current))
            .filter(|pair| {
                self.params
                    .emergency
                    .keeps(&pair.next.admission_type, &self.params.emergency_code)
            })
            .collect();

        let patients_matched = matched
            .iter()
            .map(|pair| pair.current.patient_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let visits_matched = matched
            .iter()
            .map(|pair| pair.current.visit_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let label = self.params.emergency.label();
        tracing::info!(
            "Total readmission {}patients in {} days: {}",
            label,
            self.params.days_threshold,
            patients_matched
        );
        tracing::info!(
            "Total readmission {}visits in {} days: {}",
            label,
            self.params.days_threshold,
            visits_matched
        );

        let pairs = unique_pairs(&matched);
        let readmit_visit_ids = unique_in_order(pairs.iter().map(|p| p.readmit_visit_id.as_str()));
        let trigger_visit_ids = unique_in_order(pairs.iter().map(|p| p.trigger_visit_id.as_str()));

        Ok(ReadmissionReport {
            pairs,
            readmit_visit_ids,
            trigger_visit_ids,
            patients_matched,
            parse_report,
        })
    }

    fn load_visits(&self, table: &Table) -> Result<(Vec<Visit>, ParseReport)> {
        let index = |name: &str| {
            table
                .column_index(name)
                .map_err(|_| WranglerError::missing_column(name, "visit table"))
        };
        let patient_idx = index(&self.columns.patient_id)?;
        let visit_idx = index(&self.columns.visit_id)?;
        let admitted_idx = index(&self.columns.admitted)?;
        let discharged_idx = index(&self.columns.discharged)?;
        let type_idx = index(&self.columns.admission_type)?;
        let diagnosis_idx = index(&self.columns.diagnosis)?;

        let mut report = ParseReport::default();
        let visits = table
            .rows()
            .iter()
            .map(|row| {
                let patient_id = row[patient_idx].trim().to_string();
                let visit_id = row[visit_idx].trim().to_string();
                let admitted = parse_timestamp(&row[admitted_idx]);
                let discharged = parse_timestamp(&row[discharged_idx]);

                if admitted.is_none() {
                    report.invalid_admissions.push(InvalidDate {
                        patient_id: patient_id.clone(),
                        visit_id: visit_id.clone(),
                        raw: row[admitted_idx].clone(),
                    });
                }
                if discharged.is_none() {
                    report.invalid_discharges.push(InvalidDate {
                        patient_id: patient_id.clone(),
                        visit_id: visit_id.clone(),
                        raw: row[discharged_idx].clone(),
                    });
                }

                Visit {
                    patient_id,
                    visit_id,
                    admitted,
                    discharged,
                    admission_type: row[type_idx].clone(),
                    diagnosis: row[diagnosis_idx].clone(),
                }
            })
            .collect();

        Ok((visits, report))
    }

    fn within_threshold(&self, pair: &Lookahead<'_>) -> bool {
        // An invalid discharge has no gap and never compares below the threshold
        match (pair.next.admitted, pair.current.discharged) {
            (Some(next_admit), Some(discharged)) => {
                floor_days(next_admit - discharged) < self.params.days_threshold
            }
            _ => false,
        }
    }

    fn matches_diagnosis(&self, visit: &Visit) -> bool {
        if !self.params.filter_by_diagnosis {
            return true;
        }
        self.params
            .cancer_codes
            .iter()
            .any(|code| visit.diagnosis.contains(code.as_str()))
    }
}

/// Consecutive visits of the same patient whose later visit has a valid
/// admission. `visits` must already be grouped by patient.
///
/// A blank patient id belongs to no patient. Two adjacent rows with the same
/// visit id are one visit exported twice.
fn lookaheads(visits: &[Visit]) -> impl Iterator<Item = Lookahead<'_>> {
    visits
        .windows(2)
        .filter(|w| !w[0].patient_id.is_empty() && w[0].patient_id == w[1].patient_id)
        .filter(|w| w[0].visit_id != w[1].visit_id && w[1].admitted.is_some())
        .map(|w| Lookahead {
            current: &w[0],
            next: &w[1],
        })
}

fn unique_pairs(matched: &[Lookahead<'_>]) -> Vec<ReadmissionPair> {
    let mut seen = HashSet::new();
    matched
        .iter()
        .map(|pair| ReadmissionPair {
            readmit_visit_id: pair.next.visit_id.clone(),
            trigger_visit_id: pair.current.visit_id.clone(),
        })
        .filter(|pair| seen.insert(pair.clone()))
        .collect()
}

fn unique_in_order<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).map(str::to_string).collect()
}

/// Integer ids compare numerically, anything else lexically. Equal numbers
/// spelled differently stay apart.
fn compare_patient_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Ascending admission time, invalid admissions last.
fn compare_admissions(a: &Visit, b: &Visit) -> Ordering {
    match (a.admitted, b.admitted) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn log_parse_report(report: &ParseReport) {
    if report.is_clean() {
        tracing::info!("Date type conversion successful!");
        return;
    }

    for (field, invalid) in [
        ("admission", &report.invalid_admissions),
        ("discharge", &report.invalid_discharges),
    ] {
        if invalid.is_empty() {
            continue;
        }
        tracing::warn!(
            "Date type conversion error in {} date for {} visits",
            field,
            invalid.len()
        );
        for entry in invalid {
            tracing::warn!(
                patient_id = %entry.patient_id,
                visit_id = %entry.visit_id,
                raw = %entry.raw,
                "invalid {} date",
                field
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit_table(rows: &[[&str; 6]]) -> Table {
        Table::from_rows(
            ["patient_id", "visit_sn", "B12", "B15", "B11C", "C03C"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn detector(days_threshold: i64, emergency: EmergencyMode) -> ReadmissionDetector {
        ReadmissionDetector::new(
            VisitColumns::default(),
            ReadmissionParams {
                days_threshold,
                emergency,
                ..ReadmissionParams::default()
            },
        )
    }

    fn pair(readmit: &str, trigger: &str) -> ReadmissionPair {
        ReadmissionPair {
            readmit_visit_id: readmit.to_string(),
            trigger_visit_id: trigger.to_string(),
        }
    }

    #[test]
    fn test_gap_below_threshold_produces_pair() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-05", "2", "C50.9"],
            ["P", "V2", "2024-01-10", "2024-01-20", "2", "C50.9"],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V2", "V1")]);
        assert_eq!(report.readmit_visit_ids, vec!["V2"]);
        assert_eq!(report.trigger_visit_ids, vec!["V1"]);
        assert_eq!(report.patients_matched, 1);

        let report = detector(3, EmergencyMode::All).detect(&table).unwrap();
        assert!(report.pairs.is_empty());
    }

    #[test]
    fn test_gap_equal_to_threshold_is_excluded() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-05", "2", ""],
            ["P", "V2", "2024-01-10", "2024-01-20", "2", ""],
        ]);
        assert!(detector(5, EmergencyMode::All).detect(&table).unwrap().pairs.is_empty());
        assert_eq!(detector(6, EmergencyMode::All).detect(&table).unwrap().pairs.len(), 1);
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_admission() {
        let table = visit_table(&[
            ["P", "V3", "2024-03-01", "2024-03-02", "2", ""],
            ["P", "V1", "2024-01-01", "2024-01-05", "2", ""],
            ["P", "V2", "2024-01-10", "2024-02-20", "2", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V2", "V1"), pair("V3", "V2")]);
    }

    #[test]
    fn test_single_visit_patients_contribute_nothing() {
        let table = visit_table(&[
            ["A", "V1", "2024-01-01", "2024-01-05", "1", ""],
            ["B", "V2", "2024-01-06", "2024-01-07", "1", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert!(report.pairs.is_empty());
        assert_eq!(report.patients_matched, 0);
    }

    #[test]
    fn test_overlapping_visits_have_negative_gap_and_are_kept() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-10", "2", ""],
            ["P", "V2", "2024-01-05 12:00:00", "2024-01-12", "2", ""],
        ]);

        let report = detector(0, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V2", "V1")]);
    }

    #[test]
    fn test_invalid_dates_are_reported_not_raised() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "unknown", "2", ""],
            ["P", "V2", "2024-01-10", "2024-01-20", "2", ""],
            ["P", "V3", "not-a-date", "2024-01-25", "2", ""],
            ["Q", "V4", "2024-01-01", "2024-01-02", "2", ""],
            ["Q", "V5", "2024-01-03", "2024-01-04", "2", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();

        // V1 has no discharge; V2's successor has no admission
        assert_eq!(report.pairs, vec![pair("V5", "V4")]);
        assert_eq!(report.parse_report.invalid_discharges.len(), 1);
        assert_eq!(report.parse_report.invalid_discharges[0].visit_id, "V1");
        assert_eq!(report.parse_report.invalid_admissions.len(), 1);
        assert_eq!(report.parse_report.invalid_admissions[0].raw, "not-a-date");
    }

    #[test]
    fn test_emergency_modes_partition_all() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["P", "V2", "2024-01-05", "2024-01-06", "1", ""],
            ["P", "V3", "2024-01-08", "2024-01-09", "2", ""],
            ["Q", "V4", "2024-02-01", "2024-02-02", "1", ""],
            ["Q", "V5", "2024-02-03", "2024-02-04", "1", ""],
        ]);

        let all = detector(30, EmergencyMode::All).detect(&table).unwrap();
        let emergency = detector(30, EmergencyMode::EmergencyOnly).detect(&table).unwrap();
        let other = detector(30, EmergencyMode::NonEmergencyOnly).detect(&table).unwrap();

        assert_eq!(emergency.pairs, vec![pair("V2", "V1"), pair("V5", "V4")]);
        assert_eq!(other.pairs, vec![pair("V3", "V2")]);
        assert_eq!(all.pairs.len(), emergency.pairs.len() + other.pairs.len());
        for p in &emergency.pairs {
            assert!(!other.pairs.contains(p));
            assert!(all.pairs.contains(p));
        }
        for p in &other.pairs {
            assert!(all.pairs.contains(p));
        }
    }

    #[test]
    fn test_threshold_monotonicity() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["P", "V2", "2024-01-05", "2024-01-06", "2", ""],
            ["P", "V3", "2024-01-20", "2024-01-21", "2", ""],
            ["P", "V4", "2024-03-01", "2024-03-02", "2", ""],
        ]);

        let mut previous: Vec<ReadmissionPair> = Vec::new();
        for threshold in [0, 3, 10, 15, 40, 60] {
            let current = detector(threshold, EmergencyMode::All).detect(&table).unwrap().pairs;
            for p in &previous {
                assert!(current.contains(p), "threshold {threshold} lost {p:?}");
            }
            previous = current;
        }
        assert_eq!(previous.len(), 3);
    }

    #[test]
    fn test_numeric_patient_ids_sort_numerically() {
        let table = visit_table(&[
            ["10", "V3", "2024-01-01", "2024-01-02", "2", ""],
            ["10", "V4", "2024-01-03", "2024-01-04", "2", ""],
            ["9", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["9", "V2", "2024-01-03", "2024-01-04", "2", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.trigger_visit_ids, vec!["V1", "V3"]);
        assert_eq!(report.patients_matched, 2);
    }

    #[test]
    fn test_zero_padded_ids_stay_separate_patients() {
        let table = visit_table(&[
            ["007", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["7", "V2", "2024-01-03", "2024-01-04", "2", ""],
            ["007", "V3", "2024-01-05", "2024-01-06", "2", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V3", "V1")]);
        assert_eq!(compare_patient_ids("007", "7"), Ordering::Less);
        assert_eq!(compare_patient_ids("7", "007"), Ordering::Greater);
    }

    #[test]
    fn test_blank_patient_ids_are_never_paired() {
        let table = visit_table(&[
            ["", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["  ", "V2", "2024-01-03", "2024-01-04", "2", ""],
            ["P", "V3", "2024-01-01", "2024-01-02", "2", ""],
            ["P", "V4", "2024-01-03", "2024-01-04", "2", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V4", "V3")]);
        assert_eq!(report.patients_matched, 1);
    }

    #[test]
    fn test_reused_visit_ids_yield_each_pair_once() {
        // Visit serials restart per patient in some exports
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["P", "V2", "2024-01-05", "2024-01-06", "2", ""],
            ["Q", "V1", "2024-02-01", "2024-02-02", "2", ""],
            ["Q", "V2", "2024-02-05", "2024-02-06", "2", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V2", "V1")]);
        assert_eq!(report.readmit_visit_ids, vec!["V2"]);
        assert_eq!(report.trigger_visit_ids, vec!["V1"]);
        assert_eq!(report.patients_matched, 2);
    }

    #[test]
    fn test_visit_exported_twice_is_not_its_own_readmission() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["P", "V2", "2024-01-05", "2024-01-06", "1", ""],
            ["P", "V1", "2024-01-01", "2024-01-02", "2", ""],
            ["P", "V2", "2024-01-05", "2024-01-06", "1", ""],
        ]);

        let report = detector(30, EmergencyMode::All).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V2", "V1")]);
        assert_eq!(report.readmit_visit_ids, vec!["V2"]);
        assert_eq!(report.trigger_visit_ids, vec!["V1"]);
    }

    #[test]
    fn test_diagnosis_filter_is_opt_in() {
        let table = visit_table(&[
            ["P", "V1", "2024-01-01", "2024-01-02", "2", "I10"],
            ["P", "V2", "2024-01-05", "2024-01-06", "2", "C34.1"],
            ["P", "V3", "2024-01-08", "2024-01-09", "2", "C34.1"],
        ]);

        let mut params = ReadmissionParams {
            cancer_codes: vec!["C34".to_string()],
            ..ReadmissionParams::default()
        };
        let unfiltered = ReadmissionDetector::new(VisitColumns::default(), params.clone())
            .detect(&table)
            .unwrap();
        assert_eq!(unfiltered.pairs.len(), 2);

        params.filter_by_diagnosis = true;
        let filtered = ReadmissionDetector::new(VisitColumns::default(), params)
            .detect(&table)
            .unwrap();
        assert_eq!(filtered.pairs, vec![pair("V3", "V2")]);
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let table = Table::from_rows(
            vec!["patient_id".to_string(), "visit_sn".to_string()],
            vec![vec!["P".to_string(), "V1".to_string()]],
        )
        .unwrap();

        let err = detector(30, EmergencyMode::All).detect(&table).unwrap_err();
        match err {
            WranglerError::MissingColumn { column, .. } => assert_eq!(column, "B12"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_column_mapping() {
        let table = Table::from_rows(
            ["pid", "vid", "in", "out", "kind", "dx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vec![
                ["P", "V1", "2024-01-01", "2024-01-02", "E", ""]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                ["P", "V2", "2024-01-05", "2024-01-06", "E", ""]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ],
        )
        .unwrap();

        let columns = VisitColumns {
            patient_id: "pid".to_string(),
            visit_id: "vid".to_string(),
            admitted: "in".to_string(),
            discharged: "out".to_string(),
            admission_type: "kind".to_string(),
            diagnosis: "dx".to_string(),
        };
        let params = ReadmissionParams {
            emergency: EmergencyMode::EmergencyOnly,
            emergency_code: "E".to_string(),
            ..ReadmissionParams::default()
        };

        let report = ReadmissionDetector::new(columns, params).detect(&table).unwrap();
        assert_eq!(report.pairs, vec![pair("V2", "V1")]);
    }
}
