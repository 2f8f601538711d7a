//! Synthetic backend for local development
//!
//! Serves a small set of plausible datasets without a running straxrpc
//! server, so every page can be exercised offline. Batches are generated
//! deterministically from a seeded RNG keyed on run and dataset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::batch::{Column, RecordBatch};

use super::backend::{BatchIter, ConfigRow, FieldInfo, StraxBackend};
use super::error::{Result, StraxError};

/// Glob-style match supporting `*` wildcards (`"*"`, `"s1*"`, `"*area*"`)
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == name;
    }
    let mut rest = name;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(segment) {
                Some(tail) => rest = tail,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            return rest.ends_with(segment);
        } else {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

/// The synthetic fallback batch stored under `__random__` at startup
///
/// Mirrors the shape of a real event chunk: four scalar columns plus two
/// nested waveform-like columns.
pub fn random_batch(rows: usize) -> RecordBatch {
    let mut rng = StdRng::seed_from_u64(0x5742);
    let x = (0..rows).map(|i| i as f64).collect();
    let y = (0..rows).map(|_| 90.0 * rng.gen::<f64>()).collect();
    let time = (0..rows).map(|_| 10.0 * rng.gen::<f64>()).collect();
    let length = (0..rows).map(|_| 800.0 * rng.gen::<f64>()).collect();
    let xs = (0..rows)
        .map(|_| (0..10).map(|i| i as f64).collect())
        .collect();
    let ys = (0..rows)
        .map(|_| (0..10).map(|_| 90.0 * rng.gen::<f64>()).collect())
        .collect();

    let columns = vec![
        ("x".to_string(), Column::Scalar(x)),
        ("y".to_string(), Column::Scalar(y)),
        ("time".to_string(), Column::Scalar(time)),
        ("length".to_string(), Column::Scalar(length)),
        ("xs".to_string(), Column::Nested(xs)),
        ("ys".to_string(), Column::Nested(ys)),
    ];
    // Columns are equal-length by construction
    RecordBatch::from_columns(columns).unwrap_or_default()
}

/// Offline stand-in for a straxrpc server
pub struct DemoBackend {
    datasets: Vec<(&'static str, Vec<FieldInfo>)>,
    batches_per_run: usize,
    rows_per_batch: usize,
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoBackend {
    pub fn new() -> Self {
        Self {
            datasets: vec![
                ("event_basics", event_basics_fields()),
                ("event_info", event_info_fields()),
                ("peak_basics", peak_basics_fields()),
            ],
            batches_per_run: 4,
            rows_per_batch: 200,
        }
    }

    fn fields_of(&self, name: &str) -> Result<&[FieldInfo]> {
        self.datasets
            .iter()
            .find(|(ds, _)| *ds == name)
            .map(|(_, fields)| fields.as_slice())
            .ok_or_else(|| StraxError::Backend(format!("unknown dataset '{}'", name)))
    }

    fn make_batch(&self, seed: u64, fields: &[FieldInfo]) -> RecordBatch {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = self.rows_per_batch;
        let columns = fields
            .iter()
            .map(|field| {
                let column = if field.data_type.starts_with("array") {
                    Column::Nested(
                        (0..rows)
                            .map(|_| (0..20).map(|_| rng.gen::<f64>() * 50.0).collect())
                            .collect(),
                    )
                } else {
                    Column::Scalar(
                        (0..rows)
                            .map(|_| {
                                // A sprinkle of missing values keeps the
                                // ingestion path honest in demo mode.
                                if rng.gen::<f64>() < 0.01 {
                                    f64::NAN
                                } else {
                                    rng.gen::<f64>() * 1000.0
                                }
                            })
                            .collect(),
                    )
                };
                (field.field_name.clone(), column)
            })
            .collect();
        RecordBatch::from_columns(columns).unwrap_or_default()
    }
}

impl StraxBackend for DemoBackend {
    fn search_dataframe_names(&self, pattern: &str) -> Result<Vec<String>> {
        Ok(self
            .datasets
            .iter()
            .map(|(name, _)| name.to_string())
            .filter(|name| glob_match(pattern, name))
            .collect())
    }

    fn data_info(&self, name: &str) -> Result<Vec<FieldInfo>> {
        Ok(self.fields_of(name)?.to_vec())
    }

    fn search_field(&self, pattern: &str) -> Result<Vec<String>> {
        let mut matches = Vec::new();
        for (_, fields) in &self.datasets {
            for field in fields {
                if glob_match(pattern, &field.field_name)
                    && !matches.contains(&field.field_name)
                {
                    matches.push(field.field_name.clone());
                }
            }
        }
        Ok(matches)
    }

    fn get_array_iter(&self, run_id: &str, name: &str) -> Result<BatchIter> {
        let fields = self.fields_of(name)?.to_vec();
        let base_seed = run_id
            .bytes()
            .chain(name.bytes())
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let per_batch = (0..self.batches_per_run).collect::<Vec<_>>();
        let this = self.clone_shape();
        Ok(Box::new(per_batch.into_iter().map(move |i| {
            Ok(this.make_batch(base_seed.wrapping_add(i as u64), &fields))
        })))
    }

    fn show_config(&self, name: &str) -> Result<Vec<ConfigRow>> {
        self.fields_of(name)?;
        Ok(vec![
            ConfigRow {
                option: "s1_min_coincidence".to_string(),
                default: "2".to_string(),
                current: "2".to_string(),
                applies_to: name.to_string(),
                help: "Minimum PMTs that must contribute to a valid S1".to_string(),
            },
            ConfigRow {
                option: "electron_drift_velocity".to_string(),
                default: "1.335e-4".to_string(),
                current: "1.335e-4".to_string(),
                applies_to: name.to_string(),
                help: "Vertical electron drift velocity in cm/ns".to_string(),
            },
            ConfigRow {
                option: "trigger_window".to_string(),
                default: "50".to_string(),
                current: "50".to_string(),
                applies_to: name.to_string(),
                help: "Peak-grouping window in ns".to_string(),
            },
        ])
    }
}

impl DemoBackend {
    /// Cheap copy used to move generation parameters into a batch iterator
    fn clone_shape(&self) -> DemoBackend {
        DemoBackend {
            datasets: self.datasets.clone(),
            batches_per_run: self.batches_per_run,
            rows_per_batch: self.rows_per_batch,
        }
    }
}

fn scalar(name: &str, comment: &str) -> FieldInfo {
    FieldInfo {
        field_name: name.to_string(),
        data_type: "float64".to_string(),
        comment: comment.to_string(),
    }
}

fn array(name: &str, comment: &str) -> FieldInfo {
    FieldInfo {
        field_name: name.to_string(),
        data_type: "array<float64>".to_string(),
        comment: comment.to_string(),
    }
}

fn event_basics_fields() -> Vec<FieldInfo> {
    vec![
        scalar("time", "Event start time since unix epoch [ns]"),
        scalar("endtime", "Event end time since unix epoch [ns]"),
        scalar("s1_area", "S1 area, uncorrected [PE]"),
        scalar("s2_area", "S2 area, uncorrected [PE]"),
        scalar("drift_time", "Drift time between main S1 and S2 [ns]"),
        array("s1_area_per_channel", "S1 area per PMT channel [PE]"),
    ]
}

fn event_info_fields() -> Vec<FieldInfo> {
    vec![
        scalar("time", "Event start time since unix epoch [ns]"),
        scalar("cs1", "Corrected S1 area [PE]"),
        scalar("cs2", "Corrected S2 area [PE]"),
        scalar("x", "Reconstructed interaction x position [cm]"),
        scalar("y", "Reconstructed interaction y position [cm]"),
        scalar("z", "Reconstructed interaction z position [cm]"),
    ]
}

fn peak_basics_fields() -> Vec<FieldInfo> {
    vec![
        scalar("time", "Peak start time since unix epoch [ns]"),
        scalar("area", "Peak integral [PE]"),
        scalar("length", "Length of the peak waveform [samples]"),
        scalar("range_50p_area", "Width at 50% of area [ns]"),
        array("data", "Peak waveform, summed across channels"),
    ]
}
