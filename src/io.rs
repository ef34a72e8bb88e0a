//!
//! Model files
//!
//! One forward evaluation (`allprobs`, `delta` and the transition structure)
//! stored as JSON. Files whose name ends with `.gz` are gzip-compressed.
//!
//! ```text
//! {
//!   "allprobs": [[0.6, 0.4], [0.5, 0.5], [0.3, 0.7]],
//!   "delta": [0.5, 0.5],
//!   "gamma": { "homogeneous": [[0.9, 0.1], [0.2, 0.8]] }
//! }
//! ```
//!
//! `gamma` is one of
//!
//! * `{"homogeneous": M}`
//! * `{"time_varying": [M, M, ...]}` with `nObs-1` matrices
//! * `{"periodic": {"pool": [M, ...], "tod": [k, ...]}}` with `nObs` labels
//!
use crate::error::{ForwardError, Result};
use crate::forward::{forward, forward_trace, ForwardTrace};
use crate::trans::{TransKind, Transitions};
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

///
/// Owned inputs of one forward evaluation
///
#[derive(Debug, Clone, PartialEq)]
pub struct HmmInput {
    /// `nObs x N` emission likelihoods
    pub allprobs: Array2<f64>,
    /// initial distribution of length `N`
    pub delta: Array1<f64>,
    pub gamma: TransInput,
}

///
/// Owned counterpart of [`Transitions`]
///
#[derive(Debug, Clone, PartialEq)]
pub enum TransInput {
    Homogeneous(Array2<f64>),
    TimeVarying(Array3<f64>),
    Periodic { pool: Array3<f64>, tod: Vec<usize> },
}

impl TransInput {
    pub fn view(&self) -> Transitions<'_> {
        match self {
            TransInput::Homogeneous(gamma) => Transitions::Homogeneous(gamma.view()),
            TransInput::TimeVarying(stack) => Transitions::TimeVarying(stack.view()),
            TransInput::Periodic { pool, tod } => Transitions::Periodic {
                pool: pool.view(),
                tod: tod.as_slice(),
            },
        }
    }
    pub fn kind(&self) -> TransKind {
        self.view().kind()
    }
}

impl HmmInput {
    pub fn n_obs(&self) -> usize {
        self.allprobs.nrows()
    }
    pub fn n_states(&self) -> usize {
        self.allprobs.ncols()
    }
    pub fn transitions(&self) -> Transitions<'_> {
        self.gamma.view()
    }
    pub fn log_likelihood(&self) -> Result<f64> {
        forward(self.allprobs.view(), self.delta.view(), &self.transitions())
            .map(|p| p.to_log_value())
    }
    pub fn trace(&self) -> Result<ForwardTrace> {
        forward_trace(self.allprobs.view(), self.delta.view(), &self.transitions())
    }
}

//
// json
//

#[derive(Serialize, Deserialize)]
struct HmmFile {
    allprobs: Vec<Vec<f64>>,
    delta: Vec<f64>,
    gamma: GammaFile,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GammaFile {
    Homogeneous(Vec<Vec<f64>>),
    TimeVarying(Vec<Vec<Vec<f64>>>),
    Periodic {
        pool: Vec<Vec<Vec<f64>>>,
        tod: Vec<usize>,
    },
}

impl HmmInput {
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let file: HmmFile = serde_json::from_reader(reader)?;
        file.into_input()
    }
    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json_reader(s.as_bytes())
    }
    ///
    /// read a model file, gunzipping it when the name ends with `.gz`
    ///
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);

        if path.as_ref().extension().is_some_and(|ext| ext == "gz") {
            let decoder = GzDecoder::new(reader);
            Self::from_json_reader(std::io::BufReader::new(decoder))
        } else {
            Self::from_json_reader(reader)
        }
    }
    pub fn to_json_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &HmmFile::from_input(self))?;
        Ok(())
    }
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&HmmFile::from_input(self))?)
    }
    ///
    /// write a model file, gzipping it when the name ends with `.gz`
    ///
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;

        if path.as_ref().extension().is_some_and(|ext| ext == "gz") {
            let mut writer = GzEncoder::new(file, Compression::default());
            self.to_json_writer(&mut writer)?;
            writer.try_finish()?;
            Ok(())
        } else {
            let mut writer = std::io::BufWriter::new(file);
            self.to_json_writer(&mut writer)?;
            writer.flush()?;
            Ok(())
        }
    }
}

impl HmmFile {
    fn into_input(self) -> Result<HmmInput> {
        let gamma = match self.gamma {
            GammaFile::Homogeneous(rows) => TransInput::Homogeneous(to_array2(rows, "gamma")?),
            GammaFile::TimeVarying(mats) => TransInput::TimeVarying(to_array3(mats, "gamma")?),
            GammaFile::Periodic { pool, tod } => TransInput::Periodic {
                pool: to_array3(pool, "gamma.pool")?,
                tod,
            },
        };
        Ok(HmmInput {
            allprobs: to_array2(self.allprobs, "allprobs")?,
            delta: Array1::from(self.delta),
            gamma,
        })
    }
    fn from_input(input: &HmmInput) -> Self {
        let gamma = match &input.gamma {
            TransInput::Homogeneous(gamma) => GammaFile::Homogeneous(to_rows(gamma.view())),
            TransInput::TimeVarying(stack) => GammaFile::TimeVarying(to_mats(stack.view())),
            TransInput::Periodic { pool, tod } => GammaFile::Periodic {
                pool: to_mats(pool.view()),
                tod: tod.clone(),
            },
        };
        HmmFile {
            allprobs: to_rows(input.allprobs.view()),
            delta: input.delta.to_vec(),
            gamma,
        }
    }
}

///
/// nested rows into a matrix; ragged rows are a shape error
///
fn to_array2(rows: Vec<Vec<f64>>, name: &str) -> Result<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, |row| row.len());
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n_cols) {
        return Err(ForwardError::Shape(format!(
            "{} row {} has {} columns but row 0 has {}",
            name,
            i,
            row.len(),
            n_cols
        )));
    }
    let data: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), data)
        .map_err(|e| ForwardError::Shape(format!("{}: {}", name, e)))
}

///
/// list of matrices into a stack whose axis 0 is the matrix index
///
fn to_array3(mats: Vec<Vec<Vec<f64>>>, name: &str) -> Result<Array3<f64>> {
    let n_mats = mats.len();
    let mats = mats
        .into_iter()
        .enumerate()
        .map(|(k, rows)| to_array2(rows, &format!("{}[{}]", name, k)))
        .collect::<Result<Vec<_>>>()?;
    let dim = mats.first().map_or((0, 0), |m| m.dim());
    if let Some((k, m)) = mats.iter().enumerate().find(|(_, m)| m.dim() != dim) {
        return Err(ForwardError::Shape(format!(
            "{}[{}] is {}x{} but {}[0] is {}x{}",
            name,
            k,
            m.nrows(),
            m.ncols(),
            name,
            dim.0,
            dim.1
        )));
    }
    let data: Vec<f64> = mats.iter().flat_map(|m| m.iter().copied()).collect();
    Array3::from_shape_vec((n_mats, dim.0, dim.1), data)
        .map_err(|e| ForwardError::Shape(format!("{}: {}", name, e)))
}

fn to_rows(m: ArrayView2<f64>) -> Vec<Vec<f64>> {
    m.outer_iter().map(|row| row.to_vec()).collect()
}

fn to_mats(stack: ArrayView3<f64>) -> Vec<Vec<Vec<f64>>> {
    stack.outer_iter().map(to_rows).collect()
}
