//! Transient tables produced by the time-domain simulator.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use ndarray::{s, Array1, ArrayView1};

use crate::Error;

const TIME_COLUMN: &str = "t";
const VOLTAGE_COLUMN: &str = "Vext";
const CURRENT_COLUMN: &str = "Jext";
const ERROR_COLUMN: &str = "errJ";

/// Column-wise simulator output.
#[derive(Clone, Debug)]
pub struct TransientTable {
    /// Time since the last perturbation step [s].
    pub time: Array1<f64>,
    /// Applied voltage [V], if the table has a `Vext` column.
    pub voltage: Option<Array1<f64>>,
    /// External current density [A/m²].
    pub current: Array1<f64>,
    /// Numerical error of the current density [A/m²].
    pub error: Array1<f64>,
}

/// A contiguous run of samples following one perturbation step.
///
/// All views borrow from the owning `TransientTable`.
#[derive(Clone, Debug)]
pub struct Segment<'a> {
    /// Index of the first sample in the table.
    pub start_index: usize,
    /// Index of the last sample in the table (inclusive).
    pub end_index: usize,
    pub time: ArrayView1<'a, f64>,
    pub current: ArrayView1<'a, f64>,
    pub error: ArrayView1<'a, f64>,
}

impl<'a> Segment<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

impl TransientTable {
    /// Creates a table from columns, checking that their lengths agree.
    pub fn new(
        time: Array1<f64>,
        voltage: Option<Array1<f64>>,
        current: Array1<f64>,
        error: Array1<f64>,
    ) -> Result<Self, Error> {
        let expected_length = time.len();
        let mut columns = vec![("Current", current.len()), ("Error", error.len())];
        if let Some(ref voltage) = voltage {
            columns.push(("Voltage", voltage.len()));
        }
        for (array_name, input_length) in columns {
            if input_length != expected_length {
                return Err(Error::BadInit {
                    array_name: array_name.to_string(),
                    input_length,
                    expected_length,
                });
            }
        }

        Ok(Self { time, voltage, current, error })
    }

    /// Reads a whitespace-delimited simulator output file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parses a header row followed by numeric rows.
    ///
    /// The `t`, `Jext` and `errJ` columns are required, `Vext` is optional and
    /// any other column is ignored. Blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(n, line)| line.map(|l| (n + 1, l)));

        let header = loop {
            match lines.next() {
                Some(line) => {
                    let (_, line) = line?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Err(Error::MissingColumn(TIME_COLUMN.to_string())),
            }
        };
        let names = header.split_whitespace().collect::<Vec<_>>();
        let find = |name: &str| names.iter().position(|&n| n == name);
        let require = |name: &str| find(name).ok_or_else(|| Error::MissingColumn(name.to_string()));

        let t_col = require(TIME_COLUMN)?;
        let j_col = require(CURRENT_COLUMN)?;
        let err_col = require(ERROR_COLUMN)?;
        let v_col = find(VOLTAGE_COLUMN);

        let mut time = Vec::new();
        let mut voltage = Vec::new();
        let mut current = Vec::new();
        let mut error = Vec::new();

        for line in lines {
            let (line_number, line) = line?;
            let fields = line.split_whitespace().collect::<Vec<_>>();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != names.len() {
                return Err(Error::MalformedRow {
                    line: line_number,
                    found: fields.len(),
                    expected: names.len(),
                });
            }
            let parse = |col: usize| {
                fields[col].parse::<f64>().map_err(|_| Error::Parse {
                    line: line_number,
                    value: fields[col].to_string(),
                })
            };

            time.push(parse(t_col)?);
            current.push(parse(j_col)?);
            error.push(parse(err_col)?);
            if let Some(col) = v_col {
                voltage.push(parse(col)?);
            }
        }

        log::debug!("read transient table with {} rows", time.len());

        Self::new(
            Array1::from(time),
            v_col.map(|_| Array1::from(voltage)),
            Array1::from(current),
            Array1::from(error),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Treats the whole table as a single transient.
    pub fn whole(&self) -> Result<Segment<'_>, Error> {
        if self.is_empty() {
            return Err(Error::EmptyExperiment);
        }
        Ok(self.segment(0, self.len() - 1))
    }

    /// Splits the table into back-to-back transients, each starting at `t == 0`.
    ///
    /// Rows before the first `t == 0` are not part of any segment.
    pub fn segments(&self) -> Result<Vec<Segment<'_>>, Error> {
        let starts = self
            .time
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == 0.0)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if starts.is_empty() {
            return Err(Error::EmptyExperiment);
        }

        let segments = starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).map_or(self.len() - 1, |&next| next - 1);
                self.segment(start, end)
            })
            .collect::<Vec<_>>();
        log::debug!("found {} transient segments", segments.len());

        Ok(segments)
    }

    fn segment(&self, start_index: usize, end_index: usize) -> Segment<'_> {
        let range = s![start_index..=end_index];
        Segment {
            start_index,
            end_index,
            time: self.time.slice(range),
            current: self.current.slice(range),
            error: self.error.slice(range),
        }
    }
}

impl FromStr for TransientTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}
