use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::table::Tabulate;
use crate::transient::TransientTable;
use crate::{AnalyzeDescriptor, Error, Experiment};

/// Describes an analysis.
pub struct AnalysisDescriptor<E: Experiment> {
    /// The `Experiment` to run over the transient.
    pub experiment: E,
    /// The simulator output to analyze.
    pub table: TransientTable,
}

/// Describes an analysis run.
pub struct RunDescriptor<P: AsRef<Path>> {
    /// Whether or not to print information to the console.
    pub verbose: bool,
    /// Where, if anywhere, to save the result.
    pub save_settings: Option<SaveSettings<P>>,
}

/// How results should be saved to file.
#[derive(Debug)]
pub struct SaveSettings<P: AsRef<Path>> {
    /// The path to the save file.
    pub filename: P,
    /// The file format.
    pub save_format: SaveFormat,
    /// Whether or not to overwrite an existing file.
    ///
    /// When disabled, HDF5 results are appended to the existing datasets and
    /// text results fail with `Error::FileExists`.
    pub overwrite: bool,
}

/// Represents the format results are saved in.
#[derive(PartialEq, Debug)]
pub enum SaveFormat {
    /// Space separated columns with a header row.
    Text,
    /// One resizable dataset per column, grouped by experiment.
    Hdf5,
}

/// The main `struct` of the library.
pub struct Analysis<E: Experiment> {
    experiment: E,
    table: TransientTable,
}

impl<E: Experiment> Analysis<E> {
    /// Creates a new `Analysis` instance.
    #[inline]
    pub fn new(desc: AnalysisDescriptor<E>) -> Result<Self, Error> {
        if desc.table.is_empty() {
            return Err(Error::EmptyExperiment);
        }

        Ok(Self {
            experiment: desc.experiment,
            table: desc.table,
        })
    }

    #[inline]
    pub fn table(&self) -> &TransientTable {
        &self.table
    }

    #[inline]
    pub fn experiment(&self) -> &E {
        &self.experiment
    }

    /// Does an analysis run.
    pub fn run<P: AsRef<Path>>(
        &self,
        desc: RunDescriptor<P>,
    ) -> Result<E::Output, Error> {
        // setup output if verbose
        let bar = if desc.verbose {
            println!(
                "# of samples: {}\n\
                experiment:   {}",
                self.table.len(),
                self.experiment.name(),
            );
            Some(indicatif::ProgressBar::new(0))
        } else {
            None
        };

        let result = self.experiment.analyze(AnalyzeDescriptor {
            table: &self.table,
            bar: &bar,
        })?;

        if let Some(ref bar) = bar {
            bar.finish();
        }
        log::info!(
            "{} analysis produced {} rows from {} samples",
            self.experiment.name(),
            result.len(),
            self.table.len(),
        );

        // optionally write result to file
        if let Some(SaveSettings {
            ref filename,
            ref save_format,
            overwrite,
        }) = desc.save_settings {
            let filename = filename.as_ref();
            match save_format {
                SaveFormat::Text => save_text(&result, filename, overwrite)?,
                SaveFormat::Hdf5 => save_hdf5(&result, filename, overwrite)?,
            }
            log::info!("saved {} result to {}", self.experiment.name(), filename.display());
        }

        Ok(result)
    }
}

fn save_text<T: Tabulate>(result: &T, filename: &Path, overwrite: bool) -> Result<(), Error> {
    if filename.exists() && !overwrite {
        return Err(Error::FileExists(filename.to_path_buf()));
    }
    let file = File::create(filename)?;
    result.write_text(BufWriter::new(file))
}

fn save_hdf5<T: Tabulate>(result: &T, filename: &Path, overwrite: bool) -> Result<(), Error> {
    let rows = result.rows();
    let nrows = rows.nrows();
    let columns = result.columns();

    if filename.exists() && !overwrite {
        let file = hdf5::File::append(filename)?;

        if let Ok(group) = file.group(result.group()) {
            check_attributes(&group, result)?;
            let offset = group.dataset(columns[0])?.shape()[0];
            // resize and extend column datasets
            for (j, name) in columns.iter().enumerate() {
                let dataset = group.dataset(name)?;
                dataset.resize(offset + nrows)?;
                dataset.write_slice(
                    rows.column(j).to_owned().view(),
                    ndarray::s![offset..(offset + nrows)],
                )?;
            }
        } else {
            create_group(&file, result, &rows)?;
        }

        file.close()?;
    } else {
        let file = hdf5::File::create(filename)?;
        create_group(&file, result, &rows)?;
        file.close()?;
    }

    Ok(())
}

fn create_group<T: Tabulate>(
    file: &hdf5::File,
    result: &T,
    rows: &ndarray::Array2<f64>,
) -> Result<(), Error> {
    let nrows = rows.nrows();
    let group = file.create_group(result.group())?;

    for (j, name) in result.columns().iter().enumerate() {
        let dataset = group.new_dataset::<f64>()
            .shape(hdf5::Extent::resizable(nrows))
            .create(*name)?;
        dataset.write_slice(rows.column(j).to_owned().view(), ndarray::s![0..nrows])?;
    }

    // save experiment parameters as group attributes
    for (name, value) in result.attributes() {
        let attr = group.new_attr::<f64>()
            .shape(hdf5::Extents::Scalar)
            .create(name)?;
        attr.write_scalar(&value)?;
    }

    Ok(())
}

/// Rows may only be appended to a group saved with the same parameters.
fn check_attributes<T: Tabulate>(group: &hdf5::Group, result: &T) -> Result<(), Error> {
    let given = result.attributes();
    let mut stored = Vec::new();
    for name in group.attr_names()? {
        let value = group.attr(&name)?.read_scalar::<f64>()?;
        stored.push((name, value));
    }

    for (name, value) in &given {
        let previous = stored.iter().find(|(n, _)| n == name).map(|&(_, v)| v);
        if previous != Some(*value) {
            return Err(Error::AttributeMismatch {
                name: name.to_string(),
                stored: previous,
                given: Some(*value),
            });
        }
    }
    if let Some((name, value)) = stored.iter().find(|(n, _)| given.iter().all(|(g, _)| g != n)) {
        return Err(Error::AttributeMismatch {
            name: name.clone(),
            stored: Some(*value),
            given: None,
        });
    }

    Ok(())
}
