//! Nearest-rank quantiles of a pre-sorted column of numbers.
use crate::error::{Error, Result};
use flate2::read::MultiGzDecoder;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

/// Products closer than this to an integer count as that integer, so that
/// e.g. 0.07 * 100 gives rank 7 rather than 8.
const RANK_EPSILON: f64 = 1e-9;

/// One requested quantile, keeping the text it was given as for output.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantile {
    pub label: String,
    pub fraction: f64,
}

impl Quantile {
    pub fn parse(label: &str) -> Result<Quantile> {
        let label = label.trim();
        match label.parse::<f64>() {
            Ok(fraction) if (0.0..=1.0).contains(&fraction) => Ok(Quantile {
                label: label.to_owned(),
                fraction,
            }),
            _ => Err(Error::Quantile(format!(
                "quantile '{}' is not a fraction between 0 and 1",
                label
            ))),
        }
    }
}

/// 1-based nearest rank of `fraction` among `n` values.
pub fn nearest_rank(fraction: f64, n: u64) -> u64 {
    let x = fraction * n as f64;
    let rounded = x.round();
    let rank = if (x - rounded).abs() < RANK_EPSILON {
        rounded
    } else {
        x.ceil()
    };
    (rank as u64).clamp(1, n.max(1))
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).map_err(|e| Error::io(format!("could not open {:?}", path), e))?;
    let reader = BufReader::new(file);
    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

fn values_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(open_input(path)?))
}

/// Number of value records in `path`.
pub fn count_values(path: &Path) -> Result<u64> {
    let mut rdr = values_reader(path)?;
    let mut row = csv::ByteRecord::new();
    let mut n = 0;
    while rdr.read_byte_record(&mut row)? {
        n += 1;
    }
    Ok(n)
}

/// The value at each requested quantile, in request order.
///
/// `count` is the number of values in the file; it is counted with an extra
/// pass when not given.
pub fn extract(
    path: &Path,
    column: usize,
    quantiles: &[Quantile],
    count: Option<u64>,
) -> Result<Vec<String>> {
    let n = match count {
        Some(n) => n,
        None => count_values(path)?,
    };
    if n == 0 {
        return Err(Error::Quantile(format!("no values in {:?}", path)));
    }

    // (rank, request index), walked in rank order
    let mut wanted: Vec<(u64, usize)> = quantiles
        .iter()
        .enumerate()
        .map(|(i, q)| (nearest_rank(q.fraction, n), i))
        .collect();
    wanted.sort_unstable();
    let mut found: Vec<Option<String>> = vec![None; quantiles.len()];
    let mut next = wanted.iter().peekable();

    let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr())
        .with_message("values");
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {spinner} {pos:>7} {msg}")
            .map_err(|e| Error::Quantile(e.to_string()))?
            .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]),
    );

    let mut rdr = values_reader(path)?;
    let mut record = csv::StringRecord::new();
    let mut rank = 0u64;
    let mut previous = f64::NEG_INFINITY;
    while next.peek().is_some() && rdr.read_record(&mut record)? {
        rank += 1;
        let text = record
            .get(column)
            .ok_or_else(|| {
                Error::Quantile(format!("value {} has no column {}", rank, column))
            })?
            .trim();
        let value = match text.parse::<f64>() {
            Ok(v) if !v.is_nan() => v,
            _ => {
                return Err(Error::Quantile(format!(
                    "value {} ('{}') is not a number",
                    rank, text
                )))
            }
        };
        if value < previous {
            return Err(Error::Quantile(format!(
                "values are not sorted: value {} ({}) is smaller than the one before",
                rank, text
            )));
        }
        previous = value;
        while let Some((_, i)) = next.next_if(|(r, _)| *r == rank) {
            found[*i] = Some(text.to_owned());
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    found
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                Error::Quantile(format!("expected {} values but found {}", n, rank))
            })
        })
        .collect()
}

/// Print `<quantile>\t<value>` for each requested quantile.
pub fn run(input: &Path, quantiles: &[String], column: usize, count: Option<u64>) -> Result<()> {
    let quantiles = quantiles
        .iter()
        .map(|q| Quantile::parse(q))
        .collect::<Result<Vec<_>>>()?;
    let values = extract(input, column, &quantiles, count)?;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(io::stdout().lock());
    for (q, v) in quantiles.iter().zip(values) {
        wtr.write_record([q.label.as_str(), v.as_str()])?;
    }
    wtr.flush()
        .map_err(|e| Error::io("could not write quantiles", e))?;
    Ok(())
}
