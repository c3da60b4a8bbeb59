use std::{
    fmt::Display,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Lines, Write},
    path::Path,
    str::FromStr,
};

use super::{NeuralNet, Scope};
use crate::{layer::LayerType, matrix::Matrix, rng, NetworkError, NetworkResult};

const SCOPE_HEADER: &str = "* Scope of network:";
const DIMENSION_HEADER: &str = "* Dimension of layers:";
const TYPE_HEADER: &str = "* Types of layers:";

/// Largest weight count a single loaded layer may have.
const MAX_LAYER_PARAMETERS: usize = 1 << 26;

impl NeuralNet {
    /// Writes the labelled text format.
    pub fn save(&mut self, path: impl AsRef<Path>) -> NetworkResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_rich(&mut writer)?;
        writer.flush()?;

        log::info!("saved {} to {}", self, path.as_ref().display());
        Ok(())
    }

    /// Writes the header-free format with lower-case type tokens.
    pub fn save_compact(&mut self, path: impl AsRef<Path>) -> NetworkResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_compact(&mut writer)?;
        writer.flush()?;

        log::info!("saved {} to {} (compact)", self, path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> NetworkResult<Self> {
        let net = Self::read_rich(BufReader::new(File::open(path.as_ref())?))?;
        log::info!("loaded {} from {}", net, path.as_ref().display());
        Ok(net)
    }

    pub fn load_compact(path: impl AsRef<Path>) -> NetworkResult<Self> {
        let net = Self::read_compact(BufReader::new(File::open(path.as_ref())?))?;
        log::info!("loaded {} from {} (compact)", net, path.as_ref().display());
        Ok(net)
    }

    pub fn write_rich<W: Write>(&mut self, writer: &mut W) -> NetworkResult<()> {
        self.check_built()?;
        self.sync_heads();

        if !self.has_dual_head() {
            writeln!(writer, "{SCOPE_HEADER}")?;
            writeln!(writer, "{}", self.scope)?;
        }

        writeln!(writer, "{DIMENSION_HEADER}")?;
        write_row(writer, self.layers.iter().map(|layer| layer.width()))?;
        writeln!(writer, "{TYPE_HEADER}")?;
        write_row(writer, self.layers.iter().map(|layer| layer.layer_type().name()))?;

        for (i, (_, biases)) in self.parameters().enumerate() {
            writeln!(writer, "* Biases of layer {}:", i + 1)?;
            write_row(writer, biases)?;
        }

        for (i, (weights, _)) in self.parameters().enumerate() {
            writeln!(writer, "* Weights of layer {}:", i + 1)?;
            for row in weights.iter_rows() {
                write_row(writer, row)?;
            }
        }

        Ok(())
    }

    pub fn write_compact<W: Write>(&mut self, writer: &mut W) -> NetworkResult<()> {
        self.check_built()?;
        self.sync_heads();

        writeln!(writer, "{}", self.layers.len())?;
        write_row(writer, self.layers.iter().map(|layer| layer.width()))?;
        write_row(writer, self.layers.iter().map(|layer| layer.layer_type().compact_name()))?;

        for (_, biases) in self.parameters() {
            write_row(writer, biases)?;
        }

        for (weights, _) in self.parameters() {
            for row in weights.iter_rows() {
                write_row(writer, row)?;
            }
        }

        Ok(())
    }

    pub fn read_rich<B: BufRead>(reader: B) -> NetworkResult<Self> {
        let mut lines = LineReader::new(reader);

        let mut header = lines.next_line()?;
        let mut scope = None;

        if header.trim() == SCOPE_HEADER {
            scope = Some(lines.next_line()?.trim().parse::<Scope>()?);
            header = lines.next_line()?;
        }

        lines.check_header(&header, DIMENSION_HEADER)?;
        let widths = lines.parse_row::<usize>()?;
        lines.expect_header(TYPE_HEADER)?;
        let kinds = lines.parse_row_with(|token| token.parse::<LayerType>())?;

        let mut net = Self::from_shape(&widths, &kinds, &lines)?;
        if let Some(scope) = scope {
            net.scope = scope;
        }

        let count = widths.len() - 1;

        let mut biases = Vec::with_capacity(count);
        for i in 1..=count {
            lines.expect_header(&format!("* Biases of layer {i}:"))?;
            biases.push(lines.parse_sized_row(widths[i])?);
        }

        for (i, biases) in (1..=count).zip(biases) {
            lines.expect_header(&format!("* Weights of layer {i}:"))?;
            let weights = lines.parse_matrix(widths[i], widths[i - 1])?;
            net.layers[i].set_parameters(weights, biases)?;
        }

        Ok(net)
    }

    pub fn read_compact<B: BufRead>(reader: B) -> NetworkResult<Self> {
        let mut lines = LineReader::new(reader);

        let depth = lines.parse_row::<usize>()?;
        let widths = lines.parse_row::<usize>()?;
        if depth.len() != 1 || depth[0] != widths.len() {
            return Err(lines.error("layer count does not match the dimensions"));
        }

        let kinds = lines.parse_row_with(LayerType::from_compact)?;
        let mut net = Self::from_shape(&widths, &kinds, &lines)?;

        let count = widths.len() - 1;

        let mut biases = Vec::with_capacity(count);
        for &width in &widths[1..] {
            biases.push(lines.parse_sized_row(width)?);
        }

        for (i, biases) in (1..=count).zip(biases) {
            let weights = lines.parse_matrix(widths[i], widths[i - 1])?;
            net.layers[i].set_parameters(weights, biases)?;
        }

        Ok(net)
    }

    /// Writes the loss history as `index loss` lines, counting from 1.
    pub fn write_loss_log(&self, path: impl AsRef<Path>) -> NetworkResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);

        for (i, loss) in self.loss_history.iter().enumerate() {
            writeln!(writer, "{} {}", i + 1, loss)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn has_dual_head(&self) -> bool {
        self.layers.last().is_some_and(|layer| layer.as_policy_value().is_some())
    }

    fn parameters(&self) -> impl Iterator<Item = (&Matrix, &[f64])> {
        self.layers.iter().filter_map(|layer| layer.parameters())
    }

    /// Rebuilds the layer stack through the incremental builder. The Xavier
    /// draws are overwritten by the caller, so the generator is throwaway.
    fn from_shape<B>(widths: &[usize], kinds: &[LayerType], lines: &LineReader<B>) -> NetworkResult<Self> {
        if widths.len() != kinds.len() {
            return Err(lines.error("layer dimensions and types differ in length"));
        }

        if widths.len() < 2 {
            return Err(NetworkError::TooFewLayers(widths.len()));
        }

        if kinds[0] != LayerType::Input {
            return Err(lines.error("the first layer must be the input"));
        }

        let mut nprevious = 1;
        for (i, &width) in widths.iter().enumerate() {
            match width.checked_mul(nprevious) {
                Some(size) if size <= MAX_LAYER_PARAMETERS => nprevious = width,
                _ => return Err(lines.error(format!("layer {} is too large ({width} x {nprevious})", i + 1))),
            }
        }

        let mut rng = rng::seeded(0);
        let mut net = Self::new();

        for (&kind, &width) in kinds.iter().zip(widths) {
            net.add_layer(kind, width, &mut rng)?;
        }

        Ok(net)
    }
}

fn write_row<W: Write, T: Display>(writer: &mut W, items: impl IntoIterator<Item = T>) -> io::Result<()> {
    let mut first = true;

    for item in items {
        if !first {
            write!(writer, " ")?;
        }
        write!(writer, "{item}")?;
        first = false;
    }

    writeln!(writer)
}

/// Line source that remembers where it is, for error messages.
struct LineReader<B> {
    lines: Lines<B>,
    line: usize,
}

impl<B: BufRead> LineReader<B> {
    fn new(reader: B) -> Self {
        Self { lines: reader.lines(), line: 0 }
    }

    fn next_line(&mut self) -> NetworkResult<String> {
        self.line += 1;

        match self.lines.next() {
            Some(line) => Ok(line?),
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn expect_header(&mut self, header: &str) -> NetworkResult<()> {
        let line = self.next_line()?;
        self.check_header(&line, header)
    }

    fn check_header(&self, line: &str, header: &str) -> NetworkResult<()> {
        if line.trim() != header {
            return Err(self.error(format!("expected \"{header}\", found \"{}\"", line.trim())));
        }

        Ok(())
    }

    fn parse_row_with<T>(&mut self, parse: impl Fn(&str) -> NetworkResult<T>) -> NetworkResult<Vec<T>> {
        self.next_line()?.split_whitespace().map(parse).collect()
    }

    fn parse_row<T: FromStr>(&mut self) -> NetworkResult<Vec<T>> {
        let line = self.next_line()?;

        line.split_whitespace()
            .map(|token| token.parse::<T>().map_err(|_| self.error(format!("cannot parse \"{token}\""))))
            .collect()
    }

    fn parse_sized_row(&mut self, len: usize) -> NetworkResult<Vec<f64>> {
        let row = self.parse_row::<f64>()?;

        if row.len() != len {
            return Err(self.error(format!("expected {len} values, found {}", row.len())));
        }

        Ok(row)
    }

    fn parse_matrix(&mut self, rows: usize, cols: usize) -> NetworkResult<Matrix> {
        let mut vals = Vec::with_capacity(rows * cols);

        for _ in 0..rows {
            vals.extend(self.parse_sized_row(cols)?);
        }

        Matrix::from_vec(rows, cols, vals).ok_or_else(|| self.error("malformed weight matrix"))
    }
}

impl<B> LineReader<B> {
    fn error(&self, message: impl Into<String>) -> NetworkError {
        NetworkError::Parse { line: self.line, message: message.into() }
    }
}
