use std::{
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context};
use plotters::prelude::*;
use structopt::StructOpt;

/// Plots a loss log written by `NeuralNet::write_loss_log`.
#[derive(StructOpt)]
pub struct GraphOptions {
    #[structopt(required = true, short, long)]
    input: PathBuf,
    #[structopt(required = true, short, long)]
    output: PathBuf,
    /// Width of the moving average.
    #[structopt(short, long, default_value = "10")]
    window: usize,
}

const RAW_COLOUR: RGBColor = RGBColor(31, 119, 180);
const SMOOTH_COLOUR: RGBColor = RGBColor(255, 127, 14);
const CHART_BG_COLOUR: RGBAColor = RGBAColor(234, 234, 242, 1.0);

const RAW_LINE_STROKE_WIDTH: u32 = 1;
const SMOOTH_LINE_STROKE_WIDTH: u32 = 2;
const LEGEND_STROKE_WIDTH: u32 = 4;
const LEGEND_DRAW_OFFSET: i32 = 30;

const X_LABEL_AREA_SIZE: i32 = 60;
const Y_LABEL_AREA_SIZE: i32 = 80;

const TITLE_FONT_SIZE: i32 = 40;
const LABEL_FONT_SIZE: i32 = 24;
const TICKS_FONT_SIZE: i32 = 20;

const FONT: &str = "sans-serif";

const MARGIN: i32 = 20;

/// 1080p
const IMG_DIMS: (u32, u32) = (1920, 1080);

const NOISY_PLOT_OPACITY: f64 = 0.3;

/// Calculates the simple moving average
fn moving_average(data: &[f64], window_size: usize) -> Vec<f64> {
    data.windows(window_size).map(|window| window.iter().sum::<f64>() / window_size as f64).collect()
}

fn draw_error<E: Display>(err: E) -> anyhow::Error {
    anyhow!("Failed to draw chart: {err}")
}

fn read_log(path: &Path) -> anyhow::Result<Vec<f64>> {
    let file = BufReader::new(File::open(path).with_context(|| format!("Failed to open {}.", path.display()))?);

    let mut losses = Vec::new();
    for (i, line) in file.lines().enumerate() {
        let line = line?;
        let Some(loss) = line.split_whitespace().last() else {
            continue;
        };

        losses.push(loss.parse().with_context(|| format!("Bad loss on line {}.", i + 1))?);
    }

    Ok(losses)
}

impl GraphOptions {
    pub fn run(&self) -> anyhow::Result<()> {
        if self.window == 0 {
            bail!("Moving average window must be positive!");
        }

        let data = read_log(&self.input)?;
        if data.is_empty() {
            bail!("No losses found in {}.", self.input.display());
        }

        let x_max = data.len() as i32;
        let y_min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let y_max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let y_max = if y_max > y_min { y_max } else { y_min + 1.0 };

        let root = BitMapBackend::new(&self.output, IMG_DIMS).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Training loss", (FONT, TITLE_FONT_SIZE))
            .margin(MARGIN)
            .x_label_area_size(X_LABEL_AREA_SIZE)
            .y_label_area_size(Y_LABEL_AREA_SIZE)
            .build_cartesian_2d(0..x_max, y_min..y_max)
            .map_err(draw_error)?;

        chart.plotting_area().fill(&CHART_BG_COLOUR).map_err(draw_error)?;

        chart
            .configure_mesh()
            .x_label_style((FONT, TICKS_FONT_SIZE).into_font())
            .y_label_style((FONT, TICKS_FONT_SIZE).into_font())
            .axis_desc_style((FONT, LABEL_FONT_SIZE).into_font())
            .x_desc("Update")
            .y_desc("Loss")
            .draw()
            .map_err(draw_error)?;

        chart
            .draw_series(LineSeries::new(
                data.iter().enumerate().map(|(x, &y)| (x as i32, y)),
                ShapeStyle::from(RAW_COLOUR.mix(NOISY_PLOT_OPACITY)).stroke_width(RAW_LINE_STROKE_WIDTH),
            ))
            .map_err(draw_error)?
            .label("loss")
            .legend(|(x, y)| {
                PathElement::new(
                    [(x, y), (x + LEGEND_DRAW_OFFSET, y)],
                    ShapeStyle::from(RAW_COLOUR).stroke_width(LEGEND_STROKE_WIDTH),
                )
            });

        if data.len() >= self.window {
            let offset = self.window - 1;
            let smoothed = moving_average(&data, self.window);

            chart
                .draw_series(LineSeries::new(
                    smoothed.iter().enumerate().map(|(x, &y)| ((x + offset) as i32, y)),
                    ShapeStyle::from(SMOOTH_COLOUR).stroke_width(SMOOTH_LINE_STROKE_WIDTH),
                ))
                .map_err(draw_error)?
                .label(format!("moving average ({})", self.window))
                .legend(|(x, y)| {
                    PathElement::new(
                        [(x, y), (x + LEGEND_DRAW_OFFSET, y)],
                        ShapeStyle::from(SMOOTH_COLOUR).stroke_width(LEGEND_STROKE_WIDTH),
                    )
                });
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT, LABEL_FONT_SIZE).into_font())
            .draw()
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;

        println!("Plot saved to {}", self.output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_window() {
        assert_eq!(moving_average(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.5, 2.5, 3.5]);
        assert!(moving_average(&[1.0], 2).is_empty());
    }
}
