//! Log-log SVG plot of binary counts

use std::f64::consts::TAU;
use std::path::Path;

use plotters::prelude::*;

use crate::analysis::binary_counts::CountSummary;
use crate::analysis::AnalysisError;

/// Lower y limit; counts of zero fall off the bottom of the log axis
const Y_MIN: f64 = 1.0e-4;

#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub tmax: f64, // orbits
    pub ymax: f64,
    pub sim_color: String,
    pub analytic_color: String,
}

/// Color from a name (black, red, green, blue, ...) or `#rrggbb`
pub fn parse_color(name: &str) -> Option<RGBColor> {
    let name = name.trim().to_lowercase();
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(RGBColor(channel(0)?, channel(2)?, channel(4)?));
    }
    let color = match name.as_str() {
        "black" | "k" => BLACK,
        "red" | "r" => RED,
        "green" | "g" => GREEN,
        "blue" | "b" => BLUE,
        "cyan" | "c" => CYAN,
        "magenta" | "m" => MAGENTA,
        "yellow" | "y" => YELLOW,
        "white" | "w" => WHITE,
        "gray" | "grey" => RGBColor(128, 128, 128),
        "orange" => RGBColor(255, 165, 0),
        _ => return None,
    };
    Some(color)
}

fn plot_err(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Plot(e.to_string())
}

/// Positive points of a curve, time in orbits
fn curve(t_std: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
    t_std
        .iter()
        .zip(values)
        .map(|(&t, &y)| (t / TAU, y))
        .filter(|&(t, y)| t > 0.0 && y > 0.0)
        .collect()
}

pub fn plot_counts(path: &Path, summary: &CountSummary, style: &PlotStyle) -> Result<(), AnalysisError> {
    let sim_color = parse_color(&style.sim_color)
        .ok_or_else(|| AnalysisError::Plot(format!("unknown color `{}`", style.sim_color)))?;
    let analytic_color = parse_color(&style.analytic_color)
        .ok_or_else(|| AnalysisError::Plot(format!("unknown color `{}`", style.analytic_color)))?;

    let root = SVGBackend::new(path, (1000, 900)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let t_max = style.tmax.max(1.0 + f64::EPSILON);
    let y_max = style.ymax.max(Y_MIN * 10.0);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((1.0..t_max).log_scale(), (Y_MIN..y_max).log_scale())
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Time [Orbits]")
        .y_desc("Number of binaries")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            curve(&summary.t_std, &summary.analytic_mean),
            &analytic_color,
        ))
        .map_err(plot_err)?
        .label("Slichting+Sari")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], analytic_color));

    chart
        .draw_series(LineSeries::new(curve(&summary.t_std, &summary.sim_mean), &sim_color))
        .map_err(plot_err)?
        .label("Simulation")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], sim_color));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
