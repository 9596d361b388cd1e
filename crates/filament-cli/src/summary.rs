use std::path::Path;

use console::Style;
use filament_core::batch::config::BatchConfig;
use filament_core::batch::{BatchReport, RowStatus, SummaryRow};
use filament_core::fit::{FitResult, ViscosityRecord};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    ok: Style,
    warn: Style,
    error: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            error: Style::new().red().bold(),
        }
    }

    fn status(&self, status: RowStatus) -> &Style {
        match status {
            RowStatus::Converged => &self.ok,
            RowStatus::NotConverged => &self.warn,
            RowStatus::Failed => &self.error,
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_batch_summary(config: &BatchConfig, root: &Path, output: &Path) {
    let s = Styles::new();
    print_title(&s, "Filament Batch");

    println!("  {:<14}{}", s.label.apply_to("Videos"), s.path.apply_to(root.display()));
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output.display()));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(config.worker_count())
    );
    let skip = if config.skip_existing {
        s.method.apply_to("skip existing")
    } else {
        s.disabled.apply_to("recompute all")
    };
    println!("  {:<14}{}", s.label.apply_to("Existing"), skip);
    println!();

    println!("  {}", s.header.apply_to("Measurement"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Threshold"),
        s.method.apply_to(&config.binarize.threshold_method)
    );
    match config.calibration.mm_per_pixel {
        Some(scale) => println!(
            "    {:<12}{}",
            s.label.apply_to("Scale"),
            s.value.apply_to(format!("{scale} mm/px"))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Scale"),
            s.method.apply_to(format!(
                "needle {} mm on row {}",
                config.constants.needle_diameter_mm, config.calibration.nozzle_row
            ))
        ),
    }
    if let Some(fps) = config.fps_override {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Frame rate"),
            s.value.apply_to(format!("{fps} fps"))
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Fit"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.method.apply_to(&config.fit.window)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bounds"),
        s.value.apply_to(format!(
            "{:.1e} .. {:.1e} s",
            config.fit.lambda_min, config.fit.lambda_max
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Min R²"),
        s.value.apply_to(config.fit.min_r_squared)
    );
    println!();
}

pub fn print_report(report: &BatchReport) {
    let s = Styles::new();
    print_title(&s, "Results");

    let mut rows: Vec<&SummaryRow> = report.rows.iter().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    for row in rows {
        print_row_line(&s, row);
    }
    println!();

    let converged = report
        .rows
        .iter()
        .filter(|r| r.status == RowStatus::Converged)
        .count();
    println!(
        "  {} converged, {} not converged, {} failed, {} skipped",
        s.ok.apply_to(converged),
        s.warn.apply_to(report.rows.len() - converged - report.failures.len()),
        s.error.apply_to(report.failures.len()),
        s.label.apply_to(report.skipped)
    );
    if let Some(ref path) = report.summary_path {
        println!("  Summary saved to {}", s.path.apply_to(path.display()));
    }
}

fn print_row_line(s: &Styles, row: &SummaryRow) {
    let status = s.status(row.status).apply_to(row.status);
    match (&row.fit, &row.error) {
        (Some(fit), _) if row.status == RowStatus::Converged => println!(
            "  {:<40} {:<14} {}",
            row.name,
            status,
            s.value.apply_to(format!(
                "λ = {:.3e} s  R² = {:.4}",
                fit.relaxation_time, fit.r_squared
            ))
        ),
        (_, Some(err)) => println!(
            "  {:<40} {:<14} {}",
            row.name,
            status,
            s.label.apply_to(format!("{}: {}", err.kind, err.message))
        ),
        _ => println!("  {:<40} {}", row.name, status),
    }
}

pub fn print_row(row: &SummaryRow) {
    let s = Styles::new();
    print_title(&s, &row.name);
    println!(
        "  {:<14}{}",
        s.label.apply_to("Status"),
        s.status(row.status).apply_to(row.status)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value
            .apply_to(format!("{} valid of {}", row.valid_points, row.frame_count))
    );
    if let Some(fit) = &row.fit {
        print_fit_section(&s, fit, row.viscosity.as_ref());
    }
    if let Some(err) = &row.error {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Note"),
            s.warn.apply_to(&err.message)
        );
    }
    println!();
}

pub fn print_fit(fit: &FitResult, viscosity: Option<&ViscosityRecord>) {
    let s = Styles::new();
    print_title(&s, "Decay Fit");
    print_fit_section(&s, fit, viscosity);
    if let Some(ref reason) = fit.reason {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Rejected"),
            s.warn.apply_to(reason)
        );
    }
    println!();
}

fn print_fit_section(s: &Styles, fit: &FitResult, viscosity: Option<&ViscosityRecord>) {
    println!();
    println!("  {}", s.header.apply_to("Fit"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("D0"),
        s.value.apply_to(format!("{:.4} mm", fit.d0))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("λ"),
        s.value.apply_to(format!("{:.4e} s", fit.relaxation_time))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("R²"),
        s.value.apply_to(format!("{:.5}", fit.r_squared))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.value.apply_to(format!(
            "{:.4e} .. {:.4e} s ({} points)",
            fit.window_start, fit.window_end, fit.points_used
        ))
    );

    let Some(v) = viscosity else {
        return;
    };
    println!();
    println!("  {}", s.header.apply_to("Viscosity"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Strain rate"),
        s.value.apply_to(format!("{:.4e} 1/s", v.strain_rate))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("η/σ"),
        s.value
            .apply_to(format!("{:.4e} s/m", v.viscosity_over_surface_tension))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("η_E"),
        s.value.apply_to(format!("{:.4e} Pa·s", v.extensional_viscosity))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("D0/needle"),
        s.value.apply_to(format!("{:.4}", v.normalized_d0))
    );
}
