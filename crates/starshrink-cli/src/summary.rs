use std::path::Path;

use console::Style;
use starshrink_core::batch::{BatchReport, OutcomeStatus};
use starshrink_core::pipeline::BatchConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    success: Style,
    failure: Style,
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
            success: Style::new().green().bold(),
            failure: Style::new().red().bold(),
        }
    }
}

fn rule(len: usize) -> String {
    "\u{2550}".repeat(len)
}

pub fn print_config_summary(config: &BatchConfig, input: &Path, output: &Path) {
    let s = Styles::new();
    let p = &config.pipeline;

    println!();
    println!("  {}", s.title.apply_to("Star Reduction"));
    println!("  {}", s.title.apply_to(rule(14)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    if let Some(jobs) = config.jobs {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Jobs"),
            s.value.apply_to(jobs)
        );
    }
    println!();

    // Erosion
    println!("  {}", s.header.apply_to("Erosion"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Kernel"),
        s.value.apply_to(format!("{k}x{k}", k = p.kernel_size))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Iterations"),
        s.value.apply_to(p.erosion_iterations)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(&p.erosion_mode)
    );
    if p.pre_erosion_pass {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Pre-pass"),
            s.value.apply_to(format!("{k}x{k}", k = p.pre_pass_kernel_size))
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Pre-pass"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();

    // Mask
    println!("  {}", s.header.apply_to("Star Mask"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Threshold"),
        s.value.apply_to(format!("{}th percentile", p.threshold_percentile))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Halo"),
        s.value.apply_to(format!(
            "{} x {c}x{c} dilation",
            p.mask.halo_dilation_iterations,
            c = p.mask.cleanup_kernel_size
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Feather"),
        s.value.apply_to(format!(
            "{b}x{b}, sigma {}, gain {}",
            p.mask.blur_sigma,
            p.mask.gain,
            b = p.mask.blur_kernel_size
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Flat chan."),
        s.method.apply_to(&p.flat_channel)
    );
    println!();

    // Output
    let o = &config.output;
    println!("  {}", s.header.apply_to("Output"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Format"),
        s.method.apply_to(&o.format)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Range"),
        s.method.apply_to(&o.mode)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Suffix"),
        s.value.apply_to(&o.suffix)
    );
    if o.save_intermediates {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Extras"),
            s.value.apply_to("original, mask, eroded")
        );
    }
    println!();
}

pub fn print_batch_report(report: &BatchReport) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Batch Report"));
    println!("  {}", s.title.apply_to(rule(12)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Total"),
        s.value.apply_to(report.total())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Success"),
        s.success.apply_to(report.success_count())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Failure"),
        if report.failure_count() > 0 {
            s.failure.apply_to(report.failure_count())
        } else {
            s.value.apply_to(report.failure_count())
        }
    );
    println!();

    for outcome in &report.outcomes {
        match &outcome.status {
            OutcomeStatus::Success(path) => println!(
                "    {} {} {}",
                s.success.apply_to("ok  "),
                outcome.file_name(),
                s.label.apply_to(format!("-> {}", path.display()))
            ),
            OutcomeStatus::Failure(message) => println!(
                "    {} {} {}",
                s.failure.apply_to("FAIL"),
                outcome.file_name(),
                s.label.apply_to(format!("-> {message}"))
            ),
        }
    }
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Report"),
        s.path.apply_to(report.report_path.display())
    );
}
