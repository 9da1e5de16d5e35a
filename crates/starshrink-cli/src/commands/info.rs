use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use starshrink_core::io::fits::FitsReader;

#[derive(Args)]
pub struct InfoArgs {
    /// Input FITS file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = FitsReader::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let header = &reader.header;

    println!("File:        {}", args.file.display());
    println!("HDU:         {}", reader.hdu_index);
    let dims: Vec<String> = header.axes.iter().map(|a| a.to_string()).collect();
    println!("Dimensions:  {}", dims.join("x"));
    println!("BITPIX:      {}", header.bitpix);
    if header.bscale != 1.0 || header.bzero != 0.0 {
        println!("Scaling:     {} * v + {}", header.bscale, header.bzero);
    }

    if let Some(obj) = header.object() {
        println!("Object:      {}", obj);
    }
    if let Some(tel) = header.telescope() {
        println!("Telescope:   {}", tel);
    }
    if let Some(inst) = header.instrument() {
        println!("Instrument:  {}", inst);
    }
    if let Some(date) = header.date_obs() {
        println!("Date:        {}", date);
    }
    if let Some(exp) = header.exposure_time() {
        println!("Exposure:    {} s", exp);
    }

    let raw = reader.read_image()?;
    let (min, max) = raw
        .data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min <= max {
        println!("Range:       {} .. {}", min, max);
    }

    let total_mb = reader.data_raw().len() as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
