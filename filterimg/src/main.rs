//! Blank 2x2 pixel blocks whose diagonals agree, so that checkerboard
//! voxel patterns cannot turn into non-manifold mesh edges downstream.

use std::{path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use image::{Rgb, RgbImage};
use tracing_subscriber::EnvFilter;

/// Rewrite an image with 2x2 checkerboard pixel patterns blanked.
#[derive(Debug, Parser)]
#[command(name = "filterimg", version)]
struct Args {
    /// image to filter
    #[arg(long)]
    input: PathBuf,

    /// where to write the filtered image
    #[arg(long)]
    output: PathBuf,
}

/// Zero the first three channels of every 2x2 block whose diagonal
/// pixel pairs agree, scanning in row order against the raster being
/// mutated. Returns the number of blanked blocks.
fn blank_checkerboards(img: &mut RgbImage) -> usize {
    let (w, h) = img.dimensions();
    let mut blanked = 0;

    for y in 0..h.saturating_sub(1) {
        for x in 0..w.saturating_sub(1) {
            let p00 = img.get_pixel(x, y)[0];
            let p10 = img.get_pixel(x + 1, y)[0];
            let p01 = img.get_pixel(x, y + 1)[0];
            let p11 = img.get_pixel(x + 1, y + 1)[0];

            if p00 == p11 && p10 == p01 {
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    img.put_pixel(x + dx, y + dy, Rgb([0, 0, 0]));
                }
                blanked += 1;
            }
        }
    }

    blanked
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(1);
    });

    let mut img = image::open(&args.input)
        .with_context(|| format!("can't load image {}", args.input.display()))?
        .to_rgb8();

    let blanked = blank_checkerboards(&mut img);
    tracing::debug!(blocks = blanked, "checkerboard blocks blanked");

    img.save(&args.output)
        .with_context(|| format!("can't write image {}", args.output.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_image(w: u32, h: u32, luma: &[u8]) -> RgbImage {
        let mut img = RgbImage::new(w, h);
        for (i, &v) in luma.iter().enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            img.put_pixel(x, y, Rgb([v, v, v]));
        }
        img
    }

    fn luma(img: &RgbImage) -> Vec<u8> {
        img.pixels().map(|p| p[0]).collect()
    }

    #[test]
    fn test_checkerboard_is_blanked() {
        let mut img = rgb_image(2, 2, &[0xff, 0x00, 0x00, 0xff]);

        assert_eq!(blank_checkerboards(&mut img), 1);
        assert_eq!(luma(&img), vec![0; 4]);
    }

    #[test]
    fn test_lone_pixel_survives() {
        let mut img = rgb_image(2, 2, &[0xff, 0x00, 0x00, 0x00]);

        assert_eq!(blank_checkerboards(&mut img), 0);
        assert_eq!(luma(&img), vec![0xff, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_scan_is_in_place() {
        // uniform blocks match the diagonal test too, and later windows
        // see the already blanked pixels
        let mut img = rgb_image(3, 3, &[0xff; 9]);

        assert_eq!(blank_checkerboards(&mut img), 1);
        assert_eq!(
            luma(&img),
            vec![
                0x00, 0x00, 0xff,
                0x00, 0x00, 0xff,
                0xff, 0xff, 0xff,
            ]
        );
    }
}
