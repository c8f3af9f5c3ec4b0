/// Trowel - slice STL meshes from the command line
///
/// Usage:
///   trowel info part.stl
///   trowel slice part.stl -z 1.5 --plot

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::terminal;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use trowel_cli::{write_info, write_segments, SlicePlot};
use trowel_core::{Mesh, SliceParams};

#[derive(Parser)]
#[command(name = "trowel")]
#[command(about = "Load STL meshes and cut them with horizontal planes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show face count, centroid and bounding box of an STL file
    Info {
        /// ASCII or binary STL file
        file: PathBuf,
    },
    /// Print the contour segments where the plane at height Z cuts the mesh
    Slice {
        /// ASCII or binary STL file
        file: PathBuf,
        /// Height of the cutting plane
        #[arg(short, long, allow_hyphen_values = true)]
        z: f64,
        /// Treat vertices this close to the plane as lying on it
        #[arg(short, long, default_value_t = 0.0)]
        tolerance: f64,
        /// Draw the slice as an ASCII plot sized to the terminal
        #[arg(long)]
        plot: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut out = stdout().lock();

    match cli.command {
        Commands::Info { file } => {
            let mesh = load(&file)?;
            write_info(&mut out, &mesh)?;
        }
        Commands::Slice {
            file,
            z,
            tolerance,
            plot,
        } => {
            let mesh = load(&file)?;
            let params = SliceParams::default().with_tolerance(tolerance);
            let segments = mesh
                .slice_with(z, &params)
                .with_context(|| format!("Failed to slice {} at z = {z}", file.display()))?;

            write_segments(&mut out, z, &segments)?;
            if plot {
                let (width, height) = terminal::size().unwrap_or((80, 24));
                let mut canvas = SlicePlot::new(width as usize, height.saturating_sub(2) as usize);
                canvas.render(&segments);
                canvas.draw(&mut out)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn load(path: &Path) -> Result<Mesh> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "mesh".to_string());
    Mesh::from_stl(name, path).with_context(|| format!("Failed to load STL file {}", path.display()))
}
