// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use anisotime::catalog::{Arrival, CatalogBuilder, ProgressInfo};
use anisotime::io;
use anisotime::{ComputationalMesh, Phase, Polarity, PolynomialStructure, VelocityStructure};

#[derive(Clone, Copy, ValueEnum)]
enum Model {
    /// Anisotropic PREM
    Prem,
    /// Isotropic PREM
    Iprem,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolarityArg {
    /// P-SV
    Psv,
    /// SH
    Sh,
    /// P-SV and SH for pure shear phases
    Both,
}

impl PolarityArg {
    fn polarities(self) -> &'static [Polarity] {
        match self {
            PolarityArg::Psv => &[Polarity::Psv],
            PolarityArg::Sh => &[Polarity::Sh],
            PolarityArg::Both => &[Polarity::Psv, Polarity::Sh],
        }
    }
}

#[derive(Parser)]
#[command(
    name = "anisotime",
    about = "Travel times of body-wave phases in transversely isotropic earth models"
)]
struct Cli {
    /// Velocity model
    #[arg(short = 'm', long, value_enum, default_value = "prem")]
    model: Model,

    /// Source depth [km]
    #[arg(long, default_value = "0.0")]
    depth: f64,

    /// Phase name (repeatable)
    #[arg(short = 'p', long = "phase", num_args = 1, default_values = ["P", "S"])]
    phases: Vec<String>,

    /// Epicentral distance [deg]
    #[arg(
        short = 'd',
        long,
        conflicts_with = "ray_parameter",
        required_unless_present = "ray_parameter"
    )]
    delta: Option<f64>,

    /// Ray parameter [s/deg] instead of a distance
    #[arg(long)]
    ray_parameter: Option<f64>,

    /// Default polarity of pure shear phases
    #[arg(long, value_enum, default_value = "sh")]
    polarity: PolarityArg,

    /// Mesh thickness [km]
    #[arg(long, default_value = "10.0")]
    mesh: f64,

    /// Maximum ray parameter step of the catalog [s/rad]
    #[arg(long, default_value = "2.0")]
    max_step: f64,

    /// Number of Rayon worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Write the arrivals as an N x 3 table (.npy or .mat)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Write the catalog as JSON
    #[arg(long)]
    save_catalog: Option<PathBuf>,

    /// Print catalog build progress to stderr
    #[arg(long)]
    progress: bool,
}

/// Parse every name under every polarity. Names whose polarity is fixed by
/// their letters come out once.
fn parse_phases(names: &[String], polarities: &[Polarity]) -> Result<Vec<Phase>> {
    let mut phases = Vec::new();
    for name in names {
        for &polarity in polarities {
            let phase = Phase::parse_with(name, polarity)
                .with_context(|| format!("invalid --phase '{}'", name))?;
            if !phases.contains(&phase) {
                phases.push(phase);
            }
        }
    }
    Ok(phases)
}

fn print_arrival(a: &Arrival) {
    println!(
        "{:<12} {:>12.6} {:>10.4} {:>12.4}",
        a.phase.to_string(),
        a.ray_parameter_per_degree(),
        a.delta_degrees(),
        a.time
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let structure: Arc<dyn VelocityStructure> = match cli.model {
        Model::Prem => Arc::new(PolynomialStructure::prem()),
        Model::Iprem => Arc::new(PolynomialStructure::iso_prem()),
    };
    let phases = parse_phases(&cli.phases, cli.polarity.polarities())?;

    let earth_radius = structure.earth_radius();
    let event_radius = earth_radius - cli.depth;
    if !cli.depth.is_finite()
        || cli.depth < 0.0
        || event_radius <= structure.core_mantle_boundary()
    {
        bail!(
            "--depth must lie in the mantle [0, {}) km, got {}",
            earth_radius - structure.core_mantle_boundary(),
            cli.depth
        );
    }

    let mesh = Arc::new(
        ComputationalMesh::uniform(structure.as_ref(), cli.mesh).context("invalid --mesh")?,
    );

    let mut builder = CatalogBuilder::new(structure.clone(), mesh.clone())
        .with_max_step(cli.max_step)
        .context("invalid --max-step")?;
    if let Some(threads) = cli.threads {
        builder = builder.with_threads(threads);
    }
    if cli.progress {
        builder = builder.with_progress(Box::new(|info: ProgressInfo| {
            eprintln!(
                "[{:.1}s] rays_computed={}/{}",
                info.elapsed.as_secs_f64(),
                info.rays_computed,
                info.total_rays,
            );
        }));
    }
    let catalog = builder.build().context("building ray catalog")?;

    if let Some(path) = &cli.save_catalog {
        io::save_catalog(&catalog, path)
            .with_context(|| format!("writing catalog to {}", path.display()))?;
    }

    let mut arrivals = Vec::new();
    for phase in &phases {
        let found = match (cli.delta, cli.ray_parameter) {
            (Some(delta), _) => catalog.arrivals(phase, event_radius, delta.to_radians()),
            (None, Some(p)) => catalog
                .search_ray_parameter(phase, event_radius, p.to_degrees())
                .into_iter()
                .collect(),
            (None, None) => bail!("either --delta or --ray-parameter is required"),
        };
        if found.is_empty() {
            eprintln!("{}: no arrival", phase);
        }
        arrivals.extend(found);
    }

    for a in &arrivals {
        print_arrival(a);
    }

    if let Some(path) = &cli.table {
        io::save_table(&arrivals, path)
            .with_context(|| format!("writing table to {}", path.display()))?;
    }

    Ok(())
}
