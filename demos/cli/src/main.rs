use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;

use spacetree::{
    cell::Cell,
    marching::{MarchingPrimitives, StructuredGrid, Unstructured},
    mesh::{Mesh, MeshBuilder},
    pool::{ThreadCount, ThreadPool},
    primitive::{Cube, Cuboid},
    sampler::CartesianGridSampler,
    split::{Linear, MidPoint, SplitPolicy, Weighted},
    tree::{Settings, SpaceTreeNode},
    types::Point,
};

/// Subdivision and meshing of simple implicit shapes
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,

    /// Shape to process
    #[clap(short, long, value_enum, default_value_t = ShapeKind::Sphere)]
    shape: ShapeKind,
}

#[derive(Subcommand)]
enum Command {
    /// Builds an adaptive space tree around the shape
    Tree {
        #[clap(flatten)]
        settings: TreeSettings,
    },
    /// Meshes the shape on a regular grid
    March {
        #[clap(flatten)]
        settings: MarchSettings,
    },
}

#[derive(ValueEnum, Copy, Clone)]
enum ShapeKind {
    Sphere,
    Torus,
}

impl ShapeKind {
    fn oracle(self) -> fn(&Point<3>) -> f64 {
        match self {
            ShapeKind::Sphere => |p| p.norm() - 0.6,
            ShapeKind::Torus => |p| {
                let q = (p.x.powi(2) + p.y.powi(2)).sqrt() - 0.6;
                (q.powi(2) + p.z.powi(2)).sqrt() - 0.25
            },
        }
    }
}

#[derive(ValueEnum, Copy, Clone)]
enum PolicyKind {
    Mid,
    Linear,
    Weighted,
}

#[derive(ValueEnum, Copy, Clone)]
enum CellKind {
    Cube,
    Box,
}

#[derive(Parser)]
struct TreeSettings {
    /// Maximum tree depth
    #[clap(short, long, default_value_t = 5)]
    depth: usize,

    /// Sample points per axis in each cell
    #[clap(long, default_value_t = 3)]
    samples: usize,

    /// Split policy
    #[clap(short, long, value_enum, default_value_t = PolicyKind::Mid)]
    policy: PolicyKind,

    /// Cell type
    #[clap(short, long, value_enum, default_value_t = CellKind::Cube)]
    cell: CellKind,

    /// Number of threads to use
    #[clap(short, long)]
    threads: Option<NonZeroUsize>,

    /// Disable memoization of oracle values
    #[clap(long)]
    no_memoize: bool,

    /// Name of a `.boxes` file to write with the boundary leaves
    #[clap(long)]
    boxes: Option<PathBuf>,

    /// Name of a `.stl` file to write, meshing the boundary leaves
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Number of times to subdivide (for benchmarking)
    #[clap(short = 'N', default_value_t = 1)]
    n: usize,
}

#[derive(Parser)]
struct MarchSettings {
    /// Grid points per axis
    #[clap(long, default_value_t = 64)]
    size: usize,

    /// Name of a `.stl` file to write
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Number of threads to use
    #[clap(short, long)]
    threads: Option<NonZeroUsize>,

    /// Number of times to mesh (for benchmarking)
    #[clap(short = 'N', default_value_t = 1)]
    n: usize,
}

fn thread_count(threads: Option<NonZeroUsize>) -> ThreadCount {
    threads.map(ThreadCount::from).unwrap_or_default()
}

fn thread_pool(threads: ThreadCount) -> Result<Option<ThreadPool>> {
    Ok(match threads.get() {
        Some(n) => Some(ThreadPool::new(n)?),
        None => None,
    })
}

fn save_stl(mesh: &Mesh<3>, out: &Path) -> Result<()> {
    let mut file = std::fs::File::create(out)?;
    mesh.write_stl(&mut file)?;
    info!("Wrote {} triangles to {out:?}", mesh.faces.len());
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////

fn run_tree<C, P>(
    cell: C,
    policy: P,
    target: fn(&Point<3>) -> f64,
    settings: &TreeSettings,
) -> Result<()>
where
    C: Cell<3> + Into<Cuboid<3>>,
    P: SplitPolicy + 'static,
{
    let sampler = Arc::new(CartesianGridSampler::new(settings.samples)?);
    info!("Sampling {} points per axis in each node", sampler.per_axis());
    let policy = Arc::new(policy);
    let target = Arc::new(target);
    let cfg = Settings {
        max_level: settings.depth,
        threads: thread_count(settings.threads),
        memoize: !settings.no_memoize,
    };

    let start = Instant::now();
    let mut root = None;
    for _ in 0..settings.n {
        let node = Arc::new(SpaceTreeNode::new(
            cell,
            sampler.clone(),
            policy.clone(),
        ));
        node.build(&target, &cfg)?;
        root = Some(node);
    }
    let Some(root) = root else {
        return Ok(());
    };
    info!(
        "Divided {}x at {:?} ms/tree",
        settings.n,
        start.elapsed().as_micros() as f64 / 1000.0 / (settings.n as f64)
    );
    info!("Tree has {} nodes, depth {}", root.node_count(), root.depth());

    let leaves = root.boundary_leaves();
    info!("Found {} boundary leaves", leaves.len());

    if let Some(path) = &settings.boxes {
        let boxes: Vec<Cuboid<3>> =
            leaves.iter().map(|c| (*c).into()).collect();
        let file = BufWriter::new(std::fs::File::create(path)?);
        bincode::serialize_into(file, &boxes)?;
        info!("Wrote {} boxes to {path:?}", boxes.len());
    }

    if let Some(path) = &settings.out {
        let start = Instant::now();
        let pool = thread_pool(cfg.threads)?;
        let builder = MeshBuilder::new();
        MarchingPrimitives::marching_cubes(
            Unstructured::new(&leaves),
            target.as_ref(),
            |f| builder.push(f),
        )
        .execute(pool.as_ref());
        let mesh = builder.take();
        info!("Meshed boundary leaves in {:?}", start.elapsed());
        save_stl(&mesh, path)?;
    }
    Ok(())
}

fn run_tree_with_policy<C>(
    cell: C,
    target: fn(&Point<3>) -> f64,
    settings: &TreeSettings,
) -> Result<()>
where
    C: Cell<3> + Into<Cuboid<3>>,
{
    match settings.policy {
        PolicyKind::Mid => run_tree(cell, MidPoint, target, settings),
        PolicyKind::Linear => run_tree(cell, Linear, target, settings),
        PolicyKind::Weighted => run_tree(cell, Weighted, target, settings),
    }
}

fn run_march(
    target: fn(&Point<3>) -> f64,
    settings: &MarchSettings,
) -> Result<Mesh<3>> {
    let grid = StructuredGrid::new([(-1.0, 1.0); 3], [settings.size; 3])?;
    let pool = thread_pool(thread_count(settings.threads))?;

    let mut mesh = Mesh::new();
    for _ in 0..settings.n {
        let builder = MeshBuilder::new();
        MarchingPrimitives::marching_cubes(grid, &target, |f| builder.push(f))
            .execute(pool.as_ref());
        mesh = builder.take();
    }
    Ok(mesh)
}

////////////////////////////////////////////////////////////////////////////////

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    let target = args.shape.oracle();

    match args.cmd {
        Command::Tree { settings } => {
            let base = Point::<3>::repeat(-1.0);
            match settings.cell {
                CellKind::Cube => {
                    let cell = Cube::new(base, 2.0)?;
                    run_tree_with_policy(cell, target, &settings)?;
                }
                CellKind::Box => {
                    let cell = Cuboid::new(base, Point::<3>::repeat(2.0))?;
                    run_tree_with_policy(cell, target, &settings)?;
                }
            }
        }
        Command::March { settings } => {
            let start = Instant::now();
            let mesh = run_march(target, &settings)?;
            info!(
                "Meshed {}x at {:?} ms/frame",
                settings.n,
                start.elapsed().as_micros() as f64
                    / 1000.0
                    / (settings.n as f64)
            );
            if let Some(out) = &settings.out {
                save_stl(&mesh, out)?;
            }
        }
    }
    Ok(())
}
