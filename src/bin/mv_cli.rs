use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mv_modeller::geom::{GeomMeshDiagnostics, Point3};
use mv_modeller::modeller::{ModellerOptions, StitchDiagnostics, ValveModeller};

const USAGE: &str = r#"mv_cli (mv-modeller)

USAGE:
  mv_cli list
  mv_cli run <scenario> [options]
  mv_cli options

SCENARIOS:
  four_leaflets
  three_leaflets
  leaflet_apex

OPTIONS (run):
  --config <path>    Read modeller options from a JSON file (missing fields keep defaults)
  --obj <path>       Write the stitched surface as OBJ
  --json             Print a JSON summary on stdout
  --overwrite        Overwrite existing output files
  -h, --help         Show this help

`options` prints the default modeller options as JSON.
"#;

fn main() {
    mv_modeller::initialize();
    if let Err(err) = run() {
        eprintln!("mv_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "list" => {
            for scenario in Scenario::ALL {
                println!("{}", scenario.name());
            }
            Ok(())
        }
        "run" => cmd_run(&mut args),
        "options" => {
            let text = serde_json::to_string_pretty(&ModellerOptions::default())
                .map_err(|e| format!("serialize options: {e}"))?;
            println!("{text}");
            Ok(())
        }
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_usage() {
    println!("{USAGE}");
}

/// Parsed `run` command line.
#[derive(Debug, PartialEq)]
struct RunArgs {
    scenario: Scenario,
    config: Option<PathBuf>,
    obj_path: Option<PathBuf>,
    json: bool,
    overwrite: bool,
}

/// `Ok(None)` when help was requested.
fn parse_run_args(args: &mut Args) -> Result<Option<RunArgs>, String> {
    let scenario_name = args.next().ok_or("missing scenario name")?;

    let mut config: Option<PathBuf> = None;
    let mut obj_path: Option<PathBuf> = None;
    let mut json = false;
    let mut overwrite = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.value("--config")?)),
            "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
            "--json" => json = true,
            "--overwrite" => overwrite = true,
            "-h" | "--help" => return Ok(None),
            other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
        }
    }

    let scenario =
        Scenario::from_str(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?;
    Ok(Some(RunArgs {
        scenario,
        config,
        obj_path,
        json,
        overwrite,
    }))
}

fn cmd_run(args: &mut Args) -> Result<(), String> {
    let Some(RunArgs {
        scenario,
        config,
        obj_path,
        json,
        overwrite,
    }) = parse_run_args(args)?
    else {
        print_usage();
        return Ok(());
    };

    let options = match config.as_deref() {
        Some(path) => read_options(path)?,
        None => ModellerOptions::default(),
    };

    let output = run_scenario(scenario, options)?;

    if let Some(path) = obj_path.as_deref() {
        write_obj_file(path, &output.modeller, scenario.name(), overwrite)?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        let summary = serde_json::json!({
            "scenario": scenario.name(),
            "profile_points": output.profile_points,
            "planes": output.plane_count,
            "vertices": output.vertices,
            "triangles": output.triangles,
            "volume": output.volume,
            "watertight": output.mesh_diag.is_watertight(),
            "mesh": output.mesh_diag,
            "stitch": output.stitch,
        });
        let text = serde_json::to_string_pretty(&summary).map_err(|e| format!("serialize summary: {e}"))?;
        println!("{text}");
    }

    eprintln!(
        "{}: profile={} planes={} vertices={} triangles={} | {}",
        scenario.name(),
        output.profile_points,
        output.plane_count,
        output.vertices,
        output.triangles,
        output.mesh_diag.summary()
    );
    Ok(())
}

fn read_options(path: &Path) -> Result<ModellerOptions, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("parse {}: {e}", path.display()))
}

fn unknown_scenario(name: &str) -> String {
    let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
    for scenario in Scenario::ALL {
        msg.push_str(&format!("  {}\n", scenario.name()));
    }
    msg
}

fn write_obj_file(
    path: &Path,
    modeller: &ValveModeller,
    name: &str,
    overwrite: bool,
) -> Result<(), String> {
    let mesh = modeller.surface().ok_or("no surface was generated")?;
    mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

    if path.exists() && !overwrite {
        return Err(format!(
            "refusing to overwrite existing file {} (use --overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
    }

    let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "# mv-modeller mv_cli").map_err(|e| format!("write obj: {e}"))?;
    w.write_all(mesh.to_obj(name).as_bytes())
        .map_err(|e| format!("write obj: {e}"))?;
    w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
}

struct ScenarioOutput {
    modeller: ValveModeller,
    profile_points: usize,
    plane_count: usize,
    vertices: usize,
    triangles: usize,
    volume: f64,
    mesh_diag: GeomMeshDiagnostics,
    stitch: StitchDiagnostics,
}

/// Plays a full capture session: opening landmarks, one leaflet per
/// selected plane, then the surface.
fn run_scenario(scenario: Scenario, options: ModellerOptions) -> Result<ScenarioOutput, String> {
    let mut modeller = ValveModeller::new(options);

    modeller.begin_opening_capture();
    for p in opening_landmarks() {
        modeller.capture_mut().add_point(p);
    }
    let profile_points = modeller
        .end_opening_capture()
        .map_err(|e| format!("opening: {e}"))?
        .len();
    let plane_count = modeller.planes().map_or(0, |p| p.len());

    let leaflets = scenario.leaflets();
    for (i, landmarks) in leaflets.iter().enumerate() {
        if plane_count > 0 {
            let plane = i * plane_count / leaflets.len();
            modeller
                .select_plane(plane)
                .map_err(|e| format!("select plane {plane}: {e}"))?;
        }
        modeller.begin_leaflet_capture();
        for &p in landmarks {
            modeller.capture_mut().add_point(p);
        }
        modeller
            .end_leaflet_capture(i + 1)
            .map_err(|e| format!("leaflet {}: {e}", i + 1))?;
    }

    let (mesh, mesh_diag, stitch) = modeller
        .generate_surface()
        .map_err(|e| format!("surface: {e}"))?;

    Ok(ScenarioOutput {
        profile_points,
        plane_count,
        vertices: mesh.vertex_count(),
        triangles: mesh.triangle_count(),
        volume: mesh.signed_volume(),
        mesh_diag,
        stitch,
        modeller,
    })
}

fn opening_landmarks() -> Vec<Point3> {
    (0..8)
        .map(|i| {
            let a = std::f64::consts::TAU * f64::from(i) / 8.0;
            Point3::new(18.0 * a.cos(), 14.0 * a.sin(), 1.5 * (2.0 * a).cos())
        })
        .collect()
}

/// Landmarks hanging from the annulus at `angle` down towards `tip_radius`.
fn leaflet_landmarks(angle: f64, tip_radius: f64) -> Vec<Point3> {
    (0..6)
        .map(|j| {
            let t = f64::from(j) / 5.0;
            let r = 16.0 + (tip_radius - 16.0) * t;
            let sag = -12.0 * t + 2.0 * (std::f64::consts::PI * t).sin();
            Point3::new(r * angle.cos(), r * angle.sin(), sag)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    FourLeaflets,
    ThreeLeaflets,
    LeafletApex,
}

impl Scenario {
    const ALL: &'static [Scenario] = &[
        Scenario::FourLeaflets,
        Scenario::ThreeLeaflets,
        Scenario::LeafletApex,
    ];

    fn name(self) -> &'static str {
        match self {
            Scenario::FourLeaflets => "four_leaflets",
            Scenario::ThreeLeaflets => "three_leaflets",
            Scenario::LeafletApex => "leaflet_apex",
        }
    }

    fn from_str(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    fn leaflets(self) -> Vec<Vec<Point3>> {
        let (count, tip) = match self {
            Scenario::FourLeaflets => (4, 6.0),
            Scenario::ThreeLeaflets => (3, 6.0),
            Scenario::LeafletApex => (4, 0.0),
        };
        (0..count)
            .map(|c| {
                let angle = std::f64::consts::TAU * f64::from(c) / f64::from(count);
                leaflet_landmarks(angle, tip)
            })
            .collect()
    }
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next().ok_or_else(|| format!("missing value for {flag}"))
    }
}
