use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use wrap_engine::fold::{
    ClusterSet, FoldingPattern, PivotSet, apply_fold_state, build_fold_mesh, derive_clusters, derive_pivots, fold_fix,
    normalize, tie_reveal,
};
use wrap_engine::geom::{BBox, GeomMesh, Point3, Vec3};
use wrap_engine::host::{MemoryScene, SceneHost};
use wrap_engine::ribbon::{RibbonDimensions, RibbonLayout, RibbonSize, build_ribbon_mesh, ribbon_width};
use wrap_engine::rig::{
    ColorChoice, GiftWrap, MIN_THICKNESS, Palette, PaperColor, RibbonColor, WrapOptions, render_scan_table,
    scan_wraps,
};

const SNAPSHOT_QUANTIZE: f64 = 1e-6;
const SNAPSHOT_DECIMALS: usize = 6;
const FULL_TIE: u8 = 4;

const USAGE: &str = r"wrap_cli (wrap-engine)

USAGE:
  wrap_cli fold [options]     Solve a fold plane and write it folded
  wrap_cli wrap [options]     Wrap a box in an in-memory scene
  wrap_cli colors             List the colour vocabulary

OPTIONS:
  --size <WxHxD>         Box size (default 2x1x3)
  --thickness <t>        Paper thickness (default 0.02, minimum 0.02)
  --folds <k>            Folds to apply, 0..=16 (default 16)
  --tie <n>              Ribbon tie stages to reveal, 0..=4 (default 4)
  --ribbon <S|M|L>       Ribbon size (default L)
  --paper <color>        Paper colour, `random` or `current`
  --ribbon-color <color> Ribbon colour, `random` or `current`
  --seed <n>             Seed for ids and random colours
  --obj <path>           Write the folded plane as OBJ (fold)
  --ribbon-obj <path>    Write the ribbon as OBJ (fold)
  --snapshot <path>      Write a quantized snapshot (fold)
  --state-out <path>     Write the stored wrap state as XML (wrap)
  --scan                 Print the scene scan table (wrap)
  --overwrite            Overwrite existing output files
  --verbose              Debug logging on stderr (RUST_LOG otherwise)
  -h, --help             Show this help
";

fn main() {
    if let Err(err) = run() {
        eprintln!("wrap_cli error: {err}");
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
        "fold" => {
            let options = RunOptions::parse(&mut args)?;
            init_logging(options.verbose);
            cmd_fold(&options)
        }
        "wrap" => {
            let options = RunOptions::parse(&mut args)?;
            init_logging(options.verbose);
            cmd_wrap(&options)
        }
        "colors" => {
            print_colors();
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

fn print_colors() {
    let paper: Vec<&str> = PaperColor::ALL.iter().map(|c| c.name()).collect();
    let ribbon: Vec<&str> = RibbonColor::ALL.iter().map(|c| c.name()).collect();
    println!("paper:  {}", paper.join(" "));
    println!("ribbon: {}", ribbon.join(" "));
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct RunOptions {
    size: Vec3,
    thickness: f64,
    folds: u8,
    tie: u8,
    ribbon: RibbonSize,
    paper_color: ColorChoice,
    ribbon_color: ColorChoice,
    seed: Option<u64>,
    obj_path: Option<PathBuf>,
    ribbon_obj_path: Option<PathBuf>,
    snap_path: Option<PathBuf>,
    state_path: Option<PathBuf>,
    scan: bool,
    overwrite: bool,
    verbose: bool,
}

impl RunOptions {
    fn parse(args: &mut Args) -> Result<Self, String> {
        let mut options = Self {
            size: Vec3::new(2.0, 1.0, 3.0),
            thickness: MIN_THICKNESS,
            folds: 16,
            tie: FULL_TIE,
            ribbon: RibbonSize::L,
            paper_color: ColorChoice::Random,
            ribbon_color: ColorChoice::Random,
            seed: None,
            obj_path: None,
            ribbon_obj_path: None,
            snap_path: None,
            state_path: None,
            scan: false,
            overwrite: false,
            verbose: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--size" => options.size = parse_size(&args.value("--size")?)?,
                "--thickness" => options.thickness = parse_number(&args.value("--thickness")?, "--thickness")?,
                "--folds" => options.folds = parse_number(&args.value("--folds")?, "--folds")?,
                "--tie" => options.tie = parse_number(&args.value("--tie")?, "--tie")?,
                "--ribbon" => {
                    options.ribbon = args.value("--ribbon")?.parse().map_err(|e| format!("--ribbon: {e}"))?;
                }
                "--paper" => options.paper_color = parse_color(&args.value("--paper")?),
                "--ribbon-color" => options.ribbon_color = parse_color(&args.value("--ribbon-color")?),
                "--seed" => options.seed = Some(parse_number(&args.value("--seed")?, "--seed")?),
                "--obj" => options.obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--ribbon-obj" => options.ribbon_obj_path = Some(PathBuf::from(args.value("--ribbon-obj")?)),
                "--snapshot" => options.snap_path = Some(PathBuf::from(args.value("--snapshot")?)),
                "--state-out" => options.state_path = Some(PathBuf::from(args.value("--state-out")?)),
                "--scan" => options.scan = true,
                "--overwrite" => options.overwrite = true,
                "--verbose" => options.verbose = true,
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if options.folds > 16 {
            return Err(format!("--folds must be 0..=16, got {}", options.folds));
        }
        if options.tie > FULL_TIE {
            return Err(format!("--tie must be 0..={FULL_TIE}, got {}", options.tie));
        }
        Ok(options)
    }

    fn wrap_options(&self) -> WrapOptions {
        WrapOptions::default()
            .with_thickness(self.thickness)
            .with_ribbon_size(self.ribbon)
            .with_colors(self.paper_color.clone(), self.ribbon_color.clone())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        }
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, flag: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    text.trim().parse().map_err(|e| format!("{flag}: invalid value `{text}`: {e}"))
}

fn parse_size(text: &str) -> Result<Vec3, String> {
    let parts: Vec<f64> =
        text.split(['x', 'X']).map(|part| parse_number(part, "--size")).collect::<Result<_, _>>()?;
    match parts.as_slice() {
        &[w, h, d] => Ok(Vec3::new(w, h, d)),
        _ => Err(format!("--size expects WxHxD, got `{text}`")),
    }
}

fn parse_color(text: &str) -> ColorChoice {
    match text.parse() {
        Ok(choice) => choice,
        Err(never) => match never {},
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

struct FoldRun {
    pattern: FoldingPattern,
    pivots: PivotSet,
    clusters: ClusterSet,
    folded: GeomMesh,
    ribbon: RibbonLayout,
}

fn solve_fold(options: &RunOptions) -> Result<FoldRun, String> {
    let thickness = options.wrap_options().effective_thickness();
    let (extent, orientation) = normalize(options.size).map_err(|e| e.to_string())?;
    log::info!(
        "normalized {:?} to {} x {} x {} (turn {})",
        options.size,
        extent.width,
        extent.height,
        extent.depth,
        orientation.turn_degrees()
    );

    let mut pattern = FoldingPattern::solve(extent, thickness).map_err(|e| e.to_string())?;
    let plane = build_fold_mesh(&mut pattern).map_err(|e| e.to_string())?;
    let pivots = derive_pivots(&pattern).map_err(|e| e.to_string())?;
    let clusters = derive_clusters(&pattern).map_err(|e| e.to_string())?;
    let rest = plane.positions();
    let fix = fold_fix(extent.height);

    let state = apply_fold_state(options.folds, fix).map_err(|e| e.to_string())?;
    let posed = clusters.deform(&rest, &pivots, |p| state.pose(p));
    let mut folded = plane.to_triangle_mesh();
    folded.positions = posed.iter().map(|p| p.to_array()).collect();

    let wrapped_state = apply_fold_state(16, fix).map_err(|e| e.to_string())?;
    let wrapped = clusters.deform(&rest, &pivots, |p| wrapped_state.pose(p));
    let bounds = BBox::from_points(&wrapped).ok_or("fold plane has no vertices")?.expand_by(thickness / 2.0);
    let size = bounds.size();
    let dims = RibbonDimensions::new(size.x, size.y, size.z, extent.width, thickness)
        .with_ribbon_width(ribbon_width(options.ribbon, extent.height, extent.depth));
    let ribbon = RibbonLayout::compute(dims).map_err(|e| e.to_string())?;

    Ok(FoldRun { pattern, pivots, clusters, folded, ribbon })
}

fn cmd_fold(options: &RunOptions) -> Result<(), String> {
    let run = solve_fold(options)?;
    println!(
        "{:?} plane: {} vertices, {} triangles, {} folds",
        run.pattern.topology(),
        run.folded.vertex_count(),
        run.folded.triangle_count(),
        options.folds
    );

    if let Some(path) = options.obj_path.as_deref() {
        write_obj_file(path, &run.folded, "fold_plane", options.overwrite)?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = options.ribbon_obj_path.as_deref() {
        let reveal = tie_reveal(options.tie);
        let mesh = build_ribbon_mesh(&run.ribbon, |segment| {
            reveal.iter().find(|(s, _)| *s == segment).map_or(0.0, |(_, r)| *r)
        })
        .map_err(|e| e.to_string())?;
        write_obj_file(path, &mesh, "ribbon", options.overwrite)?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = options.snap_path.as_deref() {
        write_text_file(path, &snapshot(&run, options), options.overwrite)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_wrap(options: &RunOptions) -> Result<(), String> {
    let mut scene = MemoryScene::new();
    let center = Point3::new(0.0, options.size.y / 2.0, 0.0);
    scene.create_box("gift", options.size, center).map_err(|e| e.to_string())?;

    let mut rng = options.rng();
    let wrap = GiftWrap::create(&mut scene, "gift", &options.wrap_options(), &mut rng).map_err(|e| e.to_string())?;
    wrap.fold_to(&mut scene, options.folds).map_err(|e| e.to_string())?;

    let state = wrap.state();
    let bounds = scene.bbox(&wrap.names().paper()).map_err(|e| e.to_string())?;
    let size = bounds.size();
    println!(
        "{}: paper {} ribbon {} size {} thickness {}",
        wrap.control(),
        state.paper_color,
        state.ribbon_color,
        state.ribbon_size,
        state.thickness
    );
    println!("paper bounds after {} folds: {:.4} x {:.4} x {:.4}", options.folds, size.x, size.y, size.z);

    if let Some(path) = options.state_path.as_deref() {
        let xml = state.to_xml().map_err(|e| e.to_string())?;
        write_text_file(path, &xml, options.overwrite)?;
        println!("wrote {}", path.display());
    }
    if options.scan {
        print!("{}", render_scan_table(&scan_wraps(&scene).wraps));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn snapshot(run: &FoldRun, options: &RunOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "topology {:?}", run.pattern.topology());
    let _ = writeln!(out, "folds {}", options.folds);
    write_vec3_line(&mut out, "size", options.size.to_array());

    for point in run.pattern.points() {
        let prefix = match point.vertex_index() {
            Some(index) => format!("point {} #{index}", point.key),
            None => format!("point {}", point.key),
        };
        write_vec3_line(&mut out, &prefix, point.position.to_array());
    }
    for pivot in run.pivots.iter() {
        write_vec3_line(&mut out, &format!("pivot {}", pivot.id.name()), pivot.position.to_array());
    }
    for cluster in run.clusters.iter() {
        let _ = writeln!(out, "cluster {} {}", cluster.pivot.name(), cluster.vertices.len());
    }
    for (key, point) in run.ribbon.points() {
        write_vec3_line(&mut out, &format!("ribbon {key}"), point.to_array());
    }
    for p in &run.folded.positions {
        write_vec3_line(&mut out, "v", *p);
    }
    out
}

fn normalize_snapshot_text(text: &str) -> String {
    let mut normalized = text.replace("\r\n", "\n");
    if !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

fn check_target(path: &Path, overwrite: bool) -> Result<(), String> {
    if path.exists() && !overwrite {
        return Err(format!("refusing to overwrite existing file {} (use --overwrite)", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
    }
    Ok(())
}

fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
    check_target(path, overwrite)?;
    fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
}

fn write_obj_file(path: &Path, mesh: &GeomMesh, name: &str, overwrite: bool) -> Result<(), String> {
    mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;
    check_target(path, overwrite)?;

    let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "# wrap-engine wrap_cli").map_err(|e| format!("write obj: {e}"))?;
    mesh.write_obj(&mut w, name).map_err(|e| format!("write obj: {e}"))?;
    w.flush().map_err(|e| format!("write obj: {e}"))
}

fn quantize_f64(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
    if q == 0.0 { 0.0 } else { q }
}

fn write_f64(out: &mut String, value: f64) {
    let value = quantize_f64(value);
    let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
}

fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
    let _ = write!(out, "{prefix} ");
    write_f64(out, v[0]);
    out.push(' ');
    write_f64(out, v[1]);
    out.push(' ');
    write_f64(out, v[2]);
    out.push('\n');
}

// ─────────────────────────────────────────────────────────────────────────────
// Plumbing
// ─────────────────────────────────────────────────────────────────────────────

/// `--verbose` forces debug output; otherwise `RUST_LOG` decides.
fn log_level(verbose: bool) -> Option<log::LevelFilter> {
    verbose.then_some(log::LevelFilter::Debug)
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = log_level(verbose) {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
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

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<RunOptions, String> {
        RunOptions::parse(&mut Args::new(args.iter().map(|a| (*a).to_owned()).collect()))
    }

    #[test]
    fn verbose_flag_selects_debug_logging() {
        let options = parse(&["--verbose", "--size", "1x2x3"]).expect("options");
        assert!(options.verbose);
        assert_eq!(options.size, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(log_level(options.verbose), Some(log::LevelFilter::Debug));

        let quiet = parse(&[]).expect("options");
        assert!(!quiet.verbose);
        assert_eq!(log_level(quiet.verbose), None);
    }

    #[test]
    fn logging_can_be_initialized_twice() {
        init_logging(true);
        init_logging(false);
        log::debug!("still running");
    }

    #[test]
    fn rejects_malformed_options() {
        assert!(parse_size("2x1").is_err());
        assert!(parse(&["--folds", "17"]).is_err());
        assert!(parse(&["--tie", "5"]).is_err());
        assert!(parse(&["--size"]).is_err());
        assert!(parse(&["--loud"]).is_err());
    }
}
