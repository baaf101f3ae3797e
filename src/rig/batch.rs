//! Batch wrapping, scene scans and bulk edits.
//!
//! Every batch call returns one `Result` per item and keeps going after a
//! failure; nothing here aborts half way through a list.

use rand::Rng;
use regex::Regex;

use super::color::ColorChoice;
use super::options::WrapOptions;
use super::wrap::GiftWrap;
use super::WrapError;
use crate::host::SceneHost;
use crate::ribbon::RibbonSize;

/// Most targets wrapped by one [`wrap_all`] call.
pub const MAX_BATCH: usize = 32;

/// Scene paths of wrap control handles directly under their main group.
const SCAN_PATTERN: &str = r"^.*_gift_wrap_[0-9A-Z]{5}_GRP\|CTRL_gift_[0-9A-Z]{5}$";

const COLUMNS: [(&str, usize); 7] = [
    ("Object", 18),
    ("ID", 8),
    ("P. Weight", 10),
    ("P. Color", 10),
    ("R. Color", 10),
    ("R. Size", 10),
    ("Animation", 10),
];

/// Wrap the first [`MAX_BATCH`] targets with the same options.
pub fn wrap_all<H: SceneHost + ?Sized, S: AsRef<str>>(
    host: &mut H,
    targets: &[S],
    options: &WrapOptions,
    rng: &mut impl Rng,
) -> Vec<Result<GiftWrap, WrapError>> {
    if targets.len() > MAX_BATCH {
        log::warn!("{} targets selected, wrapping the first {MAX_BATCH}", targets.len());
    }
    let results: Vec<_> = targets
        .iter()
        .take(MAX_BATCH)
        .map(|target| GiftWrap::create(host, target.as_ref(), options, rng))
        .collect();
    let done = results.iter().filter(|r| r.is_ok()).count();
    log::info!("wrapped {done} of {} targets", results.len());
    results
}

/// Outcome of a scene scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub wraps: Vec<GiftWrap>,
    /// Control handles that matched but did not load.
    pub failures: Vec<(String, WrapError)>,
}

impl ScanReport {
    #[must_use]
    pub fn controls(&self) -> Vec<String> {
        self.wraps.iter().map(GiftWrap::control).collect()
    }
}

/// Find and load every wrap in the scene.
pub fn scan_wraps<H: SceneHost + ?Sized>(host: &H) -> ScanReport {
    let mut report = ScanReport::default();
    let pattern = match Regex::new(SCAN_PATTERN) {
        Ok(pattern) => pattern,
        Err(e) => {
            log::warn!("scan pattern rejected: {e}");
            return report;
        }
    };

    for path in host.list_paths().into_iter().filter(|p| pattern.is_match(p)) {
        let control = path.rsplit('|').next().unwrap_or(path.as_str()).to_owned();
        match GiftWrap::load(host, &control) {
            Ok(wrap) => report.wraps.push(wrap),
            Err(e) => {
                log::warn!("skipping `{path}`: {e}");
                report.failures.push((control, e));
            }
        }
    }
    log::info!("scan found {} wraps, {} unreadable", report.wraps.len(), report.failures.len());
    report
}

fn cell(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    format!("{clipped:<width$} ")
}

/// Fixed-width listing of the loaded wraps, one per line.
#[must_use]
pub fn render_scan_table(wraps: &[GiftWrap]) -> String {
    if wraps.is_empty() {
        return "None found\n".to_owned();
    }
    let row = |cells: [String; 7]| -> String {
        let mut line: String = cells.iter().zip(COLUMNS).map(|(text, (_, width))| cell(text, width)).collect();
        line.push('\n');
        line
    };

    let mut out = row(COLUMNS.map(|(title, _)| title.to_owned()));
    let rule_width: usize = COLUMNS.iter().map(|(_, width)| width + 1).sum();
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');
    for wrap in wraps {
        let state = wrap.state();
        out.push_str(&row([
            state.name.clone(),
            state.id.clone(),
            state.thickness.to_string(),
            state.paper_color.to_string(),
            state.ribbon_color.to_string(),
            state.ribbon_size.to_string(),
            format!("{} - {}", state.anim_start, state.anim_end),
        ]));
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Bulk edits over control handles
// ─────────────────────────────────────────────────────────────────────────────

fn edit_each<H, S, F>(host: &mut H, controls: &[S], what: &str, mut edit: F) -> Vec<Result<GiftWrap, WrapError>>
where
    H: SceneHost + ?Sized,
    S: AsRef<str>,
    F: FnMut(&mut H, &mut GiftWrap) -> Result<(), WrapError>,
{
    controls
        .iter()
        .map(|control| -> Result<GiftWrap, WrapError> {
            let mut wrap = GiftWrap::load(host, control.as_ref())?;
            edit(host, &mut wrap)?;
            Ok(wrap)
        })
        .inspect(|result| {
            if let Err(e) = result {
                log::warn!("{what}: {e}");
            }
        })
        .collect()
}

/// Rebuild each wrap with a new paper thickness.
pub fn edit_paper_weight<H: SceneHost + ?Sized, S: AsRef<str>>(
    host: &mut H,
    controls: &[S],
    thickness: f64,
) -> Vec<Result<GiftWrap, WrapError>> {
    edit_each(host, controls, "paper weight", |host, wrap| wrap.set_thickness(host, thickness))
}

pub fn edit_colors<H: SceneHost + ?Sized, S: AsRef<str>>(
    host: &mut H,
    controls: &[S],
    paper: &ColorChoice,
    ribbon: &ColorChoice,
    rng: &mut impl Rng,
) -> Vec<Result<GiftWrap, WrapError>> {
    edit_each(host, controls, "colours", |host, wrap| wrap.recolor(host, paper, ribbon, rng))
}

pub fn edit_ribbon_size<H: SceneHost + ?Sized, S: AsRef<str>>(
    host: &mut H,
    controls: &[S],
    size: RibbonSize,
) -> Vec<Result<GiftWrap, WrapError>> {
    edit_each(host, controls, "ribbon size", |host, wrap| wrap.change_ribbon_size(host, size))
}

pub fn edit_animation<H: SceneHost + ?Sized, S: AsRef<str>>(
    host: &mut H,
    controls: &[S],
    start: i32,
    end: i32,
) -> Vec<Result<GiftWrap, WrapError>> {
    edit_each(host, controls, "animation range", |host, wrap| wrap.set_animation_range(host, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Vec3};
    use crate::host::{MemoryScene, SceneHost};
    use crate::rig::ATTR_ANIMATION;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scene_with(names: &[&str]) -> MemoryScene {
        let mut scene = MemoryScene::new();
        for (i, name) in names.iter().enumerate() {
            let x = 10.0 * f64::from(u32::try_from(i).unwrap_or_default());
            scene.create_box(name, Vec3::new(2.0, 1.0, 3.0), Point3::new(x, 0.5, 0.0)).expect("box");
        }
        scene
    }

    fn options() -> WrapOptions {
        WrapOptions::default().with_colors(ColorChoice::named("green"), ColorChoice::named("red"))
    }

    #[test]
    fn batch_reports_each_target() {
        let mut scene = scene_with(&["a", "b"]);
        let results = wrap_all(&mut scene, &["a", "missing", "b"], &options(), &mut StdRng::seed_from_u64(4));
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok() && results[2].is_ok());
        assert!(matches!(results[1], Err(WrapError::NodeNotFound(_))));
    }

    #[test]
    fn batch_is_capped() {
        let names: Vec<String> = (0..40).map(|i| format!("missing_{i}")).collect();
        let mut scene = MemoryScene::new();
        let results = wrap_all(&mut scene, &names, &options(), &mut StdRng::seed_from_u64(4));
        assert_eq!(results.len(), MAX_BATCH);
    }

    #[test]
    fn scan_skips_broken_wraps() {
        let mut scene = scene_with(&["a", "b"]);
        let results = wrap_all(&mut scene, &["a", "b"], &options(), &mut StdRng::seed_from_u64(8));
        let broken = results[0].as_ref().expect("a").control();
        scene.set_attribute(&broken, "ribbon_size", "XL".into()).expect("corrupt");

        let report = scan_wraps(&scene);
        assert_eq!(report.wraps.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, broken);
        assert_eq!(report.wraps[0].state().name, "b");
    }

    #[test]
    fn table_layout() {
        assert_eq!(render_scan_table(&[]), "None found\n");

        let mut scene = scene_with(&["a_very_long_object_name"]);
        let wrap = GiftWrap::create(&mut scene, "a_very_long_object_name", &options(), &mut StdRng::seed_from_u64(1))
            .expect("create");
        let table = render_scan_table(&[wrap.clone()]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Object             ID       P. Weight  P. Color"));
        assert_eq!(lines[1], "-".repeat(83));
        assert_eq!(lines[2].len(), 83);
        assert!(lines[2].starts_with(&format!("a_very_long_object {} ", wrap.state().id)));
        assert!(lines[2].contains("0.02       GREEN      RED        L          1 - 24"));
    }

    #[test]
    fn bulk_edits_apply_per_wrap() {
        let mut scene = scene_with(&["a", "b"]);
        let controls: Vec<String> = wrap_all(&mut scene, &["a", "b"], &options(), &mut StdRng::seed_from_u64(3))
            .into_iter()
            .map(|r| r.expect("wrap").control())
            .collect();
        let mut targets = controls.clone();
        targets.push("CTRL_gift_NOPE0".to_owned());

        let sized = edit_ribbon_size(&mut scene, &targets, RibbonSize::M);
        assert!(sized[0].is_ok() && sized[1].is_ok() && sized[2].is_err());

        let timed = edit_animation(&mut scene, &controls, 5, 50);
        assert!(timed.iter().all(Result::is_ok));
        assert_eq!(scene.keyframes(&controls[1], ATTR_ANIMATION), vec![(5.0, 0.0), (50.0, 15.0)]);

        let heavier = edit_paper_weight(&mut scene, &controls[..1], 0.04);
        assert_eq!(heavier[0].as_ref().map(|w| w.state().thickness), Ok(0.04));

        let report = scan_wraps(&scene);
        assert_eq!(report.wraps.len(), 2);
        assert!(report.wraps.iter().all(|w| w.state().ribbon_size == RibbonSize::M));
    }
}
