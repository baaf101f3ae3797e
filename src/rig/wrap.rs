//! The [`GiftWrap`] facade.

use rand::Rng;

use super::WrapError;
use super::color::{ColorChoice, Palette};
use super::naming::{WrapNames, control_name, generate_id};
use super::options::WrapOptions;
use super::state::{ATTR_ANIMATION, STATE_ATTRIBUTES, WrapState};
use crate::fold::{
    BoxExtent, Channel, DRIVER_POSITIONS, FoldError, FoldState, FoldingPattern, KeyTarget, Orientation, PivotId,
    TieSegment, apply_fold_state, build_fold_mesh, derive_clusters, derive_pivots, driver_schedule, fold_fix, normalize,
};
use crate::geom::{BBox, Point3, Vec3};
use crate::host::{HostError, MeshEdit, MetaMap, MetaValue, NodeTransform, Plug, SceneHost};
use crate::ribbon::{ProfileSlot, RibbonDimensions, RibbonLayout, RibbonSize, profile_outline, ribbon_width, segment_style};

/// Driver value of the fully wrapped pose.
pub const ANIMATION_END: f64 = 15.0;

const BEVEL_OFFSET: f64 = 0.005;
const CONTROL_RADIUS: f64 = 1.4;
const CONTROL_SEGMENTS: u32 = 16;
/// Extrusion attribute holding the section scale at the end of the path.
const EXTRUSION_SCALE: &str = "scale";

/// One wrap in a scene.
///
/// The struct holds no scene handles, only names; every method takes the
/// host it should act on.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftWrap {
    state: WrapState,
    names: WrapNames,
    initial: NodeTransform,
}

impl GiftWrap {
    // ─────────────────────────────────────────────────────────────────────
    // construction
    // ─────────────────────────────────────────────────────────────────────

    /// Wrap `target` in paper and ribbon.
    ///
    /// # Errors
    /// [`WrapError::NodeNotFound`] when `target` does not exist, before any
    /// scene change. Later failures leave the partially built nodes in place.
    pub fn create<H: SceneHost + ?Sized>(
        host: &mut H,
        target: &str,
        options: &WrapOptions,
        rng: &mut impl Rng,
    ) -> Result<Self, WrapError> {
        if !host.exists(target) {
            return Err(WrapError::NodeNotFound(target.to_owned()));
        }
        let mut id = generate_id(rng);
        while host.exists(&control_name(&id)) {
            id = generate_id(rng);
        }
        let state = WrapState {
            name: target.to_owned(),
            id,
            thickness: options.effective_thickness(),
            paper_color: options.paper_color.resolve(None, rng),
            ribbon_color: options.ribbon_color.resolve(None, rng),
            ribbon_size: options.ribbon_size,
            anim_start: options.anim_start,
            anim_end: options.anim_end,
        };
        Self::build(host, state, None)
    }

    /// [`create`](Self::create) with the thread-local generator.
    ///
    /// # Errors
    /// Same as [`create`](Self::create).
    pub fn wrap<H: SceneHost + ?Sized>(host: &mut H, target: &str, options: &WrapOptions) -> Result<Self, WrapError> {
        Self::create(host, target, options, &mut rand::rng())
    }

    /// Rebuild the facade of an existing wrap from its control handle.
    ///
    /// # Errors
    /// [`WrapError::Lookup`] when the handle or one of the wrap's nodes is
    /// missing, [`WrapError::State`] when the stored attributes are unusable.
    pub fn load<H: SceneHost + ?Sized>(host: &H, control: &str) -> Result<Self, WrapError> {
        if !host.exists(control) {
            return Err(WrapError::lookup(control, "no such control handle"));
        }
        let mut attributes = MetaMap::new();
        for name in STATE_ATTRIBUTES {
            if let Ok(value) = host.attribute(control, name) {
                attributes.insert(name.to_owned(), value);
            }
        }
        let state = WrapState::from_attributes(&attributes)?;
        let names = WrapNames::new(state.name.clone(), state.id.clone());
        if names.control() != control {
            return Err(WrapError::lookup(control, format!("stored id `{}` belongs to another handle", state.id)));
        }

        let mut required = vec![state.name.clone(), names.main_group(), names.paper()];
        required.extend(TieSegment::ALL.iter().map(|s| names.ribbon_extrusion(*s)));
        required.extend(ProfileSlot::ALL.iter().map(|p| names.profile(*p)));
        if let Some(missing) = required.iter().find(|n| !host.exists(n)) {
            return Err(WrapError::lookup(control, format!("node `{missing}` is missing")));
        }

        let main = host.transform(&names.main_group())?;
        let initial = NodeTransform::IDENTITY.with_translate(main.translate).with_rotate(main.rotate);
        log::info!("loaded wrap {} of `{}`", state.id, state.name);
        Ok(Self { state, names, initial })
    }

    // ─────────────────────────────────────────────────────────────────────
    // accessors
    // ─────────────────────────────────────────────────────────────────────

    #[must_use]
    pub const fn state(&self) -> &WrapState {
        &self.state
    }

    #[must_use]
    pub const fn names(&self) -> &WrapNames {
        &self.names
    }

    #[must_use]
    pub fn control(&self) -> String {
        self.names.control()
    }

    /// Translate and rotate the wrapped object had before it was wrapped.
    #[must_use]
    pub const fn initial_transform(&self) -> NodeTransform {
        self.initial
    }

    // ─────────────────────────────────────────────────────────────────────
    // edits
    // ─────────────────────────────────────────────────────────────────────

    /// Put the object back at the scene root and delete every wrap node.
    ///
    /// # Errors
    /// Propagates host failures.
    pub fn remove<H: SceneHost + ?Sized>(self, host: &mut H) -> Result<WrapState, WrapError> {
        self.unwrap_object(host)?;
        log::info!("removed wrap {} from `{}`", self.state.id, self.state.name);
        Ok(self.state)
    }

    /// Remove and rebuild the wrap from its stored state, keeping the main
    /// group where it is.
    ///
    /// # Errors
    /// Propagates failures of either half.
    pub fn reload<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> Result<(), WrapError> {
        let placement = host.transform(&self.names.main_group())?;
        self.unwrap_object(host)?;
        let rebuilt = Self::build(host, self.state.clone(), Some(placement))?;
        *self = Self { initial: self.initial, ..rebuilt };
        Ok(())
    }

    /// Change the paper thickness; the wrap is rebuilt.
    ///
    /// # Errors
    /// Same as [`reload`](Self::reload).
    pub fn set_thickness<H: SceneHost + ?Sized>(&mut self, host: &mut H, thickness: f64) -> Result<(), WrapError> {
        self.state.thickness = WrapOptions::default().with_thickness(thickness).effective_thickness();
        self.reload(host)
    }

    /// Store a new time range and re-key the driver over it.
    ///
    /// # Errors
    /// Propagates host failures.
    pub fn set_animation_range<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        start: i32,
        end: i32,
    ) -> Result<(), WrapError> {
        self.state.anim_start = start;
        self.state.anim_end = end;
        self.write_state(host)?;
        key_time_range(host, &self.names.control(), start, end)?;
        Ok(())
    }

    /// Pick new colours and reassign the shaders.
    ///
    /// # Errors
    /// Propagates host failures.
    pub fn recolor<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        paper: &ColorChoice,
        ribbon: &ColorChoice,
        rng: &mut impl Rng,
    ) -> Result<(), WrapError> {
        self.state.paper_color = paper.resolve(Some(self.state.paper_color), rng);
        self.state.ribbon_color = ribbon.resolve(Some(self.state.ribbon_color), rng);
        apply_colors(host, &self.names, &self.state)?;
        self.write_state(host)?;
        log::debug!("wrap {} recoloured {}/{}", self.state.id, self.state.paper_color, self.state.ribbon_color);
        Ok(())
    }

    /// Rescale every ribbon profile across by the size transition factor.
    ///
    /// # Errors
    /// Propagates host failures.
    pub fn change_ribbon_size<H: SceneHost + ?Sized>(&mut self, host: &mut H, size: RibbonSize) -> Result<(), WrapError> {
        if size == self.state.ribbon_size {
            return Ok(());
        }
        let factor = self.state.ribbon_size.transition_factor(size);
        for slot in ProfileSlot::ALL {
            let name = self.names.profile(slot);
            let mut transform = host.transform(&name)?;
            transform.scale.x *= factor;
            host.set_transform(&name, transform)?;
        }
        self.state.ribbon_size = size;
        self.write_state(host)?;
        log::debug!("wrap {} ribbon now {size} (x{factor})", self.state.id);
        Ok(())
    }

    /// Drive the wrap to fold count `k` (`0..=16`).
    ///
    /// # Errors
    /// [`FoldError::InvalidFoldCount`] for `k > 16`.
    pub fn fold_to<H: SceneHost + ?Sized>(&self, host: &mut H, k: u8) -> Result<(), WrapError> {
        let driver = DRIVER_POSITIONS.get(usize::from(k)).copied().ok_or(FoldError::InvalidFoldCount(k))?;
        self.set_animation(host, driver)
    }

    /// Set the driver channel directly (`0..=15`).
    ///
    /// # Errors
    /// Propagates host failures.
    pub fn set_animation<H: SceneHost + ?Sized>(&self, host: &mut H, value: f64) -> Result<(), WrapError> {
        host.set_attribute(&self.names.control(), ATTR_ANIMATION, MetaValue::Number(value))?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // internals
    // ─────────────────────────────────────────────────────────────────────

    fn build<H: SceneHost + ?Sized>(
        host: &mut H,
        state: WrapState,
        placement: Option<NodeTransform>,
    ) -> Result<Self, WrapError> {
        let target = state.name.as_str();
        if !host.exists(target) {
            return Err(WrapError::NodeNotFound(target.to_owned()));
        }
        let names = WrapNames::new(state.name.clone(), state.id.clone());
        let t = state.thickness;

        let initial = detach_target(host, target)?;
        let (extent, orientation) = normalize(host.bbox(target)?.size())?;
        build_hierarchy(host, &names, extent.width * CONTROL_RADIUS)?;
        host.reparent(target, Some(&names.object_group()))?;
        place_target(host, target, &orientation, t)?;

        let control = names.control();
        let mut attributes = state.to_attributes();
        for name in STATE_ATTRIBUTES {
            if let Some(value) = attributes.remove(name) {
                host.add_attribute(&control, name, value, false)?;
            }
        }
        host.add_attribute(&control, ATTR_ANIMATION, MetaValue::Number(0.0), true)?;

        let mut pattern = FoldingPattern::solve(extent, t)?;
        let plane = build_fold_mesh(&mut pattern)?;
        log::debug!("fold plane: {:?}, {} vertices", plane.topology, plane.vertex_count());
        build_paper(host, &names, &plane.mesh, t)?;
        bind_clusters(host, &names, &pattern)?;

        let fix = fold_fix(extent.height);
        pose_clusters(host, &names, &apply_fold_state(16, fix)?)?;
        let wrapped = host.bbox(&names.plane())?.expand_by(t / 2.0);
        pose_clusters(host, &names, &FoldState::rest())?;

        let size = wrapped.size();
        let dims = RibbonDimensions::new(size.x, size.y, size.z, extent.width, t)
            .with_ribbon_width(ribbon_width(state.ribbon_size, extent.height, extent.depth));
        let layout = RibbonLayout::compute(dims)?;
        build_ribbon(host, &names, &layout)?;

        key_driver(host, &names, extent, wrapped)?;
        apply_colors(host, &names, &state)?;

        let placed = placement.unwrap_or(initial);
        let main = names.main_group();
        let current = host.transform(&main)?;
        host.set_transform(&main, NodeTransform { translate: placed.translate, rotate: placed.rotate, ..current })?;

        key_time_range(host, &control, state.anim_start, state.anim_end)?;
        host.set_attribute(&control, ATTR_ANIMATION, MetaValue::Number(ANIMATION_END))?;

        log::info!(
            "wrapped `{}` as {} ({:.3} x {:.3} x {:.3}, {} paper, {} ribbon size {})",
            state.name,
            state.id,
            extent.width,
            extent.height,
            extent.depth,
            state.paper_color,
            state.ribbon_color,
            state.ribbon_size
        );
        Ok(Self { state, names, initial })
    }

    fn unwrap_object<H: SceneHost + ?Sized>(&self, host: &mut H) -> Result<(), WrapError> {
        let target = self.state.name.as_str();
        host.reparent(target, None)?;
        let placed = host.transform(target)?;
        host.set_transform(target, NodeTransform { rotate: Vec3::ZERO, ..placed })?;
        host.delete(&self.names.main_group())?;
        Ok(())
    }

    fn write_state<H: SceneHost + ?Sized>(&self, host: &mut H) -> Result<(), HostError> {
        let control = self.names.control();
        for (name, value) in self.state.to_attributes() {
            host.set_attribute(&control, &name, value)?;
        }
        Ok(())
    }
}

/// Move the target to the root, clear its placement and bake the rest.
/// Returns the translate and rotate it had.
fn detach_target<H: SceneHost + ?Sized>(host: &mut H, target: &str) -> Result<NodeTransform, HostError> {
    host.reparent(target, None)?;
    let current = host.transform(target)?;
    let initial = NodeTransform::IDENTITY.with_translate(current.translate).with_rotate(current.rotate);
    host.set_transform(target, NodeTransform { translate: Vec3::ZERO, rotate: Vec3::ZERO, ..current })?;
    host.freeze(target)?;
    Ok(initial)
}

/// Largest face down, bottom centre on `(0, t, 0)`, then the quarter turn.
fn place_target<H: SceneHost + ?Sized>(
    host: &mut H,
    target: &str,
    orientation: &Orientation,
    thickness: f64,
) -> Result<(), HostError> {
    let rest = host.transform(target)?;
    let center = host.bbox(target)?.center();
    let rotated = NodeTransform { pivot: center, rotate: orientation.base_rotation, ..rest };
    host.set_transform(target, rotated)?;

    let bounds = host.bbox(target)?;
    let bottom = Point3::new(bounds.center().x, bounds.min.y, bounds.center().z);
    let base = Point3::new(0.0, thickness, 0.0);
    host.set_transform(target, NodeTransform { translate: base - bottom, ..rotated })?;
    host.freeze(target)?;

    let frozen = host.transform(target)?;
    let turn = Vec3::new(0.0, orientation.turn_degrees(), 0.0);
    host.set_transform(target, NodeTransform { pivot: base, rotate: turn, ..frozen })
}

fn control_circle(radius: f64) -> Vec<Point3> {
    (0..CONTROL_SEGMENTS)
        .map(|i| {
            let angle = std::f64::consts::TAU * f64::from(i) / f64::from(CONTROL_SEGMENTS);
            Point3::new(radius * angle.cos(), 0.0, radius * angle.sin())
        })
        .collect()
}

fn build_hierarchy<H: SceneHost + ?Sized>(host: &mut H, names: &WrapNames, radius: f64) -> Result<(), HostError> {
    let (main, control, gift) = (names.main_group(), names.control(), names.gift_group());
    host.create_group(&main, None)?;
    host.create_curve(&control, Some(&main), &control_circle(radius), true)?;
    host.create_group(&gift, Some(&control))?;
    host.create_group(&names.fold_group(), Some(&gift))?;
    host.create_group(&names.object_group(), Some(&gift))?;
    host.create_group(&names.cluster_group(), Some(&control))?;
    host.create_group(&names.ribbon_group(), Some(&control))?;
    host.create_group(&names.ribbon_curve_group(), Some(&control))?;

    // Clusters and ribbon curves stay put when the handle moves.
    for detached in [names.cluster_group(), names.ribbon_curve_group()] {
        let hidden = NodeTransform { inherits_transform: false, visible: false, ..NodeTransform::IDENTITY };
        host.set_transform(&detached, hidden)?;
    }
    Ok(())
}

fn set_visible<H: SceneHost + ?Sized>(host: &mut H, name: &str, visible: bool) -> Result<(), HostError> {
    let current = host.transform(name)?;
    host.set_transform(name, NodeTransform { visible, ..current })
}

fn build_paper<H: SceneHost + ?Sized>(
    host: &mut H,
    names: &WrapNames,
    plane_mesh: &crate::geom::PolyMesh,
    thickness: f64,
) -> Result<(), HostError> {
    let (plane, paper) = (names.plane(), names.paper());
    host.create_mesh(&plane, Some(&names.fold_group()), plane_mesh)?;
    set_visible(host, &plane, false)?;

    host.duplicate(&plane, &paper)?;
    set_visible(host, &paper, true)?;
    host.edit_mesh(&paper, MeshEdit::Bevel { offset: BEVEL_OFFSET })?;
    host.edit_mesh(&paper, MeshEdit::Subdivide { divisions: 1 })?;
    host.edit_mesh(&paper, MeshEdit::ExtrudeFaces { offset: -thickness })?;
    let lift = Vec3::new(0.0, thickness / 2.0, 0.0);
    let current = host.transform(&paper)?;
    host.set_transform(&paper, NodeTransform { translate: lift, pivot: Point3::from(lift), ..current })?;
    host.edit_mesh(&paper, MeshEdit::PlanarUv)?;
    host.bind_wrap(&paper, &plane)
}

/// One frame group and cluster handle per pivot, bound in pivot order.
fn bind_clusters<H: SceneHost + ?Sized>(
    host: &mut H,
    names: &WrapNames,
    pattern: &FoldingPattern,
) -> Result<(), WrapError> {
    let pivots = derive_pivots(pattern)?;
    let clusters = derive_clusters(pattern)?;
    let (plane, group) = (names.plane(), names.cluster_group());
    for id in PivotId::ALL {
        let position = pivots.position(id);
        let (frame, handle) = (names.pivot_frame(id), names.cluster(id));
        host.create_group(&frame, Some(&group))?;
        let framed = NodeTransform::IDENTITY.with_pivot(position).with_rotate(id.frame().unwrap_or(Vec3::ZERO));
        host.set_transform(&frame, framed)?;
        host.create_group(&handle, Some(&frame))?;
        host.set_transform(&handle, NodeTransform::IDENTITY.with_pivot(position))?;
        host.bind_cluster(&plane, &handle, &clusters.get(id).vertices)?;
        crate::debug_log!("cluster {id}: {} vertices", clusters.get(id).vertices.len());
    }
    Ok(())
}

/// Write a fold state straight onto the cluster handles.
fn pose_clusters<H: SceneHost + ?Sized>(host: &mut H, names: &WrapNames, state: &FoldState) -> Result<(), HostError> {
    for id in PivotId::ALL {
        let handle = names.cluster(id);
        let pose = state.pose(id);
        let mut transform = host.transform(&handle)?;
        transform.set_channel(Channel::for_axis(id.axis()).attribute(), pose.rotation);
        transform.translate.x = pose.translate_x;
        host.set_transform(&handle, transform)?;
    }
    Ok(())
}

fn build_ribbon<H: SceneHost + ?Sized>(host: &mut H, names: &WrapNames, layout: &RibbonLayout) -> Result<(), WrapError> {
    let curves = names.ribbon_curve_group();
    for segment in TieSegment::ALL {
        let curve = names.ribbon_curve(segment);
        host.create_curve(&curve, Some(&curves), &layout.curve(segment)?, false)?;
        let turn = segment_style(segment).curve_turn;
        if turn.abs() > f64::EPSILON {
            let current = host.transform(&curve)?;
            host.set_transform(&curve, NodeTransform { rotate: Vec3::new(0.0, turn, 0.0), ..current })?;
        }
    }

    let dims = layout.dimensions();
    let outline: Vec<Point3> = profile_outline(dims.ribbon_width, dims.ribbon_thickness)
        .iter()
        .map(|&[x, y]| Point3::new(x, y, 0.0))
        .collect();
    let base = names.profile(ProfileSlot::Base);
    host.create_curve(&base, Some(&curves), &outline, true)?;
    for slot in ProfileSlot::ALL {
        let profile = names.profile(slot);
        if slot != ProfileSlot::Base {
            host.instance(&base, &profile, Some(&curves))?;
        }
        let current = host.transform(&profile)?;
        let placed = NodeTransform {
            translate: slot.translate(layout)?,
            rotate: Vec3::new(0.0, slot.rotate_y(), 0.0),
            ..current
        };
        host.set_transform(&profile, placed)?;
    }

    let group = names.ribbon_group();
    for segment in TieSegment::ALL {
        let style = segment_style(segment);
        let extrusion = names.ribbon_extrusion(segment);
        host.extrude(&extrusion, Some(&group), &names.profile(style.profile), &names.ribbon_curve(segment))?;
        if (style.taper - 1.0).abs() > f64::EPSILON {
            host.set_attribute(&extrusion, EXTRUSION_SCALE, MetaValue::Number(style.taper))?;
        }
    }
    log::debug!("ribbon: {} layout points, width {:.4}", layout.len(), dims.ribbon_width);
    Ok(())
}

/// Author every driven key on the handle's `animation` channel. The gift
/// flips about the centre of the wrapped box.
fn key_driver<H: SceneHost + ?Sized>(
    host: &mut H,
    names: &WrapNames,
    extent: BoxExtent,
    wrapped: BBox,
) -> Result<(), HostError> {
    let (control, gift) = (names.control(), names.gift_group());
    let current = host.transform(&gift)?;
    host.set_transform(&gift, NodeTransform { pivot: wrapped.center(), ..current })?;

    let schedule = driver_schedule(fold_fix(extent.height), extent.height);
    for key in &schedule {
        let node = match key.target {
            KeyTarget::Pivot(id) => names.cluster(id),
            KeyTarget::Gift => gift.clone(),
            KeyTarget::Ribbon(segment) => names.ribbon_extrusion(segment),
        };
        host.set_driven_key(
            Plug::new(&control, ATTR_ANIMATION),
            Plug::new(&node, key.channel.attribute()),
            key.driver,
            key.value,
        )?;
    }
    log::debug!("keyed {} driven values on {control}", schedule.len());
    Ok(())
}

fn apply_colors<H: SceneHost + ?Sized>(host: &mut H, names: &WrapNames, state: &WrapState) -> Result<(), HostError> {
    let paper = state.paper_color.shader_name();
    if host.ensure_shader(&paper, state.paper_color.rgb()) {
        log::debug!("created shader {paper}");
    }
    host.assign_shader(&paper, &names.paper())?;

    let ribbon = state.ribbon_color.shader_name();
    if host.ensure_shader(&ribbon, state.ribbon_color.rgb()) {
        log::debug!("created shader {ribbon}");
    }
    for segment in TieSegment::ALL {
        host.assign_shader(&ribbon, &names.ribbon_extrusion(segment))?;
    }
    Ok(())
}

/// Clear the driver's time keys; key `0 → 15` over `start..end` unless the
/// range is empty.
fn key_time_range<H: SceneHost + ?Sized>(host: &mut H, control: &str, start: i32, end: i32) -> Result<(), HostError> {
    host.clear_keyframes(control, ATTR_ANIMATION)?;
    if start != end {
        host.set_keyframe(control, ATTR_ANIMATION, f64::from(start), 0.0)?;
        host.set_keyframe(control, ATTR_ANIMATION, f64::from(end), ANIMATION_END)?;
    }
    Ok(())
}
