use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::model::GraphModel;
use super::strings::{NodeMotion, Point, distance_to_segment};
use super::types::GraphConfig;
use super::wave::{PointerSpeed, WaveField};
use crate::audio::synth::edge_length_to_hz;
use crate::audio::{AudioSink, SoundBoard};
use crate::config::Tuning;

const STABILIZATION_ITERATIONS: usize = 260;
const STABILIZATION_STEP: f32 = 0.016;
const FALLBACK_RADIUS: f64 = 10.0;
/// Edge hover tolerance in screen pixels.
const EDGE_HIT_WIDTH: f64 = 6.0;
const CLICK_SLOP: f64 = 4.0;
const ZOOM_IDLE_MS: f64 = 140.0;
const PULSE_STEP: f64 = 0.14;
const FIT_MARGIN: f64 = 48.0;
const FOCUS_SCALE: f64 = 1.08;
const SELECT_SCALE: f64 = 1.02;
const FOCUS_MS: f64 = 220.0;
const FIT_MS: f64 = 240.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn graph_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}

	/// Transform placing `center` (graph space) at the middle of the canvas.
	fn centered_on(center: Point, k: f64, width: f64, height: f64) -> Self {
		Self {
			x: width / 2.0 - center.x * k,
			y: height / 2.0 - center.y * k,
			k,
		}
	}
}

fn ease_in_out_quad(t: f64) -> f64 {
	if t < 0.5 {
		2.0 * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
	}
}

#[derive(Clone, Copy, Debug)]
struct CameraAnimation {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

/// What the pointer is doing to the map. Zooming lingers for a short idle
/// window after the last wheel event.
#[derive(Clone, Debug, PartialEq)]
pub enum MapInteraction {
	Idle,
	DraggingNode {
		idx: DefaultNodeIdx,
		node_id: String,
		grab: Point,
		start: Point,
		moved: bool,
	},
	Panning {
		start: Point,
		origin: ViewTransform,
	},
	Zooming {
		until: f64,
	},
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub edge: Option<String>,
	last_impulse: Option<(String, f64)>,
}

#[derive(Clone, Debug)]
struct NodePulse {
	node_id: String,
	phase: f64,
}

/// Everything the string map needs between frames: the frozen layout, the
/// wave field over it, the sound board and the pointer/camera state.
pub struct StringMapState {
	layout: ForceGraph<NodeInfo, ()>,
	index_by_id: HashMap<String, DefaultNodeIdx>,
	model: GraphModel,
	waves: WaveField<StdRng>,
	sound: SoundBoard,
	motion: NodeMotion,
	pointer: PointerSpeed,
	interaction: MapInteraction,
	transform: ViewTransform,
	home_scale: f64,
	camera: Option<CameraAnimation>,
	hover: HoverState,
	pulse: Option<NodePulse>,
	pub width: f64,
	pub height: f64,
}

impl StringMapState {
	pub fn new(
		config: &GraphConfig,
		sink: Box<dyn AudioSink>,
		seed: u64,
		width: f64,
		height: f64,
	) -> Self {
		let Tuning { wave, audio, .. } = config.tuning.clone();
		let model = GraphModel::new(config);
		let mut layout = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut index_by_id = HashMap::new();

		let count = model.nodes().len().max(1) as f64;
		let ring = 40.0 + 18.0 * count;
		for (i, node) in model.nodes().iter().enumerate() {
			let angle = i as f64 * 2.0 * PI / count;
			let idx = layout.add_node(NodeData {
				x: (ring * angle.cos()) as f32,
				y: (ring * angle.sin()) as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: NodeInfo {
					id: node.id.clone(),
				},
			});
			index_by_id.insert(node.id.clone(), idx);
		}

		let mut linked = 0;
		for edge in model.edges() {
			if edge.from == edge.to {
				continue;
			}
			if let (Some(&a), Some(&b)) = (index_by_id.get(&edge.from), index_by_id.get(&edge.to)) {
				layout.add_edge(a, b, EdgeData::default());
				linked += 1;
			}
		}

		for _ in 0..STABILIZATION_ITERATIONS {
			layout.update(STABILIZATION_STEP);
		}
		info!(
			"graph installed: {} nodes, {} edges ({linked} in layout)",
			model.nodes().len(),
			model.edges().len()
		);

		let mut state = Self {
			layout,
			index_by_id,
			model,
			waves: WaveField::new(wave, StdRng::seed_from_u64(seed)),
			sound: SoundBoard::new(audio, sink),
			motion: NodeMotion::default(),
			pointer: PointerSpeed::default(),
			interaction: MapInteraction::Idle,
			transform: ViewTransform::default(),
			home_scale: 1.0,
			camera: None,
			hover: HoverState::default(),
			pulse: None,
			width,
			height,
		};
		state.fit_view();
		state
	}

	/// Fits the whole graph into the canvas without animation.
	pub fn fit_view(&mut self) {
		let ids: Vec<String> = self.model.nodes().iter().map(|n| n.id.clone()).collect();
		if let Some(home) = self.fit_transform(&ids) {
			self.home_scale = home.k;
			self.transform = home;
			self.camera = None;
		}
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	pub fn waves(&self) -> &WaveField<StdRng> {
		&self.waves
	}

	pub fn motion(&self) -> &NodeMotion {
		&self.motion
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn hover(&self) -> &HoverState {
		&self.hover
	}

	pub fn interaction(&self) -> &MapInteraction {
		&self.interaction
	}

	pub fn selected_node(&self) -> Option<&str> {
		self.pulse.as_ref().map(|p| p.node_id.as_str())
	}

	/// Current layout position of every node, in graph space.
	pub fn positions(&self) -> HashMap<String, Point> {
		let mut out = HashMap::with_capacity(self.index_by_id.len());
		self.layout.visit_nodes(|node| {
			out.insert(
				node.data.user_data.id.clone(),
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		out
	}

	pub fn position(&self, node_id: &str) -> Option<Point> {
		let idx = *self.index_by_id.get(node_id)?;
		let mut found = None;
		self.layout.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(Point::new(node.x() as f64, node.y() as f64));
			}
		});
		found.filter(|p| p.x.is_finite() && p.y.is_finite())
	}

	/// Moves a node to `to` (graph space) without pinning it.
	#[cfg(test)]
	fn move_node(&mut self, node_id: &str, to: Point) {
		if let Some(&idx) = self.index_by_id.get(node_id) {
			self.place(idx, to, false);
		}
	}

	/// Whether the layout currently holds the node in place.
	#[cfg(test)]
	fn is_pinned(&self, node_id: &str) -> bool {
		let Some(&idx) = self.index_by_id.get(node_id) else {
			return false;
		};
		let mut pinned = false;
		self.layout.visit_nodes(|node| {
			if node.index() == idx {
				pinned = node.data.is_anchor;
			}
		});
		pinned
	}

	/// Puts a node at `to`. A node held by the pointer is pinned so the
	/// layout steps run during the drag do not pull it away.
	fn place(&mut self, idx: DefaultNodeIdx, to: Point, pinned: bool) {
		self.layout.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = to.x as f32;
				node.data.y = to.y as f32;
				node.data.is_anchor = pinned;
			}
		});
	}

	/// Lets a released node follow the layout again.
	fn release(&mut self, idx: DefaultNodeIdx) {
		self.layout.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.is_anchor = false;
			}
		});
	}

	/// Node radius as drawn this frame: the base size plus the selection pulse.
	pub fn rendered_size(&self, node_id: &str) -> f64 {
		let Some(base) = self.model.base_size(node_id).filter(|s| *s > 0.0) else {
			return FALLBACK_RADIUS;
		};
		match &self.pulse {
			Some(pulse) if pulse.node_id == node_id => base + pulse.phase.sin() * 0.6 + 0.6,
			_ => base,
		}
	}

	// --- impulses ---

	/// Rings an edge and asks for a tone pitched by its length.
	pub fn trigger_edge_wave(&mut self, edge_id: &str, strength: f64, now: f64) {
		let Some(edge) = self.model.edge(edge_id) else {
			return;
		};
		self.waves.excite_edge(edge_id, strength);
		if let (Some(a), Some(b)) = (self.position(&edge.from), self.position(&edge.to)) {
			let hz = edge_length_to_hz(a.distance(b), strength);
			self.sound.edge_sine(edge_id, hz, now);
		}
	}

	/// Rings a node, plucks it and chains a slightly damped impulse into
	/// every incident edge.
	pub fn trigger_node_impulse(&mut self, node_id: &str, strength: f64, now: f64) {
		if self.model.node(node_id).is_none() {
			return;
		}
		let impulse = self.waves.excite_node(node_id, strength);
		let boost = (impulse * 1.2).clamp(0.0, self.sound.config().pluck_size_boost);
		let size = self.rendered_size(node_id) + boost;
		self.sound.pluck(size, self.model.size_range(), now);

		let chained = impulse * self.waves.config().chain_factor;
		for edge_id in self.model.incident_edges(node_id).to_vec() {
			self.trigger_edge_wave(&edge_id, chained, now);
		}
	}

	pub fn set_highlighted_path(&mut self, edge_ids: &[String], node_ids: &[String]) {
		self.waves
			.set_highlight(edge_ids.iter().cloned(), node_ids.iter().cloned());
	}

	pub fn clear_highlighted_path(&mut self) {
		self.waves.clear_highlight();
	}

	// --- frame loop ---

	/// Advances everything time-driven by `dt` milliseconds.
	pub fn tick(&mut self, dt: f64) {
		if matches!(self.interaction, MapInteraction::DraggingNode { .. }) {
			self.layout.update((dt / 1000.0) as f32);
		}
		self.waves.advance(dt);

		if let Some(mut anim) = self.camera.take() {
			anim.elapsed += dt;
			let t = (anim.elapsed / anim.duration).clamp(0.0, 1.0);
			self.transform = anim.from.lerp(&anim.to, ease_in_out_quad(t));
			if t < 1.0 {
				self.camera = Some(anim);
			}
		}
	}

	/// Records node speeds for string bowing. Called once per drawn frame.
	pub fn sample_motion(&mut self, ts: f64) {
		let positions = self.positions();
		self.motion
			.sample(positions.iter().map(|(id, p)| (id.as_str(), *p)), ts);
	}

	pub fn is_interacting(&self, now: f64) -> bool {
		match self.interaction {
			MapInteraction::Idle => false,
			MapInteraction::Zooming { until } => now < until,
			_ => true,
		}
	}

	/// Whether the wave loop must schedule another frame. The selection
	/// pulse runs on its own frames and never keeps this loop alive.
	pub fn wants_frame(&self, now: f64) -> bool {
		self.waves.is_active() || self.is_interacting(now) || self.camera.is_some()
	}

	/// The selection pulse animates for as long as a node is selected.
	pub fn is_pulsing(&self) -> bool {
		self.pulse.is_some()
	}

	/// Steps the selection pulse by one frame. Returns whether a node is
	/// still selected.
	pub fn advance_pulse(&mut self) -> bool {
		match &mut self.pulse {
			Some(pulse) => {
				pulse.phase += PULSE_STEP;
				true
			}
			None => false,
		}
	}

	// --- selection and camera ---

	/// Starts pulsing `node_id`; the previously selected node drops back to
	/// its base size.
	pub fn select_node(&mut self, node_id: Option<&str>) {
		if self.selected_node() == node_id {
			return;
		}
		self.pulse = node_id
			.filter(|id| self.model.node(id).is_some())
			.map(|id| NodePulse {
				node_id: id.to_string(),
				phase: 0.0,
			});
	}

	pub fn select_section(&mut self, section_id: &str, focus: bool, now: f64) {
		let node_id = self.model.node_for_section(section_id).map(str::to_string);
		self.select_node(node_id.as_deref());
		if let (Some(id), true) = (node_id, focus) {
			if !self.is_interacting(now) {
				self.animate_to_node(&id, SELECT_SCALE);
			}
		}
	}

	/// Animates the camera onto `ids`: a single node is centred, several are
	/// fitted. Ignored while the user is working the map.
	pub fn focus_nodes(&mut self, ids: &[String], now: f64) {
		if ids.is_empty() || self.is_interacting(now) {
			return;
		}
		if let [single] = ids {
			self.animate_to_node(single, FOCUS_SCALE);
			return;
		}
		if let Some(target) = self.fit_transform(ids) {
			self.animate_to(target, FIT_MS);
		}
	}

	fn animate_to_node(&mut self, node_id: &str, scale: f64) {
		if let Some(p) = self.position(node_id) {
			let target =
				ViewTransform::centered_on(p, self.home_scale * scale, self.width, self.height);
			self.animate_to(target, FOCUS_MS);
		}
	}

	fn animate_to(&mut self, to: ViewTransform, duration: f64) {
		self.camera = Some(CameraAnimation {
			from: self.transform,
			to,
			elapsed: 0.0,
			duration,
		});
	}

	fn fit_transform(&self, ids: &[String]) -> Option<ViewTransform> {
		let points: Vec<Point> = ids.iter().filter_map(|id| self.position(id)).collect();
		let first = points.first()?;
		let (mut min, mut max) = (*first, *first);
		for p in &points {
			min = Point::new(min.x.min(p.x), min.y.min(p.y));
			max = Point::new(max.x.max(p.x), max.y.max(p.y));
		}
		let center = Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
		let (span_x, span_y) = (max.x - min.x, max.y - min.y);
		let (room_x, room_y) = (self.width - FIT_MARGIN * 2.0, self.height - FIT_MARGIN * 2.0);
		let k = if (span_x < 1.0 && span_y < 1.0) || room_x <= 0.0 || room_y <= 0.0 {
			1.0
		} else {
			(room_x / span_x.max(1.0))
				.min(room_y / span_y.max(1.0))
				.clamp(0.1, 2.5)
		};
		Some(ViewTransform::centered_on(center, k, self.width, self.height))
	}

	// --- hit testing ---

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let p = self.transform.screen_to_graph(sx, sy);
		let mut best: Option<(f64, String)> = None;
		for (id, pos) in self.positions() {
			let d = p.distance(pos);
			if d <= self.rendered_size(&id) && best.as_ref().is_none_or(|(bd, _)| d < *bd) {
				best = Some((d, id));
			}
		}
		best.map(|(_, id)| id)
	}

	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let p = self.transform.screen_to_graph(sx, sy);
		let tolerance = EDGE_HIT_WIDTH / self.transform.k;
		let positions = self.positions();
		let mut best: Option<(f64, &str)> = None;
		for edge in self.model.edges() {
			let (Some(a), Some(b)) = (positions.get(&edge.from), positions.get(&edge.to)) else {
				continue;
			};
			let d = distance_to_segment(p, *a, *b);
			if d <= tolerance && best.is_none_or(|(bd, _)| d < bd) {
				best = Some((d, edge.id.as_str()));
			}
		}
		best.map(|(_, id)| id.to_string())
	}

	// --- pointer ---

	/// First gesture on the map: the browser now allows audio.
	pub fn enable_sound(&mut self, now: f64) {
		self.sound.enable(now);
	}

	pub fn set_page_hidden(&mut self, hidden: bool, now: f64) {
		self.sound.set_hidden(hidden, now);
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64, now: f64) {
		self.pointer.down(sx, sy, now);
		self.camera = None;
		let start = Point::new(sx, sy);
		let hit = self
			.node_at_position(sx, sy)
			.and_then(|id| Some((self.index_by_id.get(&id).copied()?, id)));

		self.interaction = match hit {
			Some((idx, node_id)) => {
				let at = self.transform.screen_to_graph(sx, sy);
				let pos = self.position(&node_id).unwrap_or(at);
				MapInteraction::DraggingNode {
					idx,
					node_id,
					grab: Point::new(pos.x - at.x, pos.y - at.y),
					start,
					moved: false,
				}
			}
			None => MapInteraction::Panning {
				start,
				origin: self.transform,
			},
		};
	}

	pub fn pointer_moved(&mut self, sx: f64, sy: f64, now: f64) {
		self.pointer.moved(sx, sy, now, self.waves.config());

		match &mut self.interaction {
			MapInteraction::DraggingNode {
				idx,
				grab,
				start,
				moved,
				..
			} => {
				*moved |= start.distance(Point::new(sx, sy)) > CLICK_SLOP;
				let at = self.transform.screen_to_graph(sx, sy);
				let (idx, to) = (*idx, Point::new(at.x + grab.x, at.y + grab.y));
				self.place(idx, to, true);
			}
			MapInteraction::Panning { start, origin } => {
				self.transform.x = origin.x + (sx - start.x);
				self.transform.y = origin.y + (sy - start.y);
			}
			MapInteraction::Idle | MapInteraction::Zooming { .. } => self.update_hover(sx, sy, now),
		}
	}

	fn update_hover(&mut self, sx: f64, sy: f64, now: f64) {
		let strength = self.pointer.impulse_strength(self.waves.config());

		let node = self.node_at_position(sx, sy);
		if node != self.hover.node {
			self.hover.node = node.clone();
			if let Some(id) = node {
				let window = self.waves.config().node_hover_dedupe_ms;
				let repeat = matches!(
					&self.hover.last_impulse,
					Some((last, at)) if *last == id && now - at < window
				);
				if !repeat {
					self.hover.last_impulse = Some((id.clone(), now));
					self.trigger_node_impulse(&id, strength, now);
				}
			}
		}

		let edge = match self.hover.node {
			Some(_) => None,
			None => self.edge_at_position(sx, sy),
		};
		if edge != self.hover.edge {
			self.hover.edge = edge.clone();
			if let Some(id) = edge {
				let factor = self.waves.config().edge_hover_factor;
				self.trigger_edge_wave(&id, strength * factor, now);
			}
		}
	}

	/// Ends a drag or pan. A press that never moved off a node is a click,
	/// answered with that node's section.
	pub fn pointer_up(&mut self) -> Option<String> {
		match std::mem::replace(&mut self.interaction, MapInteraction::Idle) {
			MapInteraction::DraggingNode {
				idx,
				node_id,
				moved,
				..
			} => {
				self.release(idx);
				if moved {
					return None;
				}
				debug!("node {node_id} clicked");
				self.model.section_for_node(&node_id).map(str::to_string)
			}
			_ => None,
		}
	}

	pub fn pointer_left(&mut self) {
		self.pointer.left(self.waves.config());
		self.hover.node = None;
		self.hover.edge = None;
		match std::mem::replace(&mut self.interaction, MapInteraction::Idle) {
			MapInteraction::DraggingNode { idx, .. } => self.release(idx),
			MapInteraction::Panning { .. } => {}
			other => self.interaction = other,
		}
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64, now: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = k;
		self.camera = None;
		if matches!(
			self.interaction,
			MapInteraction::Idle | MapInteraction::Zooming { .. }
		) {
			self.interaction = MapInteraction::Zooming {
				until: now + ZOOM_IDLE_MS,
			};
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audio::SizeRange;
	use crate::audio::testing::RecordingSink;
	use crate::components::string_map::types::{GraphEdge, GraphNode};

	fn two_nodes() -> GraphConfig {
		GraphConfig {
			nodes: vec![
				GraphNode {
					id: "n1".into(),
					section: Some("intro".into()),
					..Default::default()
				},
				GraphNode {
					id: "n2".into(),
					section: Some("mid".into()),
					..Default::default()
				},
			],
			edges: vec![GraphEdge {
				from: "n1".into(),
				to: "n2".into(),
				..Default::default()
			}],
			..Default::default()
		}
	}

	/// State with sound enabled, n1 at the origin and n2 300px to the right.
	fn state() -> (StringMapState, RecordingSink) {
		let sink = RecordingSink::default();
		let mut state = StringMapState::new(&two_nodes(), Box::new(sink.clone()), 11, 800.0, 600.0);
		state.enable_sound(0.0);
		state.move_node("n1", Point::new(0.0, 0.0));
		state.move_node("n2", Point::new(300.0, 0.0));
		state.transform = ViewTransform::default();
		(state, sink)
	}

	#[test]
	fn node_impulse_chains_into_edges_and_plucks() {
		let (mut state, sink) = state();
		state.trigger_node_impulse("n1", 2.0, 1000.0);

		assert_eq!(state.waves().node("n1").amplitude, 2.0);
		let edge = state.model().edge_between("n1", "n2").unwrap().to_string();
		assert!((state.waves().edge(&edge).amplitude - 1.9).abs() < 1e-9);

		let plucks = sink.plucks();
		assert_eq!(plucks.len(), 1);
		let (size, range) = plucks[0];
		let base = state.model().base_size("n1").unwrap();
		assert!(size > base && size <= base + 4.0);
		assert!((size - (base + 2.4)).abs() < 1e-9);
		assert_eq!(range, SizeRange { min: base, max: base });
		assert_eq!(sink.sines().len(), 1);
	}

	#[test]
	fn unknown_ids_are_ignored() {
		let (mut state, sink) = state();
		state.trigger_node_impulse("ghost", 2.0, 1000.0);
		state.trigger_edge_wave("ghost", 2.0, 1000.0);
		assert!(sink.played.borrow().is_empty());
		assert!(!state.waves().is_active());
	}

	#[test]
	fn loop_settles_without_interaction() {
		let (mut state, _) = state();
		assert!(!state.wants_frame(0.0));
		state.trigger_node_impulse("n1", 3.0, 1000.0);
		assert!(state.wants_frame(1000.0));
		let mut frames = 0;
		while state.wants_frame(1000.0) {
			state.tick(16.0);
			frames += 1;
			assert!(frames < 500);
		}
		assert!(!state.waves().is_active());
	}

	#[test]
	fn selection_does_not_keep_the_wave_loop_alive() {
		let (mut state, _) = state();
		state.select_section("intro", false, 0.0);
		state.trigger_node_impulse("n1", 3.0, 1000.0);
		let mut frames = 0;
		while state.wants_frame(1000.0) {
			state.tick(16.0);
			frames += 1;
			assert!(frames < 500);
		}
		assert!(state.is_pulsing());
		assert!(!state.wants_frame(1000.0));
	}

	#[test]
	fn zoom_counts_as_interaction_briefly() {
		let (mut state, _) = state();
		state.wheel(400.0, 300.0, -1.0, 1000.0);
		assert!(state.transform().k > 1.0);
		assert!(state.wants_frame(1100.0));
		assert!(!state.wants_frame(1140.0));
	}

	#[test]
	fn hovering_a_node_is_deduplicated() {
		let (mut state, sink) = state();
		state.pointer_moved(0.0, 0.0, 1000.0);
		assert_eq!(state.hover().node.as_deref(), Some("n1"));
		assert!(state.waves().node("n1").is_ringing(0.03));

		state.pointer_moved(-500.0, -500.0, 1050.0);
		assert_eq!(state.hover().node, None);
		state.pointer_moved(0.0, 0.0, 1100.0);
		assert_eq!(sink.plucks().len(), 1);

		state.pointer_moved(-500.0, -500.0, 1150.0);
		state.pointer_moved(0.0, 0.0, 1200.0);
		assert_eq!(sink.plucks().len(), 2);
	}

	#[test]
	fn hovering_an_edge_rings_it() {
		let (mut state, _) = state();
		state.pointer_moved(150.0, 3.0, 1000.0);
		let edge = state.model().edge_between("n1", "n2").unwrap().to_string();
		assert_eq!(state.hover().edge.as_deref(), Some(edge.as_str()));
		assert!(state.waves().edge(&edge).amplitude >= 0.18);
		assert_eq!(state.edge_at_position(150.0, 40.0), None);
	}

	#[test]
	fn click_on_node_selects_its_section() {
		let (mut state, _) = state();
		state.pointer_down(300.0, 0.0, 1000.0);
		assert!(matches!(state.interaction(), MapInteraction::DraggingNode { .. }));
		assert_eq!(state.pointer_up(), Some("mid".to_string()));
		assert_eq!(state.interaction(), &MapInteraction::Idle);
	}

	#[test]
	fn dragging_moves_the_node_and_is_not_a_click() {
		let (mut state, _) = state();
		state.pointer_down(0.0, 0.0, 1000.0);
		state.pointer_moved(40.0, 10.0, 1016.0);
		assert!(state.wants_frame(1016.0));
		let p = state.position("n1").unwrap();
		assert!((p.x - 40.0).abs() < 1e-3 && (p.y - 10.0).abs() < 1e-3);
		assert!(state.is_pinned("n1"));
		assert_eq!(state.pointer_up(), None);
		assert!(!state.is_pinned("n1"));
	}

	#[test]
	fn leaving_the_map_releases_a_dragged_node() {
		let (mut state, _) = state();
		state.pointer_down(0.0, 0.0, 1000.0);
		state.pointer_moved(40.0, 10.0, 1016.0);
		assert!(state.is_pinned("n1"));
		state.pointer_left();
		assert!(!state.is_pinned("n1"));
		assert!(!state.is_interacting(1016.0));
	}

	#[test]
	fn panning_moves_the_view() {
		let (mut state, _) = state();
		state.pointer_down(150.0, 200.0, 1000.0);
		state.pointer_moved(170.0, 230.0, 1016.0);
		assert_eq!(state.transform().x, 20.0);
		assert_eq!(state.transform().y, 30.0);
		state.pointer_left();
		assert_eq!(state.interaction(), &MapInteraction::Idle);
	}

	#[test]
	fn pulse_restores_base_size_on_deselect() {
		let (mut state, _) = state();
		let base = state.model().base_size("n1").unwrap();
		state.select_section("intro", false, 0.0);
		assert_eq!(state.selected_node(), Some("n1"));
		state.tick(16.0);
		assert_eq!(state.rendered_size("n1"), base + 0.6);
		assert!(state.advance_pulse());
		assert!(state.rendered_size("n1") > base + 0.6);
		state.select_node(Some("n2"));
		assert_eq!(state.rendered_size("n1"), base);
		state.select_node(None);
		assert!(!state.is_pulsing());
		assert!(!state.advance_pulse());
		assert_eq!(state.rendered_size("n2"), state.model().base_size("n2").unwrap());
	}

	#[test]
	fn focus_animates_and_finishes() {
		let (mut state, _) = state();
		state.focus_nodes(&["n2".to_string()], 0.0);
		assert!(state.wants_frame(0.0));
		for _ in 0..20 {
			state.tick(16.0);
		}
		assert!(!state.wants_frame(0.0));
		let center = state.transform().graph_to_screen(Point::new(300.0, 0.0));
		assert!((center.x - 400.0).abs() < 1e-6 && (center.y - 300.0).abs() < 1e-6);
	}

	#[test]
	fn focus_is_skipped_while_interacting() {
		let (mut state, _) = state();
		state.pointer_down(150.0, 200.0, 0.0);
		let before = state.transform();
		state.focus_nodes(&["n1".to_string(), "n2".to_string()], 0.0);
		state.tick(16.0);
		assert_eq!(state.transform(), before);
	}
}
