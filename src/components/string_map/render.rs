use std::collections::HashMap;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::model::{ModelNode, NodeTone};
use super::state::StringMapState;
use super::strings::{ImpulseRings, Point, StringShape};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
	pub fn rgba(self, alpha: f64) -> String {
		format!(
			"rgba({}, {}, {}, {})",
			self.0,
			self.1,
			self.2,
			alpha.clamp(0.0, 1.0)
		)
	}
}

/// Canvas palette. Mirrors the page stylesheet's light theme.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
	pub background: Rgb,
	pub edge: Rgb,
	pub accent: Rgb,
	pub neutral: Rgb,
	pub node_border: Rgb,
	pub label: Rgb,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Rgb(247, 245, 240),
			edge: Rgb(38, 38, 38),
			accent: Rgb(36, 99, 235),
			neutral: Rgb(120, 120, 120),
			node_border: Rgb(20, 20, 20),
			label: Rgb(24, 24, 24),
		}
	}
}

pub fn render(state: &StringMapState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	ctx.set_fill_style_str(&theme.background.rgba(1.0));
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	let transform = state.transform();
	let positions = state.positions();
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_nodes(state, ctx, theme, &positions);
	ctx.set_line_cap("round");
	ctx.set_line_join("round");
	draw_strings(state, ctx, theme, &positions);
	draw_highlighted_nodes(state, ctx, theme, &positions);
	draw_node_impulses(state, ctx, theme, &positions);
	ctx.restore();
}

fn trace(ctx: &CanvasRenderingContext2d, shape: &StringShape) {
	ctx.begin_path();
	for (i, p) in shape.points().enumerate() {
		if i == 0 {
			ctx.move_to(p.x, p.y);
		} else {
			ctx.line_to(p.x, p.y);
		}
	}
}

fn circle(ctx: &CanvasRenderingContext2d, at: Point, radius: f64) {
	ctx.begin_path();
	let _ = ctx.arc(at.x, at.y, radius.max(0.0), 0.0, 2.0 * PI);
}

fn draw_strings(
	state: &StringMapState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	positions: &HashMap<String, Point>,
) {
	let highlight = state.waves().highlight();
	for edge in state.model().edges() {
		let (Some(&from), Some(&to)) = (positions.get(&edge.from), positions.get(&edge.to)) else {
			continue;
		};
		let Some(shape) = StringShape::new(
			from,
			to,
			state.rendered_size(&edge.from),
			state.rendered_size(&edge.to),
			state.motion().boost(&edge.from, &edge.to),
			state.waves().edge(&edge.id),
		) else {
			continue;
		};

		let lit = highlight.edge_ids.contains(&edge.id);
		let width = edge.width + if lit { 0.35 } else { 0.0 };
		let stroke = if lit {
			theme.accent.rgba(0.95)
		} else {
			theme.edge.rgba(1.0)
		};
		ctx.set_stroke_style_str(&stroke);
		ctx.set_line_width(width);
		trace(ctx, &shape);
		ctx.stroke();

		if lit {
			ctx.save();
			ctx.set_stroke_style_str(&theme.accent.rgba(0.34));
			ctx.set_line_width(width + 2.6);
			ctx.set_shadow_color(&theme.accent.rgba(0.7));
			ctx.set_shadow_blur(8.0);
			trace(ctx, &shape);
			ctx.stroke();
			ctx.restore();
		}
	}
}

fn node_fill(node: &ModelNode, theme: &Theme, lit: bool) -> String {
	let alpha = if lit {
		node.style.highlight_alpha
	} else {
		node.style.alpha
	};
	if let Some(color) = &node.style.color {
		return color.clone();
	}
	match node.style.tone {
		NodeTone::Accent => theme.accent.rgba(alpha),
		NodeTone::Neutral => theme.neutral.rgba(alpha),
	}
}

fn draw_nodes(
	state: &StringMapState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	positions: &HashMap<String, Point>,
) {
	let highlight = state.waves().highlight();
	let hovered = state.hover().node.as_deref();
	for node in state.model().nodes() {
		let Some(&at) = positions.get(&node.id) else {
			continue;
		};
		let radius = state.rendered_size(&node.id);
		let lit = highlight.node_ids.contains(&node.id) || hovered == Some(node.id.as_str());

		circle(ctx, at, radius);
		ctx.set_fill_style_str(&node_fill(node, theme, lit));
		ctx.fill();
		ctx.set_line_width(node.style.border_width);
		ctx.set_stroke_style_str(&theme.node_border.rgba(node.style.alpha));
		ctx.stroke();

		if let Some(label) = &node.label {
			ctx.set_fill_style_str(&theme.label.rgba(if lit { 1.0 } else { 0.86 }));
			ctx.set_font(&format!("{}px \"IBM Plex Mono\", monospace", node.font_size));
			ctx.set_text_align("center");
			let _ = ctx.fill_text(label, at.x, at.y + radius + node.font_size);
		}
	}
}

fn draw_highlighted_nodes(
	state: &StringMapState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	positions: &HashMap<String, Point>,
) {
	for id in &state.waves().highlight().node_ids {
		let Some(&at) = positions.get(id) else {
			continue;
		};
		let radius = state.rendered_size(id);

		circle(ctx, at, radius + 4.2);
		ctx.set_fill_style_str(&theme.accent.rgba(0.12));
		ctx.fill();

		ctx.save();
		ctx.set_line_width(1.2);
		ctx.set_stroke_style_str(&theme.accent.rgba(0.42));
		ctx.set_shadow_color(&theme.accent.rgba(0.72));
		ctx.set_shadow_blur(7.0);
		circle(ctx, at, radius + 6.5);
		ctx.stroke();
		ctx.restore();

		ctx.set_line_width(1.0);
		ctx.set_stroke_style_str(&theme.accent.rgba(0.62));
		circle(ctx, at, radius + 2.6);
		ctx.stroke();
	}
}

fn draw_node_impulses(
	state: &StringMapState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	positions: &HashMap<String, Point>,
) {
	for (id, osc) in state.waves().ringing_nodes() {
		let Some(&at) = positions.get(id) else {
			continue;
		};
		let rings = ImpulseRings::new(state.rendered_size(id), osc);

		ctx.set_line_width(1.1);
		ctx.set_stroke_style_str(&theme.accent.rgba(rings.inner_alpha));
		circle(ctx, at, rings.inner_radius);
		ctx.stroke();

		ctx.set_line_width(0.9);
		ctx.set_stroke_style_str(&theme.accent.rgba(rings.outer_alpha));
		circle(ctx, at, rings.outer_radius);
		ctx.stroke();
	}
}
