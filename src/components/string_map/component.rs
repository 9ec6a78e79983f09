use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::handle::{MapHandle, now_ms};

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or((800.0, 600.0))
}

/// The string map canvas. Clicking a node reports its section through
/// `on_section`; `on_hover` hears the hovered node change.
#[component]
pub fn StringMapCanvas(
	handle: MapHandle,
	on_section: Rc<dyn Fn(&str)>,
	on_hover: Rc<dyn Fn(Option<&str>)>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let listeners: Rc<RefCell<Vec<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(Vec::new()));

	let handle_init = handle.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("canvas 2d context unavailable, map stays blank");
			return;
		};
		handle_init.attach(ctx, w, h);

		let (handle_resize, canvas_resize) = (handle_init.clone(), canvas.clone());
		let on_resize = Closure::<dyn FnMut()>::new(move || {
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			handle_resize.resize(nw, nh);
		});
		let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());

		let handle_vis = handle_init.clone();
		let on_visibility = Closure::<dyn FnMut()>::new(move || {
			let hidden = web_sys::window()
				.and_then(|w| w.document())
				.is_some_and(|d| d.hidden());
			handle_vis.with(|s| s.set_page_hidden(hidden, now_ms()));
		});
		if let Some(document) = window.document() {
			let _ = document.add_event_listener_with_callback(
				"visibilitychange",
				on_visibility.as_ref().unchecked_ref(),
			);
		}

		listeners.borrow_mut().extend([on_resize, on_visibility]);
	});

	let handle_md = handle.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		let now = now_ms();
		handle_md.with(|s| {
			s.enable_sound(now);
			s.pointer_down(x, y, now);
		});
	};

	let (handle_mm, hover_mm) = (handle.clone(), on_hover.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		let (before, after) = handle_mm.with(|s| {
			let before = s.hover().node.clone();
			s.pointer_moved(x, y, now_ms());
			(before, s.hover().node.clone())
		});
		if before != after {
			hover_mm(after.as_deref());
		}
	};

	let handle_mu = handle.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(section) = handle_mu.with(|s| s.pointer_up()) {
			on_section(&section);
		}
	};

	let handle_ml = handle.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let hovered = handle_ml.with(|s| {
			let hovered = s.hover().node.is_some();
			s.pointer_left();
			hovered
		});
		if hovered {
			on_hover(None);
		}
	};

	let handle_wh = handle;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		let now = now_ms();
		handle_wh.with(|s| {
			s.enable_sound(now);
			s.wheel(x, y, ev.delta_y(), now);
		});
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="string-map-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
