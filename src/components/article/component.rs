use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos_meta::Title;

use super::reader::ArticleReader;
use crate::components::string_map::{MapHandle, StringMapCanvas, now_ms};
use crate::load::Article;

/// Map pane plus reading pane for one loaded article.
#[component]
pub fn ArticlePage(article: Article) -> impl IntoView {
	let seed = (js_sys::Date::now() as u64) ^ now_ms().to_bits();
	let map = MapHandle::new(&article.config, seed);
	let anchor_config = article.config.tuning.anchor.clone();
	let meta = article.config.meta.clone();

	let reader: Rc<RefCell<Option<ArticleReader>>> = Rc::default();
	let pane_ref = NodeRef::<leptos::html::Article>::new();
	let content_ref = NodeRef::<leptos::html::Div>::new();
	let preview_ref = NodeRef::<leptos::html::Aside>::new();

	let reader_click = reader.clone();
	let on_section: Rc<dyn Fn(&str)> = Rc::new(move |section: &str| {
		if let Some(reader) = reader_click.borrow().as_ref() {
			reader.scroll_to_section(section, false);
		}
	});
	let reader_hover = reader.clone();
	let on_hover: Rc<dyn Fn(Option<&str>)> = Rc::new(move |node: Option<&str>| {
		if let Some(reader) = reader_hover.borrow().as_ref() {
			reader.preview_node(node);
		}
	});

	let map_init = map.clone();
	Effect::new(move |_| {
		let (Some(pane), Some(content)) = (pane_ref.get(), content_ref.get()) else {
			return;
		};
		if reader.borrow().is_some() {
			return;
		}
		let installed = ArticleReader::install(
			pane,
			content.into(),
			preview_ref.get(),
			map_init.clone(),
			anchor_config.clone(),
		);
		*reader.borrow_mut() = Some(installed);
	});

	let byline = meta.byline();
	view! {
		<Title text=meta.title() />
		<main class="article-layout">
			<aside class="map-pane">
				<StringMapCanvas handle=map on_section=on_section on_hover=on_hover />
			</aside>
			<article class="article-pane" node_ref=pane_ref>
				<header class="article-header">
					<h1>{meta.title()}</h1>
					{(!byline.is_empty()).then(|| view! { <p class="byline">{byline}</p> })}
				</header>
				<div class="article-content" node_ref=content_ref>
					<div
						class="context-anchor-spacer"
						style="height: var(--context-anchor-spacer-top, 0px)"
					></div>
					<div class="article-body" inner_html=article.html></div>
					<div
						class="context-anchor-spacer"
						style="height: var(--context-anchor-spacer-bottom, 0px)"
					></div>
				</div>
			</article>
			<aside class="context-preview" node_ref=preview_ref aria-live="polite">
				<h2 class="context-preview-title"></h2>
				<p class="context-preview-meta"></p>
				<div class="context-preview-body"></div>
			</aside>
		</main>
	}
}
