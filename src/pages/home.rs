use std::sync::Arc;

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

use crate::components::article::ArticlePage;
use crate::load::{DEFAULT_ARTICLE, load_article};

/// Loads the article named by `?article=` and shows it.
#[component]
pub fn Home() -> impl IntoView {
	let query = use_query_map();
	let key = move || {
		query
			.read()
			.get("article")
			.map(|k| k.trim().to_string())
			.filter(|k| !k.is_empty())
			.unwrap_or_else(|| DEFAULT_ARTICLE.to_string())
	};
	let article = LocalResource::new(move || {
		let key = key();
		async move { load_article(key).await.map_err(Arc::new) }
	});

	view! {
		<Suspense fallback=|| view! { <p class="loading">"Loading…"</p> }>
			<ErrorBoundary fallback=move |errors| {
				view! {
					<div class="article-error">
						{move || {
							errors
								.get()
								.into_iter()
								.map(|(_, e)| {
									view! {
										<p class="error">
											{format!("Failed to load \"{}\". {e}", key())}
										</p>
									}
								})
								.collect_view()
						}}
					</div>
				}
			}>
				{move || Suspend::new(async move {
					article.await.map(|article| view! { <ArticlePage article=article /> })
				})}
			</ErrorBoundary>
		</Suspense>
	}
}
