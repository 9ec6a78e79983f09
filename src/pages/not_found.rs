use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<main class="not-found">
			<h1>"Nothing here"</h1>
			<p>
				<a href="./">"Back to the listening notes"</a>
			</p>
		</main>
	}
}
