use leptos::prelude::*;
use resonant_map::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App)
}
