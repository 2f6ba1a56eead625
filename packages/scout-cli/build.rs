use std::env;

fn main() {
	let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

	println!("cargo:rustc-env=SCOUT_TARGET_TRIPLE={target}");
	println!("cargo:rerun-if-changed=build.rs");
}
