use std::path::PathBuf;

fn main() {
	// Re-run when sources or manifest change
	println!("cargo:rerun-if-changed=build.rs");
	println!("cargo:rerun-if-changed=src/lib.rs");
	println!("cargo:rerun-if-changed=cbindgen.toml");
	println!("cargo:rerun-if-changed=Cargo.toml");

	// Generate C header via cbindgen to keep declarations in sync.
	let Ok(crate_dir) = std::env::var("CARGO_MANIFEST_DIR") else { return };
	let out_dir = PathBuf::from(&crate_dir).join("include");
	let _ = std::fs::create_dir_all(&out_dir);
	let header = out_dir.join("pinbuf.h");
	let config = cbindgen::Config::from_root_or_default(&crate_dir);
	match cbindgen::Builder::new()
		.with_crate(&crate_dir)
		.with_config(config)
		.with_language(cbindgen::Language::C)
		.generate()
	{
		Ok(bindings) => {
			bindings.write_to_file(header);
		}
		// Header generation is a convenience for C consumers; never fail the build over it.
		Err(e) => println!("cargo:warning=pinbuf.h not generated: {e}"),
	}
}
